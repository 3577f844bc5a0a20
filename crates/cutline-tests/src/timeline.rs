//! Integration tests for the timeline engine.
//!
//! Drives cutline-timeline through the editing session the way the UI does
//! and checks the results against cutline-core helpers.

use std::sync::Arc;

use cutline_core::{format_timecode, CutlineError};
use cutline_timeline::{
    EditorConfig, EditorSession, InMemoryClipLibrary, OverlapPolicy, PlacementEngine,
    PlayheadResolver, SourceClip, TimelineClip, TimelineModel,
};
use proptest::prelude::*;
use uuid::Uuid;

use crate::init_tracing;

// ── Helpers ────────────────────────────────────────────────────

struct Fixture {
    library: Arc<InMemoryClipLibrary>,
    session: EditorSession,
    intro: SourceClip,
    body: SourceClip,
}

fn fixture() -> Fixture {
    fixture_with(EditorConfig::default())
}

fn fixture_with(config: EditorConfig) -> Fixture {
    init_tracing();
    let library = Arc::new(InMemoryClipLibrary::new());
    let intro = SourceClip::new("media/intro.mp4", 10.0, true);
    let body = SourceClip::new("media/body.mov", 30.0, false);
    library.add(intro.clone());
    library.add(body.clone());
    let session = EditorSession::new(library.clone(), config).unwrap();
    Fixture {
        library,
        session,
        intro,
        body,
    }
}

// ── Scenarios ──────────────────────────────────────────────────

#[test]
fn split_scenario_through_session() {
    let mut f = fixture();
    let clip = f.session.place(f.intro.id, 0, 0.0, 10.0).unwrap();

    let pair = f.session.split_at(4.0).unwrap().unwrap();
    assert_eq!(pair.left.id, clip.id);
    assert_eq!((pair.left.start_time, pair.left.duration), (0.0, 4.0));
    assert_eq!(
        (
            pair.right.start_time,
            pair.right.duration,
            pair.right.trim_start,
            pair.right.trim_end
        ),
        (4.0, 6.0, 4.0, 10.0)
    );

    let listed = f.session.list(None);
    assert_eq!(listed.len(), 2);
    assert!(listed.windows(2).all(|w| w[0].start_time <= w[1].start_time));
}

#[test]
fn snap_scenario() {
    let engine = PlacementEngine::default();
    assert_eq!(engine.resolve_position(9.8, 60.0, None, &[], true), 10.0);
}

#[test]
fn plan_scenario_orders_by_start() {
    let mut f = fixture();
    f.session.place(f.body.id, 0, 5.0, 3.0).unwrap();
    f.session.place(f.intro.id, 0, 0.0, 2.0).unwrap();

    let plan = f.session.build_plan().unwrap();
    let order: Vec<(Uuid, f64)> = plan
        .iter()
        .map(|s| (s.source_clip_id, s.timeline_start))
        .collect();
    assert_eq!(order, vec![(f.intro.id, 0.0), (f.body.id, 5.0)]);
}

// ── Editing flow ───────────────────────────────────────────────

#[test]
fn rough_cut_then_undo_everything() {
    let mut f = fixture();
    let a = f.session.place_source(f.intro.id, 0, 0.0).unwrap();
    let b = f.session.place_source(f.body.id, 0, 10.0).unwrap();
    assert_eq!(b.start_time, a.end_time());

    f.session.trim(b.id, 5.0, 20.0).unwrap();
    f.session.split_at(12.0).unwrap().unwrap();
    f.session.move_clip(a.id, 40.2, 1).unwrap();
    assert_eq!(f.session.get(a.id).unwrap().start_time, 40.0);
    assert_eq!(f.session.list(None).len(), 3);

    while f.session.undo().unwrap() {}
    assert!(f.session.list(None).is_empty());
    assert!(f.session.can_redo());

    while f.session.redo().unwrap() {}
    assert_eq!(f.session.list(None).len(), 3);
    assert_eq!(f.session.get(a.id).unwrap().track_id, 1);
}

#[test]
fn playback_walks_across_gap() {
    let mut f = fixture();
    f.session.set_snap_enabled(false);
    let first = f.session.place(f.intro.id, 0, 0.0, 4.0).unwrap();
    let second = f.session.place(f.body.id, 0, 6.0, 4.0).unwrap();
    f.session.trim(second.id, 10.0, 14.0).unwrap();

    let at = f.session.resolve(2.0, 0).unwrap();
    assert_eq!(at.clip_id, first.id);
    assert_eq!(at.media_time, 2.0);

    // Between clips nothing is active; playback jumps to the next start.
    assert!(f.session.active_clip(5.0, 0).is_none());
    let next = f.session.next_clip_after(first.end_time(), Some(0)).unwrap();
    assert_eq!(next.id, second.id);

    let target = f.session.resolve(next.start_time, 0).unwrap();
    assert_eq!(target.media_time, 10.0);
    let clip = f.session.get(second.id).unwrap();
    assert_eq!(PlayheadResolver::timeline_time_for(clip, 12.0), 8.0);
    assert_eq!(format_timecode(clip.end_time()), "0:10");
}

#[test]
fn reject_policy_keeps_tracks_disjoint() {
    let config = EditorConfig {
        overlap_policy: OverlapPolicy::Reject,
        ..EditorConfig::default()
    };
    let mut f = fixture_with(config);
    let a = f.session.place(f.intro.id, 0, 0.0, 5.0).unwrap();
    let b = f.session.place(f.intro.id, 1, 0.0, 5.0).unwrap();

    let err = f.session.move_clip(b.id, 2.0, 0).unwrap_err();
    assert!(matches!(err, CutlineError::Overlap { track: 0, existing } if existing == a.id));
    assert_eq!(f.session.get(b.id).unwrap().track_id, 1);

    // Touching edges is not an overlap.
    f.session.move_clip(b.id, 5.0, 0).unwrap();
    assert_eq!(f.session.list(Some(0)).len(), 2);
}

#[test]
fn export_fails_whole_plan_on_missing_source() {
    let mut f = fixture();
    f.session.place_source(f.intro.id, 0, 0.0).unwrap();
    f.session.place_source(f.body.id, 0, 10.0).unwrap();
    f.library.remove(f.body.id);

    assert!(matches!(
        f.session.build_plan(),
        Err(CutlineError::MissingSource(id)) if id == f.body.id
    ));
    // Trim still works without the source; only the bound check is skipped.
    let orphan = f.session.list(None)[1].clone();
    assert!(f.session.trim(orphan.id, 0.0, 45.0).is_ok());
}

#[test]
fn config_file_drives_session() {
    init_tracing();
    let json = br#"{ "snap": { "enabled": false }, "overlap_policy": "reject" }"#;
    let config = EditorConfig::from_json(json).unwrap();
    assert_eq!(config.snap.threshold, 0.5);
    let mut f = fixture_with(config);
    let clip = f.session.place(f.intro.id, 0, 9.8, 1.0).unwrap();
    assert_eq!(clip.start_time, 9.8);
}

// ── Properties ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn add_then_remove_restores_list(
        starts in prop::collection::vec(0.0f64..100.0, 0..12),
        extra_start in 0.0f64..100.0,
        extra_track in 0u32..4,
    ) {
        let mut model = TimelineModel::new();
        for (i, start) in starts.iter().enumerate() {
            model.add(TimelineClip::new(Uuid::new_v4(), (i % 3) as u32, *start, 1.5)).unwrap();
        }
        let before = model.list(None);
        let id = model
            .add(TimelineClip::new(Uuid::new_v4(), extra_track, extra_start, 2.0))
            .unwrap();
        prop_assert!(model.remove(id));
        prop_assert_eq!(model.list(None), before);
    }

    #[test]
    fn resolved_position_stays_on_timeline(
        candidate in -50.0f64..150.0,
        duration in 0.0f64..120.0,
        snap in any::<bool>(),
    ) {
        let engine = PlacementEngine::default();
        let clips = vec![TimelineClip::new(Uuid::new_v4(), 0, 12.3, 4.4)];
        let resolved = engine.resolve_position(candidate, duration, None, &clips, snap);
        prop_assert!(resolved >= 0.0 && resolved <= duration);
        if snap {
            let grid = resolved.round();
            let on_grid = (resolved - grid).abs() < 1e-9;
            let on_edge = resolved == 12.3 || resolved == clips[0].end_time();
            let untouched = resolved == candidate.clamp(0.0, duration);
            prop_assert!(on_grid || on_edge || untouched);
        }
    }

    #[test]
    fn active_clip_none_outside_ranges(playhead in -10.0f64..50.0) {
        let clips = vec![
            TimelineClip::new(Uuid::new_v4(), 0, 0.0, 5.0),
            TimelineClip::new(Uuid::new_v4(), 0, 10.0, 5.0),
        ];
        let inside = clips
            .iter()
            .any(|c| c.start_time <= playhead && playhead < c.end_time());
        prop_assert_eq!(PlayheadResolver::active_clip(playhead, 0, &clips).is_some(), inside);
    }
}
