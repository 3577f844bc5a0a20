//! Integration tests for export: session → render plan → encoder.

use std::sync::Arc;
use std::time::Duration;

use cutline_render::{
    Encoder, ExportProgress, FfmpegEncoder, RenderError, RenderHandle, RenderJob,
    ResolutionPreset,
};
use cutline_timeline::{EditorSession, InMemoryClipLibrary, RenderPlan, SourceClip};

use crate::init_tracing;

/// Encoder that "renders" one plan segment per step.
struct SteppingEncoder {
    step: Duration,
}

impl Encoder for SteppingEncoder {
    fn render(&self, plan: RenderPlan, _job: RenderJob) -> cutline_render::Result<RenderHandle> {
        let step = self.step;
        RenderHandle::spawn(move |tx, cancel| {
            let total = plan.total_duration();
            let mut rendered = 0.0;
            for segment in plan.iter() {
                if cancel.is_cancelled() {
                    return Err(RenderError::Cancelled);
                }
                std::thread::sleep(step);
                rendered += segment.duration();
                let _ = tx.send(ExportProgress {
                    rendered_seconds: rendered,
                    total_seconds: total,
                    speed: None,
                });
            }
            Ok(())
        })
    }
}

fn edited_session() -> EditorSession {
    init_tracing();
    let library = Arc::new(InMemoryClipLibrary::new());
    let a = SourceClip::new("media/a.mp4", 8.0, true);
    let b = SourceClip::new("media/b.mp4", 12.0, true);
    library.add(a.clone());
    library.add(b.clone());

    let mut session = EditorSession::with_defaults(library);
    session.place_source(b.id, 0, 8.0).unwrap();
    session.place_source(a.id, 0, 0.0).unwrap();
    session.split_at(14.0).unwrap().unwrap();
    session
}

#[test]
fn plan_reaches_encoder_in_timeline_order() {
    let session = edited_session();
    let plan = session.build_plan().unwrap();
    assert_eq!(plan.len(), 3);
    assert_eq!(plan.total_duration(), 20.0);

    let encoder = SteppingEncoder {
        step: Duration::from_millis(1),
    };
    let handle = encoder.render(plan, RenderJob::new("/tmp/cut")).unwrap();
    let updates: Vec<ExportProgress> = handle.progress().iter().collect();
    assert_eq!(updates.len(), 3);
    assert_eq!(updates[0].rendered_seconds, 8.0);
    assert_eq!(updates[2].fraction(), 1.0);
    assert!(handle.wait().is_ok());
}

#[test]
fn cancelled_render_reports_cancelled() {
    let session = edited_session();
    let plan = session.build_plan().unwrap();
    let encoder = SteppingEncoder {
        step: Duration::from_millis(50),
    };
    let handle = encoder.render(plan, RenderJob::new("/tmp/cut")).unwrap();
    handle.cancel();
    assert!(matches!(handle.wait(), Err(RenderError::Cancelled)));
}

#[test]
fn plan_is_independent_of_later_edits() {
    let mut session = edited_session();
    let plan = session.build_plan().unwrap();
    session.clear();
    assert!(session.list(None).is_empty());
    assert_eq!(plan.len(), 3);
}

#[test]
fn ffmpeg_args_follow_split_segments() {
    let session = edited_session();
    let plan = session.build_plan().unwrap();
    let encoder = FfmpegEncoder::new(session.library().clone());
    let job = RenderJob::new("/tmp/cut").with_resolution(ResolutionPreset::P1080);

    let args = encoder.ffmpeg_args(&plan, &job).unwrap();
    let joined = args.join(" ");
    assert!(joined.contains("-ss 0.000 -t 8.000 -i media/a.mp4"));
    assert!(joined.contains("-ss 0.000 -t 6.000 -i media/b.mp4"));
    assert!(joined.contains("-ss 6.000 -t 6.000 -i media/b.mp4"));
    assert!(joined.contains("concat=n=3:v=1:a=1[outv][outa]"));
}
