//! Encoder backed by an `ffmpeg` process.
//!
//! Each plan segment becomes one input, seeked to its source in point and
//! limited to its length. The inputs are normalised and concatenated in plan
//! order with a single filter graph. Progress is read from `-progress pipe:1`.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;

use crossbeam_channel::Sender;
use cutline_core::CutlineError;
use cutline_timeline::{ClipLibrary, RenderPlan};
use tracing::{debug, info, warn};

use crate::encoder::{Encoder, RenderHandle};
use crate::error::{RenderError, Result};
use crate::export::{ContainerFormat, ExportCancel, ExportProgress, RenderJob};

/// Audio sample rate of rendered output.
const AUDIO_SAMPLE_RATE: u32 = 48_000;

/// Frame rate and canvas of the black frames standing in for audio-only
/// segments. The canvas is only used when the job keeps source resolution.
const FILL_FRAME_RATE: u32 = 30;
const FILL_CANVAS: (u32, u32) = (1280, 720);

/// Lines of encoder stderr kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// Renders plans by running `ffmpeg`.
#[derive(Clone)]
pub struct FfmpegEncoder {
    binary: PathBuf,
    library: Arc<dyn ClipLibrary>,
}

impl FfmpegEncoder {
    /// Encoder using `ffmpeg` from `PATH`, resolving source files through
    /// `library`.
    pub fn new(library: Arc<dyn ClipLibrary>) -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
            library,
        }
    }

    /// Use a specific `ffmpeg` binary.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Build the FFmpeg command arguments for `plan`.
    pub fn ffmpeg_args(&self, plan: &RenderPlan, job: &RenderJob) -> Result<Vec<String>> {
        if plan.is_empty() {
            return Err(RenderError::EmptyPlan);
        }

        let mut args: Vec<String> = vec![
            "-y".into(),
            "-hide_banner".into(),
            "-nostats".into(),
            "-progress".into(),
            "pipe:1".into(),
        ];

        // One input per segment, seeked and limited on the input side
        for segment in plan.iter() {
            let source = self
                .library
                .get_clip(segment.source_clip_id)
                .ok_or(CutlineError::MissingSource(segment.source_clip_id))?;
            args.extend_from_slice(&[
                "-ss".into(),
                format_seconds(segment.trim_start),
                "-t".into(),
                format_seconds(segment.duration()),
                "-i".into(),
                source.path.to_string_lossy().into_owned(),
            ]);
        }

        let with_audio = plan.has_audio();
        args.extend_from_slice(&[
            "-filter_complex".into(),
            filter_graph(plan, job, with_audio),
            "-map".into(),
            "[outv]".into(),
        ]);
        if with_audio {
            args.extend_from_slice(&["-map".into(), "[outa]".into()]);
        }

        // Video codec and quality
        args.extend_from_slice(&[
            "-c:v".into(),
            "libx264".into(),
            "-preset".into(),
            job.quality.encoder_preset().into(),
            "-crf".into(),
            job.quality.crf().to_string(),
            "-pix_fmt".into(),
            "yuv420p".into(),
        ]);

        if with_audio {
            args.extend_from_slice(&[
                "-c:a".into(),
                "aac".into(),
                "-b:a".into(),
                format!("{}k", job.quality.audio_bitrate()),
            ]);
        }

        if job.format == ContainerFormat::Mp4 {
            args.extend_from_slice(&["-movflags".into(), "+faststart".into()]);
        }

        args.extend_from_slice(&["-f".into(), job.format.extension().into()]);
        args.push(job.resolved_output_path().to_string_lossy().into_owned());

        Ok(args)
    }
}

impl Encoder for FfmpegEncoder {
    fn render(&self, plan: RenderPlan, job: RenderJob) -> Result<RenderHandle> {
        let args = self.ffmpeg_args(&plan, &job)?;
        let total_seconds = plan.total_duration();

        info!(
            segments = plan.len(),
            output = %job.resolved_output_path().display(),
            resolution = job.resolution.label(),
            "Starting export"
        );
        debug!(args = ?args, "ffmpeg arguments");

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(RenderError::Spawn)?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RenderError::Failed("Failed to open ffmpeg stdout".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| RenderError::Failed("Failed to open ffmpeg stderr".into()))?;

        RenderHandle::spawn(move |tx, cancel| {
            supervise(&mut child, stdout, stderr, total_seconds, &tx, &cancel)
        })
    }
}

/// Pump progress out of a running ffmpeg until it exits or is cancelled.
fn supervise(
    child: &mut Child,
    stdout: impl Read,
    stderr: impl Read + Send + 'static,
    total_seconds: f64,
    tx: &Sender<ExportProgress>,
    cancel: &ExportCancel,
) -> Result<()> {
    let stderr_tail = std::thread::spawn(move || tail_lines(stderr, STDERR_TAIL_LINES));

    let mut parser = ProgressParser::new(total_seconds);
    for line in BufReader::new(stdout).lines() {
        if cancel.is_cancelled() {
            let _ = child.kill();
            let _ = child.wait();
            warn!("Export cancelled");
            return Err(RenderError::Cancelled);
        }
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                warn!(error = %e, "Lost ffmpeg progress stream");
                return Err(RenderError::Io(e));
            }
        };
        if let Some(progress) = parser.feed(&line) {
            // Nobody listening is fine; the render still runs to completion.
            let _ = tx.send(progress);
        }
    }

    let status = child.wait()?;
    let tail = stderr_tail.join().unwrap_or_default();
    if cancel.is_cancelled() {
        return Err(RenderError::Cancelled);
    }
    if !status.success() {
        warn!(%status, "ffmpeg failed");
        return Err(RenderError::Failed(format!(
            "ffmpeg exited with status: {}\n{}",
            status, tail
        )));
    }

    info!("Export complete");
    Ok(())
}

/// Filter graph that normalises every input and concatenates them.
///
/// Segments without a video stream are filled with black frames for their
/// length.
fn filter_graph(plan: &RenderPlan, job: &RenderJob, with_audio: bool) -> String {
    let mut chains = Vec::with_capacity(plan.len() * 2 + 1);
    let mut concat_inputs = String::new();

    for (i, segment) in plan.iter().enumerate() {
        let dimensions = job.resolution.dimensions();
        let video = if !segment.has_video {
            let (w, h) = dimensions.unwrap_or(FILL_CANVAS);
            format!(
                "color=c=black:s={w}x{h}:r={FILL_FRAME_RATE}:d={},\
                 setsar=1,format=yuv420p[v{i}]",
                format_seconds(segment.duration())
            )
        } else if let Some((w, h)) = dimensions {
            format!(
                "[{i}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
                 pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,format=yuv420p[v{i}]"
            )
        } else {
            format!("[{i}:v]setsar=1,format=yuv420p[v{i}]")
        };
        chains.push(video);
        concat_inputs.push_str(&format!("[v{i}]"));

        if with_audio {
            // Silent sources get generated silence so concat sees matching streams
            let audio = if segment.has_audio {
                format!("[{i}:a]aresample={AUDIO_SAMPLE_RATE},aformat=channel_layouts=stereo[a{i}]")
            } else {
                format!(
                    "anullsrc=r={AUDIO_SAMPLE_RATE}:cl=stereo,atrim=duration={}[a{i}]",
                    format_seconds(segment.duration())
                )
            };
            chains.push(audio);
            concat_inputs.push_str(&format!("[a{i}]"));
        }
    }

    let (audio_streams, outputs) = if with_audio {
        (1, "[outv][outa]")
    } else {
        (0, "[outv]")
    };
    chains.push(format!(
        "{concat_inputs}concat=n={}:v=1:a={audio_streams}{outputs}",
        plan.len()
    ));
    chains.join(";")
}

/// Seconds with millisecond precision, as ffmpeg accepts them.
fn format_seconds(seconds: f64) -> String {
    format!("{:.3}", seconds.max(0.0))
}

fn tail_lines(reader: impl Read, keep: usize) -> String {
    let mut tail = VecDeque::with_capacity(keep);
    for line in BufReader::new(reader).lines().map_while(|l| l.ok()) {
        if tail.len() == keep {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    Vec::from(tail).join("\n")
}

// ── Progress parsing ────────────────────────────────────────────

/// Turns `-progress` key=value lines into progress updates.
///
/// ffmpeg writes a block of keys per update and terminates each block with
/// `progress=continue` or `progress=end`.
#[derive(Debug, Clone)]
pub struct ProgressParser {
    total_seconds: f64,
    rendered_seconds: f64,
    speed: Option<f64>,
}

impl ProgressParser {
    pub fn new(total_seconds: f64) -> Self {
        Self {
            total_seconds,
            rendered_seconds: 0.0,
            speed: None,
        }
    }

    /// Feed one line; returns an update at the end of each block.
    pub fn feed(&mut self, line: &str) -> Option<ExportProgress> {
        let (key, value) = line.trim().split_once('=')?;
        match key {
            // Both keys carry microseconds
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<i64>() {
                    self.rendered_seconds = (us.max(0) as f64) / 1_000_000.0;
                }
            }
            "speed" => {
                self.speed = value.trim_end_matches('x').trim().parse::<f64>().ok();
            }
            "progress" => {
                if value == "end" {
                    self.rendered_seconds = self.total_seconds;
                }
                return Some(ExportProgress {
                    rendered_seconds: self.rendered_seconds.min(self.total_seconds),
                    total_seconds: self.total_seconds,
                    speed: self.speed,
                });
            }
            _ => {}
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{QualityPreset, ResolutionPreset};
    use cutline_timeline::{ExportPlanner, InMemoryClipLibrary, SourceClip, TimelineClip};

    fn plan_with(sources: &[(SourceClip, f64, f64)]) -> (Arc<InMemoryClipLibrary>, RenderPlan) {
        let library = Arc::new(InMemoryClipLibrary::new());
        let mut clips = Vec::new();
        let mut start = 0.0;
        for (source, trim_start, trim_end) in sources {
            library.add(source.clone());
            let mut clip = TimelineClip::new(source.id, 0, start, trim_end - trim_start);
            clip.trim_start = *trim_start;
            clip.trim_end = *trim_end;
            start += clip.duration;
            clips.push(clip);
        }
        let plan = ExportPlanner::build_plan(&clips, library.as_ref()).unwrap();
        (library, plan)
    }

    #[test]
    fn test_ffmpeg_args_seek_each_segment() {
        let a = SourceClip::new("/media/a.mp4", 30.0, true);
        let b = SourceClip::new("/media/b.mov", 10.0, false);
        let (library, plan) = plan_with(&[(a, 2.0, 5.5), (b, 0.0, 4.0)]);
        let encoder = FfmpegEncoder::new(library);
        let job = RenderJob::new("/tmp/out")
            .with_resolution(ResolutionPreset::P720)
            .with_quality(QualityPreset::Medium);

        let args = encoder.ffmpeg_args(&plan, &job).unwrap();
        let joined = args.join(" ");
        assert!(joined.contains("-ss 2.000 -t 3.500 -i /media/a.mp4"));
        assert!(joined.contains("-ss 0.000 -t 4.000 -i /media/b.mov"));
        assert!(joined.contains("-crf 23"));
        assert!(joined.contains("-map [outa]"));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/out.mp4"));

        let graph = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];
        assert!(graph.contains("[0:v]scale=1280:720"));
        assert!(graph.contains("anullsrc=r=48000:cl=stereo,atrim=duration=4.000[a1]"));
        assert!(graph.ends_with("[v0][a0][v1][a1]concat=n=2:v=1:a=1[outv][outa]"));
    }

    #[test]
    fn test_audio_only_segment_gets_black_frames() {
        let screen = SourceClip::new("/media/screen.mp4", 10.0, true);
        let mic = SourceClip::new("/media/mic.wav", 10.0, true).with_video(false);
        let (library, plan) = plan_with(&[(screen, 0.0, 4.0), (mic, 1.0, 7.0)]);
        let encoder = FfmpegEncoder::new(library);
        let job = RenderJob::new("/tmp/out").with_resolution(ResolutionPreset::P720);

        let args = encoder.ffmpeg_args(&plan, &job).unwrap();
        let graph = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];
        assert!(graph.contains("[0:v]scale=1280:720"));
        assert!(!graph.contains("[1:v]"));
        assert!(graph.contains(
            "color=c=black:s=1280x720:r=30:d=6.000,setsar=1,format=yuv420p[v1]"
        ));
        assert!(graph.contains("[1:a]aresample=48000"));
        assert!(graph.ends_with("[v0][a0][v1][a1]concat=n=2:v=1:a=1[outv][outa]"));
    }

    #[test]
    fn test_audio_only_plan_at_source_resolution() {
        let mic = SourceClip::new("/media/mic.wav", 5.0, true).with_video(false);
        let (library, plan) = plan_with(&[(mic, 0.0, 5.0)]);
        let encoder = FfmpegEncoder::new(library);

        let args = encoder
            .ffmpeg_args(&plan, &RenderJob::new("/tmp/out.mp4"))
            .unwrap();
        assert!(args
            .iter()
            .any(|a| a.starts_with("color=c=black:s=1280x720:r=30:d=5.000")));
    }

    /// A progress pipe that fails on first read.
    struct BrokenPipe;

    impl Read for BrokenPipe {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "progress pipe closed",
            ))
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_progress_read_error_stops_encoder_process() {
        let mut child = Command::new("sleep")
            .arg("30")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();
        let (tx, _rx) = crossbeam_channel::unbounded();

        let result = supervise(
            &mut child,
            BrokenPipe,
            std::io::empty(),
            10.0,
            &tx,
            &ExportCancel::new(),
        );
        assert!(matches!(result, Err(RenderError::Io(_))));
        // Already reaped: the process is not left running.
        assert!(child.try_wait().unwrap().is_some());
    }

    #[test]
    fn test_silent_plan_has_no_audio_output() {
        let a = SourceClip::new("/media/a.mp4", 10.0, false);
        let (library, plan) = plan_with(&[(a, 0.0, 10.0)]);
        let encoder = FfmpegEncoder::new(library);
        let job = RenderJob::new("/tmp/out.mov").with_format(ContainerFormat::Mov);

        let args = encoder.ffmpeg_args(&plan, &job).unwrap();
        assert!(!args.contains(&"[outa]".to_string()));
        assert!(!args.contains(&"-c:a".to_string()));
        assert!(!args.contains(&"-movflags".to_string()));
        assert!(args.iter().any(|a| a.ends_with("concat=n=1:v=1:a=0[outv]")));
    }

    #[test]
    fn test_source_missing_at_render_time() {
        let a = SourceClip::new("/media/a.mp4", 10.0, false);
        let (library, plan) = plan_with(&[(a.clone(), 0.0, 10.0)]);
        library.remove(a.id);
        let encoder = FfmpegEncoder::new(library);
        assert!(matches!(
            encoder.ffmpeg_args(&plan, &RenderJob::new("/tmp/out.mp4")),
            Err(RenderError::Plan(CutlineError::MissingSource(_)))
        ));
    }

    #[test]
    fn test_empty_plan_rejected() {
        let (library, plan) = plan_with(&[]);
        let encoder = FfmpegEncoder::new(library);
        assert!(matches!(
            encoder.render(plan, RenderJob::new("/tmp/out.mp4")),
            Err(RenderError::EmptyPlan)
        ));
    }

    #[test]
    fn test_missing_binary_fails_to_spawn() {
        let a = SourceClip::new("/media/a.mp4", 10.0, false);
        let (library, plan) = plan_with(&[(a, 0.0, 10.0)]);
        let encoder =
            FfmpegEncoder::new(library).with_binary("/nonexistent/cutline-test-ffmpeg");
        assert!(matches!(
            encoder.render(plan, RenderJob::new("/tmp/out.mp4")),
            Err(RenderError::Spawn(_))
        ));
    }

    #[test]
    fn test_progress_parser_blocks() {
        let mut parser = ProgressParser::new(10.0);
        assert_eq!(parser.feed("frame=120"), None);
        assert_eq!(parser.feed("out_time_us=2500000"), None);
        assert_eq!(parser.feed("speed=1.25x"), None);
        let update = parser.feed("progress=continue").unwrap();
        assert_eq!(update.rendered_seconds, 2.5);
        assert_eq!(update.speed, Some(1.25));

        assert_eq!(parser.feed("speed=N/A"), None);
        assert_eq!(parser.feed("not a key value line"), None);
        let done = parser.feed("progress=end").unwrap();
        assert_eq!(done.fraction(), 1.0);
        assert_eq!(done.speed, None);
    }

    #[test]
    fn test_tail_lines_keeps_last() {
        let text = "1\n2\n3\n4\n5\n";
        assert_eq!(tail_lines(text.as_bytes(), 2), "4\n5");
    }
}
