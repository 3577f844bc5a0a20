//! The encoder seam: hand a render plan to something that produces a file.
//!
//! Rendering runs out of band. `render` returns at once with a
//! [`RenderHandle`] carrying a progress stream, a cancel handle and the
//! terminal result.

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use cutline_timeline::RenderPlan;

use crate::error::{RenderError, Result};
use crate::export::{ExportCancel, ExportProgress, RenderJob};

/// Something that can turn a render plan into an output file.
pub trait Encoder: Send + Sync {
    /// Start rendering `plan` as described by `job`.
    ///
    /// Errors returned here mean the render never started; failures after
    /// that arrive through [`RenderHandle::wait`].
    fn render(&self, plan: RenderPlan, job: RenderJob) -> Result<RenderHandle>;
}

/// A running render.
pub struct RenderHandle {
    progress: Receiver<ExportProgress>,
    cancel: ExportCancel,
    worker: JoinHandle<Result<()>>,
}

impl RenderHandle {
    /// Run `work` on a background thread.
    ///
    /// `work` receives the progress sender and the cancel handle; it should
    /// poll the cancel handle and return [`RenderError::Cancelled`] once it
    /// sees it set.
    pub fn spawn<F>(work: F) -> Result<Self>
    where
        F: FnOnce(Sender<ExportProgress>, ExportCancel) -> Result<()> + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::unbounded();
        let cancel = ExportCancel::new();
        let worker_cancel = cancel.clone();
        let worker = std::thread::Builder::new()
            .name("cutline-render".into())
            .spawn(move || work(tx, worker_cancel))
            .map_err(RenderError::Spawn)?;
        Ok(Self {
            progress: rx,
            cancel,
            worker,
        })
    }

    /// Progress updates. The channel disconnects when the render ends.
    pub fn progress(&self) -> &Receiver<ExportProgress> {
        &self.progress
    }

    /// Latest progress update without blocking, draining older ones.
    pub fn latest_progress(&self) -> Option<ExportProgress> {
        self.progress.try_iter().last()
    }

    /// Wait up to `timeout` for the next progress update.
    pub fn next_progress(&self, timeout: Duration) -> Option<ExportProgress> {
        self.progress.recv_timeout(timeout).ok()
    }

    /// A handle that can cancel this render from elsewhere.
    pub fn cancel_handle(&self) -> ExportCancel {
        self.cancel.clone()
    }

    /// Ask the render to stop.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Block until the render ends and return its result.
    pub fn wait(self) -> Result<()> {
        self.worker
            .join()
            .map_err(|_| RenderError::Failed("render thread panicked".into()))?
    }
}
