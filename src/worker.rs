//! Background render thread with latest-request-wins semantics.
//!
//! The worker owns a receiving end of a job channel. Whenever it wakes up it
//! drains everything queued and runs only the newest job; older jobs are
//! superseded before they start. Outcomes go back over a second channel and
//! the session drops any that arrive after a newer request
//! ([`FilterSession::complete`]). Together these guarantee the published
//! render always matches the most recent selection.

use crate::imaging::{EffectRegistry, ExportEncoder};
use crate::session::{FilterSession, RenderJob, RenderOutcome, SelectOutcome, SessionError};
use crate::types::FilterName;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("Failed to start render worker: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Render worker stopped")]
    Stopped,
}

pub struct RenderWorker {
    jobs: Option<Sender<RenderJob>>,
    outcomes: Receiver<RenderOutcome>,
    handle: Option<JoinHandle<()>>,
}

impl RenderWorker {
    /// Start the render thread. It runs until the worker is dropped.
    pub fn spawn<R: EffectRegistry + 'static>(registry: Arc<R>) -> Result<Self, WorkerError> {
        let (job_tx, job_rx) = mpsc::channel::<RenderJob>();
        let (outcome_tx, outcome_rx) = mpsc::channel();

        let handle = std::thread::Builder::new()
            .name("render-worker".into())
            .spawn(move || {
                // Locals drop in reverse order, also when an effect panics: the
                // job channel closes before the outcome channel does.
                let outcome_tx = outcome_tx;
                let job_rx = job_rx;
                while let Ok(mut job) = job_rx.recv() {
                    while let Ok(newer) = job_rx.try_recv() {
                        tracing::debug!(superseded = %job.selection(), "skipping stale render job");
                        job = newer;
                    }
                    if outcome_tx.send(job.run(registry.as_ref())).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            jobs: Some(job_tx),
            outcomes: outcome_rx,
            handle: Some(handle),
        })
    }

    pub fn submit(&self, job: RenderJob) -> Result<(), WorkerError> {
        self.jobs
            .as_ref()
            .ok_or(WorkerError::Stopped)?
            .send(job)
            .map_err(|_| WorkerError::Stopped)
    }

    /// Block until the next outcome arrives.
    pub fn recv(&self) -> Result<RenderOutcome, WorkerError> {
        self.outcomes.recv().map_err(|_| WorkerError::Stopped)
    }

    /// An outcome if one is ready.
    pub fn try_recv(&self) -> Option<RenderOutcome> {
        self.outcomes.try_recv().ok()
    }

    /// Ask the session for a render of `name` and queue it.
    ///
    /// Returns `false` when nothing needed rendering.
    pub fn select<R, E>(
        &self,
        session: &mut FilterSession<R, E>,
        name: impl Into<FilterName>,
    ) -> Result<bool, WorkerError>
    where
        R: EffectRegistry,
        E: ExportEncoder,
    {
        match session.request(name)? {
            Some(job) => {
                if let Err(e) = self.submit(job) {
                    session.cancel_pending();
                    return Err(e);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Feed outcomes into the session until no request is pending.
    ///
    /// Returns the outcome of the render that got published last, if any.
    /// If the worker has stopped, the pending request is cancelled so the
    /// session keeps showing its last published render.
    pub fn settle<R, E>(
        &self,
        session: &mut FilterSession<R, E>,
    ) -> Result<Option<SelectOutcome>, WorkerError>
    where
        R: EffectRegistry,
        E: ExportEncoder,
    {
        let mut last = None;
        while session.pending().is_some() {
            let outcome = match self.recv() {
                Ok(outcome) => outcome,
                Err(e) => {
                    session.cancel_pending();
                    return Err(e);
                }
            };
            if let Some(published) = session.complete(outcome) {
                last = Some(published);
            }
        }
        Ok(last)
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        // Closing the job channel ends the thread's receive loop.
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FilterCatalog;
    use crate::imaging::encoder::tests::MockEncoder;
    use crate::imaging::registry::tests::MockEffects;
    use crate::types::{BoundingBox, OriginalCanvas};
    use image::{Rgba, RgbaImage};

    /// Registry whose only effect panics, taking the worker thread down.
    struct PanickingEffects;

    impl EffectRegistry for PanickingEffects {
        fn names(&self) -> Vec<FilterName> {
            vec![FilterName::new("boom")]
        }

        fn has(&self, name: &FilterName) -> bool {
            name.as_str() == "boom"
        }

        fn apply(
            &self,
            _name: &FilterName,
            _bitmap: RgbaImage,
        ) -> Result<RgbaImage, crate::imaging::EffectError> {
            panic!("effect crashed")
        }
    }

    fn session(registry: Arc<MockEffects>) -> FilterSession<Arc<MockEffects>, MockEncoder> {
        let catalog = FilterCatalog::from_registry(&registry);
        let mut s = FilterSession::new(
            registry,
            MockEncoder::default(),
            catalog,
            BoundingBox::default(),
        );
        let black = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        s.load_original(OriginalCanvas::new(black).unwrap());
        s
    }

    #[test]
    fn worker_publishes_requested_selection() {
        let registry = Arc::new(MockEffects::new());
        let worker = RenderWorker::spawn(registry.clone()).unwrap();
        let mut s = session(registry);

        assert!(worker.select(&mut s, "red").unwrap());
        assert_eq!(worker.settle(&mut s).unwrap(), Some(SelectOutcome::Applied));
        assert_eq!(s.selection().unwrap().as_str(), "red");
        let render = s.current_render().unwrap();
        assert_eq!(render.pixels.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn latest_request_wins() {
        let registry = Arc::new(MockEffects::new());
        let worker = RenderWorker::spawn(registry.clone()).unwrap();
        let mut s = session(registry);

        worker.select(&mut s, "red").unwrap();
        worker.select(&mut s, "broken").unwrap();
        worker.select(&mut s, "shift").unwrap();
        worker.settle(&mut s).unwrap();

        assert_eq!(s.selection().unwrap().as_str(), "shift");
        let render = s.current_render().unwrap();
        assert_eq!(render.pixels.get_pixel(0, 0).0, [10, 0, 0, 255]);
        assert!(s.pending().is_none());
    }

    #[test]
    fn reselecting_pending_queues_nothing() {
        let registry = Arc::new(MockEffects::new());
        let worker = RenderWorker::spawn(registry.clone()).unwrap();
        let mut s = session(registry);

        assert!(worker.select(&mut s, "red").unwrap());
        assert!(!worker.select(&mut s, "red").unwrap());
        worker.settle(&mut s).unwrap();
        assert!(!worker.select(&mut s, "red").unwrap());
        assert_eq!(s.render_count(), 2);
    }

    #[test]
    fn unknown_filter_is_reported_through_worker() {
        let registry = Arc::new(MockEffects::new());
        let worker = RenderWorker::spawn(registry.clone()).unwrap();
        let mut s = session(registry);

        assert!(matches!(
            worker.select(&mut s, "nope"),
            Err(WorkerError::Session(SessionError::UnknownFilter(_)))
        ));
    }

    #[test]
    fn dead_worker_leaves_published_render_in_place() {
        let registry = Arc::new(PanickingEffects);
        let worker = RenderWorker::spawn(registry.clone()).unwrap();
        let catalog = FilterCatalog::from_registry(&registry);
        let mut s = FilterSession::new(
            registry,
            MockEncoder::default(),
            catalog,
            BoundingBox::default(),
        );
        let black = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        s.load_original(OriginalCanvas::new(black).unwrap());

        assert!(worker.select(&mut s, "boom").unwrap());
        assert!(matches!(worker.settle(&mut s), Err(WorkerError::Stopped)));
        assert!(s.pending().is_none());
        assert!(s.selection().unwrap().is_normal());

        // The thread is gone, so the next submit fails and is rolled back too.
        assert!(matches!(
            worker.select(&mut s, "boom"),
            Err(WorkerError::Stopped)
        ));
        assert!(s.pending().is_none());
        assert_eq!(s.render_count(), 1);
    }

    #[test]
    fn inline_select_recovers_after_worker_loss() {
        let registry = Arc::new(MockEffects::new());
        let worker = RenderWorker::spawn(registry.clone()).unwrap();
        let mut s = session(registry);

        worker.select(&mut s, "red").unwrap();
        // Outcome never collected; the worker goes away with the job.
        drop(worker);

        assert_eq!(s.select("red").unwrap(), SelectOutcome::Applied);
        assert_eq!(s.selection().unwrap().as_str(), "red");
        assert!(s.pending().is_none());
    }
}
