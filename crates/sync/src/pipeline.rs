//! Ordered pipeline of in-flight store calls.
//!
//! Tasks are spawned as they are submitted and may finish in any order.
//! A drain loop walks the queue from the front once per interval and hands
//! the consumer only the newest result of the leading run of finished,
//! verified tasks. Nothing behind an unfinished task is ever delivered.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::FutureExt;
use minesduel_store::ABSENT;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Predicate deciding whether a finished task's result may be delivered.
pub type Verify<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Drain cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub drain_interval: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            drain_interval: Duration::from_secs(1),
        }
    }
}

struct Queue<T> {
    tasks: Mutex<VecDeque<JoinHandle<T>>>,
    closing: AtomicBool,
}

impl<T> Queue<T> {
    /// Takes the leading run of finished tasks off the queue and returns
    /// the newest verified result in it.
    ///
    /// The run stops at the first unfinished task, or right after the
    /// first finished one that fails verification. A failed task is removed
    /// but nothing after it is looked at until the next drain.
    fn take_usable(&self, verify: &Verify<T>) -> Option<T> {
        let Ok(mut tasks) = self.tasks.lock() else {
            return None;
        };

        let mut last = None;
        let mut resolved = 0;
        for handle in tasks.iter_mut() {
            if !handle.is_finished() {
                break;
            }
            // Out of coop budget; try again next drain.
            let Some(joined) = handle.now_or_never() else {
                break;
            };
            resolved += 1;
            match joined {
                Ok(value) if verify(&value) => last = Some(value),
                _ => break,
            }
        }
        tasks.drain(..resolved);
        last
    }

    fn len(&self) -> usize {
        self.tasks.lock().map(|t| t.len()).unwrap_or(0)
    }

    /// Drops every queued handle. The tasks themselves keep running to
    /// completion; only their results are discarded.
    fn clear(&self) {
        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.clear();
        }
    }
}

/// Ordered queue of spawned tasks producing `T`, drained on a cadence.
pub struct TaskPipeline<T> {
    queue: Arc<Queue<T>>,
    cancel: CancellationToken,
    drain: tokio::sync::Mutex<Option<JoinHandle<()>>>,
}

impl<T: Send + 'static> TaskPipeline<T> {
    /// Starts a pipeline whose drain loop stops when `parent` is cancelled
    /// or the pipeline is closed.
    ///
    /// Without a `verify` predicate every finished result is usable.
    pub fn new<C>(
        config: PipelineConfig,
        parent: &CancellationToken,
        verify: Option<Verify<T>>,
        consumer: C,
    ) -> Self
    where
        C: FnMut(T) + Send + 'static,
    {
        let queue = Arc::new(Queue {
            tasks: Mutex::new(VecDeque::new()),
            closing: AtomicBool::new(false),
        });
        let cancel = parent.child_token();
        let verify: Verify<T> = match verify {
            Some(verify) => verify,
            None => Box::new(|_: &T| true),
        };

        let drain = tokio::spawn(drain_loop(
            Arc::clone(&queue),
            verify,
            consumer,
            config.drain_interval,
            cancel.clone(),
        ));

        Self {
            queue,
            cancel,
            drain: tokio::sync::Mutex::new(Some(drain)),
        }
    }

    /// Spawns `task` and queues it behind everything already submitted.
    /// Returns `false` once the pipeline is closing.
    pub fn submit<F>(&self, task: F) -> bool
    where
        F: Future<Output = T> + Send + 'static,
    {
        let Ok(mut tasks) = self.queue.tasks.lock() else {
            return false;
        };
        if self.queue.closing.load(Ordering::SeqCst) {
            return false;
        }
        tasks.push_back(tokio::spawn(task));
        true
    }

    /// Number of queued tasks, finished or not.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closing(&self) -> bool {
        self.queue.closing.load(Ordering::SeqCst)
    }

    /// Stops accepting tasks, cancels the drain loop and waits for it to
    /// exit. Safe to call more than once.
    pub async fn close(&self) {
        if let Ok(_tasks) = self.queue.tasks.lock() {
            self.queue.closing.store(true, Ordering::SeqCst);
        }
        self.cancel.cancel();

        let drain = self.drain.lock().await.take();
        if let Some(handle) = drain {
            let _ = handle.await;
        }
        self.queue.clear();
    }
}

async fn drain_loop<T, C>(
    queue: Arc<Queue<T>>,
    verify: Verify<T>,
    mut consumer: C,
    every: Duration,
    cancel: CancellationToken,
) where
    C: FnMut(T),
{
    let mut interval = tokio::time::interval(every);
    interval.tick().await; // Skip immediate first tick.

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Some(value) = queue.take_usable(&verify) {
                    consumer(value);
                }
            }
        }
    }

    queue.clear();
    debug!("pipeline drain loop stopped");
}

/// Pipeline for uploads: any finished result is delivered.
pub fn upload_pipeline<C>(
    config: PipelineConfig,
    parent: &CancellationToken,
    consumer: C,
) -> TaskPipeline<bool>
where
    C: FnMut(bool) + Send + 'static,
{
    TaskPipeline::new(config, parent, None, consumer)
}

/// Pipeline for downloads: empty bodies and absent keys are not usable.
pub fn download_pipeline<C>(
    config: PipelineConfig,
    parent: &CancellationToken,
    consumer: C,
) -> TaskPipeline<String>
where
    C: FnMut(String) + Send + 'static,
{
    let verify: Verify<String> = Box::new(|body: &String| !body.is_empty() && body.as_str() != ABSENT);
    TaskPipeline::new(config, parent, Some(verify), consumer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::{mpsc, oneshot};

    const TICK: Duration = Duration::from_secs(1);

    fn collecting() -> (
        impl FnMut(String) + Send + 'static,
        mpsc::UnboundedReceiver<String>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            move |value| {
                let _ = tx.send(value);
            },
            rx,
        )
    }

    /// A task that finishes with whatever is sent through the returned
    /// sender.
    fn gated() -> (
        oneshot::Sender<String>,
        impl Future<Output = String> + Send + 'static,
    ) {
        let (tx, rx) = oneshot::channel();
        (tx, async move { rx.await.unwrap_or_default() })
    }

    #[tokio::test(start_paused = true)]
    async fn delivers_only_latest_of_verified_prefix() {
        let root = CancellationToken::new();
        let (consumer, mut rx) = collecting();
        let pipeline = download_pipeline(PipelineConfig::default(), &root, consumer);

        for body in ["1", "2", "3"] {
            assert!(pipeline.submit(async move { body.to_string() }));
        }
        tokio::time::sleep(TICK * 2).await;

        assert_eq!(rx.try_recv().unwrap(), "3");
        assert!(rx.try_recv().is_err());
        assert!(pipeline.is_empty());
        pipeline.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn pending_task_blocks_later_results() {
        let root = CancellationToken::new();
        let (consumer, mut rx) = collecting();
        let pipeline = download_pipeline(PipelineConfig::default(), &root, consumer);

        let (first, slow) = gated();
        pipeline.submit(slow);
        pipeline.submit(async { "2".to_string() });
        pipeline.submit(async { "3".to_string() });

        tokio::time::sleep(TICK * 3).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(pipeline.len(), 3);

        first.send("1".to_string()).unwrap();
        tokio::time::sleep(TICK * 2).await;
        assert_eq!(rx.try_recv().unwrap(), "3");
        assert!(rx.try_recv().is_err());
        pipeline.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_verification_blocks_until_removed() {
        let root = CancellationToken::new();
        let (consumer, mut rx) = collecting();
        let pipeline = download_pipeline(PipelineConfig::default(), &root, consumer);

        // T1 fails verification, T2 and T3 succeed; all three finish
        // before the first drain.
        pipeline.submit(async { ABSENT.to_string() });
        pipeline.submit(async { "2".to_string() });
        pipeline.submit(async { "3".to_string() });

        // First drain: T1 is dropped, nothing is delivered.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(rx.try_recv().is_err());
        assert_eq!(pipeline.len(), 2);

        // Second drain: only the newest of T2/T3.
        tokio::time::sleep(TICK).await;
        assert_eq!(rx.try_recv().unwrap(), "3");
        assert!(rx.try_recv().is_err());
        assert!(pipeline.is_empty());
        pipeline.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn verified_prefix_before_failure_is_delivered() {
        let root = CancellationToken::new();
        let (consumer, mut rx) = collecting();
        let pipeline = download_pipeline(PipelineConfig::default(), &root, consumer);

        pipeline.submit(async { "1".to_string() });
        pipeline.submit(async { String::new() });
        pipeline.submit(async { "3".to_string() });

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(rx.try_recv().unwrap(), "1");
        assert_eq!(pipeline.len(), 1);

        tokio::time::sleep(TICK).await;
        assert_eq!(rx.try_recv().unwrap(), "3");
        pipeline.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn upload_accepts_failures() {
        let root = CancellationToken::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let pipeline = upload_pipeline(PipelineConfig::default(), &root, move |ok| {
            let _ = tx.send(ok);
        });

        pipeline.submit(async { true });
        pipeline.submit(async { false });
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert!(!rx.try_recv().unwrap());
        assert!(rx.try_recv().is_err());
        pipeline.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn close_rejects_submissions_and_stops_loop() {
        let root = CancellationToken::new();
        let (consumer, mut rx) = collecting();
        let pipeline = download_pipeline(PipelineConfig::default(), &root, consumer);

        let (_gate, slow) = gated();
        pipeline.submit(slow);
        pipeline.close().await;

        assert!(pipeline.is_closing());
        assert!(!pipeline.submit(async { "late".to_string() }));
        assert!(pipeline.is_empty());

        tokio::time::sleep(TICK * 3).await;
        assert!(rx.try_recv().is_err());

        // Closing twice is fine.
        pipeline.close().await;
    }

    #[tokio::test(start_paused = true)]
    async fn parent_cancel_stops_drain() {
        let root = CancellationToken::new();
        let (consumer, mut rx) = collecting();
        let pipeline = download_pipeline(PipelineConfig::default(), &root, consumer);

        root.cancel();
        tokio::task::yield_now().await;
        pipeline.submit(async { "1".to_string() });
        tokio::time::sleep(TICK * 3).await;
        assert!(rx.try_recv().is_err());

        tokio::time::timeout(TICK, pipeline.close())
            .await
            .expect("close should not hang");
    }
}
