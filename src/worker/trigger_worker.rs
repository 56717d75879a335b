use std::sync::Arc;

use rand::Rng;
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use crate::campaign::StageTrigger;
use crate::db::StatusWriter;
use crate::functions::{stage_payload, FunctionInvoker};

/// A stage invocation requested by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerRequest {
    pub campaign_id: i32,
    pub trigger: StageTrigger,
}

/// Sending half handed to the controller; enqueueing never waits
#[derive(Clone)]
pub struct TriggerQueue {
    tx: mpsc::UnboundedSender<TriggerRequest>,
}

impl TriggerQueue {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TriggerRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Hand a request to the worker. Fails only once the worker has stopped.
    pub fn enqueue(&self, request: TriggerRequest) -> Result<(), TriggerRequest> {
        self.tx.send(request).map_err(|e| e.0)
    }
}

/// How many times an invocation is attempted and how long to back off
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Exponential backoff plus up to half a base delay of jitter
    fn delay_for(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let backoff = base_ms.saturating_mul(1 << attempt.saturating_sub(1).min(10));
        let jitter = rand::thread_rng().gen_range(0..=base_ms / 2);
        Duration::from_millis(backoff + jitter)
    }
}

/// Background worker delivering stage invocations
pub struct TriggerWorker {
    invoker: Arc<dyn FunctionInvoker>,
    status_writer: Arc<dyn StatusWriter>,
    retry: RetryPolicy,
}

impl TriggerWorker {
    pub fn new(
        invoker: Arc<dyn FunctionInvoker>,
        status_writer: Arc<dyn StatusWriter>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            invoker,
            status_writer,
            retry,
        }
    }

    /// Run worker with semaphore-based bounded concurrency
    ///
    /// # Architecture
    /// - Receives requests from the controller's [`TriggerQueue`]
    /// - Acquires a semaphore permit before spawning each delivery task
    /// - Each task invokes the stage function, retrying with backoff
    /// - If every attempt fails, writes the stage's failed status so the
    ///   operator is offered a retry, unless the status has moved on
    ///
    /// # Shutdown
    /// Once `shutdown_rx` flips to true (or its sender is dropped), the queue
    /// is closed, requests already queued are still delivered, and the
    /// worker returns after every in-flight task has released its permit.
    pub async fn run(
        &self,
        mut requests: mpsc::UnboundedReceiver<TriggerRequest>,
        max_concurrent: usize,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let max_concurrent = max_concurrent.max(1);
        let semaphore = Arc::new(Semaphore::new(max_concurrent));
        info!("Trigger worker started (max {} concurrent invocations)", max_concurrent);

        loop {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Trigger worker received shutdown signal, closing queue");
                        requests.close();
                        break;
                    }
                }
                next = requests.recv() => match next {
                    Some(request) => self.dispatch(request, &semaphore).await,
                    None => {
                        info!("Trigger queue closed");
                        break;
                    }
                }
            }
        }

        // drain whatever was queued before the close
        while let Some(request) = requests.recv().await {
            self.dispatch(request, &semaphore).await;
        }

        info!("Waiting for in-flight invocations to finish...");
        match semaphore.acquire_many(max_concurrent as u32).await {
            Ok(_) => info!("Trigger worker stopped"),
            Err(e) => error!("Trigger worker semaphore closed unexpectedly: {:?}", e),
        };
    }

    async fn dispatch(&self, request: TriggerRequest, semaphore: &Arc<Semaphore>) {
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(e) => {
                error!("Failed to acquire semaphore for campaign {}: {:?}", request.campaign_id, e);
                return;
            }
        };

        let invoker = self.invoker.clone();
        let status_writer = self.status_writer.clone();
        let retry = self.retry;

        tokio::spawn(async move {
            deliver(invoker.as_ref(), status_writer.as_ref(), retry, request).await;
            drop(permit);
        });
    }
}

async fn deliver(
    invoker: &dyn FunctionInvoker,
    status_writer: &dyn StatusWriter,
    retry: RetryPolicy,
    request: TriggerRequest,
) {
    let TriggerRequest { campaign_id, trigger } = request;
    let function_id = trigger.function_id();

    for attempt in 1..=retry.max_attempts {
        match invoker.invoke(function_id, stage_payload(campaign_id)).await {
            Ok(()) => {
                info!(
                    "Invoked {} for campaign {} (trigger={}, attempt {})",
                    function_id, campaign_id, trigger, attempt
                );
                return;
            }
            Err(e) => {
                warn!(
                    "Invocation of {} for campaign {} failed (attempt {}/{}): {}",
                    function_id, campaign_id, attempt, retry.max_attempts, e
                );
                if attempt < retry.max_attempts {
                    let delay = retry.delay_for(attempt);
                    sleep(delay).await;
                }
            }
        }
    }

    let failed = trigger.failed_status();
    error!(
        "Giving up on {} for campaign {}; marking it {}",
        function_id, campaign_id, failed
    );
    match status_writer
        .write_status_from(campaign_id, trigger.in_progress_status(), failed)
        .await
    {
        Ok(true) => {}
        Ok(false) => warn!(
            "Campaign {} is no longer {}; leaving its status alone",
            campaign_id,
            trigger.in_progress_status()
        ),
        Err(e) => error!("Failed to record {} for campaign {}: {:?}", failed, campaign_id, e),
    }
}
