use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::sleep;

use queuing_core::{BackoffStrategy, Incident, IncidentProcessor, QueueError, QueueResult};
use queuing_infrastructure::StructuredLogger;

/// 事件处理服务
///
/// 每个事件的处理时长由退避生成器给出。调用 [`shutdown`](Self::shutdown)
/// 后，进行中和之后到达的事件都立即以 [`QueueError::ServiceUnavailable`] 结束。
pub struct IncidentProcessingService {
    backoff: Arc<dyn BackoffStrategy>,
    shutdown_tx: watch::Sender<bool>,
}

impl IncidentProcessingService {
    pub fn new(backoff: Arc<dyn BackoffStrategy>) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            backoff,
            shutdown_tx,
        }
    }

    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}

#[async_trait]
impl IncidentProcessor for IncidentProcessingService {
    async fn process(&self, incident: Incident) -> QueueResult<()> {
        let interval = self.backoff.next_interval();
        StructuredLogger::log_processing_started(&incident, interval);

        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let stopped = async move {
            let _ = shutdown_rx.wait_for(|stopped| *stopped).await;
        };

        tokio::select! {
            _ = sleep(interval) => {
                StructuredLogger::log_processing_finished(&incident);
                Ok(())
            }
            _ = stopped => {
                StructuredLogger::log_processing_aborted(&incident);
                Err(QueueError::ServiceUnavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Utc;
    use queuing_core::{ExponentialBackoff, LinearBackoff};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_processing_waits_backoff_interval() {
        let service = IncidentProcessingService::new(Arc::new(ExponentialBackoff::new(
            Duration::from_millis(100),
            Duration::from_millis(300),
        )));

        for expected in [100, 200, 300, 300] {
            let start = tokio::time::Instant::now();
            service
                .process(Incident::new(1, Utc::now(), 1))
                .await
                .unwrap();
            assert_eq!(start.elapsed(), Duration::from_millis(expected));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_aborts_in_flight_processing() {
        let service = Arc::new(IncidentProcessingService::new(Arc::new(LinearBackoff::new(
            Duration::from_secs(60),
        ))));

        let handle = {
            let service = service.clone();
            tokio::spawn(async move { service.process(Incident::new(1, Utc::now(), 1)).await })
        };
        tokio::time::sleep(Duration::from_secs(1)).await;

        service.shutdown();
        assert_eq!(handle.await.unwrap(), Err(QueueError::ServiceUnavailable));
    }

    #[tokio::test]
    async fn test_processing_after_shutdown_fails_immediately() {
        let service = IncidentProcessingService::new(Arc::new(LinearBackoff::new(
            Duration::from_secs(60),
        )));
        service.shutdown();

        assert!(service.is_shutdown());
        assert_eq!(
            service.process(Incident::new(1, Utc::now(), 1)).await,
            Err(QueueError::ServiceUnavailable)
        );
    }
}
