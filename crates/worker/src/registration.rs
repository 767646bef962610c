use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use queuing_core::{QueueError, QueueResult, RegistrationConfig, WorkerInfo, WorkerRegistrar};

/// 启动时向Dispatcher注册当前Worker
pub struct WorkerRegistration {
    registrar: Arc<dyn WorkerRegistrar>,
    worker: WorkerInfo,
    attempts: u32,
    retry_interval: Duration,
}

impl WorkerRegistration {
    pub fn new(
        registrar: Arc<dyn WorkerRegistrar>,
        worker: WorkerInfo,
        config: &RegistrationConfig,
    ) -> Self {
        Self {
            registrar,
            worker,
            attempts: config.attempts.max(1),
            retry_interval: Duration::from_millis(config.retry_interval_ms),
        }
    }

    pub fn worker(&self) -> &WorkerInfo {
        &self.worker
    }

    /// 最多尝试 `attempts` 次，返回最后一次的错误
    pub async fn run(&self) -> QueueResult<()> {
        let mut last_error = None;

        for attempt in 1..=self.attempts {
            match self.registrar.register(self.worker.clone()).await {
                Ok(()) => {
                    info!("Worker {} 已成功注册到Dispatcher", self.worker);
                    return Ok(());
                }
                Err(e) => {
                    debug!(
                        "Worker注册失败 (第 {}/{} 次): {}",
                        attempt, self.attempts, e
                    );
                    last_error = Some(e);
                }
            }

            if attempt < self.attempts {
                sleep(self.retry_interval).await;
            }
        }

        let error = last_error.unwrap_or_else(|| QueueError::Internal("未执行注册".to_string()));
        warn!("Worker {} 注册失败，已放弃: {}", self.worker, error);
        Err(error)
    }
}
