use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{sleep, Instant};
use tracing::{error, info};

use queuing_core::{BackoffStrategy, QueueResult};

/// 周期性执行的任务
#[async_trait]
pub trait ScheduledTask: Send + Sync + 'static {
    async fn execute(&self) -> QueueResult<()>;
}

/// 周期调度器
///
/// `run` 阻塞直到 [`stop`](Self::stop) 被调用，随后等待所有已启动的执行结束。
pub struct ScheduledRunner {
    stop_tx: watch::Sender<bool>,
}

impl ScheduledRunner {
    pub fn new() -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self { stop_tx }
    }

    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    pub async fn run(&self, backoff: Arc<dyn BackoffStrategy>, task: Arc<dyn ScheduledTask>) {
        let mut stop_rx = self.stop_tx.subscribe();
        let mut running = JoinSet::new();
        let tick = sleep(backoff.next_interval());
        tokio::pin!(tick);

        loop {
            if *stop_rx.borrow_and_update() {
                info!("调度器正在停止...");
                break;
            }

            tokio::select! {
                _ = &mut tick => {
                    tick.as_mut().reset(Instant::now() + backoff.next_interval());
                    let task = task.clone();
                    running.spawn(async move { task.execute().await });
                }
                Some(joined) = running.join_next(), if !running.is_empty() => {
                    Self::log_outcome(joined);
                }
                _ = stop_rx.changed() => {}
            }
        }

        if !running.is_empty() {
            info!("等待 {} 个进行中的任务完成", running.len());
        }
        while let Some(joined) = running.join_next().await {
            Self::log_outcome(joined);
        }
    }

    fn log_outcome(joined: Result<QueueResult<()>, tokio::task::JoinError>) {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("调度任务执行失败: {}", e),
            Err(e) => error!("调度任务异常退出: {}", e),
        }
    }
}

impl Default for ScheduledRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use queuing_core::{LinearBackoff, QueueError};

    use super::*;

    #[derive(Default)]
    struct CountingTask {
        started: AtomicUsize,
        finished: AtomicUsize,
        duration: Duration,
        fail: bool,
    }

    #[async_trait]
    impl ScheduledTask for CountingTask {
        async fn execute(&self) -> QueueResult<()> {
            self.started.fetch_add(1, Ordering::SeqCst);
            sleep(self.duration).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(QueueError::Network("connection refused".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_task_every_interval() {
        let runner = Arc::new(ScheduledRunner::new());
        let task = Arc::new(CountingTask::default());

        let handle = {
            let runner = runner.clone();
            let task = task.clone();
            tokio::spawn(async move {
                runner
                    .run(Arc::new(LinearBackoff::new(Duration::from_millis(100))), task)
                    .await
            })
        };

        sleep(Duration::from_millis(350)).await;
        runner.stop();
        handle.await.unwrap();

        assert_eq!(task.started.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_waits_for_in_flight_tasks() {
        let runner = Arc::new(ScheduledRunner::new());
        let task = Arc::new(CountingTask {
            duration: Duration::from_secs(1),
            fail: true,
            ..Default::default()
        });

        let handle = {
            let runner = runner.clone();
            let task = task.clone();
            tokio::spawn(async move {
                runner
                    .run(Arc::new(LinearBackoff::new(Duration::from_millis(100))), task)
                    .await
            })
        };

        sleep(Duration::from_millis(250)).await;
        runner.stop();
        handle.await.unwrap();

        let started = task.started.load(Ordering::SeqCst);
        assert_eq!(started, 2);
        assert_eq!(task.finished.load(Ordering::SeqCst), started);
    }

    #[tokio::test]
    async fn test_stop_before_run_returns_immediately() {
        let runner = ScheduledRunner::new();
        let task = Arc::new(CountingTask::default());
        runner.stop();

        runner
            .run(Arc::new(LinearBackoff::new(Duration::from_secs(60))), task.clone())
            .await;

        assert_eq!(task.started.load(Ordering::SeqCst), 0);
    }
}
