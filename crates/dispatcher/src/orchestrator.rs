//! 调度编排器
//!
//! 状态机 `Running → Draining → Stopped`：
//! - `Running`：接收提交，按优先级从缓冲区取批次并发下发
//! - `Draining`：收到关闭信号后拒绝新提交，继续处理已缓冲的事件，
//!   直到完成槽表清空或排空超时
//! - `Stopped`：主循环退出，剩余未完成的提交以 `ServiceUnavailable` 结束
//!
//! 下发过程中发现内部不变量被破坏时直接进入 `Stopped` 并panic，
//! `run` 返回的任务以panic结束。
//!
//! 后台的Worker供给循环把空闲Worker标记为忙碌后放入有界交接队列，
//! 主循环每下发一个事件从队列取一个Worker，整批完成后才取下一批。

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, warn};

use queuing_core::config::{
    DispatcherConfig, DEFAULT_DRAIN_TIMEOUT_MS, DEFAULT_HAND_OFF_CAPACITY,
    DEFAULT_INVOKE_TIMEOUT_MS,
};
use queuing_core::{Incident, IncidentSubmitter, MetricsSink, QueueError, QueueResult};

use crate::buffer::PriorityBuffer;
use crate::completion::CompletionTable;
use crate::worker_directory::{WorkerDirectory, WorkerHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Running,
    Draining,
    Stopped,
}

impl fmt::Display for DispatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatcherState::Running => write!(f, "RUNNING"),
            DispatcherState::Draining => write!(f, "DRAINING"),
            DispatcherState::Stopped => write!(f, "STOPPED"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Worker交接队列容量
    pub hand_off_capacity: usize,
    /// 单次远程调用超时
    pub invoke_timeout: Duration,
    /// 排空阶段的最长等待时间
    pub drain_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            hand_off_capacity: DEFAULT_HAND_OFF_CAPACITY,
            invoke_timeout: Duration::from_millis(DEFAULT_INVOKE_TIMEOUT_MS),
            drain_timeout: Duration::from_millis(DEFAULT_DRAIN_TIMEOUT_MS),
        }
    }
}

impl From<&DispatcherConfig> for OrchestratorConfig {
    fn from(config: &DispatcherConfig) -> Self {
        Self {
            hand_off_capacity: config.hand_off_capacity,
            invoke_timeout: Duration::from_millis(config.invoke_timeout_ms),
            drain_timeout: Duration::from_millis(config.drain_timeout_ms),
        }
    }
}

pub struct DispatchOrchestrator {
    buffer: Arc<PriorityBuffer>,
    directory: Arc<WorkerDirectory>,
    completions: Arc<CompletionTable>,
    metrics: Arc<dyn MetricsSink>,
    config: OrchestratorConfig,
    state: watch::Sender<DispatcherState>,
}

impl DispatchOrchestrator {
    pub fn new(
        buffer: Arc<PriorityBuffer>,
        directory: Arc<WorkerDirectory>,
        completions: Arc<CompletionTable>,
        metrics: Arc<dyn MetricsSink>,
        config: OrchestratorConfig,
    ) -> Self {
        let (state, _) = watch::channel(DispatcherState::Running);
        Self {
            buffer,
            directory,
            completions,
            metrics,
            config,
            state,
        }
    }

    pub fn state(&self) -> DispatcherState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<DispatcherState> {
        self.state.subscribe()
    }

    /// 等待进入 `Stopped` 状态
    pub async fn stopped(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|state| *state == DispatcherState::Stopped).await;
    }

    /// 提交事件并等待最终结果
    pub async fn submit(&self, incident: Incident) -> QueueResult<()> {
        if self.state() != DispatcherState::Running {
            warn!("服务正在停止，拒绝事件 {}", incident);
            return Err(QueueError::ServiceUnavailable);
        }

        let completion = match self.completions.open(incident.key()).await {
            Ok(rx) => rx,
            Err(e) => {
                warn!("拒绝事件 {}: {}", incident, e);
                return Err(e);
            }
        };

        info!("收到新事件 {}", incident);
        self.metrics.incident_received(&incident).await;

        if let Err(QueueError::BufferFull) = self.buffer.try_admit(&incident).await {
            let evicted = self.buffer.evict_and_admit(&incident).await;
            if evicted.key() == incident.key() {
                info!("缓冲区已满，事件 {} 被拒绝", incident);
            } else {
                info!("缓冲区已满，事件 {} 被 {} 驱逐", evicted, incident);
            }
            self.completions
                .resolve(
                    evicted.key(),
                    Err(QueueError::evicted(evicted.id, evicted.priority)),
                )
                .await;
        }

        let outcome = completion
            .await
            .unwrap_or_else(|_| Err(QueueError::Internal("完成槽在填充前被丢弃".to_string())));

        match &outcome {
            Ok(()) => info!("事件 {} 处理成功", incident),
            Err(e) => {
                self.metrics.incident_rejected(&incident).await;
                warn!("事件 {} 处理失败: {}", incident, e);
            }
        }
        outcome
    }

    /// 主循环，直到进入 `Stopped` 才返回
    pub async fn run(self: Arc<Self>, shutdown_rx: broadcast::Receiver<()>) {
        info!(
            "事件调度器已启动, 缓冲区容量: {}, 交接队列容量: {}",
            self.buffer.capacity(),
            self.config.hand_off_capacity
        );

        let (hand_off_tx, mut hand_off_rx) = mpsc::channel(self.config.hand_off_capacity);
        let supply = tokio::spawn(Arc::clone(&self).supply_workers(hand_off_tx));
        let watcher = tokio::spawn(Arc::clone(&self).watch_shutdown(shutdown_rx));

        loop {
            tokio::select! {
                biased;
                _ = self.stopped() => break,
                batch = self.buffer.next_batch() => {
                    self.dispatch_batch(batch, &mut hand_off_rx).await;
                }
            }
        }

        for (name, task) in [("Worker供给", supply), ("停机监听", watcher)] {
            if let Err(e) = task.await {
                error!("{}任务异常退出: {}", name, e);
            }
        }

        let abandoned = self.completions.close(QueueError::ServiceUnavailable).await;
        let dropped = self.buffer.clear().await;
        if abandoned > 0 {
            warn!(
                "调度器停止时仍有 {} 个事件未完成，其中 {} 个仍在缓冲区",
                abandoned,
                dropped.len()
            );
        }
        info!("事件调度器已停止");
    }

    /// 等待关闭信号，进入 `Draining` 后负责排空
    async fn watch_shutdown(self: Arc<Self>, mut shutdown_rx: broadcast::Receiver<()>) {
        // 发送端被丢弃同样视为关闭
        let _ = shutdown_rx.recv().await;
        if self.begin_draining() {
            self.drain().await;
        }
    }

    /// 只会进入一次 `Draining`
    fn begin_draining(&self) -> bool {
        let entered = self.state.send_if_modified(|state| {
            if *state == DispatcherState::Running {
                *state = DispatcherState::Draining;
                true
            } else {
                false
            }
        });
        if entered {
            warn!("收到关闭信号，停止接收新事件");
        }
        entered
    }

    async fn drain(&self) {
        let drain_timeout = self.config.drain_timeout;
        match tokio::time::timeout(drain_timeout, self.completions.wait_until_empty()).await {
            Ok(()) => info!("所有事件已处理完毕"),
            Err(_) => warn!(
                "排空超时({:?})，仍有 {} 个事件未处理完毕",
                drain_timeout,
                self.completions.len().await
            ),
        }
        self.state.send_replace(DispatcherState::Stopped);
    }

    /// 把空闲Worker标记为忙碌并交给主循环
    async fn supply_workers(self: Arc<Self>, hand_off: mpsc::Sender<WorkerHandle>) {
        loop {
            let mut published = 0usize;
            for worker in self.directory.snapshot().await {
                if self.directory.is_busy(worker.id()).await {
                    continue;
                }
                self.directory.mark_busy(worker.id()).await;
                debug!("Worker {} 已预留", worker.info);

                tokio::select! {
                    biased;
                    _ = self.stopped() => return,
                    sent = hand_off.send(worker) => {
                        if sent.is_err() {
                            return;
                        }
                    }
                }
                published += 1;
            }

            if published > 0 {
                continue;
            }
            tokio::select! {
                biased;
                _ = self.stopped() => return,
                _ = self.directory.wait_for_change() => {}
            }
        }
    }

    /// 下发一个批次并等待其中所有事件结束
    async fn dispatch_batch(
        self: &Arc<Self>,
        batch: Vec<Incident>,
        hand_off: &mut mpsc::Receiver<WorkerHandle>,
    ) {
        debug!("开始下发批次, 事件数: {}", batch.len());
        let mut tasks = Vec::with_capacity(batch.len());
        let mut incidents = batch.into_iter();

        while let Some(incident) = incidents.next() {
            let worker = tokio::select! {
                biased;
                worker = hand_off.recv() => worker,
                _ = self.stopped() => None,
            };
            let Some(worker) = worker else {
                let unassigned = 1 + incidents.by_ref().count();
                warn!("调度器已停止，{} 个事件未能分配Worker", unassigned);
                break;
            };

            let this = Arc::clone(self);
            tasks.push(tokio::spawn(async move {
                this.process_incident(incident, worker).await
            }));
        }

        for result in join_all(tasks).await {
            if let Err(e) = result {
                if e.is_panic() {
                    std::panic::resume_unwind(e.into_panic());
                }
                error!("事件处理任务被取消: {}", e);
            }
        }
    }

    async fn process_incident(&self, incident: Incident, worker: WorkerHandle) {
        self.metrics.incident_assigned(&incident, &worker.info).await;
        debug!("事件 {} 分配给 {}", incident, worker.info);

        let invoke_timeout = self.config.invoke_timeout;
        let outcome =
            match tokio::time::timeout(invoke_timeout, worker.invoker.invoke(&incident)).await {
                Ok(result) => result,
                Err(_) => Err(QueueError::InvocationTimeout {
                    timeout_ms: u64::try_from(invoke_timeout.as_millis()).unwrap_or(u64::MAX),
                }),
            };
        self.metrics.incident_processed(&incident, &worker.info).await;

        if let Err(e) = &outcome {
            warn!("{} 处理事件 {} 失败: {}", worker.info, incident, e);
        }
        self.completions.resolve(incident.key(), outcome).await;

        if let Err(e) = self.buffer.remove(&incident).await {
            self.fail(format!("已下发的事件 {incident} 不在缓冲区中: {e}"))
                .await;
        }
        self.directory.mark_free(worker.id()).await;
    }

    /// 内部状态不一致，停止调度器后panic
    ///
    /// 进入 `Stopped` 后不再接收提交，所有等待中的提交者以 `Internal` 结束。
    async fn fail(&self, reason: String) {
        error!("调度器内部状态不一致，立即停止: {}", reason);
        self.state.send_replace(DispatcherState::Stopped);
        let abandoned = self
            .completions
            .close(QueueError::Internal(reason.clone()))
            .await;
        if abandoned > 0 {
            error!("{} 个未完成的事件以内部错误结束", abandoned);
        }
        panic!("dispatcher invariant violated: {reason}");
    }
}

#[async_trait]
impl IncidentSubmitter for DispatchOrchestrator {
    async fn submit(&self, incident: Incident) -> QueueResult<()> {
        DispatchOrchestrator::submit(self, incident).await
    }
}
