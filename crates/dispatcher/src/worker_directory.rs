use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::{Notify, RwLock};
use tracing::debug;

use queuing_core::{IncidentInvoker, QueueError, QueueResult, WorkerInfo};

/// 已注册Worker及其调用能力
#[derive(Clone)]
pub struct WorkerHandle {
    pub info: WorkerInfo,
    pub invoker: Arc<dyn IncidentInvoker>,
}

impl WorkerHandle {
    pub fn new(info: WorkerInfo, invoker: Arc<dyn IncidentInvoker>) -> Self {
        Self { info, invoker }
    }

    pub fn id(&self) -> u64 {
        self.info.id
    }
}

impl fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

/// Worker目录
///
/// 注册表只追加不删除；忙闲状态单独加锁，扫描与状态切换互不阻塞注册。
#[derive(Debug, Default)]
pub struct WorkerDirectory {
    workers: RwLock<Vec<WorkerHandle>>,
    busy: RwLock<HashMap<u64, bool>>,
    /// 有Worker注册或被释放
    changed: Notify,
}

impl WorkerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加Worker，相同id重复注册会被拒绝
    pub async fn add(&self, handle: WorkerHandle) -> QueueResult<()> {
        let mut workers = self.workers.write().await;
        if workers.iter().any(|w| w.id() == handle.id()) {
            return Err(QueueError::WorkerAlreadyRegistered { id: handle.id() });
        }
        debug!("Worker加入目录: {}", handle.info);
        workers.push(handle);
        drop(workers);

        self.changed.notify_one();
        Ok(())
    }

    /// 注册表副本，调用方可以在不持有锁的情况下遍历
    pub async fn snapshot(&self) -> Vec<WorkerHandle> {
        self.workers.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.workers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.workers.read().await.is_empty()
    }

    /// 首次查询的Worker视为空闲
    pub async fn is_busy(&self, id: u64) -> bool {
        self.busy.read().await.get(&id).copied().unwrap_or(false)
    }

    pub async fn mark_busy(&self, id: u64) {
        self.busy.write().await.insert(id, true);
    }

    pub async fn mark_free(&self, id: u64) {
        self.busy.write().await.insert(id, false);
        self.changed.notify_one();
    }

    /// 等待下一次注册或释放
    pub async fn wait_for_change(&self) {
        self.changed.notified().await;
    }
}
