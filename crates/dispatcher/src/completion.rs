//! 完成槽表：把调度结果交还给阻塞中的提交者
//!
//! 每个 `(id, priority)` 最多一个存活槽，槽只会被填充一次。
//! 表处于打开状态时填充不存在的槽属于内部不变量被破坏，直接panic。

use std::collections::HashMap;

use tokio::sync::{oneshot, Mutex, Notify};
use tracing::{debug, error};

use queuing_core::{IncidentKey, QueueError, QueueResult};

pub type Outcome = QueueResult<()>;

#[derive(Debug, Default)]
struct Slots {
    pending: HashMap<IncidentKey, oneshot::Sender<Outcome>>,
    closed: bool,
}

#[derive(Debug, Default)]
pub struct CompletionTable {
    slots: Mutex<Slots>,
    emptied: Notify,
}

impl CompletionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为事件创建完成槽
    pub async fn open(&self, key: IncidentKey) -> QueueResult<oneshot::Receiver<Outcome>> {
        let mut slots = self.slots.lock().await;
        if slots.closed {
            return Err(QueueError::ServiceUnavailable);
        }
        if slots.pending.contains_key(&key) {
            return Err(QueueError::DuplicateIncident {
                id: key.id,
                priority: key.priority,
            });
        }

        let (tx, rx) = oneshot::channel();
        slots.pending.insert(key, tx);
        Ok(rx)
    }

    /// 填充完成槽
    pub async fn resolve(&self, key: IncidentKey, outcome: Outcome) {
        let mut slots = self.slots.lock().await;
        let Some(tx) = slots.pending.remove(&key) else {
            if slots.closed {
                debug!("完成槽表已关闭，忽略事件结果: id={}, priority={}", key.id, key.priority);
                return;
            }
            error!("完成槽不存在: id={}, priority={}", key.id, key.priority);
            panic!(
                "completion slot missing for incident id={} priority={}",
                key.id, key.priority
            );
        };
        let emptied = slots.pending.is_empty();
        drop(slots);

        if tx.send(outcome).is_err() {
            debug!("提交者已离开: id={}, priority={}", key.id, key.priority);
        }
        if emptied {
            self.emptied.notify_waiters();
        }
    }

    pub async fn len(&self) -> usize {
        self.slots.lock().await.pending.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// 等待所有完成槽被填充
    pub async fn wait_until_empty(&self) {
        loop {
            let notified = self.emptied.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_empty().await {
                return;
            }
            notified.await;
        }
    }

    /// 关闭表并以同一个错误填充所有剩余的槽，返回被填充的数量
    pub async fn close(&self, reason: QueueError) -> usize {
        let mut slots = self.slots.lock().await;
        slots.closed = true;
        let remaining: Vec<_> = slots.pending.drain().collect();
        drop(slots);

        let count = remaining.len();
        for (_, tx) in remaining {
            let _ = tx.send(Err(reason.clone()));
        }
        self.emptied.notify_waiters();
        count
    }
}
