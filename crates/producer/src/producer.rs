use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use queuing_core::{Incident, IncidentSubmitter, Priority, QueueResult};

use crate::runner::ScheduledTask;

/// 以固定优先级生成事件，事件ID从1开始递增
pub struct IncidentProducer {
    submitter: Arc<dyn IncidentSubmitter>,
    priority: Priority,
    counter: AtomicU64,
}

impl IncidentProducer {
    pub fn new(submitter: Arc<dyn IncidentSubmitter>, priority: Priority) -> Self {
        Self {
            submitter,
            priority,
            counter: AtomicU64::new(0),
        }
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn produced(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    /// 生成下一个事件并提交，等待Dispatcher给出最终结果
    pub async fn produce(&self) -> QueueResult<Incident> {
        let id = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let incident = Incident::new(id, Utc::now(), self.priority);

        self.submitter.submit(incident.clone()).await?;
        debug!("新事件已生成并处理: {}", incident);
        Ok(incident)
    }
}

#[async_trait]
impl ScheduledTask for IncidentProducer {
    async fn execute(&self) -> QueueResult<()> {
        self.produce().await.map(|_| ())
    }
}
