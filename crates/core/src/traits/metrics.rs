use async_trait::async_trait;

use crate::models::{Incident, WorkerInfo};

/// 生命周期事件观察者
///
/// 调度核心在每次状态转换时通知该接口，实现方只做统计，不能影响调度结果。
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn incident_received(&self, incident: &Incident);

    async fn incident_assigned(&self, incident: &Incident, worker: &WorkerInfo);

    async fn incident_processed(&self, incident: &Incident, worker: &WorkerInfo);

    /// 事件最终以失败结束（驱逐、拒绝或远程处理失败）
    async fn incident_rejected(&self, incident: &Incident);

    async fn worker_registered(&self, worker: &WorkerInfo);
}
