//! 调度核心与外部协作者之间的接口定义
//!
//! 调度核心只依赖这些抽象：
//! - [`IncidentInvoker`]：向远程Worker发送单个事件并获取处理结果
//! - [`WorkerConnector`]：根据注册地址建立到Worker的调用能力
//! - [`IncidentSubmitter`] / [`WorkerRegistrar`]：Dispatcher对外暴露的RPC能力
//! - [`IncidentProcessor`]：Worker进程内实际处理事件的用例
//!
//! 具体的HTTP实现位于 `queuing-infrastructure`，路由位于 `queuing-api`。

use std::sync::Arc;

use async_trait::async_trait;

use crate::models::{Incident, WorkerInfo};
use crate::QueueResult;

/// 远程Worker调用能力
#[async_trait]
pub trait IncidentInvoker: Send + Sync {
    /// 发送事件到Worker，传输错误或 `success=false` 均返回错误
    async fn invoke(&self, incident: &Incident) -> QueueResult<()>;
}

/// 为新注册的Worker创建调用能力
#[async_trait]
pub trait WorkerConnector: Send + Sync {
    async fn connect(&self, worker: &WorkerInfo) -> QueueResult<Arc<dyn IncidentInvoker>>;
}

/// 事件提交入口，调用方阻塞直到事件被处理、驱逐或拒绝
#[async_trait]
pub trait IncidentSubmitter: Send + Sync {
    async fn submit(&self, incident: Incident) -> QueueResult<()>;
}

/// Worker注册入口
#[async_trait]
pub trait WorkerRegistrar: Send + Sync {
    async fn register(&self, worker: WorkerInfo) -> QueueResult<()>;
}

/// Worker侧的事件处理用例
#[async_trait]
pub trait IncidentProcessor: Send + Sync {
    async fn process(&self, incident: Incident) -> QueueResult<()>;
}
