use thiserror::Error;

use crate::models::Priority;

/// 排队系统错误类型定义
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("缓冲区已满")]
    BufferFull,

    #[error("优先级 {priority} 没有可驱逐的事件")]
    NothingToEvict { priority: Priority },

    #[error("缓冲区中未找到事件: id={id}, priority={priority}")]
    ElementNotFound { id: u64, priority: Priority },

    #[error("事件被其他事件驱逐: id={id}, priority={priority}")]
    Evicted { id: u64, priority: Priority },

    #[error("服务当前不可用")]
    ServiceUnavailable,

    #[error("事件已在处理中: id={id}, priority={priority}")]
    DuplicateIncident { id: u64, priority: Priority },

    #[error("Worker已注册: id={id}")]
    WorkerAlreadyRegistered { id: u64 },

    #[error("远程处理失败: {0}")]
    RemoteInvocation(String),

    #[error("远程调用超时: {timeout_ms}ms")]
    InvocationTimeout { timeout_ms: u64 },

    #[error("网络错误: {0}")]
    Network(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

impl QueueError {
    pub fn evicted(id: u64, priority: Priority) -> Self {
        Self::Evicted { id, priority }
    }
    pub fn not_found(id: u64, priority: Priority) -> Self {
        Self::ElementNotFound { id, priority }
    }
    pub fn remote<S: Into<String>>(msg: S) -> Self {
        Self::RemoteInvocation(msg.into())
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// 调用方可见的失败：这些错误会跨越提交边界返回给生产者
    pub fn is_caller_visible(&self) -> bool {
        matches!(
            self,
            QueueError::Evicted { .. }
                | QueueError::ServiceUnavailable
                | QueueError::DuplicateIncident { .. }
                | QueueError::RemoteInvocation(_)
                | QueueError::InvocationTimeout { .. }
                | QueueError::Network(_)
        )
    }

    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            QueueError::Internal(_) | QueueError::Configuration(_)
        )
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            QueueError::Network(_) | QueueError::InvocationTimeout { .. } | QueueError::ServiceUnavailable
        )
    }
}

impl From<serde_json::Error> for QueueError {
    fn from(err: serde_json::Error) -> Self {
        QueueError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for QueueError {
    fn from(err: config::ConfigError) -> Self {
        QueueError::Configuration(err.to_string())
    }
}

impl From<anyhow::Error> for QueueError {
    fn from(err: anyhow::Error) -> Self {
        QueueError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_visible_errors() {
        assert!(QueueError::evicted(1, 2).is_caller_visible());
        assert!(QueueError::ServiceUnavailable.is_caller_visible());
        assert!(QueueError::remote("boom").is_caller_visible());
        assert!(!QueueError::BufferFull.is_caller_visible());
        assert!(!QueueError::NothingToEvict { priority: 1 }.is_caller_visible());
        assert!(!QueueError::not_found(1, 1).is_caller_visible());
    }

    #[test]
    fn test_error_display() {
        let err = QueueError::evicted(7, 3);
        assert_eq!(err.to_string(), "事件被其他事件驱逐: id=7, priority=3");

        let err = QueueError::InvocationTimeout { timeout_ms: 5000 };
        assert!(err.to_string().contains("5000"));
    }

    #[test]
    fn test_fatal_and_retryable() {
        assert!(QueueError::Internal("x".to_string()).is_fatal());
        assert!(!QueueError::ServiceUnavailable.is_fatal());
        assert!(QueueError::Network("reset".to_string()).is_retryable());
        assert!(!QueueError::evicted(1, 1).is_retryable());
    }
}
