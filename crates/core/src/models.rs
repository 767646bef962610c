use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 事件优先级，数值越大越紧急
pub type Priority = u64;

/// 事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    pub id: u64,
    pub creation_time: DateTime<Utc>,
    pub priority: Priority,
}

impl Incident {
    pub fn new(id: u64, creation_time: DateTime<Utc>, priority: Priority) -> Self {
        Self {
            id,
            creation_time,
            priority,
        }
    }

    pub fn key(&self) -> IncidentKey {
        IncidentKey {
            id: self.id,
            priority: self.priority,
        }
    }
}

impl fmt::Display for Incident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Incident{{{}, {}, {}}}",
            self.id,
            self.creation_time.to_rfc3339(),
            self.priority
        )
    }
}

/// 事件标识：同一优先级内id唯一
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IncidentKey {
    pub id: u64,
    pub priority: Priority,
}

/// 已注册的Worker节点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerInfo {
    pub id: u64,
    pub address: String,
}

impl fmt::Display for WorkerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Worker{{{}, {}}}", self.id, self.address)
    }
}

/// 生产者提交事件的请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitIncidentRequest {
    pub id: u64,
    pub creation_time: DateTime<Utc>,
    pub priority: u64,
}

impl From<SubmitIncidentRequest> for Incident {
    fn from(req: SubmitIncidentRequest) -> Self {
        Incident::new(req.id, req.creation_time, req.priority)
    }
}

impl From<&Incident> for SubmitIncidentRequest {
    fn from(incident: &Incident) -> Self {
        Self {
            id: incident.id,
            creation_time: incident.creation_time,
            priority: incident.priority,
        }
    }
}

/// Dispatcher下发给Worker的处理请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeIncidentRequest {
    pub id: u64,
    pub creation_time: DateTime<Utc>,
    pub priority: u64,
}

impl From<InvokeIncidentRequest> for Incident {
    fn from(req: InvokeIncidentRequest) -> Self {
        Incident::new(req.id, req.creation_time, req.priority)
    }
}

impl From<&Incident> for InvokeIncidentRequest {
    fn from(incident: &Incident) -> Self {
        Self {
            id: incident.id,
            creation_time: incident.creation_time,
            priority: incident.priority,
        }
    }
}

/// Worker注册请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterWorkerRequest {
    pub id: u64,
    pub address: String,
}

/// 所有RPC接口的统一响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

impl RpcResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: String::new(),
        }
    }

    pub fn failed<S: Into<String>>(message: S) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_incident_key_and_display() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let incident = Incident::new(42, created, 3);

        assert_eq!(incident.key(), IncidentKey { id: 42, priority: 3 });
        assert_eq!(
            incident.to_string(),
            "Incident{42, 2024-05-01T12:00:00+00:00, 3}"
        );
    }

    #[test]
    fn test_submit_request_wire_format() {
        let json = r#"{"id":7,"creation_time":"2024-05-01T12:00:00Z","priority":2}"#;
        let req: SubmitIncidentRequest = serde_json::from_str(json).unwrap();
        let incident: Incident = req.into();

        assert_eq!(incident.id, 7);
        assert_eq!(incident.priority, 2);
    }

    #[test]
    fn test_rpc_response_message_defaults_to_empty() {
        let resp: RpcResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert_eq!(resp, RpcResponse::ok());

        let failed = RpcResponse::failed("服务当前不可用");
        assert!(!failed.success);
        assert_eq!(failed.message, "服务当前不可用");
    }
}
