//! Test data builders

use chrono::{DateTime, Duration, Utc};
use queuing_core::{Incident, Priority, WorkerInfo};

/// Builder for creating test incidents
pub struct IncidentBuilder {
    incident: Incident,
}

impl IncidentBuilder {
    pub fn new() -> Self {
        Self {
            incident: Incident::new(1, Utc::now(), 1),
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.incident.id = id;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.incident.priority = priority;
        self
    }

    pub fn with_creation_time(mut self, creation_time: DateTime<Utc>) -> Self {
        self.incident.creation_time = creation_time;
        self
    }

    /// 创建时间向前偏移，数值越大越"老"
    pub fn aged(mut self, seconds: i64) -> Self {
        self.incident.creation_time -= Duration::seconds(seconds);
        self
    }

    pub fn build(self) -> Incident {
        self.incident
    }
}

impl Default for IncidentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test worker descriptors
pub struct WorkerInfoBuilder {
    info: WorkerInfo,
}

impl WorkerInfoBuilder {
    pub fn new() -> Self {
        Self {
            info: WorkerInfo {
                id: 1,
                address: "127.0.0.1:9001".to_string(),
            },
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.info.id = id;
        self
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.info.address = address.to_string();
        self
    }

    pub fn build(self) -> WorkerInfo {
        self.info
    }
}

impl Default for WorkerInfoBuilder {
    fn default() -> Self {
        Self::new()
    }
}
