//! Structured logging utilities
//!
//! Event-style helpers so that incident lifecycle records share the same
//! field names across the dispatcher and worker processes.

use std::time::Duration;

use tracing::{debug, info, warn};

use queuing_core::{Incident, WorkerInfo};

use super::metrics_collector::{PriorityStats, WorkerStats};

/// Structured logging utilities
pub struct StructuredLogger;

impl StructuredLogger {
    /// Log incident arrival at the dispatcher
    pub fn log_incident_received(incident: &Incident) {
        debug!(
            event = "incident_received",
            incident.id = incident.id,
            incident.priority = incident.priority,
            incident.created_at = %incident.creation_time,
            "Incident received"
        );
    }

    /// Log incident assignment to a worker
    pub fn log_incident_assigned(incident: &Incident, worker: &WorkerInfo) {
        debug!(
            event = "incident_assigned",
            incident.id = incident.id,
            incident.priority = incident.priority,
            worker.id = worker.id,
            worker.address = %worker.address,
            "Incident assigned to worker"
        );
    }

    pub fn log_incident_processed(incident: &Incident, worker: &WorkerInfo, duration: Duration) {
        debug!(
            event = "incident_processed",
            incident.id = incident.id,
            incident.priority = incident.priority,
            worker.id = worker.id,
            duration_ms = duration.as_millis() as u64,
            "Incident processing finished"
        );
    }

    pub fn log_incident_rejected(incident: &Incident) {
        debug!(
            event = "incident_rejected",
            incident.id = incident.id,
            incident.priority = incident.priority,
            "Incident rejected"
        );
    }

    pub fn log_worker_registered(worker: &WorkerInfo) {
        info!(
            event = "worker_registered",
            worker.id = worker.id,
            worker.address = %worker.address,
            "Worker registered"
        );
    }

    /// Log the start of simulated processing on a worker
    pub fn log_processing_started(incident: &Incident, interval: Duration) {
        info!(
            event = "processing_started",
            incident.id = incident.id,
            incident.priority = incident.priority,
            interval_ms = interval.as_millis() as u64,
            "New incident received, start processing"
        );
    }

    pub fn log_processing_finished(incident: &Incident) {
        info!(
            event = "processing_finished",
            incident.id = incident.id,
            incident.priority = incident.priority,
            "Incident processed"
        );
    }

    pub fn log_processing_aborted(incident: &Incident) {
        warn!(
            event = "processing_aborted",
            incident.id = incident.id,
            incident.priority = incident.priority,
            "Incident processing aborted by shutdown"
        );
    }

    /// Log per-priority statistics row
    pub fn log_priority_statistics(stats: &PriorityStats) {
        info!(
            event = "priority_statistics",
            priority = stats.priority,
            total = stats.total,
            rejected = stats.rejected,
            rejection_probability = stats.rejection_probability,
            time_in_buffer_ms = stats.mean_time_in_buffer.as_millis() as u64,
            time_in_processing_ms = stats.mean_time_in_processing.as_millis() as u64,
            time_in_system_ms = stats.mean_time_in_system.as_millis() as u64,
            "Producer statistics"
        );
    }

    /// Log per-worker statistics row
    pub fn log_worker_statistics(stats: &WorkerStats) {
        info!(
            event = "worker_statistics",
            worker.id = stats.id,
            registered_at = %stats.registered_at,
            uptime_ms = stats.uptime.as_millis() as u64,
            busy_ms = stats.busy.as_millis() as u64,
            utilization = stats.utilization,
            "Worker statistics"
        );
    }
}
