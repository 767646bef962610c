//! Dispatcher metrics and statistics
//!
//! [`DispatcherMetrics`] observes incident lifecycle transitions. Every
//! transition increments a `metrics` counter (exported through Prometheus
//! when a recorder is installed) and updates an in-memory record used to
//! build the per-priority and per-worker statistics report logged on stop.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, gauge, histogram};
use tokio::sync::Mutex;
use tracing::info;

use queuing_core::{Incident, MetricsSink, Priority, WorkerInfo};

use super::structured_logger::StructuredLogger;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IncidentStatus {
    InBuffer,
    InProcessing,
    Processed,
    Rejected,
}

#[derive(Debug, Clone)]
struct IncidentRecord {
    status: IncidentStatus,
    received: DateTime<Utc>,
    worker_id: Option<u64>,
    started: Option<DateTime<Utc>>,
    finished: Option<DateTime<Utc>>,
}

impl IncidentRecord {
    fn new(received: DateTime<Utc>) -> Self {
        Self {
            status: IncidentStatus::InBuffer,
            received,
            worker_id: None,
            started: None,
            finished: None,
        }
    }
}

/// Per-priority statistics
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityStats {
    pub priority: Priority,
    pub total: usize,
    pub rejected: usize,
    pub rejection_probability: f64,
    pub mean_time_in_buffer: Duration,
    pub mean_time_in_processing: Duration,
    pub mean_time_in_system: Duration,
}

/// Per-worker statistics
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerStats {
    pub id: u64,
    pub registered_at: DateTime<Utc>,
    pub uptime: Duration,
    pub busy: Duration,
    pub utilization: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatisticsReport {
    pub generated_at: DateTime<Utc>,
    pub priorities: Vec<PriorityStats>,
    pub workers: Vec<WorkerStats>,
}

fn elapsed(from: DateTime<Utc>, to: DateTime<Utc>) -> Duration {
    (to - from).to_std().unwrap_or_default()
}

fn mean(total: Duration, count: usize) -> Duration {
    if count == 0 {
        Duration::ZERO
    } else {
        total / count as u32
    }
}

/// 统计聚合器，实现调度核心的 [`MetricsSink`]
#[derive(Debug, Default)]
pub struct DispatcherMetrics {
    incidents: Mutex<BTreeMap<Priority, HashMap<u64, IncidentRecord>>>,
    workers: Mutex<BTreeMap<u64, DateTime<Utc>>>,
}

impl DispatcherMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 事件进入系统的时间取其创建时间
    pub async fn record_received(&self, incident: &Incident) {
        counter!("queuing_incidents_received_total", "priority" => incident.priority.to_string())
            .increment(1);

        let mut incidents = self.incidents.lock().await;
        incidents
            .entry(incident.priority)
            .or_default()
            .insert(incident.id, IncidentRecord::new(incident.creation_time));
    }

    pub async fn record_assigned_at(
        &self,
        incident: &Incident,
        worker: &WorkerInfo,
        now: DateTime<Utc>,
    ) {
        counter!("queuing_incidents_assigned_total", "priority" => incident.priority.to_string())
            .increment(1);

        let mut incidents = self.incidents.lock().await;
        let record = incidents
            .entry(incident.priority)
            .or_default()
            .entry(incident.id)
            .or_insert_with(|| IncidentRecord::new(incident.creation_time));
        record.status = IncidentStatus::InProcessing;
        record.worker_id = Some(worker.id);
        record.started = Some(now);

        histogram!("queuing_incident_buffer_seconds", "priority" => incident.priority.to_string())
            .record(elapsed(record.received, now).as_secs_f64());
    }

    pub async fn record_processed_at(
        &self,
        incident: &Incident,
        worker: &WorkerInfo,
        now: DateTime<Utc>,
    ) {
        counter!("queuing_incidents_processed_total", "priority" => incident.priority.to_string())
            .increment(1);

        let mut incidents = self.incidents.lock().await;
        let record = incidents
            .entry(incident.priority)
            .or_default()
            .entry(incident.id)
            .or_insert_with(|| IncidentRecord::new(incident.creation_time));
        record.status = IncidentStatus::Processed;
        record.finished = Some(now);

        let started = record.started.unwrap_or(now);
        let processing = elapsed(started, now);
        histogram!(
            "queuing_incident_processing_seconds",
            "priority" => incident.priority.to_string()
        )
        .record(processing.as_secs_f64());
        StructuredLogger::log_incident_processed(incident, worker, processing);
    }

    pub async fn record_rejected(&self, incident: &Incident) {
        counter!("queuing_incidents_rejected_total", "priority" => incident.priority.to_string())
            .increment(1);

        let mut incidents = self.incidents.lock().await;
        incidents
            .entry(incident.priority)
            .or_default()
            .entry(incident.id)
            .or_insert_with(|| IncidentRecord::new(incident.creation_time))
            .status = IncidentStatus::Rejected;
    }

    pub async fn record_worker_registered_at(&self, worker: &WorkerInfo, now: DateTime<Utc>) {
        let mut workers = self.workers.lock().await;
        workers.insert(worker.id, now);
        gauge!("queuing_registered_workers").set(workers.len() as f64);
    }

    /// 生成统计报告；在途事件既不算处理成功也不算拒绝
    pub async fn report_at(&self, now: DateTime<Utc>) -> StatisticsReport {
        let incidents = self.incidents.lock().await;
        let workers = self.workers.lock().await;

        let mut busy: HashMap<u64, Duration> = HashMap::new();
        let mut priorities = Vec::with_capacity(incidents.len());

        for (priority, records) in incidents.iter() {
            let mut total = 0usize;
            let mut rejected = 0usize;
            let mut processed = 0usize;
            let mut in_buffer = Duration::ZERO;
            let mut in_processing = Duration::ZERO;

            for record in records.values() {
                match record.status {
                    IncidentStatus::InBuffer | IncidentStatus::InProcessing => continue,
                    IncidentStatus::Rejected => {
                        total += 1;
                        rejected += 1;
                    }
                    IncidentStatus::Processed => {
                        total += 1;
                        processed += 1;
                        let started = record.started.unwrap_or(record.received);
                        let finished = record.finished.unwrap_or(started);
                        let processing = elapsed(started, finished);
                        in_buffer += elapsed(record.received, started);
                        in_processing += processing;
                        if let Some(worker_id) = record.worker_id {
                            *busy.entry(worker_id).or_default() += processing;
                        }
                    }
                }
            }

            if total == 0 {
                continue;
            }
            let mean_time_in_buffer = mean(in_buffer, processed);
            let mean_time_in_processing = mean(in_processing, processed);
            priorities.push(PriorityStats {
                priority: *priority,
                total,
                rejected,
                rejection_probability: rejected as f64 / total as f64,
                mean_time_in_buffer,
                mean_time_in_processing,
                mean_time_in_system: mean_time_in_buffer + mean_time_in_processing,
            });
        }

        let workers = workers
            .iter()
            .map(|(id, registered_at)| {
                let uptime = elapsed(*registered_at, now);
                let busy = busy.get(id).copied().unwrap_or_default();
                let utilization = if uptime.is_zero() {
                    0.0
                } else {
                    busy.as_secs_f64() / uptime.as_secs_f64()
                };
                WorkerStats {
                    id: *id,
                    registered_at: *registered_at,
                    uptime,
                    busy,
                    utilization,
                }
            })
            .collect();

        StatisticsReport {
            generated_at: now,
            priorities,
            workers,
        }
    }

    pub async fn report(&self) -> StatisticsReport {
        self.report_at(Utc::now()).await
    }

    /// 输出统计报告
    pub async fn log_statistics(&self) {
        let report = self.report().await;
        info!("=== Statistics ===");
        for stats in &report.priorities {
            StructuredLogger::log_priority_statistics(stats);
        }
        for stats in &report.workers {
            StructuredLogger::log_worker_statistics(stats);
        }
    }
}

#[async_trait]
impl MetricsSink for DispatcherMetrics {
    async fn incident_received(&self, incident: &Incident) {
        StructuredLogger::log_incident_received(incident);
        self.record_received(incident).await;
    }

    async fn incident_assigned(&self, incident: &Incident, worker: &WorkerInfo) {
        StructuredLogger::log_incident_assigned(incident, worker);
        self.record_assigned_at(incident, worker, Utc::now()).await;
    }

    async fn incident_processed(&self, incident: &Incident, worker: &WorkerInfo) {
        self.record_processed_at(incident, worker, Utc::now()).await;
    }

    async fn incident_rejected(&self, incident: &Incident) {
        StructuredLogger::log_incident_rejected(incident);
        self.record_rejected(incident).await;
    }

    async fn worker_registered(&self, worker: &WorkerInfo) {
        StructuredLogger::log_worker_registered(worker);
        self.record_worker_registered_at(worker, Utc::now()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + chrono::Duration::seconds(secs)
    }

    fn worker(id: u64) -> WorkerInfo {
        WorkerInfo {
            id,
            address: format!("127.0.0.1:{}", 9000 + id),
        }
    }

    #[tokio::test]
    async fn test_priority_statistics() {
        let metrics = DispatcherMetrics::new();
        let w = worker(1);

        // 优先级1：两个处理成功，一个被拒绝
        let a = Incident::new(1, at(0), 1);
        let b = Incident::new(2, at(0), 1);
        let c = Incident::new(3, at(0), 1);
        for incident in [&a, &b, &c] {
            metrics.record_received(incident).await;
        }
        metrics.record_assigned_at(&a, &w, at(2)).await;
        metrics.record_processed_at(&a, &w, at(6)).await;
        metrics.record_assigned_at(&b, &w, at(4)).await;
        metrics.record_processed_at(&b, &w, at(6)).await;
        metrics.record_rejected(&c).await;

        let report = metrics.report_at(at(10)).await;
        assert_eq!(report.priorities.len(), 1);

        let stats = &report.priorities[0];
        assert_eq!(stats.priority, 1);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.rejected, 1);
        assert!((stats.rejection_probability - 1.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(stats.mean_time_in_buffer, Duration::from_secs(3));
        assert_eq!(stats.mean_time_in_processing, Duration::from_secs(3));
        assert_eq!(stats.mean_time_in_system, Duration::from_secs(6));
    }

    #[tokio::test]
    async fn test_failed_invocation_counts_as_rejected() {
        let metrics = DispatcherMetrics::new();
        let w = worker(1);
        let incident = Incident::new(1, at(0), 2);

        metrics.record_received(&incident).await;
        metrics.record_assigned_at(&incident, &w, at(1)).await;
        metrics.record_processed_at(&incident, &w, at(2)).await;
        metrics.record_rejected(&incident).await;

        let report = metrics.report_at(at(3)).await;
        let stats = &report.priorities[0];
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.mean_time_in_processing, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_in_flight_incidents_are_excluded() {
        let metrics = DispatcherMetrics::new();
        metrics.record_received(&Incident::new(1, at(0), 5)).await;

        let report = metrics.report_at(at(1)).await;
        assert!(report.priorities.is_empty());
    }

    #[tokio::test]
    async fn test_worker_utilization() {
        let metrics = DispatcherMetrics::new();
        let busy_worker = worker(1);
        let idle_worker = worker(2);
        metrics.record_worker_registered_at(&busy_worker, at(0)).await;
        metrics.record_worker_registered_at(&idle_worker, at(0)).await;

        let incident = Incident::new(1, at(0), 1);
        metrics.record_received(&incident).await;
        metrics.record_assigned_at(&incident, &busy_worker, at(0)).await;
        metrics.record_processed_at(&incident, &busy_worker, at(5)).await;

        let report = metrics.report_at(at(10)).await;
        assert_eq!(report.workers.len(), 2);

        let busy = &report.workers[0];
        assert_eq!(busy.id, 1);
        assert_eq!(busy.uptime, Duration::from_secs(10));
        assert_eq!(busy.busy, Duration::from_secs(5));
        assert!((busy.utilization - 0.5).abs() < f64::EPSILON);

        let idle = &report.workers[1];
        assert_eq!(idle.busy, Duration::ZERO);
        assert_eq!(idle.utilization, 0.0);
    }

    #[tokio::test]
    async fn test_sink_records_through_trait() {
        let metrics = DispatcherMetrics::new();
        let sink: &dyn MetricsSink = &metrics;
        let incident = Incident::new(9, Utc::now(), 3);

        sink.incident_received(&incident).await;
        sink.incident_rejected(&incident).await;
        sink.worker_registered(&worker(4)).await;

        let report = metrics.report().await;
        assert_eq!(report.priorities[0].rejected, 1);
        assert_eq!(report.workers[0].id, 4);
    }
}
