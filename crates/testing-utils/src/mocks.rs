//! Mock implementations for the dispatch seams
//!
//! In-memory test doubles that record every call so tests can assert on
//! ordering and concurrency without a network.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use queuing_core::{
    Incident, IncidentInvoker, IncidentKey, IncidentProcessor, IncidentSubmitter, MetricsSink,
    QueueError, QueueResult, WorkerConnector, WorkerInfo, WorkerRegistrar,
};

#[derive(Debug, Default)]
struct InvokerState {
    delay: Mutex<Duration>,
    failure: Mutex<Option<QueueError>>,
    hang: AtomicBool,
    invocations: Mutex<Vec<Incident>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

/// Mock remote worker
#[derive(Debug, Clone, Default)]
pub struct MockInvoker {
    state: Arc<InvokerState>,
}

struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.state.delay.lock().unwrap() = delay;
        self
    }

    pub fn failing(self, error: QueueError) -> Self {
        *self.state.failure.lock().unwrap() = Some(error);
        self
    }

    /// 调用永远不会返回
    pub fn hanging(self) -> Self {
        self.state.hang.store(true, Ordering::SeqCst);
        self
    }

    pub fn invocations(&self) -> Vec<Incident> {
        self.state.invocations.lock().unwrap().clone()
    }

    pub fn invocation_count(&self) -> usize {
        self.state.invocations.lock().unwrap().len()
    }

    pub fn in_flight(&self) -> usize {
        self.state.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    /// 轮询等待调用次数达到 `count`
    pub async fn wait_for_invocations(&self, count: usize) {
        while self.invocation_count() < count {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }
}

#[async_trait]
impl IncidentInvoker for MockInvoker {
    async fn invoke(&self, incident: &Incident) -> QueueResult<()> {
        self.state.invocations.lock().unwrap().push(incident.clone());
        let current = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlightGuard(&self.state.in_flight);
        self.state.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if self.state.hang.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let delay = *self.state.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match self.state.failure.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Mock connector handing out one shared invoker
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    invoker: MockInvoker,
    connected: Arc<Mutex<Vec<WorkerInfo>>>,
    failure: Arc<Mutex<Option<QueueError>>>,
}

impl MockConnector {
    pub fn new(invoker: MockInvoker) -> Self {
        Self {
            invoker,
            ..Self::default()
        }
    }

    pub fn failing(self, error: QueueError) -> Self {
        *self.failure.lock().unwrap() = Some(error);
        self
    }

    pub fn connected(&self) -> Vec<WorkerInfo> {
        self.connected.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkerConnector for MockConnector {
    async fn connect(&self, worker: &WorkerInfo) -> QueueResult<Arc<dyn IncidentInvoker>> {
        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }
        self.connected.lock().unwrap().push(worker.clone());
        Ok(Arc::new(self.invoker.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsEvent {
    Received(IncidentKey),
    Assigned(IncidentKey, u64),
    Processed(IncidentKey, u64),
    Rejected(IncidentKey),
    Registered(u64),
}

/// Metrics sink that records every lifecycle notification
#[derive(Debug, Clone, Default)]
pub struct RecordingMetricsSink {
    events: Arc<Mutex<Vec<MetricsEvent>>>,
}

impl RecordingMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MetricsEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&MetricsEvent) -> bool,
    {
        self.events.lock().unwrap().iter().filter(|e| predicate(e)).count()
    }

    pub fn rejected(&self) -> Vec<IncidentKey> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                MetricsEvent::Rejected(key) => Some(*key),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: MetricsEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl MetricsSink for RecordingMetricsSink {
    async fn incident_received(&self, incident: &Incident) {
        self.record(MetricsEvent::Received(incident.key()));
    }

    async fn incident_assigned(&self, incident: &Incident, worker: &WorkerInfo) {
        self.record(MetricsEvent::Assigned(incident.key(), worker.id));
    }

    async fn incident_processed(&self, incident: &Incident, worker: &WorkerInfo) {
        self.record(MetricsEvent::Processed(incident.key(), worker.id));
    }

    async fn incident_rejected(&self, incident: &Incident) {
        self.record(MetricsEvent::Rejected(incident.key()));
    }

    async fn worker_registered(&self, worker: &WorkerInfo) {
        self.record(MetricsEvent::Registered(worker.id));
    }
}

/// Mock dispatcher submission endpoint
#[derive(Debug, Clone)]
pub struct MockSubmitter {
    outcome: Arc<Mutex<QueueResult<()>>>,
    submitted: Arc<Mutex<Vec<Incident>>>,
}

impl MockSubmitter {
    pub fn new() -> Self {
        Self::with_outcome(Ok(()))
    }

    pub fn with_outcome(outcome: QueueResult<()>) -> Self {
        Self {
            outcome: Arc::new(Mutex::new(outcome)),
            submitted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn submitted(&self) -> Vec<Incident> {
        self.submitted.lock().unwrap().clone()
    }
}

impl Default for MockSubmitter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IncidentSubmitter for MockSubmitter {
    async fn submit(&self, incident: Incident) -> QueueResult<()> {
        self.submitted.lock().unwrap().push(incident);
        self.outcome.lock().unwrap().clone()
    }
}

/// Mock registration endpoint; fails the first `failures` attempts
#[derive(Debug, Clone, Default)]
pub struct MockRegistrar {
    failures: Arc<AtomicUsize>,
    attempts: Arc<Mutex<Vec<WorkerInfo>>>,
}

impl MockRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_times(failures: usize) -> Self {
        Self {
            failures: Arc::new(AtomicUsize::new(failures)),
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> Vec<WorkerInfo> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkerRegistrar for MockRegistrar {
    async fn register(&self, worker: WorkerInfo) -> QueueResult<()> {
        self.attempts.lock().unwrap().push(worker);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(QueueError::Network("connection refused".to_string()));
        }
        Ok(())
    }
}

/// Mock worker-side processing use case
#[derive(Debug, Clone)]
pub struct MockProcessor {
    outcome: Arc<Mutex<QueueResult<()>>>,
    processed: Arc<Mutex<Vec<Incident>>>,
}

impl MockProcessor {
    pub fn new() -> Self {
        Self::with_outcome(Ok(()))
    }

    pub fn with_outcome(outcome: QueueResult<()>) -> Self {
        Self {
            outcome: Arc::new(Mutex::new(outcome)),
            processed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn processed(&self) -> Vec<Incident> {
        self.processed.lock().unwrap().clone()
    }
}

impl Default for MockProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IncidentProcessor for MockProcessor {
    async fn process(&self, incident: Incident) -> QueueResult<()> {
        self.processed.lock().unwrap().push(incident);
        self.outcome.lock().unwrap().clone()
    }
}
