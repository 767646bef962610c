use std::sync::Arc;

use queuing_core::{IncidentInvoker, QueueError, WorkerRegistrar};
use queuing_dispatcher::{RegistrationService, WorkerDirectory};
use queuing_testing_utils::{
    IncidentBuilder, MetricsEvent, MockConnector, MockInvoker, RecordingMetricsSink,
    WorkerInfoBuilder,
};

fn service(connector: MockConnector) -> (RegistrationService, Arc<WorkerDirectory>, RecordingMetricsSink) {
    let directory = Arc::new(WorkerDirectory::new());
    let metrics = RecordingMetricsSink::new();
    let service = RegistrationService::new(
        directory.clone(),
        Arc::new(connector),
        Arc::new(metrics.clone()),
    );
    (service, directory, metrics)
}

#[tokio::test]
async fn test_register_adds_worker_with_invoker() {
    let invoker = MockInvoker::new();
    let connector = MockConnector::new(invoker.clone());
    let (service, directory, metrics) = service(connector.clone());

    let worker = WorkerInfoBuilder::new().with_id(3).with_address("localhost:9003").build();
    service.register(worker.clone()).await.unwrap();

    assert_eq!(connector.connected(), vec![worker.clone()]);
    assert_eq!(metrics.events(), vec![MetricsEvent::Registered(3)]);

    let snapshot = directory.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].info, worker);
    assert!(!directory.is_busy(3).await);

    // 目录中的调用能力来自连接器
    snapshot[0]
        .invoker
        .invoke(&IncidentBuilder::new().build())
        .await
        .unwrap();
    assert_eq!(invoker.invocation_count(), 1);
}

#[tokio::test]
async fn test_register_rejects_duplicate_id() {
    let (service, directory, metrics) = service(MockConnector::new(MockInvoker::new()));
    let worker = WorkerInfoBuilder::new().with_id(1).build();

    service.register(worker.clone()).await.unwrap();
    let result = service.register(worker).await;

    assert_eq!(result, Err(QueueError::WorkerAlreadyRegistered { id: 1 }));
    assert_eq!(directory.len().await, 1);
    assert_eq!(metrics.count(|e| matches!(e, MetricsEvent::Registered(_))), 1);
}

#[tokio::test]
async fn test_register_rejects_malformed_address() {
    let (service, directory, _) = service(MockConnector::new(MockInvoker::new()));
    let worker = WorkerInfoBuilder::new().with_address("no-port").build();

    let result = service.register(worker).await;
    assert!(matches!(result, Err(QueueError::Configuration(_))));
    assert!(directory.is_empty().await);
}

#[tokio::test]
async fn test_register_propagates_connector_failure() {
    let connector =
        MockConnector::new(MockInvoker::new()).failing(QueueError::Network("refused".to_string()));
    let (service, directory, metrics) = service(connector);

    let result = service.register(WorkerInfoBuilder::new().build()).await;
    assert_eq!(result, Err(QueueError::Network("refused".to_string())));
    assert!(directory.is_empty().await);
    assert!(metrics.events().is_empty());
}
