use std::sync::Arc;
use std::time::Duration;

use queuing_core::{QueueError, RegistrationConfig};
use queuing_testing_utils::{builders::WorkerInfoBuilder, mocks::MockRegistrar};
use queuing_worker::WorkerRegistration;

fn config(attempts: u32) -> RegistrationConfig {
    RegistrationConfig {
        attempts,
        retry_interval_ms: 500,
    }
}

#[tokio::test(start_paused = true)]
async fn test_registration_succeeds_first_time() {
    let registrar = MockRegistrar::new();
    let worker = WorkerInfoBuilder::new().with_id(4).build();
    let registration = WorkerRegistration::new(Arc::new(registrar.clone()), worker.clone(), &config(5));

    registration.run().await.unwrap();

    assert_eq!(registrar.attempts(), vec![worker]);
}

#[tokio::test(start_paused = true)]
async fn test_registration_retries_until_success() {
    let registrar = MockRegistrar::failing_times(2);
    let worker = WorkerInfoBuilder::new().with_id(4).build();
    let registration = WorkerRegistration::new(Arc::new(registrar.clone()), worker, &config(5));

    let start = tokio::time::Instant::now();
    registration.run().await.unwrap();

    assert_eq!(registrar.attempts().len(), 3);
    assert_eq!(start.elapsed(), Duration::from_millis(1000));
}

#[tokio::test(start_paused = true)]
async fn test_registration_gives_up_after_attempts() {
    let registrar = MockRegistrar::failing_times(10);
    let worker = WorkerInfoBuilder::new().with_id(4).build();
    let registration = WorkerRegistration::new(Arc::new(registrar.clone()), worker, &config(5));

    let result = registration.run().await;

    assert_eq!(result, Err(QueueError::Network("connection refused".to_string())));
    assert_eq!(registrar.attempts().len(), 5);
}
