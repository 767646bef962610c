pub mod backoff;
pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod traits;

pub use backoff::{BackoffStrategy, ExponentialBackoff, LinearBackoff};
pub use config::{
    ClientConfig, ConfigValidator, DispatcherAppConfig, DispatcherConfig, LogConfig, LogFormat,
    ProducerAppConfig, ProducerConfig, RegistrationConfig, WorkerAppConfig, WorkerConfig,
};
pub use errors::*;
pub use logging::init_logging;
pub use models::{
    Incident, IncidentKey, InvokeIncidentRequest, Priority, RegisterWorkerRequest, RpcResponse,
    SubmitIncidentRequest, WorkerInfo,
};
pub use traits::{IncidentInvoker, IncidentProcessor, IncidentSubmitter, MetricsSink, WorkerConnector, WorkerRegistrar};

/// 统一的Result类型
pub type QueueResult<T> = std::result::Result<T, QueueError>;
