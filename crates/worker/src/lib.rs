//! Worker进程的用例
//!
//! - [`IncidentProcessingService`]：按退避生成的时长模拟处理事件，可被关闭信号中断
//! - [`WorkerRegistration`]：启动时向Dispatcher注册，失败按配置重试

pub mod processing;
pub mod registration;

pub use processing::IncidentProcessingService;
pub use registration::WorkerRegistration;
