//! 事件调度核心
//!
//! - [`buffer`]：按优先级分区的有界缓冲区，负责准入与驱逐
//! - [`worker_directory`]：Worker注册表与忙闲状态
//! - [`completion`]：提交者等待结果的完成槽表
//! - [`orchestrator`]：批次下发、结果回传与优雅停机
//! - [`registration`]：Worker注册入口

pub mod buffer;
pub mod completion;
pub mod orchestrator;
pub mod registration;
pub mod worker_directory;

pub use buffer::PriorityBuffer;
pub use completion::CompletionTable;
pub use orchestrator::{DispatchOrchestrator, DispatcherState, OrchestratorConfig};
pub use registration::RegistrationService;
pub use worker_directory::{WorkerDirectory, WorkerHandle};
