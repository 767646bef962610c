//! 事件生产者
//!
//! [`ScheduledRunner`] 按退避生成器给出的间隔周期性执行 [`ScheduledTask`]，
//! 每次执行都在独立任务中进行；[`IncidentProducer`] 是向Dispatcher发送事件的任务。

pub mod producer;
pub mod runner;

pub use producer::IncidentProducer;
pub use runner::{ScheduledRunner, ScheduledTask};
