//! # Queuing Testing Utils
//!
//! 工作区共享的测试工具：各个接口的手写Mock实现和测试数据构建器。
//!
//! ```toml
//! [dev-dependencies]
//! queuing-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod mocks;

pub use builders::*;
pub use mocks::*;
