//! 分布式事件排队系统的应用外壳
//!
//! 三个可执行文件共用这里的启动流程：加载配置、初始化日志、
//! 运行对应模式的 [`app::Application`]，并在收到信号后优雅关闭。

pub mod app;
pub mod common;
pub mod shutdown;
