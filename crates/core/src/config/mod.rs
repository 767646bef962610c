//! 配置管理
//!
//! 三个进程（dispatcher、worker、producer）各自读取一个YAML配置文件。
//! 每个文件都包含 `logger` 段以及组件自身的配置段，键名使用 kebab-case：
//!
//! ```yaml
//! logger:
//!   level: debug
//!   out:
//!     - stdout
//!   type: console
//!   stacktrace: true
//! dispatcher:
//!   port: 8080
//!   buffer-capacity: 16
//! ```
//!
//! 加载流程：文件 → `QUEUING__` 前缀的环境变量覆盖 → 反序列化 → [`ConfigValidator`] 校验。

pub mod loader;
pub mod sections;
pub mod validation;

pub use loader::load_config;
pub use sections::*;
pub use validation::{ConfigValidator, ValidationUtils};
