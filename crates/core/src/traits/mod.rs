pub mod dispatch;
pub mod metrics;

pub use dispatch::*;
pub use metrics::*;
