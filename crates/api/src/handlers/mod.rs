pub mod health;
pub mod incidents;
pub mod metrics;
pub mod workers;
