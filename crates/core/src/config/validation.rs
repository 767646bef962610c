use crate::{QueueError, QueueResult};

/// Trait for configuration validation
pub trait ConfigValidator {
    fn validate(&self) -> QueueResult<()>;
}

/// General validation utilities
pub struct ValidationUtils;

impl ValidationUtils {
    /// Validate that a string is not empty
    pub fn validate_not_empty(value: &str, field_name: &str) -> QueueResult<()> {
        if value.trim().is_empty() {
            return Err(QueueError::config_error(format!(
                "{field_name} cannot be empty"
            )));
        }
        Ok(())
    }

    /// Validate that a port number is valid
    pub fn validate_port(port: u16) -> QueueResult<()> {
        if port == 0 {
            return Err(QueueError::config_error("port cannot be 0"));
        }
        Ok(())
    }

    /// Validate that a count is reasonable
    pub fn validate_count(count: usize, field_name: &str) -> QueueResult<()> {
        if count == 0 {
            return Err(QueueError::config_error(format!(
                "{field_name} must be greater than 0"
            )));
        }
        if count > 100_000 {
            return Err(QueueError::config_error(format!(
                "{field_name} must be less than or equal to 100000"
            )));
        }
        Ok(())
    }

    /// Validate that an interval in milliseconds is reasonable
    pub fn validate_interval_ms(interval_ms: u64, field_name: &str) -> QueueResult<()> {
        if interval_ms == 0 {
            return Err(QueueError::config_error(format!(
                "{field_name} must be greater than 0"
            )));
        }
        if interval_ms > 3_600_000 {
            return Err(QueueError::config_error(format!(
                "{field_name} must be less than or equal to 3600000"
            )));
        }
        Ok(())
    }

    /// Validate a `host:port` pair, optionally prefixed with a scheme
    pub fn validate_host_port(value: &str, field_name: &str) -> QueueResult<()> {
        Self::validate_not_empty(value, field_name)?;

        let without_scheme = value
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(value)
            .trim_end_matches('/');

        let Some((host, port)) = without_scheme.rsplit_once(':') else {
            return Err(QueueError::config_error(format!(
                "{field_name} must be in host:port format"
            )));
        };

        if host.is_empty() {
            return Err(QueueError::config_error(format!(
                "{field_name} host cannot be empty"
            )));
        }

        match port.parse::<u16>() {
            Ok(port) => Self::validate_port(port),
            Err(_) => Err(QueueError::config_error(format!(
                "{field_name} has invalid port: {port}"
            ))),
        }
    }
}
