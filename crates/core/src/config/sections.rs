use serde::{Deserialize, Serialize};

use super::validation::{ConfigValidator, ValidationUtils};
use crate::QueueResult;

pub const DEFAULT_HAND_OFF_CAPACITY: usize = 10;
pub const DEFAULT_INVOKE_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_DRAIN_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_REGISTRATION_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Console,
    Json,
}

/// 日志配置段
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LogLevel,
    /// 输出目标：`stdout`、`stderr` 或文件路径
    pub out: Vec<String>,
    #[serde(rename = "type")]
    pub format: LogFormat,
    #[serde(default)]
    pub stacktrace: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            out: vec!["stdout".to_string()],
            format: LogFormat::Console,
            stacktrace: false,
        }
    }
}

impl ConfigValidator for LogConfig {
    fn validate(&self) -> QueueResult<()> {
        if self.out.is_empty() {
            return Err(crate::QueueError::config_error("logger.out cannot be empty"));
        }
        for target in &self.out {
            ValidationUtils::validate_not_empty(target, "logger.out")?;
        }
        Ok(())
    }
}

/// 访问Dispatcher的客户端配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// `host:port`
    pub host: String,
}

impl ClientConfig {
    pub fn base_url(&self) -> String {
        if self.host.contains("://") {
            self.host.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", self.host)
        }
    }
}

impl ConfigValidator for ClientConfig {
    fn validate(&self) -> QueueResult<()> {
        ValidationUtils::validate_host_port(&self.host, "dispatcher.host")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct DispatcherConfig {
    pub port: u16,
    pub buffer_capacity: usize,
    #[serde(default = "default_hand_off_capacity")]
    pub hand_off_capacity: usize,
    #[serde(default = "default_invoke_timeout_ms")]
    pub invoke_timeout_ms: u64,
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,
}

impl ConfigValidator for DispatcherConfig {
    fn validate(&self) -> QueueResult<()> {
        ValidationUtils::validate_port(self.port)?;
        ValidationUtils::validate_count(self.buffer_capacity, "dispatcher.buffer-capacity")?;
        ValidationUtils::validate_count(self.hand_off_capacity, "dispatcher.hand-off-capacity")?;
        ValidationUtils::validate_interval_ms(self.invoke_timeout_ms, "dispatcher.invoke-timeout-ms")?;
        ValidationUtils::validate_interval_ms(self.drain_timeout_ms, "dispatcher.drain-timeout-ms")?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct WorkerConfig {
    /// 指数退避的起始处理时长
    pub interval_ms: u64,
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
}

impl ConfigValidator for WorkerConfig {
    fn validate(&self) -> QueueResult<()> {
        ValidationUtils::validate_interval_ms(self.interval_ms, "worker.interval-ms")?;
        if self.max_interval_ms < self.interval_ms {
            return Err(crate::QueueError::config_error(
                "worker.max-interval-ms must be greater than or equal to worker.interval-ms",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct RegistrationConfig {
    pub attempts: u32,
    pub retry_interval_ms: u64,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_REGISTRATION_ATTEMPTS,
            retry_interval_ms: 1_000,
        }
    }
}

impl ConfigValidator for RegistrationConfig {
    fn validate(&self) -> QueueResult<()> {
        ValidationUtils::validate_count(self.attempts as usize, "registration.attempts")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ProducerConfig {
    pub interval_ms: u64,
    /// 0.0 ~ 1.0 之间的随机抖动比例
    #[serde(default)]
    pub jitter: f64,
}

impl ConfigValidator for ProducerConfig {
    fn validate(&self) -> QueueResult<()> {
        ValidationUtils::validate_interval_ms(self.interval_ms, "producer.interval-ms")?;
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(crate::QueueError::config_error(
                "producer.jitter must be within [0.0, 1.0]",
            ));
        }
        Ok(())
    }
}

/// Dispatcher进程配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatcherAppConfig {
    pub logger: LogConfig,
    pub dispatcher: DispatcherConfig,
}

impl ConfigValidator for DispatcherAppConfig {
    fn validate(&self) -> QueueResult<()> {
        self.logger.validate()?;
        self.dispatcher.validate()
    }
}

/// Worker进程配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerAppConfig {
    pub logger: LogConfig,
    pub worker: WorkerConfig,
    pub dispatcher: ClientConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
}

impl ConfigValidator for WorkerAppConfig {
    fn validate(&self) -> QueueResult<()> {
        self.logger.validate()?;
        self.worker.validate()?;
        self.dispatcher.validate()?;
        self.registration.validate()
    }
}

/// Producer进程配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProducerAppConfig {
    pub logger: LogConfig,
    pub producer: ProducerConfig,
    pub dispatcher: ClientConfig,
}

impl ConfigValidator for ProducerAppConfig {
    fn validate(&self) -> QueueResult<()> {
        self.logger.validate()?;
        self.producer.validate()?;
        self.dispatcher.validate()
    }
}

fn default_hand_off_capacity() -> usize {
    DEFAULT_HAND_OFF_CAPACITY
}

fn default_invoke_timeout_ms() -> u64 {
    DEFAULT_INVOKE_TIMEOUT_MS
}

fn default_drain_timeout_ms() -> u64 {
    DEFAULT_DRAIN_TIMEOUT_MS
}

fn default_max_interval_ms() -> u64 {
    60_000
}
