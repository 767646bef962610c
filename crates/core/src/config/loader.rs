use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

use super::validation::ConfigValidator;
use crate::{QueueError, QueueResult};

/// 环境变量覆盖前缀，例如 `QUEUING__DISPATCHER__PORT=9090`
pub const ENV_PREFIX: &str = "QUEUING";

/// 从YAML文件加载并校验配置
pub fn load_config<T>(path: &str) -> QueueResult<T>
where
    T: DeserializeOwned + ConfigValidator,
{
    if !Path::new(path).exists() {
        return Err(QueueError::config_error(format!("配置文件不存在: {path}")));
    }

    let settings = ::config::Config::builder()
        .add_source(::config::File::new(path, ::config::FileFormat::Yaml))
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()
        .map_err(|e| QueueError::config_error(format!("读取配置文件 {path} 失败: {e}")))?;

    let parsed: T = settings
        .try_deserialize()
        .map_err(|e| QueueError::config_error(format!("解析配置文件 {path} 失败: {e}")))?;

    parsed.validate()?;
    debug!("配置文件加载完成: {}", path);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::config::{
        DispatcherAppConfig, LogFormat, LogLevel, ProducerAppConfig, WorkerAppConfig,
        DEFAULT_DRAIN_TIMEOUT_MS, DEFAULT_HAND_OFF_CAPACITY,
    };

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".yaml")
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const DISPATCHER_CONFIG: &str = r#"
logger:
  level: debug
  out:
    - stdout
  type: console
  stacktrace: true
dispatcher:
  port: 8080
  buffer-capacity: 16
"#;

    #[test]
    fn test_load_dispatcher_config() {
        let file = write_config(DISPATCHER_CONFIG);
        let config: DispatcherAppConfig = load_config(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.logger.level, LogLevel::Debug);
        assert_eq!(config.logger.out, vec!["stdout".to_string()]);
        assert_eq!(config.logger.format, LogFormat::Console);
        assert!(config.logger.stacktrace);
        assert_eq!(config.dispatcher.port, 8080);
        assert_eq!(config.dispatcher.buffer_capacity, 16);
        assert_eq!(config.dispatcher.hand_off_capacity, DEFAULT_HAND_OFF_CAPACITY);
        assert_eq!(config.dispatcher.drain_timeout_ms, DEFAULT_DRAIN_TIMEOUT_MS);
    }

    #[test]
    fn test_load_worker_config_with_default_registration() {
        let file = write_config(
            r#"
logger:
  level: info
  out:
    - stdout
  type: json
worker:
  interval-ms: 200
dispatcher:
  host: localhost:8080
"#,
        );
        let config: WorkerAppConfig = load_config(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.logger.format, LogFormat::Json);
        assert!(!config.logger.stacktrace);
        assert_eq!(config.worker.interval_ms, 200);
        assert_eq!(config.dispatcher.host, "localhost:8080");
        assert_eq!(config.registration.attempts, 5);
    }

    #[test]
    fn test_load_producer_config() {
        let file = write_config(
            r#"
logger:
  level: warn
  out:
    - stderr
  type: console
producer:
  interval-ms: 300
  jitter: 0.25
dispatcher:
  host: 127.0.0.1:8080
"#,
        );
        let config: ProducerAppConfig = load_config(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.logger.level, LogLevel::Warn);
        assert_eq!(config.producer.interval_ms, 300);
        assert_eq!(config.producer.jitter, 0.25);
    }

    #[test]
    fn test_missing_file_is_rejected() {
        let result: QueueResult<DispatcherAppConfig> = load_config("/nonexistent/queuing.yaml");
        assert!(matches!(result, Err(QueueError::Configuration(_))));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let file = write_config(
            r#"
logger:
  level: unknown
  out:
    - stdout
  type: console
dispatcher:
  port: 8080
  buffer-capacity: 16
"#,
        );
        let result: QueueResult<DispatcherAppConfig> =
            load_config(file.path().to_str().unwrap());
        assert!(result.is_err());

        let file = write_config(
            r#"
logger:
  level: info
  out:
    - stdout
  type: console
dispatcher:
  port: 8080
  buffer-capacity: 0
"#,
        );
        let result: QueueResult<DispatcherAppConfig> =
            load_config(file.path().to_str().unwrap());
        assert!(result.is_err());
    }
}
