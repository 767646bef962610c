//! 日志系统初始化
//!
//! 根据 `logger` 配置段构建 `tracing_subscriber` 注册表：
//! - `level` 作为默认过滤级别，`RUST_LOG` 环境变量优先
//! - `out` 中的每个目标对应一个输出层（`stdout`、`stderr` 或追加写入的文件）
//! - `type` 选择 `console` 或 `json` 格式
//! - `stacktrace` 打开时附带源文件、行号和target

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use crate::config::{LogConfig, LogFormat};
use crate::{QueueError, QueueResult};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// 初始化全局日志订阅者，只能调用一次
pub fn init_logging(config: &LogConfig) -> QueueResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.to_string()));

    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(config.out.len());
    for target in &config.out {
        let (writer, ansi) = open_writer(target)?;
        layers.push(build_layer(config, writer, ansi));
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|e| QueueError::config_error(format!("初始化日志系统失败: {e}")))
}

fn open_writer(target: &str) -> QueueResult<(BoxMakeWriter, bool)> {
    match target {
        "stdout" => Ok((BoxMakeWriter::new(std::io::stdout), true)),
        "stderr" => Ok((BoxMakeWriter::new(std::io::stderr), true)),
        path => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| QueueError::config_error(format!("无法打开日志文件 {path}: {e}")))?;
            Ok((BoxMakeWriter::new(Mutex::new(file)), false))
        }
    }
}

fn build_layer(config: &LogConfig, writer: BoxMakeWriter, ansi: bool) -> BoxedLayer {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi && config.format == LogFormat::Console)
        .with_target(config.stacktrace)
        .with_file(config.stacktrace)
        .with_line_number(config.stacktrace);

    match config.format {
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Console => layer.boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_writer_targets() {
        assert!(open_writer("stdout").unwrap().1);
        assert!(open_writer("stderr").unwrap().1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dispatcher.log");
        let (_, ansi) = open_writer(path.to_str().unwrap()).unwrap();
        assert!(!ansi);
        assert!(path.exists());
    }

    #[test]
    fn test_open_writer_rejects_unwritable_path() {
        let result = open_writer("/nonexistent-dir/queuing/dispatcher.log");
        assert!(matches!(result, Err(QueueError::Configuration(_))));
    }
}
