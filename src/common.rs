use std::time::Duration;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tokio::signal;
use tracing::{error, info, warn};

use queuing_core::{config::load_config, init_logging, ConfigValidator};

use crate::app::Application;
use crate::shutdown::ShutdownManager;

/// 收到关闭信号后等待应用退出的最长时间
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// 加载并校验进程配置
pub fn load_app_config<T>(config_path: &str) -> Result<T>
where
    T: DeserializeOwned + ConfigValidator,
{
    load_config(config_path).with_context(|| format!("加载配置文件失败: {config_path}"))
}

/// 启动应用程序的通用函数
///
/// 应用在后台任务中运行；收到SIGINT/SIGTERM或应用提前退出时结束。
pub async fn start_application(app: Application, service_name: &str) -> Result<()> {
    init_logging(app.log_config()).context("初始化日志系统失败")?;
    info!("启动 {} 服务", service_name);

    let shutdown_manager = ShutdownManager::new();
    let mut app_handle = {
        let shutdown_rx = shutdown_manager.subscribe();
        tokio::spawn(async move { app.run(shutdown_rx).await })
    };

    tokio::select! {
        signal = wait_for_shutdown_signal() => {
            signal?;
            info!("收到关闭信号，开始优雅关闭...");
        }
        finished = &mut app_handle => {
            return match finished {
                Ok(Ok(())) => {
                    info!("{} 服务已退出", service_name);
                    Ok(())
                }
                Ok(Err(e)) => {
                    error!("{} 服务运行失败: {:#}", service_name, e);
                    Err(e)
                }
                Err(e) => Err(e).context(format!("{service_name} 服务任务异常退出")),
            };
        }
    }

    shutdown_manager.shutdown();

    match tokio::time::timeout(SHUTDOWN_TIMEOUT, app_handle).await {
        Ok(Ok(Ok(()))) => info!("{} 服务已优雅关闭", service_name),
        Ok(Ok(Err(e))) => {
            error!("{} 服务关闭时发生错误: {:#}", service_name, e);
            return Err(e);
        }
        Ok(Err(e)) => {
            return Err(e).context(format!("{service_name} 服务任务异常退出"));
        }
        Err(_) => warn!("{} 服务关闭超时，强制退出", service_name),
    }

    Ok(())
}

/// 等待SIGINT或SIGTERM
pub async fn wait_for_shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("安装Ctrl+C信号处理器失败") };

    #[cfg(unix)]
    let terminate = async {
        let mut term = signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("安装SIGTERM信号处理器失败")?;
        term.recv().await;
        Ok::<(), anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        result = ctrl_c => {
            info!("收到Ctrl+C信号");
            result
        }
        result = terminate => {
            info!("收到SIGTERM信号");
            result
        }
    }
}
