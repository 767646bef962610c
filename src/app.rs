use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{error, info, warn};

use queuing_api::{create_dispatcher_routes, create_worker_routes, DispatcherState, WorkerState};
use queuing_core::{
    DispatcherAppConfig, ExponentialBackoff, LinearBackoff, LogConfig, Priority,
    ProducerAppConfig, WorkerAppConfig, WorkerInfo,
};
use queuing_dispatcher::{
    CompletionTable, DispatchOrchestrator, OrchestratorConfig, PriorityBuffer,
    RegistrationService, WorkerDirectory,
};
use queuing_infrastructure::{
    init_metrics_exporter, DispatcherClient, DispatcherMetrics, HttpWorkerConnector,
};
use queuing_producer::{IncidentProducer, ScheduledRunner};
use queuing_worker::{IncidentProcessingService, WorkerRegistration};

const METRICS_UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// 应用运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    Dispatcher,
    Worker,
    Producer,
}

/// 主应用程序，每个进程运行其中一种模式
#[derive(Debug, Clone)]
pub enum Application {
    Dispatcher(DispatcherAppConfig),
    Worker {
        config: WorkerAppConfig,
        worker: WorkerInfo,
    },
    Producer {
        config: ProducerAppConfig,
        priority: Priority,
    },
}

impl Application {
    pub fn mode(&self) -> AppMode {
        match self {
            Application::Dispatcher(_) => AppMode::Dispatcher,
            Application::Worker { .. } => AppMode::Worker,
            Application::Producer { .. } => AppMode::Producer,
        }
    }

    pub fn log_config(&self) -> &LogConfig {
        match self {
            Application::Dispatcher(config) => &config.logger,
            Application::Worker { config, .. } => &config.logger,
            Application::Producer { config, .. } => &config.logger,
        }
    }

    /// 运行直到收到关闭信号并完成清理
    pub async fn run(self, shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        info!("启动应用程序，模式: {:?}", self.mode());

        match self {
            Application::Dispatcher(config) => run_dispatcher(config, shutdown_rx).await,
            Application::Worker { config, worker } => {
                run_worker(config, worker, shutdown_rx).await
            }
            Application::Producer { config, priority } => {
                run_producer(config, priority, shutdown_rx).await
            }
        }
    }
}

async fn run_dispatcher(
    config: DispatcherAppConfig,
    shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    let settings = &config.dispatcher;
    info!(
        "启动Dispatcher服务，端口: {}, 缓冲区容量: {}",
        settings.port, settings.buffer_capacity
    );

    let metrics_handle = match init_metrics_exporter() {
        Ok(handle) => {
            let upkeep = handle.clone();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(METRICS_UPKEEP_INTERVAL);
                loop {
                    ticker.tick().await;
                    upkeep.run_upkeep();
                }
            });
            Some(handle)
        }
        Err(e) => {
            warn!("Prometheus导出器初始化失败，/metrics 不可用: {}", e);
            None
        }
    };

    let metrics = Arc::new(DispatcherMetrics::new());
    let directory = Arc::new(WorkerDirectory::new());
    let orchestrator = Arc::new(DispatchOrchestrator::new(
        Arc::new(PriorityBuffer::new(settings.buffer_capacity)),
        Arc::clone(&directory),
        Arc::new(CompletionTable::new()),
        metrics.clone(),
        OrchestratorConfig::from(settings),
    ));
    let registration = Arc::new(RegistrationService::new(
        directory,
        Arc::new(HttpWorkerConnector::new()?),
        metrics.clone(),
    ));

    let router = create_dispatcher_routes(DispatcherState {
        submitter: orchestrator.clone(),
        registrar: registration,
        metrics_handle,
    });

    let bind_address = format!("0.0.0.0:{}", settings.port);
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("绑定地址失败: {bind_address}"))?;
    info!("Dispatcher监听 http://{}", bind_address);

    let dispatch_handle = tokio::spawn(Arc::clone(&orchestrator).run(shutdown_rx));

    // 调度器进入Stopped后所有提交都已得到结果，此时再关闭HTTP服务
    let stopped = {
        let orchestrator = Arc::clone(&orchestrator);
        async move { orchestrator.stopped().await }
    };
    let server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(stopped)
            .await
    });

    // 调度任务只会在Stopped之后正常返回，panic说明内部状态已不一致
    if let Err(e) = dispatch_handle.await {
        error!("调度任务异常退出: {}", e);
        server.abort();
        return Err(anyhow!("调度任务异常退出: {e}"));
    }
    server
        .await
        .context("Dispatcher HTTP服务任务异常退出")?
        .context("Dispatcher HTTP服务运行失败")?;

    metrics.log_statistics().await;
    info!("Dispatcher服务已停止");
    Ok(())
}

async fn run_worker(
    config: WorkerAppConfig,
    worker: WorkerInfo,
    shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    info!("启动Worker服务: {}", worker);

    let backoff = ExponentialBackoff::new(
        Duration::from_millis(config.worker.interval_ms),
        Duration::from_millis(config.worker.max_interval_ms),
    );
    let processing = Arc::new(IncidentProcessingService::new(Arc::new(backoff)));

    let router = create_worker_routes(WorkerState {
        processor: processing.clone(),
    });
    let listener = TcpListener::bind(&worker.address)
        .await
        .with_context(|| format!("绑定地址失败: {}", worker.address))?;

    let server = {
        let processing = Arc::clone(&processing);
        let mut shutdown_rx = shutdown_rx;
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                    info!("Worker收到关闭信号");
                    processing.shutdown();
                })
                .await
        })
    };

    let client = DispatcherClient::new(&config.dispatcher)?;
    let registration = WorkerRegistration::new(Arc::new(client), worker, &config.registration);
    if let Err(e) = registration.run().await {
        server.abort();
        return Err(e).context("向Dispatcher注册失败");
    }

    server
        .await
        .context("Worker HTTP服务任务异常退出")?
        .context("Worker HTTP服务运行失败")?;

    info!("Worker服务已停止");
    Ok(())
}

async fn run_producer(
    config: ProducerAppConfig,
    priority: Priority,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    info!(
        "启动Producer服务，优先级: {}, Dispatcher: {}",
        priority, config.dispatcher.host
    );

    let client = DispatcherClient::new(&config.dispatcher)?;
    let producer = Arc::new(IncidentProducer::new(Arc::new(client), priority));
    let backoff = LinearBackoff::new(Duration::from_millis(config.producer.interval_ms))
        .with_jitter(config.producer.jitter);

    let runner = Arc::new(ScheduledRunner::new());
    let handle = {
        let runner = Arc::clone(&runner);
        let producer = Arc::clone(&producer);
        tokio::spawn(async move { runner.run(Arc::new(backoff), producer).await })
    };

    let _ = shutdown_rx.recv().await;
    info!("Producer收到关闭信号，等待进行中的事件完成");
    runner.stop();
    handle.await.context("Producer调度任务异常退出")?;

    info!("Producer服务已停止，共生成 {} 个事件", producer.produced());
    Ok(())
}
