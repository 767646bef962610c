use anyhow::{Context, Result};
use clap::{Arg, Command};
use queuing::app::Application;
use queuing::common::{load_app_config, start_application};
use queuing_core::{config::ValidationUtils, WorkerAppConfig, WorkerInfo};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("incident-worker")
        .version(env!("CARGO_PKG_VERSION"))
        .about("事件排队系统 - Worker服务")
        .long_about("向Dispatcher注册并处理分派到本节点的事件")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径")
                .required(true),
        )
        .arg(
            Arg::new("id")
                .long("id")
                .value_name("ID")
                .help("Worker唯一标识符")
                .value_parser(clap::value_parser!(u64))
                .required(true),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST:PORT")
                .help("Worker监听并向Dispatcher注册的地址")
                .required(true),
        )
        .get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .context("缺少配置文件路径")?;
    let id = *matches.get_one::<u64>("id").context("缺少Worker ID")?;
    let host = matches
        .get_one::<String>("host")
        .context("缺少Worker地址")?;
    ValidationUtils::validate_host_port(host, "--host")?;

    let config: WorkerAppConfig = load_app_config(config_path)?;
    let worker = WorkerInfo {
        id,
        address: host.clone(),
    };
    start_application(Application::Worker { config, worker }, "Worker").await
}
