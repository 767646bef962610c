use anyhow::{Context, Result};
use clap::{Arg, Command};
use queuing::app::Application;
use queuing::common::{load_app_config, start_application};
use queuing_core::DispatcherAppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("incident-dispatcher")
        .version(env!("CARGO_PKG_VERSION"))
        .about("事件排队系统 - Dispatcher服务")
        .long_about("接收Producer提交的事件，按优先级缓冲并分派给已注册的Worker")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径")
                .required(true),
        )
        .get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .context("缺少配置文件路径")?;

    let config: DispatcherAppConfig = load_app_config(config_path)?;
    start_application(Application::Dispatcher(config), "Dispatcher").await
}
