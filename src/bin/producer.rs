use anyhow::{Context, Result};
use clap::{Arg, Command};
use queuing::app::Application;
use queuing::common::{load_app_config, start_application};
use queuing_core::ProducerAppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("incident-producer")
        .version(env!("CARGO_PKG_VERSION"))
        .about("事件排队系统 - Producer服务")
        .long_about("按配置的间隔生成固定优先级的事件并提交给Dispatcher")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("配置文件路径")
                .required(true),
        )
        .arg(
            Arg::new("priority")
                .short('p')
                .long("priority")
                .value_name("PRIORITY")
                .help("生成事件的优先级，数值越大越优先")
                .value_parser(clap::value_parser!(u64))
                .required(true),
        )
        .get_matches();

    let config_path = matches
        .get_one::<String>("config")
        .context("缺少配置文件路径")?;
    let priority = *matches
        .get_one::<u64>("priority")
        .context("缺少事件优先级")?;

    let config: ProducerAppConfig = load_app_config(config_path)?;
    start_application(Application::Producer { config, priority }, "Producer").await
}
