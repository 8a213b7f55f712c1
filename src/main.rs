//! 网络设备命令采集主入口

use ops_collect::{
    collector::Collector,
    config::{AppConfig, CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE},
    output::OutputArchive,
    ssh::{RemoteExecutor, RusshConnector},
    telemetry,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" | "-V" => {
                println!("ops-collect {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    // 按优先级加载：.env.<COLLECT_ENV> 或 .env.local > .env
    if let Ok(name) = std::env::var("COLLECT_ENV") {
        dotenv::from_filename(format!(".env.{}", name)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::dotenv().ok();
    }

    // 1. 加载配置
    let config = AppConfig::load().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config.logging);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        tasks = config.tasks.len(),
        output_dir = %config.output.dir,
        "ops-collect starting"
    );

    // 3. 依次采集
    let settings = config.ssh.to_settings()?;
    let collector = Collector::new(
        RemoteExecutor::new(RusshConnector::new(settings)),
        OutputArchive::new(&config.output.dir),
    );

    let summary = collector.run(&config.tasks).await;

    // 单个任务失败不影响退出码
    tracing::info!(
        total = summary.total(),
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        "Collection finished"
    );

    Ok(())
}

/// 打印帮助信息
fn print_help() {
    println!("ops-collect {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: ops-collect [选项]");
    println!();
    println!("选项:");
    println!("  --version     打印版本信息并退出");
    println!("  --help        打印此帮助信息并退出");
    println!();
    println!("配置:");
    println!("  {}    配置文件路径（默认 {}）", CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE);
    println!("  COLLECT_<SECTION>__<KEY>  覆盖配置项，例如 COLLECT_SSH__PASSWORD");
    println!("  RUST_LOG          覆盖日志级别");
}
