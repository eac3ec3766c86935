use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use zabbix_cli::{Cli, CliApp, Commands, commands, utils};
use zabbix_core::AppConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 先加载配置才能确定日志目录；init 命令使用默认日志目录
    let app = match &cli.command {
        Commands::Init { .. } => None,
        _ => match CliApp::new_with_config_path(&cli.config) {
            Ok(app) => Some(app),
            Err(e) => {
                eprintln!("❌ 加载配置失败: {e:#}");
                return ExitCode::FAILURE;
            }
        },
    };

    let log_dir = app
        .as_ref()
        .map(|app| app.config.get_log_dir())
        .unwrap_or_else(|| AppConfig::default().get_log_dir());
    let _guard = match utils::setup_logging(cli.verbose, &log_dir, cli.command.log_file_name()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("❌ 初始化日志失败: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    debug!("zabbix-cli {} 启动", env!("CARGO_PKG_VERSION"));
    if let Some(app) = &app {
        match &app.config_source {
            Some(path) => info!("使用配置文件: {}", path.display()),
            None => warn!("未找到配置文件，使用默认配置（可运行 init 命令生成 config.toml）"),
        }
    }

    let result = match (cli.command, app) {
        (Commands::Init { force }, _) => commands::run_init(&cli.config, force),
        (command, Some(app)) => app.run_command(command).await,
        (_, None) => Err(anyhow::anyhow!("配置未加载")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ 执行失败: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
