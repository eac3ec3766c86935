use crate::app::CliApp;
use crate::cli::DetectCommand;
use anyhow::Result;
use tracing::info;
use zabbix_core::detector::{detect_by_host, detect_by_hostgroup};
use zabbix_core::report::{render_detection_summary, write_detection_reports};

/// 检测非模板监控项/触发器并生成报告
pub async fn handle_detect_command(app: &CliApp, cmd: DetectCommand) -> Result<()> {
    let mut client = app.connect().await?;
    let result = match &cmd {
        DetectCommand::Host { name } => detect_by_host(&client, name).await,
        DetectCommand::Hostgroup { name } => detect_by_hostgroup(&client, name).await,
    };
    client.logout().await;
    let result = result?;

    let (detail, summary) = write_detection_reports(&result, &app.config.get_report_dir())?;
    for line in render_detection_summary(&result).lines() {
        info!("{}", line);
    }
    info!("📄 详细报告: {}", detail.display());
    info!("📄 汇总报告: {}", summary.display());
    Ok(())
}
