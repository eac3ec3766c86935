use crate::app::CliApp;
use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};
use zabbix_core::analysis::{load_group_names, run_analysis};

/// 分析主机组，生成问题报告和模板继承报告
pub async fn run_analyze(app: &CliApp, groups: Vec<String>) -> Result<()> {
    let group_names = load_group_names(&groups, Path::new(&app.config.output.groups_file))?;
    info!("待分析主机组: {}", group_names.join(", "));

    let mut client = app.connect().await?;
    let result = run_analysis(&client, &group_names, &app.config.get_report_dir()).await;
    client.logout().await;
    let report = result?;

    for path in &report.group_reports {
        info!("📄 主机组报告: {}", path.display());
    }
    match &report.inheritance_report {
        Some(path) => info!("📄 模板继承报告: {}", path.display()),
        None => info!("未发现模板继承问题"),
    }
    if !report.failed_groups.is_empty() {
        warn!("⚠️  以下主机组分析失败: {}", report.failed_groups.join(", "));
    }
    Ok(())
}
