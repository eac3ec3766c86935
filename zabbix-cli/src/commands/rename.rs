use crate::app::CliApp;
use anyhow::Result;
use std::path::PathBuf;
use tracing::{info, warn};
use zabbix_core::directives::load_directives;
use zabbix_core::matcher::LetterPrefixMatcher;

/// 按 CSV 批量改名：备份 -> 改名/下线 -> 清理空分组
pub async fn run_rename(app: &CliApp, csv: Option<PathBuf>) -> Result<()> {
    let rename_config = &app.config.rename;
    let csv_path = csv.unwrap_or_else(|| PathBuf::from(&rename_config.changes_file));
    info!("📄 读取改名对照表: {}", csv_path.display());

    let directives = load_directives(&csv_path, rename_config)?;
    if directives.is_empty() {
        warn!("对照表中没有需要处理的记录");
        return Ok(());
    }
    info!("共 {} 条需要处理的记录", directives.len());

    let manager = app.backup_manager()?;
    let matcher = LetterPrefixMatcher::from_config(rename_config);
    let mut client = app.connect().await?;

    let result =
        zabbix_core::rename::run_rename(&client, &matcher, rename_config, &manager, &directives)
            .await;
    client.logout().await;
    let report = result?;

    info!("========== 处理结果 ==========");
    info!("总记录数: {}", report.total);
    info!("重命名成功: {}", report.renamed);
    info!("迁移到下线分组: {}", report.moved_offline);
    info!("无需修改: {}", report.skipped);
    info!("未找到分组: {}", report.not_found);
    info!("匹配到多个分组: {}", report.ambiguous);
    info!("失败: {}", report.failed);
    info!("删除空分组: {}", report.deleted_groups);
    info!("备份文件: {}", report.backup_file.display());
    info!("💡 如需撤销，请运行: zabbix-cli rollback --file {}", report.backup_file.display());

    if report.failed > 0 {
        warn!("⚠️  有 {} 条记录处理失败，详情见日志", report.failed);
    }
    Ok(())
}
