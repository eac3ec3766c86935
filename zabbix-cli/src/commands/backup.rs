use crate::app::CliApp;
use crate::utils::format_size;
use anyhow::Result;
use tracing::{info, warn};

/// 手动创建一次全量备份
pub async fn run_backup(app: &CliApp) -> Result<()> {
    let manager = app.backup_manager()?;
    let mut client = app.connect().await?;

    let result = manager.create_backup(&client).await;
    client.logout().await;

    let path = result?;
    info!("✅ 备份完成: {}", path.display());
    Ok(())
}

/// 列出备份文件
pub fn run_list_backups(app: &CliApp) -> Result<()> {
    let manager = app.backup_manager()?;
    let backups = manager.list_backups()?;

    if backups.is_empty() {
        warn!("❌ 没有可用的备份");
        info!("💡 请先创建备份:");
        info!("   zabbix-cli backup");
        return Ok(());
    }

    info!("📋 备份目录: {}", manager.storage_dir().display());
    info!("{:<4} {:<20} {:<10} {}", "序号", "修改时间", "大小", "文件名");
    info!("{}", "-".repeat(72));

    for (index, backup) in backups.iter().enumerate() {
        let size_display = std::fs::metadata(&backup.path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "未知".to_string());
        info!(
            "{:<4} {:<20} {:<10} {}",
            index + 1,
            backup.modified.format("%Y-%m-%d %H:%M:%S"),
            size_display,
            backup.file_name()
        );
    }

    info!("{}", "-".repeat(72));
    info!("💡 回滚最新备份: zabbix-cli rollback");
    info!("   回滚指定备份: zabbix-cli rollback --file <备份文件>");
    Ok(())
}
