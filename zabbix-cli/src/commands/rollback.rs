use crate::app::CliApp;
use crate::utils::confirm;
use anyhow::Result;
use std::path::PathBuf;
use tracing::{info, warn};
use zabbix_core::backup::load_snapshot;
use zabbix_core::rollback::{RollbackOptions, rollback_snapshot};

/// 从备份恢复分组名称与主机关联
pub async fn run_rollback(app: &CliApp, file: Option<PathBuf>, force: bool) -> Result<()> {
    let backup_file = match file {
        Some(path) => path,
        None => {
            let manager = app.backup_manager()?;
            let backups = manager.list_backups()?;
            if !backups.is_empty() {
                info!("找到 {} 个备份文件:", backups.len());
                for (index, backup) in backups.iter().enumerate() {
                    let marker = if index == 0 { " (最新)" } else { "" };
                    info!(
                        "  {}. {} [{}]{}",
                        index + 1,
                        backup.file_name(),
                        backup.modified.format("%Y-%m-%d %H:%M:%S"),
                        marker
                    );
                }
            }
            match backups.into_iter().next() {
                Some(backup) => {
                    info!("使用最新的备份文件: {}", backup.file_name());
                    backup.path
                }
                None => anyhow::bail!(
                    "没有可用的备份文件（目录: {}），请先运行 zabbix-cli backup",
                    manager.storage_dir().display()
                ),
            }
        }
    };

    // 先读取快照，文件损坏时不登录
    let snapshot = load_snapshot(&backup_file)?;
    info!(
        "备份文件 {} 共包含 {} 个分组",
        backup_file.display(),
        snapshot.len()
    );

    if !force {
        warn!("⚠️  警告: 此操作将把分组名称和主机关联恢复到备份时的状态!");
        let prompt = format!("请确认您要从备份 {} 回滚 (y/N): ", backup_file.display());
        if !confirm(&prompt).await? {
            warn!("操作已取消");
            return Ok(());
        }
    }

    let options = RollbackOptions::from_config(&app.config.rename);
    let mut client = app.connect().await?;
    let summary = rollback_snapshot(&client, &snapshot, &options).await;
    client.logout().await;

    info!(
        "✅ 回滚完成: 成功 {} 个分组（重命名 {}，重建 {}），失败 {} 个分组",
        summary.success, summary.renamed, summary.recreated, summary.failed
    );
    if summary.failed > 0 {
        warn!("⚠️  部分分组回滚失败，详情见 rollback.log");
    }
    Ok(())
}
