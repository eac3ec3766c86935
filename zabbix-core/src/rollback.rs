use crate::api::ZabbixApi;
use crate::backup::{GroupBackupEntry, GroupSnapshot, load_snapshot};
use crate::config::RenameConfig;
use crate::error::Result;
use crate::membership::restore_hosts_to_group;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

/// 回滚选项
#[derive(Debug, Clone)]
pub struct RollbackOptions {
    /// 需要从主机上移除的下线分组名称
    pub offline_group: String,
    /// 每个分组处理之后的间隔
    pub delay: Duration,
}

impl RollbackOptions {
    pub fn from_config(config: &RenameConfig) -> Self {
        Self {
            offline_group: config.offline_group.clone(),
            delay: config.request_delay(),
        }
    }
}

/// 回滚结果统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RollbackSummary {
    pub success: usize,
    pub failed: usize,
    /// 改回原名的分组数
    pub renamed: usize,
    /// 重新创建的分组数
    pub recreated: usize,
}

/// 单个分组的回滚结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupOutcome {
    Recreated,
    Renamed,
    Unchanged,
}

/// 从备份文件回滚
pub async fn rollback_from_file<A: ZabbixApi + ?Sized>(
    api: &A,
    backup_file: &Path,
    options: &RollbackOptions,
) -> Result<RollbackSummary> {
    let snapshot = load_snapshot(backup_file)?;
    info!("开始回滚操作，备份文件：{}", backup_file.display());
    Ok(rollback_snapshot(api, &snapshot, options).await)
}

/// 将所有分组恢复到快照中的状态，每个分组独立处理，失败只计数
pub async fn rollback_snapshot<A: ZabbixApi + ?Sized>(
    api: &A,
    snapshot: &GroupSnapshot,
    options: &RollbackOptions,
) -> RollbackSummary {
    info!("共有 {} 个分组需要处理", snapshot.len());
    let mut summary = RollbackSummary::default();

    for (name, entry) in snapshot {
        info!("[回滚检查] 原分组名: '{}'，groupid: {}", name, entry.groupid);
        match rollback_group(api, name, entry, options).await {
            Ok(outcome) => {
                summary.success += 1;
                match outcome {
                    GroupOutcome::Recreated => summary.recreated += 1,
                    GroupOutcome::Renamed => summary.renamed += 1,
                    GroupOutcome::Unchanged => {}
                }
            }
            Err(e) => {
                error!("[回滚失败] 分组 '{}'：{}", name, e);
                summary.failed += 1;
            }
        }

        if !options.delay.is_zero() {
            tokio::time::sleep(options.delay).await;
        }
    }

    info!(
        "回滚操作完成！成功: {} 个分组，失败: {} 个分组（重命名 {}，重建 {}）",
        summary.success, summary.failed, summary.renamed, summary.recreated
    );
    summary
}

async fn rollback_group<A: ZabbixApi + ?Sized>(
    api: &A,
    name: &str,
    entry: &GroupBackupEntry,
    options: &RollbackOptions,
) -> Result<GroupOutcome> {
    let Some(current) = api.get_group_by_id(&entry.groupid).await? else {
        info!(
            "[缺失] 分组ID {} 不存在，尝试重新创建分组 '{}'",
            entry.groupid, name
        );
        let new_groupid = api.create_group(name).await?;
        info!("[回滚] 已重新创建分组 '{}'，ID: {}", name, new_groupid);
        restore_hosts_to_group(api, &entry.hosts, &new_groupid, name, &options.offline_group)
            .await?;
        return Ok(GroupOutcome::Recreated);
    };

    // 无论名称是否变化，都要恢复主机关联
    restore_hosts_to_group(
        api,
        &entry.hosts,
        &entry.groupid,
        name,
        &options.offline_group,
    )
    .await?;

    if current.name == name {
        info!("[已是原名] 分组 '{}' 无需重命名", name);
        return Ok(GroupOutcome::Unchanged);
    }

    api.rename_group(&entry.groupid, name).await?;
    info!("[回滚成功] 分组 '{}' -> '{}'", current.name, name);
    Ok(GroupOutcome::Renamed)
}
