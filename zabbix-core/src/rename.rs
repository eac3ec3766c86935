use crate::api::ZabbixApi;
use crate::api_types::HostGroup;
use crate::backup::BackupManager;
use crate::config::RenameConfig;
use crate::directives::{DirectiveAction, RenameDirective};
use crate::error::{Result, ZabbixError};
use crate::matcher::GroupNameMatcher;
use crate::membership::move_hosts_to_group;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// 单条指令的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenameOutcome {
    /// 无需修改，没有发出任何请求
    Skipped,
    /// 已改名
    Renamed { from: String, to: String },
    /// 主机已迁移到下线分组，`groupid` 为原分组，等待清理
    MovedOffline { groupid: String, hosts: usize },
}

/// 主机组改名器
pub struct GroupRenamer<'a, A: ?Sized, M: ?Sized> {
    api: &'a A,
    matcher: &'a M,
    config: &'a RenameConfig,
}

impl<'a, A, M> GroupRenamer<'a, A, M>
where
    A: ZabbixApi + ?Sized,
    M: GroupNameMatcher + ?Sized,
{
    pub fn new(api: &'a A, matcher: &'a M, config: &'a RenameConfig) -> Self {
        Self {
            api,
            matcher,
            config,
        }
    }

    /// 按名称定位分组：先精确匹配，再按匹配策略依次尝试候选名称
    pub async fn resolve_group(&self, original_name: &str) -> Result<HostGroup> {
        let mut found = self.api.get_groups_by_name(original_name, true).await?;

        if found.is_empty() {
            for candidate in self.matcher.candidates(original_name) {
                found = self.api.get_groups_by_name(&candidate, true).await?;
                if !found.is_empty() {
                    info!("[找到匹配] 使用候选名称找到分组：{}", candidate);
                    break;
                }
            }
        }

        match found.len() {
            0 => Err(ZabbixError::GroupNotFound {
                name: original_name.to_string(),
            }),
            1 => Ok(found.swap_remove(0)),
            _ => Err(ZabbixError::AmbiguousGroup {
                name: original_name.to_string(),
                matches: found.into_iter().map(|g| g.name).collect(),
            }),
        }
    }

    /// 执行一条改名指令
    pub async fn apply(&self, directive: &RenameDirective) -> Result<RenameOutcome> {
        let action = directive.action(self.config);
        if action == DirectiveAction::Skip {
            return Ok(RenameOutcome::Skipped);
        }

        let group = self.resolve_group(&directive.original_name).await?;

        match action {
            DirectiveAction::Skip => Ok(RenameOutcome::Skipped),
            DirectiveAction::Offline => {
                let hostids: Vec<String> = group.hosts.iter().map(|h| h.hostid.clone()).collect();
                move_hosts_to_group(self.api, &hostids, &self.config.offline_group).await?;
                info!(
                    "[迁移] 将分组 '{}' 中 {} 个主机移动到 '{}'",
                    group.name,
                    hostids.len(),
                    self.config.offline_group
                );
                Ok(RenameOutcome::MovedOffline {
                    groupid: group.groupid,
                    hosts: hostids.len(),
                })
            }
            DirectiveAction::Rename(new_name) => {
                let final_name = self.matcher.apply_prefix(&group.name, &new_name);
                if final_name != new_name {
                    info!("[保留前缀] 为新名称添加前缀：{} -> {}", new_name, final_name);
                }
                self.api.rename_group(&group.groupid, &final_name).await?;
                info!("[成功] 分组 '{}' 重命名为 '{}'", group.name, final_name);
                Ok(RenameOutcome::Renamed {
                    from: group.name,
                    to: final_name,
                })
            }
        }
    }
}

/// 批量改名结果汇总
#[derive(Debug, Default, Clone)]
pub struct RenameReport {
    pub backup_file: PathBuf,
    pub total: usize,
    pub renamed: usize,
    pub moved_offline: usize,
    pub skipped: usize,
    pub not_found: usize,
    pub ambiguous: usize,
    pub failed: usize,
    pub deleted_groups: usize,
}

/// 完整改名流程：备份 -> 逐行处理 -> 清理空分组
///
/// 备份失败时直接返回错误，不做任何修改。
pub async fn run_rename<A, M>(
    api: &A,
    matcher: &M,
    config: &RenameConfig,
    backup_manager: &BackupManager,
    directives: &[RenameDirective],
) -> Result<RenameReport>
where
    A: ZabbixApi + ?Sized,
    M: GroupNameMatcher + ?Sized,
{
    let backup_file = backup_manager.create_backup(api).await?;

    let renamer = GroupRenamer::new(api, matcher, config);
    let mut report = RenameReport {
        backup_file,
        total: directives.len(),
        ..Default::default()
    };
    let mut cleanup_ids: Vec<String> = Vec::new();

    for (index, directive) in directives.iter().enumerate() {
        info!(
            "正在处理第 {}/{} 条记录：'{}' -> '{}'",
            index + 1,
            report.total,
            directive.original_name,
            directive.new_name
        );

        match renamer.apply(directive).await {
            Ok(RenameOutcome::Skipped) => report.skipped += 1,
            Ok(RenameOutcome::Renamed { .. }) => report.renamed += 1,
            Ok(RenameOutcome::MovedOffline { groupid, .. }) => {
                report.moved_offline += 1;
                if !cleanup_ids.contains(&groupid) {
                    cleanup_ids.push(groupid);
                }
            }
            Err(ZabbixError::GroupNotFound { name }) => {
                warn!("[未找到] 原分组：{}（已尝试所有前缀）", name);
                report.not_found += 1;
            }
            Err(ZabbixError::AmbiguousGroup { name, matches }) => {
                warn!("[匹配多个分组] 原分组：{} 匹配到多个：{:?}", name, matches);
                report.ambiguous += 1;
            }
            Err(e) => {
                error!(
                    "[失败] 分组 '{}' 重命名为 '{}' 出错：{}",
                    directive.original_name, directive.new_name, e
                );
                report.failed += 1;
            }
        }

        let delay = config.request_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    if cleanup_ids.is_empty() {
        info!("没有需要清理的群组");
    } else {
        report.deleted_groups = cleanup_empty_groups(api, &cleanup_ids).await;
    }

    info!("所有操作完成，备份文件：{}", report.backup_file.display());
    Ok(report)
}

/// 校验分组ID可以转换为数字
fn parse_group_id(groupid: &str) -> Result<u64> {
    groupid.trim().parse::<u64>().map_err(|_| ZabbixError::InvalidId {
        id: groupid.to_string(),
    })
}

/// 分组中是否没有任何主机
pub async fn is_group_empty<A: ZabbixApi + ?Sized>(api: &A, groupid: &str) -> Result<bool> {
    parse_group_id(groupid)?;
    Ok(!api.group_has_hosts(groupid).await?)
}

/// 删除空分组；分组不为空或出错时返回 false
pub async fn delete_empty_group<A: ZabbixApi + ?Sized>(
    api: &A,
    groupid: &str,
    group_name: &str,
) -> bool {
    let result: Result<bool> = async {
        if !is_group_empty(api, groupid).await? {
            warn!("[跳过删除] 群组 '{}' 不为空，跳过删除", group_name);
            return Ok(false);
        }
        api.delete_group(groupid).await?;
        info!("[删除成功] 空群组 '{}' 已删除", group_name);
        Ok(true)
    }
    .await;

    result.unwrap_or_else(|e| {
        error!("[删除失败] 群组 '{}' 删除失败：{}", group_name, e);
        false
    })
}

/// 批量清理空分组，返回删除数量
pub async fn cleanup_empty_groups<A: ZabbixApi + ?Sized>(api: &A, groupids: &[String]) -> usize {
    info!("开始检查并清理 {} 个可能为空的群组...", groupids.len());
    let mut deleted = 0;

    for groupid in groupids {
        if let Err(e) = parse_group_id(groupid) {
            error!("[清理群组] {}，跳过", e);
            continue;
        }

        let group = match api.get_group_by_id(groupid).await {
            Ok(Some(group)) => group,
            Ok(None) => {
                warn!("[清理群组] 群组 {} 不存在，跳过", groupid);
                continue;
            }
            Err(e) => {
                error!("[清理群组] 处理群组 {} 时出错：{}", groupid, e);
                continue;
            }
        };

        if delete_empty_group(api, &group.groupid, &group.name).await {
            deleted += 1;
        }
    }

    if deleted > 0 {
        info!("清理完成，共删除 {} 个空群组", deleted);
    } else {
        info!("没有空群组需要删除");
    }
    deleted
}
