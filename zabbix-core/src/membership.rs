//! 主机分组关系维护
//!
//! 下线迁移和回滚恢复都是"改写主机的分组列表"，区别只在于改写策略：
//! - [`MembershipPolicy::Replace`]：主机只保留目标组
//! - [`MembershipPolicy::Restore`]：去掉指定组（下线组），确保包含目标组

use crate::api::ZabbixApi;
use crate::api_types::HostRef;
use crate::error::Result;
use std::collections::HashSet;
use tracing::{error, info, warn};

/// 分组改写策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipPolicy {
    /// 用目标组替换主机原有的全部分组
    Replace,
    /// 移除 `excluded` 中的分组，并确保包含目标组
    Restore { excluded: HashSet<String> },
}

impl MembershipPolicy {
    /// 计算主机新的分组列表，结果永远不为空且不含重复
    pub fn plan(&self, current: &[String], target: &str) -> Vec<String> {
        match self {
            MembershipPolicy::Replace => vec![target.to_string()],
            MembershipPolicy::Restore { excluded } => {
                let mut groups: Vec<String> = Vec::with_capacity(current.len() + 1);
                for gid in current {
                    if !excluded.contains(gid) && !groups.contains(gid) {
                        groups.push(gid.clone());
                    }
                }
                if !groups.iter().any(|g| g == target) {
                    groups.push(target.to_string());
                }
                groups
            }
        }
    }

    /// 是否需要先读取主机当前分组
    fn needs_current(&self) -> bool {
        matches!(self, MembershipPolicy::Restore { .. })
    }
}

/// 按策略改写单个主机的分组，主机不存在时返回 false
pub async fn apply_membership<A: ZabbixApi + ?Sized>(
    api: &A,
    hostid: &str,
    target_groupid: &str,
    policy: &MembershipPolicy,
) -> Result<bool> {
    let current = if policy.needs_current() {
        match api.get_host_group_ids(hostid).await? {
            Some(ids) => ids,
            None => {
                warn!("主机 {} 不存在，跳过", hostid);
                return Ok(false);
            }
        }
    } else {
        Vec::new()
    };

    let groups = policy.plan(&current, target_groupid);
    api.set_host_groups(hostid, &groups).await?;
    Ok(true)
}

/// 按名称查找分组，不存在时创建，返回 groupid
pub async fn ensure_group<A: ZabbixApi + ?Sized>(api: &A, name: &str) -> Result<String> {
    let groups = api.get_groups_by_name(name, false).await?;
    if let Some(group) = groups.into_iter().next() {
        return Ok(group.groupid);
    }

    let groupid = api.create_group(name).await?;
    info!("已创建分组 '{}' (ID: {})", name, groupid);
    Ok(groupid)
}

/// 按名称查找分组ID集合（可能为空）
pub async fn group_ids_by_name<A: ZabbixApi + ?Sized>(
    api: &A,
    name: &str,
) -> Result<HashSet<String>> {
    Ok(api
        .get_groups_by_name(name, false)
        .await?
        .into_iter()
        .map(|g| g.groupid)
        .collect())
}

/// 将主机整体迁移到指定分组（替换原有分组）
///
/// 没有主机时不做任何调用，返回 None；否则返回目标组ID。
/// 任一主机失败即返回错误。
pub async fn move_hosts_to_group<A: ZabbixApi + ?Sized>(
    api: &A,
    hostids: &[String],
    target_group_name: &str,
) -> Result<Option<String>> {
    if hostids.is_empty() {
        return Ok(None);
    }

    let target = ensure_group(api, target_group_name).await?;
    for hostid in hostids {
        apply_membership(api, hostid, &target, &MembershipPolicy::Replace).await?;
    }
    Ok(Some(target))
}

/// 主机恢复统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RestoreStats {
    pub restored: usize,
    pub missing: usize,
    pub failed: usize,
}

/// 将快照中的主机恢复到目标组，并移除下线分组
///
/// 单个主机失败只记录日志，不影响其他主机。
pub async fn restore_hosts_to_group<A: ZabbixApi + ?Sized>(
    api: &A,
    hosts: &[HostRef],
    target_groupid: &str,
    group_name: &str,
    offline_group_name: &str,
) -> Result<RestoreStats> {
    let mut stats = RestoreStats::default();
    if hosts.is_empty() {
        info!("[跳过] 分组 '{}' 没有需要恢复的主机", group_name);
        return Ok(stats);
    }

    info!("[恢复主机] 开始恢复 {} 个主机到分组 '{}'", hosts.len(), group_name);
    let policy = MembershipPolicy::Restore {
        excluded: group_ids_by_name(api, offline_group_name).await?,
    };

    for host in hosts {
        let hostname = if host.name.is_empty() {
            "未知名称"
        } else {
            host.name.as_str()
        };
        match apply_membership(api, &host.hostid, target_groupid, &policy).await {
            Ok(true) => {
                info!("[恢复主机] ID: {}, 名称: {}, 结果: 成功", host.hostid, hostname);
                stats.restored += 1;
            }
            Ok(false) => stats.missing += 1,
            Err(e) => {
                error!(
                    "[主机恢复失败] ID: {}, 名称: {}, 错误: {}",
                    host.hostid, hostname, e
                );
                stats.failed += 1;
            }
        }
    }

    Ok(stats)
}
