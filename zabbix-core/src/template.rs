use crate::api::ZabbixApi;
use crate::api_types::{HostRef, Template, TemplateRef};
use crate::error::{Result, ZabbixError};
use std::fmt;
use tracing::{error, info, warn};

/// 模板替换的目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateTarget {
    /// 主机组中链接了旧模板的所有主机
    Group(String),
    /// 按主机名称
    HostName(String),
    /// 按主机ID
    HostId(String),
}

impl fmt::Display for TemplateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateTarget::Group(name) => write!(f, "主机组 '{name}'"),
            TemplateTarget::HostName(name) => write!(f, "主机名称 '{name}'"),
            TemplateTarget::HostId(id) => write!(f, "主机ID '{id}'"),
        }
    }
}

/// 在模板列表中把旧模板换成新模板，其余保持原顺序
///
/// 列表中不含旧模板时返回 None。
pub fn swap_template(current: &[TemplateRef], old_id: &str, new_id: &str) -> Option<Vec<String>> {
    if !current.iter().any(|t| t.templateid == old_id) {
        return None;
    }
    Some(
        current
            .iter()
            .map(|t| {
                if t.templateid == old_id {
                    new_id.to_string()
                } else {
                    t.templateid.clone()
                }
            })
            .collect(),
    )
}

/// 替换单个主机的模板
///
/// 主机不存在或没有链接旧模板时返回 false；API 出错也记录日志并返回 false。
pub async fn replace_host_template<A: ZabbixApi + ?Sized>(
    api: &A,
    hostid: &str,
    old_template_id: &str,
    new_template_id: &str,
) -> bool {
    let result: Result<bool> = async {
        let Some(host) = api.get_host_by_id(hostid).await? else {
            error!("主机 {} 不存在", hostid);
            return Ok(false);
        };

        let Some(templates) = swap_template(&host.parent_templates, old_template_id, new_template_id)
        else {
            warn!("主机 {} 未使用指定的旧模板", host.name);
            return Ok(false);
        };

        api.set_host_templates(hostid, &templates).await?;
        info!("主机 {} 模板替换成功", host.name);
        Ok(true)
    }
    .await;

    result.unwrap_or_else(|e| {
        error!("替换主机 {} 模板失败: {}", hostid, e);
        false
    })
}

/// 模板替换结果
#[derive(Debug, Default, Clone)]
pub struct ReplaceReport {
    /// 需要替换的主机数
    pub candidates: usize,
    /// 替换成功的主机
    pub replaced_hosts: Vec<HostRef>,
}

impl ReplaceReport {
    pub fn success_count(&self) -> usize {
        self.replaced_hosts.len()
    }
}

async fn require_template<A: ZabbixApi + ?Sized>(api: &A, name: &str) -> Result<Template> {
    api.get_template_by_name(name)
        .await?
        .ok_or_else(|| ZabbixError::TemplateNotFound {
            name: name.to_string(),
        })
}

/// 按目标替换模板
///
/// 主机组/主机/模板不存在时返回错误；单个主机替换失败只计入结果。
pub async fn replace_templates<A: ZabbixApi + ?Sized>(
    api: &A,
    target: &TemplateTarget,
    old_template_name: &str,
    new_template_name: &str,
) -> Result<ReplaceReport> {
    info!("开始为 {} 替换模板", target);
    info!("旧模板: {}", old_template_name);
    info!("新模板: {}", new_template_name);

    // 先确定目标存在，再查模板
    let group_id = match target {
        TemplateTarget::Group(name) => {
            let group = api
                .get_groups_by_name(name, false)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| ZabbixError::GroupNotFound { name: name.clone() })?;
            Some(group.groupid)
        }
        _ => None,
    };

    let single_host = match target {
        TemplateTarget::HostName(name) => Some(api.get_host_by_name(name).await?.ok_or_else(
            || ZabbixError::HostNotFound {
                identifier: name.clone(),
            },
        )?),
        TemplateTarget::HostId(id) => Some(api.get_host_by_id(id).await?.ok_or_else(|| {
            ZabbixError::HostNotFound {
                identifier: id.clone(),
            }
        })?),
        TemplateTarget::Group(_) => None,
    };

    let old_template = require_template(api, old_template_name).await?;
    let new_template = require_template(api, new_template_name).await?;

    let hosts = match (group_id, single_host) {
        (Some(groupid), _) => {
            api.get_hosts_in_group_with_template(&groupid, &old_template.templateid)
                .await?
        }
        (None, Some(host)) => vec![host],
        (None, None) => Vec::new(),
    };

    let mut report = ReplaceReport {
        candidates: hosts.len(),
        ..Default::default()
    };
    if hosts.is_empty() {
        info!("{} 中没有使用模板 '{}' 的主机", target, old_template_name);
        return Ok(report);
    }
    info!("找到 {} 个主机需要替换模板", hosts.len());

    for host in &hosts {
        if replace_host_template(
            api,
            &host.hostid,
            &old_template.templateid,
            &new_template.templateid,
        )
        .await
        {
            report.replaced_hosts.push(host.to_host_ref());
        }
    }

    info!(
        "模板替换完成: {}/{} 个主机成功",
        report.success_count(),
        report.candidates
    );
    Ok(report)
}
