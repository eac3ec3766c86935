//! 非模板触发器检查与删除
//!
//! 模板替换之后，主机上直接创建的触发器往往与新模板重复。这里负责
//! 找出它们、整理成报告记录，并按用户选择删除。

use crate::api::ZabbixApi;
use crate::api_types::{HostRef, Trigger, priority_name, status_name};
use crate::error::{Result, ZabbixError};
use std::fmt;
use tracing::{error, info, warn};

/// 预览时展示的条数
pub const PREVIEW_LIMIT: usize = 5;

/// 触发器关联的监控项（名称、键值）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedItem {
    pub name: String,
    pub key: String,
}

/// 一条非模板触发器记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRecord {
    pub host_name: String,
    pub host_id: String,
    pub trigger_id: String,
    pub description: String,
    pub expression: String,
    /// 优先级名称
    pub priority: String,
    /// 启用 / 禁用
    pub status: String,
    pub items: Vec<LinkedItem>,
}

impl TriggerRecord {
    pub fn from_trigger(host: &HostRef, trigger: &Trigger) -> Self {
        let or_default = |value: &str, fallback: &str| {
            if value.is_empty() {
                fallback.to_string()
            } else {
                value.to_string()
            }
        };

        Self {
            host_name: host.name.clone(),
            host_id: host.hostid.clone(),
            trigger_id: trigger.triggerid.clone(),
            description: or_default(&trigger.description, "无描述"),
            expression: or_default(&trigger.expression, "无表达式"),
            priority: priority_name(trigger.priority_code()),
            status: status_name(trigger.status.as_deref()).to_string(),
            items: trigger
                .items
                .iter()
                .map(|item| LinkedItem {
                    name: or_default(&item.name, "未知监控项"),
                    key: or_default(&item.key_, "未知键值"),
                })
                .collect(),
        }
    }

    /// 一行预览文本
    pub fn preview(&self) -> String {
        format!(
            "主机: {} | 触发器: {} | 优先级: {}",
            self.host_name, self.description, self.priority
        )
    }
}

/// 分析单个主机的非模板触发器，出错时记录日志并返回空列表
pub async fn analyze_host_triggers<A: ZabbixApi + ?Sized>(
    api: &A,
    host: &HostRef,
) -> Vec<TriggerRecord> {
    match api.get_host_own_triggers(&host.hostid).await {
        Ok(triggers) => triggers
            .iter()
            .filter(|t| t.is_local() && t.flags_value() == 0)
            .map(|t| TriggerRecord::from_trigger(host, t))
            .collect(),
        Err(e) => {
            error!("获取主机 {} 的非模板触发器失败: {}", host.hostid, e);
            Vec::new()
        }
    }
}

/// 依次分析多台主机
pub async fn analyze_hosts<A: ZabbixApi + ?Sized>(
    api: &A,
    hosts: &[HostRef],
) -> Vec<TriggerRecord> {
    let mut records = Vec::new();
    for host in hosts {
        records.extend(analyze_host_triggers(api, host).await);
    }
    records
}

/// 检查范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckScope {
    Host(String),
    Group(String),
}

/// 按主机名或主机组名收集非模板触发器
pub async fn collect_triggers<A: ZabbixApi + ?Sized>(
    api: &A,
    scope: &CheckScope,
) -> Result<Vec<TriggerRecord>> {
    let hosts: Vec<HostRef> = match scope {
        CheckScope::Host(name) => {
            let host = api
                .get_host_by_name(name)
                .await?
                .ok_or_else(|| ZabbixError::HostNotFound {
                    identifier: name.clone(),
                })?;
            vec![host.to_host_ref()]
        }
        CheckScope::Group(name) => {
            let group = api
                .get_groups_by_name(name, false)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| ZabbixError::GroupNotFound { name: name.clone() })?;
            api.get_hosts_in_group(&group.groupid)
                .await?
                .iter()
                .map(|h| h.to_host_ref())
                .collect()
        }
    };

    Ok(analyze_hosts(api, &hosts).await)
}

/// 删除确认菜单的选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionChoice {
    /// 1：删除全部
    DeleteAll,
    /// 2：手动选择
    Select,
    /// 3：跳过
    Skip,
    /// 其他输入，按跳过处理
    Invalid,
}

impl DeletionChoice {
    pub fn parse(input: &str) -> Self {
        match input.trim() {
            "1" => DeletionChoice::DeleteAll,
            "2" => DeletionChoice::Select,
            "3" => DeletionChoice::Skip,
            _ => DeletionChoice::Invalid,
        }
    }
}

impl fmt::Display for DeletionChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DeletionChoice::DeleteAll => "删除所有非模板触发器",
            DeletionChoice::Select => "手动选择删除",
            DeletionChoice::Skip => "跳过删除",
            DeletionChoice::Invalid => "无效选择",
        };
        write!(f, "{text}")
    }
}

/// 手动选择的解析结果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexSelection {
    /// 有效的 0 基下标（保持输入顺序）
    pub indices: Vec<usize>,
    /// 超出范围的 1 基编号
    pub out_of_range: Vec<i64>,
}

impl IndexSelection {
    /// 选择的编号总数（含无效编号）
    pub fn requested(&self) -> usize {
        self.indices.len() + self.out_of_range.len()
    }
}

/// 解析 "1,3,5" 形式的 1 基编号
///
/// 任一项不是数字时整体报错，不会删除任何触发器。
pub fn parse_index_selection(input: &str, len: usize) -> Result<IndexSelection> {
    let input = input.trim();
    let mut selection = IndexSelection::default();
    if input.is_empty() {
        return Ok(selection);
    }

    let numbers = input
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<i64>()
                .map_err(|_| ZabbixError::config(format!("输入格式错误，'{}' 不是有效的数字", part.trim())))
        })
        .collect::<Result<Vec<i64>>>()?;

    for number in numbers {
        if number >= 1 && (number as usize) <= len {
            selection.indices.push(number as usize - 1);
        } else {
            selection.out_of_range.push(number);
        }
    }
    Ok(selection)
}

/// 删除给定的触发器，返回成功数量
pub async fn delete_triggers<A: ZabbixApi + ?Sized>(api: &A, records: &[&TriggerRecord]) -> usize {
    let mut deleted = 0;
    for record in records {
        match api.delete_trigger(&record.trigger_id).await {
            Ok(()) => {
                deleted += 1;
                info!(
                    "已删除触发器: {} (主机: {})",
                    record.description, record.host_name
                );
            }
            Err(e) => error!("删除触发器 {} 失败: {}", record.trigger_id, e),
        }
    }
    deleted
}

/// 删除全部记录
pub async fn delete_all<A: ZabbixApi + ?Sized>(api: &A, records: &[TriggerRecord]) -> usize {
    info!("开始删除所有非模板触发器...");
    let refs: Vec<&TriggerRecord> = records.iter().collect();
    let deleted = delete_triggers(api, &refs).await;
    info!("删除完成: {}/{} 个触发器成功删除", deleted, records.len());
    deleted
}

/// 按手动选择删除
pub async fn delete_selected<A: ZabbixApi + ?Sized>(
    api: &A,
    records: &[TriggerRecord],
    selection: &IndexSelection,
) -> usize {
    for number in &selection.out_of_range {
        warn!("无效编号: {}", number);
    }
    let chosen: Vec<&TriggerRecord> = selection
        .indices
        .iter()
        .filter_map(|&i| records.get(i))
        .collect();
    let deleted = delete_triggers(api, &chosen).await;
    info!(
        "删除完成: {}/{} 个选中的触发器成功删除",
        deleted,
        selection.requested()
    );
    deleted
}
