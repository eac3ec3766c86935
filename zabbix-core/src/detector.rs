use crate::api::ZabbixApi;
use crate::api_types::{
    Host, Item, TemplateRef, Trigger, is_local_template_id, item_type_name, priority_name,
    status_name,
};
use crate::error::{Result, ZabbixError};
use std::ops::AddAssign;
use tracing::{error, info};

/// 主机直接创建的监控项
#[derive(Debug, Clone)]
pub struct NonTemplateItem {
    pub itemid: String,
    pub name: String,
    pub key: String,
    pub status: String,
    pub item_type: String,
    pub delay: String,
}

/// 非模板触发器引用的监控项
#[derive(Debug, Clone)]
pub struct TriggerItemInfo {
    pub name: String,
    pub key: String,
    pub is_template_item: bool,
}

/// 主机直接创建的触发器
#[derive(Debug, Clone)]
pub struct NonTemplateTrigger {
    pub triggerid: String,
    pub description: String,
    pub expression: String,
    pub status: String,
    pub priority: String,
    pub items: Vec<TriggerItemInfo>,
}

#[derive(Debug, Clone)]
pub struct DisabledItem {
    pub itemid: String,
    pub name: String,
    pub key: String,
    pub is_template_item: bool,
    pub template_id: String,
}

#[derive(Debug, Clone)]
pub struct DisabledTrigger {
    pub triggerid: String,
    pub description: String,
    pub is_template_trigger: bool,
    pub template_id: String,
    pub priority: String,
}

/// 模板监控项上挂着的本地触发器
#[derive(Debug, Clone)]
pub struct LocalItemTrigger {
    pub triggerid: String,
    pub description: String,
    pub status: String,
    pub priority: String,
}

#[derive(Debug, Clone)]
pub struct TemplateItemIssue {
    pub item_id: String,
    pub item_name: String,
    pub item_key: String,
    pub template_id: String,
    pub triggers: Vec<LocalItemTrigger>,
}

/// 检测统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DetectionSummary {
    pub non_template_items: usize,
    pub non_template_triggers: usize,
    pub disabled_items: usize,
    pub disabled_triggers: usize,
    pub template_items_with_non_template_triggers: usize,
}

impl AddAssign for DetectionSummary {
    fn add_assign(&mut self, other: Self) {
        self.non_template_items += other.non_template_items;
        self.non_template_triggers += other.non_template_triggers;
        self.disabled_items += other.disabled_items;
        self.disabled_triggers += other.disabled_triggers;
        self.template_items_with_non_template_triggers +=
            other.template_items_with_non_template_triggers;
    }
}

/// 单个主机的检测结果
#[derive(Debug, Clone)]
pub struct HostDetection {
    pub host_name: String,
    pub host_id: String,
    pub templates: Vec<TemplateRef>,
    pub non_template_items: Vec<NonTemplateItem>,
    pub non_template_triggers: Vec<NonTemplateTrigger>,
    pub disabled_items: Vec<DisabledItem>,
    pub disabled_triggers: Vec<DisabledTrigger>,
    pub template_items_with_non_template_triggers: Vec<TemplateItemIssue>,
}

impl HostDetection {
    pub fn summary(&self) -> DetectionSummary {
        DetectionSummary {
            non_template_items: self.non_template_items.len(),
            non_template_triggers: self.non_template_triggers.len(),
            disabled_items: self.disabled_items.len(),
            disabled_triggers: self.disabled_triggers.len(),
            template_items_with_non_template_triggers: self
                .template_items_with_non_template_triggers
                .iter()
                .map(|issue| issue.triggers.len())
                .sum(),
        }
    }
}

/// 检测范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionScope {
    Host(String),
    HostGroup(String),
}

impl DetectionScope {
    pub fn identifier(&self) -> &str {
        match self {
            DetectionScope::Host(name) | DetectionScope::HostGroup(name) => name,
        }
    }
}

/// 检测结果
#[derive(Debug, Clone)]
pub struct DetectionResult {
    pub scope: DetectionScope,
    pub total_hosts: usize,
    pub hosts: Vec<HostDetection>,
}

impl DetectionResult {
    pub fn summary(&self) -> DetectionSummary {
        let mut total = DetectionSummary::default();
        for host in &self.hosts {
            total += host.summary();
        }
        total
    }
}

fn template_id_or_none(templateid: Option<&str>) -> String {
    templateid.unwrap_or("无").to_string()
}

/// 根据监控项与触发器对主机问题分类
pub fn classify_host(host: &Host, items: &[Item], triggers: &[Trigger]) -> HostDetection {
    let mut result = HostDetection {
        host_name: host.name.clone(),
        host_id: host.hostid.clone(),
        templates: host.parent_templates.clone(),
        non_template_items: Vec::new(),
        non_template_triggers: Vec::new(),
        disabled_items: Vec::new(),
        disabled_triggers: Vec::new(),
        template_items_with_non_template_triggers: Vec::new(),
    };

    for item in items {
        if item.is_local() {
            result.non_template_items.push(NonTemplateItem {
                itemid: item.itemid.clone(),
                name: item.name.clone(),
                key: item.key_.clone(),
                status: status_name(item.status.as_deref()).to_string(),
                item_type: item_type_name(item.item_type.as_deref().unwrap_or("0")),
                delay: item.delay.clone().unwrap_or_else(|| "未知".to_string()),
            });
        }

        if item.is_disabled() {
            result.disabled_items.push(DisabledItem {
                itemid: item.itemid.clone(),
                name: item.name.clone(),
                key: item.key_.clone(),
                is_template_item: !item.is_local(),
                template_id: template_id_or_none(item.templateid.as_deref()),
            });
        }

        if !item.is_local() {
            let local: Vec<LocalItemTrigger> = item
                .triggers
                .iter()
                .filter(|t| t.is_local())
                .map(|t| LocalItemTrigger {
                    triggerid: t.triggerid.clone(),
                    description: t.description.clone(),
                    status: status_name(t.status.as_deref()).to_string(),
                    priority: priority_name(t.priority.as_deref().unwrap_or("0")),
                })
                .collect();
            if !local.is_empty() {
                result
                    .template_items_with_non_template_triggers
                    .push(TemplateItemIssue {
                        item_id: item.itemid.clone(),
                        item_name: item.name.clone(),
                        item_key: item.key_.clone(),
                        template_id: template_id_or_none(item.templateid.as_deref()),
                        triggers: local,
                    });
            }
        }
    }

    for trigger in triggers {
        if trigger.is_local() {
            result.non_template_triggers.push(NonTemplateTrigger {
                triggerid: trigger.triggerid.clone(),
                description: trigger.description.clone(),
                expression: trigger.expression.clone(),
                status: status_name(trigger.status.as_deref()).to_string(),
                priority: priority_name(trigger.priority_code()),
                items: trigger
                    .items
                    .iter()
                    .map(|i| TriggerItemInfo {
                        name: i.name.clone(),
                        key: i.key_.clone(),
                        is_template_item: !is_local_template_id(i.templateid.as_deref()),
                    })
                    .collect(),
            });
        }

        if trigger.is_disabled() {
            result.disabled_triggers.push(DisabledTrigger {
                triggerid: trigger.triggerid.clone(),
                description: trigger.description.clone(),
                is_template_trigger: !trigger.is_local(),
                template_id: template_id_or_none(trigger.templateid.as_deref()),
                priority: priority_name(trigger.priority_code()),
            });
        }
    }

    result
}

async fn detect_host_issues<A: ZabbixApi + ?Sized>(api: &A, host: &Host) -> Result<HostDetection> {
    info!("检测主机: {} (ID: {})", host.name, host.hostid);
    let items = api.get_host_items(&host.hostid).await?;
    let triggers = api.get_host_triggers(&host.hostid).await?;
    Ok(classify_host(host, &items, &triggers))
}

/// 按主机名检测
pub async fn detect_by_host<A: ZabbixApi + ?Sized>(api: &A, host_name: &str) -> Result<DetectionResult> {
    info!("开始检测主机: {}", host_name);
    let host = api
        .get_host_by_name(host_name)
        .await?
        .ok_or_else(|| ZabbixError::HostNotFound {
            identifier: host_name.to_string(),
        })?;

    let detection = detect_host_issues(api, &host).await?;
    Ok(DetectionResult {
        scope: DetectionScope::Host(host_name.to_string()),
        total_hosts: 1,
        hosts: vec![detection],
    })
}

/// 按主机组检测，单个主机失败只记录日志
pub async fn detect_by_hostgroup<A: ZabbixApi + ?Sized>(
    api: &A,
    group_name: &str,
) -> Result<DetectionResult> {
    info!("开始检测主机组: {}", group_name);
    let group = api
        .get_groups_by_name(group_name, false)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ZabbixError::GroupNotFound {
            name: group_name.to_string(),
        })?;

    let hosts = api.get_hosts_in_group(&group.groupid).await?;
    if hosts.is_empty() {
        info!("主机组 '{}' 中没有主机", group_name);
    }

    let mut result = DetectionResult {
        scope: DetectionScope::HostGroup(group_name.to_string()),
        total_hosts: hosts.len(),
        hosts: Vec::with_capacity(hosts.len()),
    };
    for host in &hosts {
        match detect_host_issues(api, host).await {
            Ok(detection) => result.hosts.push(detection),
            Err(e) => error!("检测主机 {} 失败: {}", host.name, e),
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> Host {
        serde_json::from_value(serde_json::json!({
            "hostid": "10084",
            "name": "web-01",
            "parentTemplates": [{"templateid": "10001", "name": "Linux by Zabbix agent"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_classify_host() {
        let items: Vec<Item> = serde_json::from_value(serde_json::json!([
            {"itemid": "1", "name": "本地项", "key_": "custom.key", "status": "0", "templateid": "0", "type": "2", "delay": "1m"},
            {"itemid": "2", "name": "CPU", "key_": "system.cpu.util", "status": "1", "templateid": "500",
             "triggers": [
                {"triggerid": "90", "description": "本地CPU告警", "status": "0", "priority": "3", "templateid": "0"},
                {"triggerid": "91", "description": "模板CPU告警", "status": "0", "priority": "3", "templateid": "700"}
             ]}
        ]))
        .unwrap();
        let triggers: Vec<Trigger> = serde_json::from_value(serde_json::json!([
            {"triggerid": "90", "description": "本地CPU告警", "expression": "x>1", "priority": "3", "status": "0", "templateid": "0",
             "items": [{"itemid": "2", "name": "CPU", "key_": "system.cpu.util", "templateid": "500"}]},
            {"triggerid": "92", "description": "禁用的模板触发器", "expression": "y>1", "priority": "5", "status": "1", "templateid": "701"}
        ]))
        .unwrap();

        let detection = classify_host(&host(), &items, &triggers);
        let summary = detection.summary();

        assert_eq!(summary.non_template_items, 1);
        assert_eq!(detection.non_template_items[0].item_type, "Zabbix trapper");
        assert_eq!(summary.disabled_items, 1);
        assert!(detection.disabled_items[0].is_template_item);
        assert_eq!(summary.template_items_with_non_template_triggers, 1);
        assert_eq!(summary.non_template_triggers, 1);
        assert!(detection.non_template_triggers[0].items[0].is_template_item);
        assert_eq!(summary.disabled_triggers, 1);
        assert_eq!(detection.disabled_triggers[0].priority, "灾难");
        assert_eq!(detection.disabled_triggers[0].template_id, "701");
    }

    #[test]
    fn test_summary_add_assign() {
        let mut total = DetectionSummary::default();
        total += DetectionSummary {
            non_template_items: 2,
            disabled_triggers: 1,
            ..Default::default()
        };
        total += DetectionSummary {
            non_template_items: 1,
            ..Default::default()
        };
        assert_eq!(total.non_template_items, 3);
        assert_eq!(total.disabled_triggers, 1);
    }
}
