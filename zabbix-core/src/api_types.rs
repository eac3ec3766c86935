use serde::{Deserialize, Serialize};

// ============================================================================
// JSON-RPC 基础结构
// ============================================================================

/// JSON-RPC 2.0 请求
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: serde_json::Value,
    pub id: u64,
}

/// JSON-RPC 2.0 响应
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 错误体
#[derive(Debug, Deserialize)]
pub struct JsonRpcError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<String>,
}

/// `*.create` / `*.delete` 的返回值
#[derive(Debug, Deserialize)]
pub struct GroupIdsResponse {
    pub groupids: Vec<String>,
}

// ============================================================================
// 实体
// ============================================================================

/// templateid 为空或 "0" 时，说明该监控项/触发器直接建在主机上，不是从模板继承的
pub fn is_local_template_id(templateid: Option<&str>) -> bool {
    match templateid {
        None => true,
        Some(id) => id.is_empty() || id == "0",
    }
}

/// 主机组
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostGroup {
    pub groupid: String,
    pub name: String,
    #[serde(default)]
    pub hosts: Vec<HostRef>,
}

/// 主机引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRef {
    pub hostid: String,
    #[serde(default)]
    pub name: String,
}

/// 只带名称的引用（trigger.get selectHosts: ["name"]）
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NameRef {
    #[serde(default)]
    pub name: String,
}

/// 分组引用（host.get selectGroups）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub groupid: String,
}

/// 模板引用（selectParentTemplates）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateRef {
    pub templateid: String,
    #[serde(default)]
    pub name: String,
}

/// 主机
#[derive(Debug, Clone, Deserialize)]
pub struct Host {
    pub hostid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub groups: Vec<GroupRef>,
    #[serde(default, rename = "parentTemplates")]
    pub parent_templates: Vec<TemplateRef>,
}

impl Host {
    pub fn to_host_ref(&self) -> HostRef {
        HostRef {
            hostid: self.hostid.clone(),
            name: self.name.clone(),
        }
    }

    pub fn template_ids(&self) -> Vec<String> {
        self.parent_templates
            .iter()
            .map(|t| t.templateid.clone())
            .collect()
    }
}

/// 模板
#[derive(Debug, Clone, Deserialize)]
pub struct Template {
    pub templateid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "parentTemplates")]
    pub parent_templates: Vec<TemplateRef>,
}

/// 触发器关联的监控项
#[derive(Debug, Clone, Deserialize)]
pub struct ItemRef {
    #[serde(default)]
    pub itemid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub key_: String,
    #[serde(default)]
    pub templateid: Option<String>,
}

impl ItemRef {
    pub fn is_template_item(&self) -> bool {
        !is_local_template_id(self.templateid.as_deref())
    }
}

/// 触发器
#[derive(Debug, Clone, Deserialize)]
pub struct Trigger {
    pub triggerid: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub expression: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub templateid: Option<String>,
    #[serde(default)]
    pub flags: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemRef>,
    /// 触发器所属的主机/模板
    #[serde(default)]
    pub hosts: Vec<NameRef>,
}

impl Trigger {
    pub fn is_local(&self) -> bool {
        is_local_template_id(self.templateid.as_deref())
    }

    pub fn is_disabled(&self) -> bool {
        self.status.as_deref() == Some("1")
    }

    /// flags 缺省按 0（普通触发器）处理
    pub fn flags_value(&self) -> u32 {
        self.flags
            .as_deref()
            .and_then(|f| f.parse().ok())
            .unwrap_or(0)
    }

    pub fn priority_code(&self) -> &str {
        self.priority.as_deref().unwrap_or("0")
    }
}

/// 监控项上挂的触发器（item.get selectTriggers）
#[derive(Debug, Clone, Deserialize)]
pub struct ItemTrigger {
    pub triggerid: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub templateid: Option<String>,
}

impl ItemTrigger {
    pub fn is_local(&self) -> bool {
        is_local_template_id(self.templateid.as_deref())
    }

    pub fn is_disabled(&self) -> bool {
        self.status.as_deref() == Some("1")
    }
}

/// 监控项
#[derive(Debug, Clone, Deserialize)]
pub struct Item {
    pub itemid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub key_: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub templateid: Option<String>,
    #[serde(default, rename = "type")]
    pub item_type: Option<String>,
    #[serde(default)]
    pub delay: Option<String>,
    #[serde(default)]
    pub triggers: Vec<ItemTrigger>,
}

impl Item {
    pub fn is_local(&self) -> bool {
        is_local_template_id(self.templateid.as_deref())
    }

    pub fn is_disabled(&self) -> bool {
        self.status.as_deref() == Some("1")
    }
}

/// 用户宏
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserMacro {
    #[serde(rename = "macro")]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

// ============================================================================
// 显示名称
// ============================================================================

/// 触发器优先级名称
pub fn priority_name(priority: &str) -> String {
    match priority {
        "0" => "未分类".to_string(),
        "1" => "信息".to_string(),
        "2" => "警告".to_string(),
        "3" => "一般严重".to_string(),
        "4" => "严重".to_string(),
        "5" => "灾难".to_string(),
        other => format!("未知优先级({other})"),
    }
}

/// 启用/禁用状态名称
pub fn status_name(status: Option<&str>) -> &'static str {
    match status {
        Some("1") => "禁用",
        _ => "启用",
    }
}

/// 监控项类型名称
pub fn item_type_name(item_type: &str) -> String {
    let name = match item_type {
        "0" => "Zabbix agent",
        "1" => "SNMPv1 agent",
        "2" => "Zabbix trapper",
        "3" => "Simple check",
        "4" => "SNMPv2 agent",
        "5" => "Zabbix internal",
        "6" => "SNMPv3 agent",
        "7" => "Zabbix agent (active)",
        "8" => "Zabbix aggregate",
        "9" => "Web item",
        "10" => "External check",
        "11" => "Database monitor",
        "12" => "IPMI agent",
        "13" => "SSH agent",
        "14" => "TELNET agent",
        "15" => "Calculated",
        "16" => "JMX agent",
        "17" => "SNMP trap",
        "18" => "Dependent item",
        "19" => "HTTP agent",
        "20" => "SNMP agent",
        "21" => "Script",
        other => return format!("未知类型({other})"),
    };
    name.to_string()
}
