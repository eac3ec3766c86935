//! 集成测试共用的内存版 Zabbix
#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use zabbix_core::{Result, ZabbixApi, ZabbixError};

#[derive(Debug, Clone, Default)]
pub struct FakeHost {
    pub name: String,
    pub groups: Vec<String>,
    pub templates: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    groups: BTreeMap<String, String>,
    hosts: BTreeMap<String, FakeHost>,
    templates: BTreeMap<String, String>,
    template_parents: BTreeMap<String, Vec<String>>,
    /// 每条触发器需带 "hostid"
    triggers: Vec<Value>,
    /// 每条监控项需带 "hostid"，按触发器查询时匹配可选的 "triggerid"
    items: Vec<Value>,
    macros: BTreeMap<String, Vec<(String, String)>>,
    calls: Vec<(String, Value)>,
    failing: HashSet<String>,
}

/// 只实现测试需要的那部分 API 语义
#[derive(Debug, Default)]
pub struct FakeZabbix {
    state: Mutex<State>,
}

fn id_list(value: Option<&Value>) -> Option<Vec<String>> {
    let value = value?;
    let ids = match value {
        Value::Array(list) => list.iter().filter_map(scalar_string).collect(),
        other => scalar_string(other).into_iter().collect(),
    };
    Some(ids)
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_local(value: &Value) -> bool {
    match value.get("templateid").and_then(Value::as_str) {
        None => true,
        Some(id) => id.is_empty() || id == "0",
    }
}

fn api_error(message: &str) -> ZabbixError {
    ZabbixError::Api {
        code: -32602,
        message: "Invalid params.".to_string(),
        data: Some(message.to_string()),
    }
}

impl FakeZabbix {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.state.lock().unwrap().next_id = 1000;
        fake
    }

    fn next_id(state: &mut State) -> String {
        state.next_id += 1;
        state.next_id.to_string()
    }

    pub fn add_group(&self, name: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let id = Self::next_id(&mut state);
        state.groups.insert(id.clone(), name.to_string());
        id
    }

    pub fn add_host(&self, name: &str, groups: &[&str]) -> String {
        let mut state = self.state.lock().unwrap();
        let id = Self::next_id(&mut state);
        state.hosts.insert(
            id.clone(),
            FakeHost {
                name: name.to_string(),
                groups: groups.iter().map(|g| g.to_string()).collect(),
                templates: Vec::new(),
            },
        );
        id
    }

    pub fn add_template(&self, name: &str) -> String {
        let mut state = self.state.lock().unwrap();
        let id = Self::next_id(&mut state);
        state.templates.insert(id.clone(), name.to_string());
        id
    }

    pub fn link_templates(&self, hostid: &str, templates: &[&str]) {
        let mut state = self.state.lock().unwrap();
        if let Some(host) = state.hosts.get_mut(hostid) {
            host.templates = templates.iter().map(|t| t.to_string()).collect();
        }
    }

    pub fn set_template_parents(&self, templateid: &str, parents: &[&str]) {
        self.state.lock().unwrap().template_parents.insert(
            templateid.to_string(),
            parents.iter().map(|p| p.to_string()).collect(),
        );
    }

    pub fn add_trigger(&self, trigger: Value) {
        self.state.lock().unwrap().triggers.push(trigger);
    }

    pub fn add_item(&self, item: Value) {
        self.state.lock().unwrap().items.push(item);
    }

    pub fn add_macro(&self, owner_id: &str, name: &str, value: &str) {
        self.state
            .lock()
            .unwrap()
            .macros
            .entry(owner_id.to_string())
            .or_default()
            .push((name.to_string(), value.to_string()));
    }

    /// 让某个方法之后的调用都返回 API 错误
    pub fn fail_method(&self, method: &str) {
        self.state.lock().unwrap().failing.insert(method.to_string());
    }

    pub fn remove_group(&self, groupid: &str) {
        self.state.lock().unwrap().groups.remove(groupid);
    }

    pub fn group_name(&self, groupid: &str) -> Option<String> {
        self.state.lock().unwrap().groups.get(groupid).cloned()
    }

    pub fn group_id(&self, name: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .groups
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(id, _)| id.clone())
    }

    pub fn group_names(&self) -> Vec<String> {
        self.state.lock().unwrap().groups.values().cloned().collect()
    }

    pub fn host(&self, hostid: &str) -> FakeHost {
        self.state.lock().unwrap().hosts[hostid].clone()
    }

    pub fn trigger_ids(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .triggers
            .iter()
            .filter_map(|t| t["triggerid"].as_str().map(String::from))
            .collect()
    }

    /// (hostid, 分组集合)，用于比较成员关系
    pub fn membership(&self) -> BTreeMap<String, Vec<String>> {
        self.state
            .lock()
            .unwrap()
            .hosts
            .iter()
            .map(|(id, h)| {
                let mut groups = h.groups.clone();
                groups.sort();
                (id.clone(), groups)
            })
            .collect()
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls().iter().filter(|(m, _)| m == method).count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    fn hosts_json(state: &State, ids: &[String], params: &Value) -> Vec<Value> {
        ids.iter()
            .filter_map(|id| state.hosts.get(id).map(|h| (id, h)))
            .map(|(id, host)| {
                let mut value = json!({"hostid": id, "name": host.name});
                if params.get("selectGroups").is_some() {
                    value["groups"] = host
                        .groups
                        .iter()
                        .map(|g| json!({"groupid": g}))
                        .collect();
                }
                if params.get("selectParentTemplates").is_some() {
                    value["parentTemplates"] = host
                        .templates
                        .iter()
                        .map(|t| {
                            json!({
                                "templateid": t,
                                "name": state.templates.get(t).cloned().unwrap_or_default()
                            })
                        })
                        .collect();
                }
                value
            })
            .collect()
    }

    fn hostgroup_get(state: &State, params: &Value) -> Value {
        let name_filter = params.pointer("/filter/name").and_then(Value::as_str);
        let id_filter = id_list(params.get("groupids"));
        let with_hosts = params.get("selectHosts").is_some();

        let groups: Vec<Value> = state
            .groups
            .iter()
            .filter(|(_, name)| name_filter.is_none_or(|f| f == name.as_str()))
            .filter(|(id, _)| id_filter.as_ref().is_none_or(|ids| ids.contains(id)))
            .map(|(id, name)| {
                let mut value = json!({"groupid": id, "name": name});
                if with_hosts {
                    value["hosts"] = state
                        .hosts
                        .iter()
                        .filter(|(_, h)| h.groups.contains(id))
                        .map(|(hid, h)| json!({"hostid": hid, "name": h.name}))
                        .collect();
                }
                value
            })
            .collect();
        Value::Array(groups)
    }

    fn host_get(state: &State, params: &Value) -> Value {
        let name_filter = params.pointer("/filter/name").and_then(Value::as_str);
        let host_ids = id_list(params.get("hostids"));
        let group_ids = id_list(params.get("groupids"));
        let template_ids = id_list(params.get("templateids"));
        let limit = params.get("limit").and_then(Value::as_u64);

        let mut ids: Vec<String> = state
            .hosts
            .iter()
            .filter(|(id, _)| host_ids.as_ref().is_none_or(|ids| ids.contains(id)))
            .filter(|(_, h)| name_filter.is_none_or(|f| f == h.name))
            .filter(|(_, h)| {
                group_ids
                    .as_ref()
                    .is_none_or(|ids| h.groups.iter().any(|g| ids.contains(g)))
            })
            .filter(|(_, h)| {
                template_ids
                    .as_ref()
                    .is_none_or(|ids| h.templates.iter().any(|t| ids.contains(t)))
            })
            .map(|(id, _)| id.clone())
            .collect();
        if let Some(limit) = limit {
            ids.truncate(limit as usize);
        }
        Value::Array(Self::hosts_json(state, &ids, params))
    }

    fn trigger_get(state: &State, params: &Value) -> Value {
        let host_ids = id_list(params.get("hostids"));
        let template_ids = id_list(params.get("templateids"));
        let only_own = params.get("inherited") == Some(&Value::Bool(false));
        let flags = params.pointer("/filter/flags").and_then(Value::as_u64);

        let triggers: Vec<Value> = state
            .triggers
            .iter()
            .filter(|t| {
                let owner = t["hostid"].as_str().unwrap_or_default().to_string();
                host_ids.as_ref().is_none_or(|ids| ids.contains(&owner))
                    && template_ids.as_ref().is_none_or(|ids| ids.contains(&owner))
            })
            .filter(|t| !only_own || is_local(t))
            .filter(|t| {
                flags.is_none_or(|f| {
                    t.get("flags")
                        .and_then(Value::as_str)
                        .unwrap_or("0")
                        .parse::<u64>()
                        .unwrap_or(0)
                        == f
                })
            })
            .map(|t| {
                let mut value = t.clone();
                if params.get("selectHosts").is_some() {
                    let owner = t["hostid"].as_str().unwrap_or_default();
                    let name = state
                        .templates
                        .get(owner)
                        .cloned()
                        .or_else(|| state.hosts.get(owner).map(|h| h.name.clone()))
                        .unwrap_or_default();
                    value["hosts"] = json!([{"name": name}]);
                }
                value
            })
            .collect();
        Value::Array(triggers)
    }

    fn handle(&self, state: &mut State, method: &str, params: &Value) -> Result<Value> {
        match method {
            "hostgroup.get" => Ok(Self::hostgroup_get(state, params)),
            "hostgroup.create" => {
                let name = params["name"].as_str().unwrap_or_default().to_string();
                if state.groups.values().any(|n| *n == name) {
                    return Err(api_error(&format!("Host group \"{name}\" already exists.")));
                }
                let id = Self::next_id(state);
                state.groups.insert(id.clone(), name);
                Ok(json!({"groupids": [id]}))
            }
            "hostgroup.update" => {
                let id = params["groupid"].as_str().unwrap_or_default();
                let name = params["name"].as_str().unwrap_or_default().to_string();
                match state.groups.get_mut(id) {
                    Some(current) => {
                        *current = name;
                        Ok(json!({"groupids": [id]}))
                    }
                    None => Err(api_error("No permissions to referred object or it does not exist!")),
                }
            }
            "hostgroup.delete" => {
                let ids = id_list(Some(params)).unwrap_or_default();
                for id in &ids {
                    if state.hosts.values().any(|h| h.groups.contains(id)) {
                        return Err(api_error("Host group is not empty."));
                    }
                    state.groups.remove(id);
                }
                Ok(json!({"groupids": ids}))
            }
            "host.get" => Ok(Self::host_get(state, params)),
            "host.update" => {
                let id = params["hostid"].as_str().unwrap_or_default().to_string();
                let Some(host) = state.hosts.get_mut(&id) else {
                    return Err(api_error("No permissions to referred object or it does not exist!"));
                };
                if let Some(groups) = params.get("groups").and_then(Value::as_array) {
                    if groups.is_empty() {
                        return Err(api_error("Host must have at least one group."));
                    }
                    host.groups = groups
                        .iter()
                        .filter_map(|g| g["groupid"].as_str().map(String::from))
                        .collect();
                }
                if let Some(templates) = params.get("templates").and_then(Value::as_array) {
                    host.templates = templates
                        .iter()
                        .filter_map(|t| t["templateid"].as_str().map(String::from))
                        .collect();
                }
                Ok(json!({"hostids": [id]}))
            }
            "template.get" => {
                let name_filter = params.pointer("/filter/name").and_then(Value::as_str);
                let templates: Vec<Value> = state
                    .templates
                    .iter()
                    .filter(|(_, name)| name_filter.is_none_or(|f| f == name.as_str()))
                    .map(|(id, name)| {
                        let mut value = json!({"templateid": id, "name": name});
                        if params.get("selectParentTemplates").is_some() {
                            value["parentTemplates"] = state
                                .template_parents
                                .get(id)
                                .into_iter()
                                .flatten()
                                .map(|p| {
                                    json!({
                                        "templateid": p,
                                        "name": state.templates.get(p).cloned().unwrap_or_default()
                                    })
                                })
                                .collect();
                        }
                        value
                    })
                    .collect();
                Ok(Value::Array(templates))
            }
            "trigger.get" => Ok(Self::trigger_get(state, params)),
            "trigger.delete" => {
                let ids = id_list(Some(params)).unwrap_or_default();
                state
                    .triggers
                    .retain(|t| !ids.iter().any(|id| t["triggerid"].as_str() == Some(id)));
                Ok(json!({"triggerids": ids}))
            }
            "item.get" => {
                let host_ids = id_list(params.get("hostids"));
                let trigger_ids = id_list(params.get("triggerids"));
                let items: Vec<Value> = state
                    .items
                    .iter()
                    .filter(|i| {
                        let owner = i["hostid"].as_str().unwrap_or_default().to_string();
                        host_ids.as_ref().is_none_or(|ids| ids.contains(&owner))
                    })
                    .filter(|i| {
                        let trigger = i["triggerid"].as_str().unwrap_or_default().to_string();
                        trigger_ids.as_ref().is_none_or(|ids| ids.contains(&trigger))
                    })
                    .cloned()
                    .collect();
                Ok(Value::Array(items))
            }
            "usermacro.get" => {
                let owners = id_list(params.get("hostids")).unwrap_or_default();
                let macros: Vec<Value> = owners
                    .iter()
                    .filter_map(|o| state.macros.get(o))
                    .flatten()
                    .map(|(name, value)| json!({"macro": name, "value": value}))
                    .collect();
                Ok(Value::Array(macros))
            }
            other => Err(api_error(&format!("unsupported method {other}"))),
        }
    }
}

#[async_trait]
impl ZabbixApi for FakeZabbix {
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((method.to_string(), params.clone()));
        if state.failing.contains(method) {
            return Err(api_error("injected failure"));
        }
        self.handle(&mut state, method, &params)
    }
}
