use crate::api_types::*;
use crate::config::ZabbixConfig;
use crate::constants::api;
use crate::error::{Result, ZabbixError};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// 把 JSON-RPC result 解析成具体类型
fn decode<T: DeserializeOwned>(method: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| ZabbixError::unexpected(method, e.to_string()))
}

fn first<T>(mut list: Vec<T>) -> Option<T> {
    if list.is_empty() {
        None
    } else {
        Some(list.swap_remove(0))
    }
}

/// Zabbix API 调用接口
///
/// 只需实现 [`ZabbixApi::call`]，其余方法都是基于它的类型化封装。
/// 所有工作流（改名、回滚、模板替换、检测）都只依赖这个 trait。
#[async_trait]
pub trait ZabbixApi: Send + Sync {
    /// 调用任意 API 方法，返回 JSON-RPC 的 result 字段
    async fn call(&self, method: &str, params: Value) -> Result<Value>;

    // ------------------------------------------------------------------
    // hostgroup.*
    // ------------------------------------------------------------------

    /// 按名称精确查找主机组
    async fn get_groups_by_name(&self, name: &str, with_hosts: bool) -> Result<Vec<HostGroup>> {
        let mut params = json!({
            "filter": {"name": name},
            "output": ["groupid", "name"],
        });
        if with_hosts {
            params["selectHosts"] = json!(["hostid", "name"]);
        }
        decode("hostgroup.get", self.call("hostgroup.get", params).await?)
    }

    async fn get_group_by_id(&self, groupid: &str) -> Result<Option<HostGroup>> {
        let params = json!({
            "output": ["groupid", "name"],
            "groupids": [groupid],
        });
        let groups: Vec<HostGroup> =
            decode("hostgroup.get", self.call("hostgroup.get", params).await?)?;
        Ok(first(groups))
    }

    /// 一次性拉取所有主机组及其主机
    async fn get_all_groups_with_hosts(&self) -> Result<Vec<HostGroup>> {
        let params = json!({
            "output": ["groupid", "name"],
            "selectHosts": ["hostid", "name"],
        });
        decode("hostgroup.get", self.call("hostgroup.get", params).await?)
    }

    /// 创建主机组，返回新的 groupid
    async fn create_group(&self, name: &str) -> Result<String> {
        let created: GroupIdsResponse = decode(
            "hostgroup.create",
            self.call("hostgroup.create", json!({"name": name})).await?,
        )?;
        first(created.groupids)
            .ok_or_else(|| ZabbixError::unexpected("hostgroup.create", "groupids 为空"))
    }

    async fn rename_group(&self, groupid: &str, name: &str) -> Result<()> {
        self.call(
            "hostgroup.update",
            json!({"groupid": groupid, "name": name}),
        )
        .await?;
        Ok(())
    }

    async fn delete_group(&self, groupid: &str) -> Result<()> {
        self.call("hostgroup.delete", json!([groupid])).await?;
        Ok(())
    }

    /// 主机组下是否还有主机（只取一条）
    async fn group_has_hosts(&self, groupid: &str) -> Result<bool> {
        let params = json!({
            "output": ["hostid"],
            "groupids": [groupid],
            "limit": 1,
        });
        let hosts: Vec<HostRef> = decode("host.get", self.call("host.get", params).await?)?;
        Ok(!hosts.is_empty())
    }

    // ------------------------------------------------------------------
    // host.*
    // ------------------------------------------------------------------

    /// 获取主机当前所属的分组ID，主机不存在时返回 None
    async fn get_host_group_ids(&self, hostid: &str) -> Result<Option<Vec<String>>> {
        let params = json!({
            "output": ["hostid"],
            "selectGroups": ["groupid"],
            "hostids": hostid,
        });
        let hosts: Vec<Host> = decode("host.get", self.call("host.get", params).await?)?;
        Ok(first(hosts).map(|h| h.groups.into_iter().map(|g| g.groupid).collect()))
    }

    /// 覆盖主机的分组列表
    async fn set_host_groups(&self, hostid: &str, groupids: &[String]) -> Result<()> {
        let groups: Vec<Value> = groupids.iter().map(|id| json!({"groupid": id})).collect();
        self.call(
            "host.update",
            json!({"hostid": hostid, "groups": groups}),
        )
        .await?;
        Ok(())
    }

    async fn get_host_by_id(&self, hostid: &str) -> Result<Option<Host>> {
        let params = json!({
            "output": ["hostid", "name"],
            "hostids": hostid,
            "selectParentTemplates": ["templateid", "name"],
        });
        let hosts: Vec<Host> = decode("host.get", self.call("host.get", params).await?)?;
        Ok(first(hosts))
    }

    async fn get_host_by_name(&self, name: &str) -> Result<Option<Host>> {
        let params = json!({
            "output": ["hostid", "name"],
            "filter": {"name": name},
            "selectParentTemplates": ["templateid", "name"],
        });
        let hosts: Vec<Host> = decode("host.get", self.call("host.get", params).await?)?;
        Ok(first(hosts))
    }

    async fn get_hosts_in_group(&self, groupid: &str) -> Result<Vec<Host>> {
        let params = json!({
            "output": ["hostid", "name"],
            "groupids": groupid,
            "selectParentTemplates": ["templateid", "name"],
        });
        decode("host.get", self.call("host.get", params).await?)
    }

    /// 获取主机组中链接了指定模板的主机
    async fn get_hosts_in_group_with_template(
        &self,
        groupid: &str,
        templateid: &str,
    ) -> Result<Vec<Host>> {
        let params = json!({
            "output": ["hostid", "name"],
            "groupids": groupid,
            "templateids": templateid,
            "selectParentTemplates": ["templateid", "name"],
        });
        decode("host.get", self.call("host.get", params).await?)
    }

    /// 覆盖主机链接的模板列表
    async fn set_host_templates(&self, hostid: &str, templateids: &[String]) -> Result<()> {
        let templates: Vec<Value> = templateids
            .iter()
            .map(|id| json!({"templateid": id}))
            .collect();
        self.call(
            "host.update",
            json!({"hostid": hostid, "templates": templates}),
        )
        .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // template.*
    // ------------------------------------------------------------------

    async fn get_template_by_name(&self, name: &str) -> Result<Option<Template>> {
        let params = json!({
            "filter": {"name": name},
            "output": ["templateid", "name"],
        });
        let templates: Vec<Template> =
            decode("template.get", self.call("template.get", params).await?)?;
        Ok(first(templates))
    }

    /// 所有启用的模板及其父模板
    async fn get_enabled_templates(&self) -> Result<Vec<Template>> {
        let params = json!({
            "output": ["templateid", "name"],
            "filter": {"status": 0},
            "selectParentTemplates": ["templateid", "name"],
        });
        decode("template.get", self.call("template.get", params).await?)
    }

    // ------------------------------------------------------------------
    // trigger.* / item.* / usermacro.*
    // ------------------------------------------------------------------

    /// 主机上非继承的普通触发器（flags=0，仍需按 templateid 二次过滤）
    async fn get_host_own_triggers(&self, hostid: &str) -> Result<Vec<Trigger>> {
        let params = json!({
            "output": ["triggerid", "description", "expression", "priority", "status", "templateid", "flags"],
            "hostids": hostid,
            "inherited": false,
            "filter": {"flags": 0},
            "selectItems": ["itemid", "name", "key_"],
        });
        decode("trigger.get", self.call("trigger.get", params).await?)
    }

    /// 主机上的全部触发器（含模板继承的）
    async fn get_host_triggers(&self, hostid: &str) -> Result<Vec<Trigger>> {
        let params = json!({
            "output": ["triggerid", "description", "expression", "priority", "status", "templateid"],
            "hostids": hostid,
            "selectItems": ["itemid", "name", "key_", "templateid"],
        });
        decode("trigger.get", self.call("trigger.get", params).await?)
    }

    async fn get_template_triggers(
        &self,
        templateids: &[String],
        with_hosts: bool,
    ) -> Result<Vec<Trigger>> {
        let mut params = json!({
            "templateids": templateids,
            "output": ["triggerid", "description", "status", "flags"],
            "expandData": true,
        });
        if with_hosts {
            params["selectHosts"] = json!(["name"]);
        }
        decode("trigger.get", self.call("trigger.get", params).await?)
    }

    async fn get_trigger_items(&self, triggerid: &str) -> Result<Vec<ItemRef>> {
        let params = json!({
            "triggerids": triggerid,
            "output": ["itemid", "name", "key_"],
        });
        decode("item.get", self.call("item.get", params).await?)
    }

    async fn delete_trigger(&self, triggerid: &str) -> Result<()> {
        self.call("trigger.delete", json!([triggerid])).await?;
        Ok(())
    }

    async fn get_host_items(&self, hostid: &str) -> Result<Vec<Item>> {
        let params = json!({
            "output": ["itemid", "name", "key_", "status", "templateid", "type", "delay"],
            "hostids": hostid,
            "selectTriggers": ["triggerid", "description", "status", "priority", "templateid"],
        });
        decode("item.get", self.call("item.get", params).await?)
    }

    /// 主机（或模板，Zabbix 中二者共用 hostids）上定义的宏
    async fn get_macros(&self, hostids: &[String]) -> Result<Vec<UserMacro>> {
        if hostids.is_empty() {
            return Ok(Vec::new());
        }
        let params = json!({
            "hostids": hostids,
            "output": ["macro", "value"],
        });
        decode("usermacro.get", self.call("usermacro.get", params).await?)
    }
}

/// 基于 HTTP 的 Zabbix JSON-RPC 客户端
#[derive(Debug)]
pub struct ZabbixClient {
    http: Client,
    url: String,
    timeout_secs: u64,
    auth_token: Option<String>,
    request_id: AtomicU64,
}

impl ZabbixClient {
    /// 创建新的客户端（尚未登录）
    pub fn new(config: &ZabbixConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(ZabbixError::Request)?;

        Ok(Self {
            http,
            url: config.url.clone(),
            timeout_secs: config.timeout_secs,
            auth_token: None,
            request_id: AtomicU64::new(1),
        })
    }

    /// 校验配置、创建客户端并登录
    pub async fn connect(config: &ZabbixConfig) -> Result<Self> {
        config.validate()?;
        let mut client = Self::new(config)?;
        client.login(&config.username, &config.password).await?;
        Ok(client)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_logged_in(&self) -> bool {
        self.auth_token.is_some()
    }

    /// 登录 Zabbix，保存 Bearer Token
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        info!("正在登录 Zabbix: {}", self.url);
        let result = self
            .send(
                "user.login",
                json!({"username": username, "password": password}),
                false,
            )
            .await?;

        let token = result
            .as_str()
            .ok_or_else(|| ZabbixError::unexpected("user.login", "token 不是字符串"))?;
        self.auth_token = Some(token.to_string());
        info!("登录成功");
        Ok(())
    }

    /// 注销，失败只记录警告
    pub async fn logout(&mut self) {
        if self.auth_token.is_none() {
            return;
        }
        match self.send("user.logout", json!([]), true).await {
            Ok(_) => info!("已注销"),
            Err(e) => warn!("注销失败: {}", e),
        }
        self.auth_token = None;
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    fn map_send_error(&self, e: reqwest::Error) -> ZabbixError {
        if e.is_timeout() {
            ZabbixError::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else if e.is_connect() {
            ZabbixError::Connect {
                url: self.url.clone(),
            }
        } else {
            ZabbixError::Request(e)
        }
    }

    /// 发送一次 JSON-RPC 请求
    async fn send(&self, method: &str, params: Value, with_auth: bool) -> Result<Value> {
        let payload = JsonRpcRequest {
            jsonrpc: api::JSONRPC_VERSION,
            method,
            params,
            id: self.next_id(),
        };
        debug!("调用 {} (id={})", method, payload.id);

        let mut request = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, api::CONTENT_TYPE)
            .body(serde_json::to_vec(&payload)?);

        if with_auth {
            if let Some(ref token) = self.auth_token {
                request = request.header(AUTHORIZATION, format!("Bearer {token}"));
            }
        }

        let response = request.send().await.map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ZabbixError::Http {
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(|e| self.map_send_error(e))?;
        let body: JsonRpcResponse =
            serde_json::from_str(&text).map_err(|e| ZabbixError::InvalidResponse {
                reason: e.to_string(),
            })?;

        if let Some(error) = body.error {
            return Err(ZabbixError::Api {
                code: error.code,
                message: error.message,
                data: error.data,
            });
        }

        body.result
            .ok_or_else(|| ZabbixError::unexpected(method, "响应中缺少 result 字段"))
    }
}

#[async_trait]
impl ZabbixApi for ZabbixClient {
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        self.send(method, params, true).await
    }
}
