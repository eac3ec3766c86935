use crate::constants::{api, backup, config, csv, group, output};
use crate::error::{Result, ZabbixError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 应用配置结构
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub zabbix: ZabbixConfig,
    #[serde(default)]
    pub rename: RenameConfig,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Zabbix 连接配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ZabbixConfig {
    pub url: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    api::DEFAULT_TIMEOUT_SECS
}

impl Default for ZabbixConfig {
    fn default() -> Self {
        Self {
            url: api::DEFAULT_URL.to_string(),
            username: api::DEFAULT_USERNAME.to_string(),
            password: String::new(),
            timeout_secs: api::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ZabbixConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// 验证连接配置
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(ZabbixError::config("请配置正确的 Zabbix API 地址"));
        }
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(ZabbixError::config(format!(
                "请配置 Zabbix 用户名和密码（或设置环境变量 {} / {}）",
                api::ENV_USER,
                api::ENV_PASSWORD
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ZabbixError::config("timeout_secs 必须大于 0"));
        }
        Ok(())
    }
}

/// 主机组改名相关配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RenameConfig {
    #[serde(default = "default_offline_group")]
    pub offline_group: String,
    #[serde(default = "default_skip_sentinel")]
    pub skip_sentinel: String,
    #[serde(default = "default_prefix_letters")]
    pub prefix_letters: String,
    #[serde(default = "default_prefix_separator")]
    pub prefix_separator: String,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_changes_file")]
    pub changes_file: String,
}

fn default_offline_group() -> String {
    group::OFFLINE_GROUP_NAME.to_string()
}

fn default_skip_sentinel() -> String {
    group::SKIP_SENTINEL.to_string()
}

fn default_prefix_letters() -> String {
    group::DEFAULT_PREFIX_LETTERS.to_string()
}

fn default_prefix_separator() -> String {
    group::DEFAULT_PREFIX_SEPARATOR.to_string()
}

fn default_request_delay_ms() -> u64 {
    group::DEFAULT_REQUEST_DELAY_MS
}

fn default_changes_file() -> String {
    csv::DEFAULT_CHANGES_FILE.to_string()
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            offline_group: default_offline_group(),
            skip_sentinel: default_skip_sentinel(),
            prefix_letters: default_prefix_letters(),
            prefix_separator: default_prefix_separator(),
            request_delay_ms: default_request_delay_ms(),
            changes_file: default_changes_file(),
        }
    }
}

impl RenameConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

/// 备份相关配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackupConfig {
    pub storage_dir: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            storage_dir: backup::DEFAULT_STORAGE_DIR.to_string(),
        }
    }
}

/// 报告输出配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OutputConfig {
    pub report_dir: String,
    #[serde(default = "default_groups_file")]
    pub groups_file: String,
}

fn default_groups_file() -> String {
    csv::DEFAULT_GROUPS_FILE.to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_dir: output::DEFAULT_REPORT_DIR.to_string(),
            groups_file: default_groups_file(),
        }
    }
}

/// 日志配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: output::DEFAULT_LOG_DIR.to_string(),
        }
    }
}

fn toml_string(value: &str) -> String {
    toml::Value::String(value.to_string()).to_string()
}

impl AppConfig {
    /// 智能查找并加载配置文件
    /// 按优先级查找：config.toml -> /etc/zabbix-cli/config.toml，都不存在时使用默认配置
    ///
    /// 同时返回实际加载的文件路径（使用默认配置时为 None），由调用方在日志初始化后输出。
    pub fn find_and_load_config() -> Result<(Self, Option<PathBuf>)> {
        match Self::find_config_file() {
            Some(path) => {
                let config = Self::load_from_file(&path)?;
                Ok((config, Some(path)))
            }
            None => {
                let mut default_config = Self::default();
                default_config.apply_env_overrides();
                Ok((default_config, None))
            }
        }
    }

    /// 按优先级返回第一个存在的配置文件
    pub fn find_config_file() -> Option<PathBuf> {
        [config::DEFAULT_CONFIG_FILE, config::SYSTEM_CONFIG_FILE]
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// 从指定文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut config: AppConfig = toml::from_str(&content)
            .map_err(|e| ZabbixError::config(format!("解析 {} 失败: {e}", path.display())))?;
        config.apply_env_overrides();

        Ok(config)
    }

    /// 使用环境变量（含 .env 文件）覆盖连接配置
    pub fn apply_env_overrides(&mut self) {
        let _ = dotenvy::dotenv();
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(api::ENV_URL).filter(|v| !v.is_empty()) {
            self.zabbix.url = url;
        }
        if let Some(user) = lookup(api::ENV_USER).filter(|v| !v.is_empty()) {
            self.zabbix.username = user;
        }
        if let Some(password) = lookup(api::ENV_PASSWORD).filter(|v| !v.is_empty()) {
            self.zabbix.password = password;
        }
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml_with_comments();
        fs::write(&path, content)?;
        Ok(())
    }

    /// 生成带注释的TOML配置
    fn to_toml_with_comments(&self) -> String {
        const TEMPLATE: &str = include_str!("../templates/config.toml.template");

        // 将所有路径的反斜杠替换为正斜杠，确保TOML兼容性
        let backup_storage_dir = self.backup.storage_dir.replace('\\', "/");
        let report_dir = self.output.report_dir.replace('\\', "/");
        let log_dir = self.logging.dir.replace('\\', "/");

        // 字符串值按 TOML 规则加引号并转义，模板里不带引号
        TEMPLATE
            .replace("{url}", &toml_string(&self.zabbix.url))
            .replace("{username}", &toml_string(&self.zabbix.username))
            .replace("{password}", &toml_string(&self.zabbix.password))
            .replace("{timeout_secs}", &self.zabbix.timeout_secs.to_string())
            .replace("{offline_group}", &toml_string(&self.rename.offline_group))
            .replace("{skip_sentinel}", &toml_string(&self.rename.skip_sentinel))
            .replace("{prefix_letters}", &toml_string(&self.rename.prefix_letters))
            .replace(
                "{prefix_separator}",
                &toml_string(&self.rename.prefix_separator),
            )
            .replace(
                "{request_delay_ms}",
                &self.rename.request_delay_ms.to_string(),
            )
            .replace("{changes_file}", &toml_string(&self.rename.changes_file))
            .replace("{backup_storage_dir}", &toml_string(&backup_storage_dir))
            .replace("{report_dir}", &toml_string(&report_dir))
            .replace("{groups_file}", &toml_string(&self.output.groups_file))
            .replace("{log_dir}", &toml_string(&log_dir))
    }

    /// 获取备份目录路径
    pub fn get_backup_dir(&self) -> PathBuf {
        PathBuf::from(&self.backup.storage_dir)
    }

    /// 获取报告输出目录路径
    pub fn get_report_dir(&self) -> PathBuf {
        PathBuf::from(&self.output.report_dir)
    }

    pub fn get_log_dir(&self) -> PathBuf {
        PathBuf::from(&self.logging.dir)
    }

    /// 确保输出目录存在
    pub fn ensure_output_dirs(&self) -> Result<()> {
        fs::create_dir_all(self.get_backup_dir())?;
        fs::create_dir_all(self.get_report_dir())?;
        Ok(())
    }
}
