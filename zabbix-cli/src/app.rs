use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use zabbix_core::backup::BackupManager;
use zabbix_core::{AppConfig, ZabbixClient};

use crate::cli::Commands;
use crate::commands;

#[derive(Clone)]
pub struct CliApp {
    pub config: Arc<AppConfig>,
    /// 实际加载的配置文件，使用默认配置时为 None
    pub config_source: Option<PathBuf>,
}

impl CliApp {
    /// 使用指定配置文件路径初始化CLI应用
    pub fn new_with_config_path<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();
        let (config, config_source) = if config_path.exists() {
            (
                AppConfig::load_from_file(config_path)?,
                Some(config_path.to_path_buf()),
            )
        } else {
            // 如果指定的配置文件不存在，尝试智能查找
            AppConfig::find_and_load_config()?
        };

        Ok(Self {
            config: Arc::new(config),
            config_source,
        })
    }

    pub fn new_with_config(config: AppConfig) -> Self {
        Self {
            config: Arc::new(config),
            config_source: None,
        }
    }

    /// 登录 Zabbix，失败时直接返回错误
    pub async fn connect(&self) -> Result<ZabbixClient> {
        let client = ZabbixClient::connect(&self.config.zabbix).await?;
        debug!("已连接 Zabbix: {}", client.url());
        Ok(client)
    }

    pub fn backup_manager(&self) -> Result<BackupManager> {
        Ok(BackupManager::new(self.config.get_backup_dir())?)
    }

    /// 运行应用命令
    pub async fn run_command(&self, command: Commands) -> Result<()> {
        match command {
            // init 在加载配置之前由 main.rs 处理
            Commands::Init { .. } => anyhow::bail!("init 命令不应通过已加载的配置执行"),
            Commands::Backup => commands::run_backup(self).await,
            Commands::ListBackups => commands::run_list_backups(self),
            Commands::Rename { csv } => commands::run_rename(self, csv).await,
            Commands::Rollback { file, force } => commands::run_rollback(self, file, force).await,
            Commands::Template(template_cmd) => {
                commands::handle_template_command(self, template_cmd).await
            }
            Commands::Detect(detect_cmd) => commands::handle_detect_command(self, detect_cmd).await,
            Commands::Analyze { groups } => commands::run_analyze(self, groups).await,
        }
    }
}
