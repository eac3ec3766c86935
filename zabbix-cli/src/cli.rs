use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// 模板替换与非模板触发器检查
#[derive(Subcommand, Debug)]
pub enum TemplateCommand {
    /// 替换主机组中所有链接了旧模板的主机
    Group {
        /// 主机组名称
        group: String,
        /// 旧模板名称
        old_template: String,
        /// 新模板名称
        new_template: String,
        /// 替换完成后检查非模板触发器
        #[arg(long)]
        check_triggers: bool,
    },
    /// 按主机名称替换
    HostName {
        /// 主机名称
        host: String,
        old_template: String,
        new_template: String,
        #[arg(long)]
        check_triggers: bool,
    },
    /// 按主机ID替换
    HostId {
        /// 主机ID
        hostid: String,
        old_template: String,
        new_template: String,
        #[arg(long)]
        check_triggers: bool,
    },
    /// 只检查非模板触发器，不替换模板
    CheckTriggers {
        /// 主机名称（配合 --by-group 时为主机组名称）
        name: String,
        /// 按主机组检查
        #[arg(long)]
        by_group: bool,
    },
}

/// 非模板监控项/触发器检测
#[derive(Subcommand, Debug)]
pub enum DetectCommand {
    /// 检测单个主机
    Host {
        /// 主机名称
        name: String,
    },
    /// 检测主机组中的所有主机
    Hostgroup {
        /// 主机组名称
        name: String,
    },
}

/// Zabbix 批量运维工具 - 主机组改名、备份回滚、模板替换与触发器检测
#[derive(Parser, Debug)]
#[command(name = "zabbix-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// 详细输出
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 生成默认配置文件
    Init {
        /// 如果配置文件已存在，强制覆盖
        #[arg(long)]
        force: bool,
    },
    /// 备份所有主机组及其主机
    Backup,
    /// 列出所有备份（最新的在前）
    ListBackups,
    /// 按 CSV 批量修改主机组名称（先自动备份，最后清理空分组）
    Rename {
        /// 改名对照表，默认使用配置中的 rename.changes_file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// 从备份恢复主机组名称与主机关联
    Rollback {
        /// 备份文件，不提供时使用最新的备份
        #[arg(long)]
        file: Option<PathBuf>,
        /// 跳过确认
        #[arg(long)]
        force: bool,
    },
    /// 模板替换
    #[command(subcommand)]
    Template(TemplateCommand),
    /// 检测非模板监控项和触发器
    #[command(subcommand)]
    Detect(DetectCommand),
    /// 分析主机组（不提供参数时读取 groups.txt）
    Analyze {
        /// 主机组名称
        groups: Vec<String>,
    },
}

impl Commands {
    /// 每类命令写入各自的日志文件
    pub fn log_file_name(&self) -> &'static str {
        match self {
            Commands::Init { .. } | Commands::Rename { .. } => "group_update.log",
            Commands::Backup | Commands::ListBackups => "group_backup.log",
            Commands::Rollback { .. } => "rollback.log",
            Commands::Template(_) => "template_replace.log",
            Commands::Detect(_) => "zabbix_detector.log",
            Commands::Analyze { .. } => "zabbix_analysis.log",
        }
    }
}
