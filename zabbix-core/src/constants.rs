//! 全局常量

/// Zabbix API 相关常量
pub mod api {
    /// 默认 API 地址
    pub const DEFAULT_URL: &str = "http://localhost/api_jsonrpc.php";
    pub const DEFAULT_USERNAME: &str = "Admin";
    /// 单次请求超时（秒）
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    pub const JSONRPC_VERSION: &str = "2.0";
    pub const CONTENT_TYPE: &str = "application/json-rpc";

    /// 环境变量覆盖
    pub const ENV_URL: &str = "ZABBIX_URL";
    pub const ENV_USER: &str = "ZABBIX_USER";
    pub const ENV_PASSWORD: &str = "ZABBIX_PASSWORD";
}

/// 主机组改名相关常量
pub mod group {
    /// 下线分组名称
    pub const OFFLINE_GROUP_NAME: &str = "下线";
    /// CSV 中表示"无需修改"的占位值
    pub const SKIP_SENTINEL: &str = "无需修改";
    /// 外部命名前缀使用的字母表（按此顺序尝试 a_ ... z_）
    pub const DEFAULT_PREFIX_LETTERS: &str = "abcdefghijklmnopqrstuvwxyz";
    pub const DEFAULT_PREFIX_SEPARATOR: &str = "_";
    /// 每个分组操作之后的固定间隔（毫秒）
    pub const DEFAULT_REQUEST_DELAY_MS: u64 = 100;
}

/// CSV 输入文件
pub mod csv {
    pub const DEFAULT_CHANGES_FILE: &str = "group_changes.csv";
    pub const ORIGINAL_NAME_COLUMN: &str = "原系统名称";
    pub const NEW_NAME_COLUMN: &str = "修改后系统名称";
    pub const DEFAULT_GROUPS_FILE: &str = "groups.txt";
}

/// 备份快照
pub mod backup {
    pub const FILE_PREFIX: &str = "group_backup_";
    pub const FILE_SUFFIX: &str = ".json";
    pub const DEFAULT_STORAGE_DIR: &str = "backups";
}

/// 报告与日志输出
pub mod output {
    /// 文件名中使用的时间戳格式
    pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
    pub const DEFAULT_REPORT_DIR: &str = "output";
    pub const DEFAULT_LOG_DIR: &str = "logs";

    pub const NON_TEMPLATE_TRIGGER_REPORT_PREFIX: &str = "non_template_triggers_";
    pub const DETECTION_DETAIL_PREFIX: &str = "zabbix_detection_detail_";
    pub const DETECTION_SUMMARY_PREFIX: &str = "zabbix_detection_summary_";
    pub const INHERITANCE_REPORT_PREFIX: &str = "模板继承禁用触发器_";

    /// 生成带时间戳的文件名片段
    pub fn timestamp() -> String {
        chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
    }
}

/// 配置文件
pub mod config {
    pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
    pub const SYSTEM_CONFIG_FILE: &str = "/etc/zabbix-cli/config.toml";
}
