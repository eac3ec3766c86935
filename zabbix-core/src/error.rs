//! Zabbix 运维工具错误定义

use thiserror::Error;

/// 错误大类，决定调用方的处理策略（跳过当前条目 / 中止整个流程）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 网络、HTTP、JSON-RPC 层面的错误
    Transport,
    /// 本地数据错误：文件缺失、CSV 格式、非数字ID 等
    Data,
    /// 主机组/主机/模板按名称匹配不到，或匹配到多个
    Ambiguity,
}

impl ErrorKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ErrorKind::Transport => "接口错误",
            ErrorKind::Data => "数据错误",
            ErrorKind::Ambiguity => "匹配错误",
        }
    }
}

#[derive(Debug, Error)]
pub enum ZabbixError {
    #[error("API 请求超时 (>{timeout_secs}s)")]
    Timeout { timeout_secs: u64 },

    #[error("无法连接到 Zabbix 服务器: {url}")]
    Connect { url: String },

    #[error("HTTP 错误: {status}")]
    Http { status: u16 },

    #[error("API 响应不是有效的 JSON 格式: {reason}")]
    InvalidResponse { reason: String },

    /// 服务端返回的 JSON-RPC error
    #[error("Zabbix API 错误: {}", .data.as_deref().unwrap_or(.message.as_str()))]
    Api {
        code: i64,
        message: String,
        data: Option<String>,
    },

    #[error("HTTP 请求错误: {0}")]
    Request(#[from] reqwest::Error),

    #[error("文件操作失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 解析错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV 读写错误: {0}")]
    Csv(#[from] csv::Error),

    #[error("配置错误: {0}")]
    Config(String),

    #[error("无法将ID '{id}' 转换为整数")]
    InvalidId { id: String },

    #[error("文件不存在: {path}")]
    MissingFile { path: String },

    #[error("{method} 返回了无法识别的结果: {reason}")]
    UnexpectedResult { method: String, reason: String },

    #[error("未找到主机组: {name}")]
    GroupNotFound { name: String },

    #[error("主机组 '{name}' 匹配到多个: {matches:?}")]
    AmbiguousGroup { name: String, matches: Vec<String> },

    #[error("主机 '{identifier}' 不存在")]
    HostNotFound { identifier: String },

    #[error("模板 '{name}' 不存在")]
    TemplateNotFound { name: String },
}

impl ZabbixError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ZabbixError::Timeout { .. }
            | ZabbixError::Connect { .. }
            | ZabbixError::Http { .. }
            | ZabbixError::InvalidResponse { .. }
            | ZabbixError::Api { .. }
            | ZabbixError::Request(_) => ErrorKind::Transport,
            ZabbixError::Io(_)
            | ZabbixError::Json(_)
            | ZabbixError::Csv(_)
            | ZabbixError::Config(_)
            | ZabbixError::InvalidId { .. }
            | ZabbixError::MissingFile { .. }
            | ZabbixError::UnexpectedResult { .. } => ErrorKind::Data,
            ZabbixError::GroupNotFound { .. }
            | ZabbixError::AmbiguousGroup { .. }
            | ZabbixError::HostNotFound { .. }
            | ZabbixError::TemplateNotFound { .. } => ErrorKind::Ambiguity,
        }
    }

    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn unexpected<M: Into<String>, R: Into<String>>(method: M, reason: R) -> Self {
        Self::UnexpectedResult {
            method: method.into(),
            reason: reason.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }
}

pub type Result<T> = std::result::Result<T, ZabbixError>;
