//! 改名映射 CSV 解析
//!
//! CSV 需要包含 `原系统名称`、`修改后系统名称` 两列，其他列忽略。

use crate::config::RenameConfig;
use crate::error::{Result, ZabbixError};
use serde::Deserialize;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// CSV 原始行
#[derive(Debug, Deserialize)]
struct DirectiveRow {
    #[serde(rename = "原系统名称", default)]
    original_name: Option<String>,
    #[serde(rename = "修改后系统名称", default)]
    new_name: Option<String>,
}

/// 一条改名指令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameDirective {
    pub original_name: String,
    pub new_name: String,
}

/// 指令对应的动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveAction {
    /// 无需修改
    Skip,
    /// 主机迁移到下线分组
    Offline,
    /// 改名为指定名称（前缀尚未处理）
    Rename(String),
}

impl RenameDirective {
    pub fn new(original_name: impl Into<String>, new_name: impl Into<String>) -> Self {
        Self {
            original_name: original_name.into(),
            new_name: new_name.into(),
        }
    }

    pub fn action(&self, config: &RenameConfig) -> DirectiveAction {
        if self.new_name == config.skip_sentinel {
            DirectiveAction::Skip
        } else if self.new_name == config.offline_group {
            DirectiveAction::Offline
        } else {
            DirectiveAction::Rename(self.new_name.clone())
        }
    }
}

/// 从 CSV 内容解析改名指令
///
/// 两列都会去掉首尾空白；任一列为空的行、以及"无需修改"的行都被丢弃。
pub fn parse_directives<R: Read>(reader: R, config: &RenameConfig) -> Result<Vec<RenameDirective>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    debug!("读取 CSV 文件头字段：{:?}", headers);
    for column in [
        crate::constants::csv::ORIGINAL_NAME_COLUMN,
        crate::constants::csv::NEW_NAME_COLUMN,
    ] {
        if !headers.iter().any(|h| h == column) {
            return Err(ZabbixError::config(format!("CSV 缺少列: {column}")));
        }
    }

    let mut directives = Vec::new();
    for row in csv_reader.deserialize::<DirectiveRow>() {
        let row = row?;
        let new_name = row.new_name.unwrap_or_default();
        if new_name.is_empty() {
            debug!("跳过空值行：原系统名称 {:?}", row.original_name);
            continue;
        }
        if new_name == config.skip_sentinel {
            continue;
        }
        let original_name = row.original_name.unwrap_or_default();
        if original_name.is_empty() {
            continue;
        }

        directives.push(RenameDirective {
            original_name,
            new_name,
        });
    }

    Ok(directives)
}

/// 读取改名映射文件（兼容 Excel 导出的 UTF-8 BOM）
pub fn load_directives<P: AsRef<Path>>(path: P, config: &RenameConfig) -> Result<Vec<RenameDirective>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ZabbixError::MissingFile {
            path: path.display().to_string(),
        });
    }
    let content = fs::read_to_string(path)?;
    let content = content.trim_start_matches('\u{feff}');
    parse_directives(content.as_bytes(), config)
}
