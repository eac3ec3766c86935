//! 主机组名称匹配策略
//!
//! CSV 中的"原系统名称"与服务器上的实际组名不一定一致：外部系统常常给组名
//! 加上 `a_`、`b_` 这样的字母前缀。精确匹配失败后，由匹配策略给出依次尝试的
//! 候选名称。

use crate::config::RenameConfig;

/// 候选名称生成策略
pub trait GroupNameMatcher: Send + Sync {
    /// 精确匹配失败后依次尝试的候选名称（按顺序，命中即停止）
    fn candidates(&self, original_name: &str) -> Vec<String>;

    /// 从当前组名中提取需要保留的前缀（含分隔符）
    fn preserved_prefix<'a>(&self, current_name: &'a str) -> Option<&'a str>;

    /// 计算改名后的最终名称：当前名称带前缀而新名称没有时，补上前缀
    fn apply_prefix(&self, current_name: &str, new_name: &str) -> String {
        match self.preserved_prefix(current_name) {
            Some(prefix) if !new_name.starts_with(prefix) => format!("{prefix}{new_name}"),
            _ => new_name.to_string(),
        }
    }
}

/// 单字母前缀匹配（默认 a_ ... z_）
#[derive(Debug, Clone)]
pub struct LetterPrefixMatcher {
    letters: Vec<char>,
    separator: String,
}

impl LetterPrefixMatcher {
    pub fn new(letters: &str, separator: &str) -> Self {
        Self {
            letters: letters.chars().filter(|c| !c.is_whitespace()).collect(),
            separator: separator.to_string(),
        }
    }

    pub fn from_config(config: &RenameConfig) -> Self {
        Self::new(&config.prefix_letters, &config.prefix_separator)
    }
}

impl Default for LetterPrefixMatcher {
    fn default() -> Self {
        Self::from_config(&RenameConfig::default())
    }
}

impl GroupNameMatcher for LetterPrefixMatcher {
    fn candidates(&self, original_name: &str) -> Vec<String> {
        self.letters
            .iter()
            .map(|letter| format!("{letter}{}{original_name}", self.separator))
            .collect()
    }

    fn preserved_prefix<'a>(&self, current_name: &'a str) -> Option<&'a str> {
        if self.separator.is_empty() {
            return None;
        }
        current_name
            .find(self.separator.as_str())
            .map(|pos| &current_name[..pos + self.separator.len()])
    }
}
