pub mod analysis;
pub mod api;
pub mod api_types;

// 重新导出常用的实体类型
pub use api_types::*;
pub mod backup;
pub mod config;
pub mod constants;
pub mod detector;
pub mod directives;
pub mod error;
pub mod matcher;
pub mod membership;
pub mod rename;
pub mod report;
pub mod rollback;
pub mod template;
pub mod triggers;

pub use api::{ZabbixApi, ZabbixClient};
pub use config::AppConfig;
pub use error::*;
