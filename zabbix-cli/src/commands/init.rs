use anyhow::Result;
use std::path::Path;
use tracing::{info, warn};
use zabbix_core::AppConfig;

/// 生成默认配置文件并创建输出目录
pub fn run_init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        warn!("⚠️  配置文件已存在: {}", config_path.display());
        info!("💡 如需覆盖，请使用 --force 参数");
        anyhow::bail!("配置文件已存在: {}", config_path.display());
    }

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let config = AppConfig::default();
    config.save_to_file(config_path)?;
    config.ensure_output_dirs()?;

    info!("✅ 配置文件已生成: {}", config_path.display());
    info!("💡 请编辑 [zabbix] 部分填写 url、username、password");
    info!("   也可以通过环境变量 ZABBIX_URL / ZABBIX_USER / ZABBIX_PASSWORD 或 .env 文件提供");
    Ok(())
}
