use crate::api::ZabbixApi;
use crate::api_types::{HostGroup, HostRef};
use crate::constants::{backup, output};
use crate::error::{Result, ZabbixError};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 快照中单个分组的记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBackupEntry {
    pub groupid: String,
    #[serde(default)]
    pub hosts: Vec<HostRef>,
}

/// 分组快照：分组名称 -> {groupid, hosts}
pub type GroupSnapshot = BTreeMap<String, GroupBackupEntry>;

/// 由 hostgroup.get 的结果构建快照
pub fn snapshot_from_groups(groups: Vec<HostGroup>) -> GroupSnapshot {
    groups
        .into_iter()
        .map(|g| {
            (
                g.name,
                GroupBackupEntry {
                    groupid: g.groupid,
                    hosts: g.hosts,
                },
            )
        })
        .collect()
}

/// 磁盘上的一个备份文件
#[derive(Debug, Clone)]
pub struct BackupFile {
    pub path: PathBuf,
    pub modified: DateTime<Local>,
}

impl BackupFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// 备份管理器
#[derive(Debug, Clone)]
pub struct BackupManager {
    storage_dir: PathBuf,
}

impl BackupManager {
    /// 创建新的备份管理器
    pub fn new(storage_dir: PathBuf) -> Result<Self> {
        if !storage_dir.exists() {
            fs::create_dir_all(&storage_dir)?;
        }

        Ok(Self { storage_dir })
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// 全量备份所有分组及其主机，返回备份文件路径
    pub async fn create_backup<A: ZabbixApi + ?Sized>(&self, api: &A) -> Result<PathBuf> {
        info!("开始备份所有主机组");
        let groups = api.get_all_groups_with_hosts().await?;
        for group in &groups {
            debug!(
                "[备份] 分组: {} (ID: {}), 主机数量: {}",
                group.name,
                group.groupid,
                group.hosts.len()
            );
        }

        let snapshot = snapshot_from_groups(groups);
        let path = self.write_snapshot(&snapshot)?;
        info!(
            "[备份完成] 文件：{} (共 {} 个分组)",
            path.display(),
            snapshot.len()
        );
        Ok(path)
    }

    /// 将快照写入 group_backup_<时间戳>.json
    pub fn write_snapshot(&self, snapshot: &GroupSnapshot) -> Result<PathBuf> {
        let filename = format!(
            "{}{}{}",
            backup::FILE_PREFIX,
            output::timestamp(),
            backup::FILE_SUFFIX
        );
        let path = self.storage_dir.join(filename);

        // 先完整序列化，避免写出半个文件
        let content = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, content)?;
        Ok(path)
    }

    /// 列出所有备份文件，最新修改的排在最前
    pub fn list_backups(&self) -> Result<Vec<BackupFile>> {
        if !self.storage_dir.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.storage_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with(backup::FILE_PREFIX) || !name.ends_with(backup::FILE_SUFFIX) {
                continue;
            }

            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            let modified = match metadata.modified() {
                Ok(time) => DateTime::<Local>::from(time),
                Err(e) => {
                    warn!("无法读取 {} 的修改时间: {}", name, e);
                    continue;
                }
            };

            files.push(BackupFile {
                path: entry.path(),
                modified,
            });
        }

        files.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| b.path.cmp(&a.path))
        });
        Ok(files)
    }

    /// 最新的备份文件
    pub fn latest_backup(&self) -> Result<Option<BackupFile>> {
        Ok(self.list_backups()?.into_iter().next())
    }
}

/// 读取备份快照
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<GroupSnapshot> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ZabbixError::MissingFile {
            path: path.display().to_string(),
        });
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
