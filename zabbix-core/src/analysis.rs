//! 主机组分析：非模板触发器、宏覆盖、模板继承中被禁用的触发器

use crate::api::ZabbixApi;
use crate::api_types::{Host, Trigger};
use crate::error::{Result, ZabbixError};
use crate::report;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub const ISSUE_LOCAL_TRIGGER: &str = "非模板触发器";
pub const ISSUE_MACRO_OVERRIDE: &str = "覆盖宏";
pub const ISSUE_ANALYSIS_ERROR: &str = "分析错误";

/// 主机组分析报告中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRow {
    pub host_name: String,
    pub issue_type: String,
    pub trigger_description: String,
    pub item_name: String,
    pub item_key: String,
    pub detail: String,
}

impl AnalysisRow {
    fn new(
        host_name: &str,
        issue_type: &str,
        trigger_description: &str,
        item_name: &str,
        item_key: &str,
        detail: String,
    ) -> Self {
        Self {
            host_name: host_name.to_string(),
            issue_type: issue_type.to_string(),
            trigger_description: trigger_description.to_string(),
            item_name: item_name.to_string(),
            item_key: item_key.to_string(),
            detail,
        }
    }
}

/// 模板继承中被禁用的触发器
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InheritanceIssue {
    pub template_name: String,
    pub trigger_description: String,
    pub source_template: String,
}

fn or_unknown<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

async fn local_trigger_rows<A: ZabbixApi + ?Sized>(
    api: &A,
    host_name: &str,
    trigger: &Trigger,
) -> Vec<AnalysisRow> {
    let expression = or_unknown(&trigger.expression, "未知");
    let row_for = |name: &str, key: &str, detail: String| {
        AnalysisRow::new(
            host_name,
            ISSUE_LOCAL_TRIGGER,
            &trigger.description,
            name,
            key,
            detail,
        )
    };

    // 触发器本身没带监控项时再单独查一次
    let items = if trigger.items.is_empty() {
        match api.get_trigger_items(&trigger.triggerid).await {
            Ok(items) => items,
            Err(e) => {
                return vec![row_for(
                    "获取监控项失败",
                    "获取监控项失败",
                    format!("触发器ID: {}, 错误: {}", trigger.triggerid, e),
                )];
            }
        }
    } else {
        trigger.items.clone()
    };

    if items.is_empty() {
        return vec![row_for(
            "无关联监控项",
            "无关联监控项",
            format!("触发器ID: {}, 表达式: {}", trigger.triggerid, expression),
        )];
    }

    items
        .iter()
        .map(|item| {
            row_for(
                or_unknown(&item.name, "未知监控项"),
                or_unknown(&item.key_, "未知键值"),
                format!(
                    "触发器ID: {}, 监控项ID: {}, 表达式: {}",
                    trigger.triggerid,
                    or_unknown(&item.itemid, "未知"),
                    expression
                ),
            )
        })
        .collect()
}

/// 找出主机值与模板值不同的宏
async fn macro_override_rows<A: ZabbixApi + ?Sized>(api: &A, host: &Host) -> Result<Vec<AnalysisRow>> {
    let host_macros = api.get_macros(std::slice::from_ref(&host.hostid)).await?;
    let template_ids = host.template_ids();
    if template_ids.is_empty() {
        return Ok(Vec::new());
    }

    let template_macros: HashMap<String, String> = api
        .get_macros(&template_ids)
        .await?
        .into_iter()
        .map(|m| (m.name, m.value))
        .collect();

    Ok(host_macros
        .iter()
        .filter_map(|m| {
            let template_value = template_macros.get(&m.name)?;
            (template_value != &m.value).then(|| {
                AnalysisRow::new(
                    &host.name,
                    ISSUE_MACRO_OVERRIDE,
                    "宏值覆盖",
                    "N/A",
                    "N/A",
                    format!("{} 主机值={} 模板值={}", m.name, m.value, template_value),
                )
            })
        })
        .collect())
}

/// 分析单个主机；出错时返回一行"分析错误"
pub async fn analyze_host<A: ZabbixApi + ?Sized>(api: &A, host: &Host) -> Vec<AnalysisRow> {
    let result: Result<Vec<AnalysisRow>> = async {
        let mut rows = Vec::new();
        let triggers = api.get_host_own_triggers(&host.hostid).await?;
        for trigger in triggers
            .iter()
            .filter(|t| t.is_local() && t.flags_value() == 0)
        {
            rows.extend(local_trigger_rows(api, &host.name, trigger).await);
        }
        rows.extend(macro_override_rows(api, host).await?);
        Ok(rows)
    }
    .await;

    result.unwrap_or_else(|e| {
        error!("分析主机 {} 时出错: {}", host.name, e);
        vec![AnalysisRow::new(
            &host.name,
            ISSUE_ANALYSIS_ERROR,
            "系统错误",
            "N/A",
            "N/A",
            e.to_string(),
        )]
    })
}

/// 分析一个主机组并写出 CSV
///
/// 主机组不存在或没有主机时返回 None，不生成文件。
pub async fn analyze_hostgroup<A: ZabbixApi + ?Sized>(
    api: &A,
    group_name: &str,
    report_dir: &Path,
    timestamp: &str,
) -> Result<Option<PathBuf>> {
    info!("开始分析主机组: {}", group_name);
    let Some(group) = api.get_groups_by_name(group_name, false).await?.into_iter().next() else {
        warn!("主机组不存在: {}", group_name);
        return Ok(None);
    };

    let hosts = api.get_hosts_in_group(&group.groupid).await?;
    if hosts.is_empty() {
        warn!("主机组 {} 下无主机", group_name);
        return Ok(None);
    }

    let mut rows = Vec::new();
    for host in &hosts {
        rows.extend(analyze_host(api, host).await);
    }

    let path = report_dir.join(format!(
        "{}_{}.csv",
        report::sanitize_filename(group_name),
        timestamp
    ));
    report::write_analysis_report(&rows, &path)?;
    info!("主机组 {} 分析完成，报告: {}", group_name, path.display());
    Ok(Some(path))
}

/// 查找启用模板中，从父模板继承（flags=4）且被禁用的触发器
pub async fn find_inheritance_issues<A: ZabbixApi + ?Sized>(api: &A) -> Result<Vec<InheritanceIssue>> {
    info!("检查模板继承问题...");
    let mut issues = Vec::new();

    for template in api.get_enabled_templates().await? {
        if template.parent_templates.is_empty() {
            continue;
        }

        let triggers = api
            .get_template_triggers(std::slice::from_ref(&template.templateid), false)
            .await?;
        let disabled_inherited: Vec<&Trigger> = triggers
            .iter()
            .filter(|t| t.flags_value() == 4 && t.is_disabled())
            .collect();
        if disabled_inherited.is_empty() {
            continue;
        }

        let parent_ids: Vec<String> = template
            .parent_templates
            .iter()
            .map(|p| p.templateid.clone())
            .collect();
        let parent_triggers = api.get_template_triggers(&parent_ids, true).await?;
        let desc_to_parent: HashMap<&str, &str> = parent_triggers
            .iter()
            .map(|pt| {
                let parent = pt.hosts.first().map(|h| h.name.as_str()).unwrap_or("未知模板");
                (pt.description.as_str(), parent)
            })
            .collect();

        for trigger in disabled_inherited {
            issues.push(InheritanceIssue {
                template_name: template.name.clone(),
                trigger_description: trigger.description.clone(),
                source_template: desc_to_parent
                    .get(trigger.description.as_str())
                    .copied()
                    .unwrap_or("未知模板")
                    .to_string(),
            });
        }
    }

    Ok(issues)
}

/// 生成模板继承问题报告，没有问题时不生成文件
pub async fn generate_inheritance_report<A: ZabbixApi + ?Sized>(
    api: &A,
    report_dir: &Path,
    timestamp: &str,
) -> Result<Option<PathBuf>> {
    let issues = find_inheritance_issues(api).await?;
    if issues.is_empty() {
        info!("未发现模板继承问题");
        return Ok(None);
    }

    let path = report_dir.join(format!(
        "{}{}.csv",
        crate::constants::output::INHERITANCE_REPORT_PREFIX,
        timestamp
    ));
    report::write_inheritance_report(&issues, &path)?;
    info!(
        "模板继承问题报告完成，共 {} 项，文件: {}",
        issues.len(),
        path.display()
    );
    Ok(Some(path))
}

/// 确定要分析的主机组：优先命令行参数，其次 groups 文件（每行一个）
pub fn load_group_names(args: &[String], groups_file: &Path) -> Result<Vec<String>> {
    if !args.is_empty() {
        return Ok(args.to_vec());
    }

    if groups_file.exists() {
        let content = fs::read_to_string(groups_file)?;
        let groups: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();
        if !groups.is_empty() {
            return Ok(groups);
        }
    }

    Err(ZabbixError::config(format!(
        "请提供主机组名参数或创建 {} 文件",
        groups_file.display()
    )))
}

/// 分析结果汇总
#[derive(Debug, Default, Clone)]
pub struct AnalysisReport {
    pub group_reports: Vec<PathBuf>,
    pub failed_groups: Vec<String>,
    pub inheritance_report: Option<PathBuf>,
}

/// 依次分析所有主机组，然后生成模板继承报告
pub async fn run_analysis<A: ZabbixApi + ?Sized>(
    api: &A,
    group_names: &[String],
    report_dir: &Path,
) -> Result<AnalysisReport> {
    fs::create_dir_all(report_dir)?;
    let timestamp = crate::constants::output::timestamp();
    info!("开始分析 {} 个主机组", group_names.len());

    let mut report = AnalysisReport::default();
    for group_name in group_names {
        match analyze_hostgroup(api, group_name, report_dir, &timestamp).await {
            Ok(Some(path)) => report.group_reports.push(path),
            Ok(None) => {}
            Err(e) => {
                error!("分析主机组 {} 失败: {}", group_name, e);
                report.failed_groups.push(group_name.clone());
            }
        }
    }

    match generate_inheritance_report(api, report_dir, &timestamp).await {
        Ok(path) => report.inheritance_report = path,
        Err(e) => error!("生成模板继承报告时出错: {}", e),
    }

    info!("分析完成");
    Ok(report)
}
