//! CSV / TXT 报告输出

use crate::analysis::{AnalysisRow, InheritanceIssue};
use crate::constants::output;
use crate::detector::{DetectionResult, DetectionScope, DetectionSummary, HostDetection};
use crate::error::Result;
use crate::triggers::TriggerRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// 文件名中最多保留的字符数
const MAX_FILENAME_CHARS: usize = 100;

static UNSAFE_CHARS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("文件名字符正则无效"));

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("空白正则无效"));

/// 清理文件名中的特殊字符与空白，并限制长度
pub fn sanitize_filename(name: &str) -> String {
    let cleaned = UNSAFE_CHARS_RE.replace_all(name, "_");
    let cleaned = WHITESPACE_RE.replace_all(&cleaned, "_");
    cleaned.chars().take(MAX_FILENAME_CHARS).collect()
}

fn create_writer(path: &Path) -> Result<csv::Writer<fs::File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(csv::Writer::from_path(path)?)
}

// ============================================================================
// 非模板触发器报告
// ============================================================================

const TRIGGER_HEADERS: [&str; 9] = [
    "主机名",
    "主机ID",
    "触发器ID",
    "触发器描述",
    "表达式",
    "优先级",
    "状态",
    "监控项名称",
    "监控项键值",
];

/// 每个关联监控项写一行；没有监控项的触发器写一行"无关联监控项"
pub fn write_trigger_report(records: &[TriggerRecord], path: &Path) -> Result<()> {
    let mut writer = create_writer(path)?;
    writer.write_record(TRIGGER_HEADERS)?;

    for record in records {
        let base = [
            record.host_name.as_str(),
            record.host_id.as_str(),
            record.trigger_id.as_str(),
            record.description.as_str(),
            record.expression.as_str(),
            record.priority.as_str(),
            record.status.as_str(),
        ];
        if record.items.is_empty() {
            writer.write_record(base.iter().chain(&["无关联监控项", "无关联监控项"]))?;
        } else {
            for item in &record.items {
                writer.write_record(
                    base.iter()
                        .chain(&[item.name.as_str(), item.key.as_str()]),
                )?;
            }
        }
    }

    writer.flush()?;
    info!("触发器报告已生成: {}", path.display());
    Ok(())
}

/// non_template_triggers_<时间戳>.csv
pub fn trigger_report_path(report_dir: &Path) -> PathBuf {
    report_dir.join(format!(
        "{}{}.csv",
        output::NON_TEMPLATE_TRIGGER_REPORT_PREFIX,
        output::timestamp()
    ))
}

// ============================================================================
// 检测报告
// ============================================================================

const DETECTION_HEADERS: [&str; 11] = [
    "主机名",
    "主机ID",
    "问题类型",
    "项目ID",
    "项目名称",
    "项目键值",
    "状态",
    "优先级",
    "是否模板项",
    "模板ID",
    "描述",
];

fn yes_no(value: bool) -> &'static str {
    if value { "是" } else { "否" }
}

fn detection_rows(host: &HostDetection) -> Vec<[String; 11]> {
    let row = |issue: &str,
               id: &str,
               name: &str,
               key: &str,
               status: &str,
               priority: &str,
               is_template: &str,
               template_id: &str,
               description: String| {
        [
            host.host_name.clone(),
            host.host_id.clone(),
            issue.to_string(),
            id.to_string(),
            name.to_string(),
            key.to_string(),
            status.to_string(),
            priority.to_string(),
            is_template.to_string(),
            template_id.to_string(),
            description,
        ]
    };

    let mut rows = Vec::new();
    for item in &host.non_template_items {
        rows.push(row(
            "非模板监控项",
            &item.itemid,
            &item.name,
            &item.key,
            &item.status,
            "无",
            "否",
            "无",
            format!("类型: {}, 采集间隔: {}", item.item_type, item.delay),
        ));
    }
    for trigger in &host.non_template_triggers {
        rows.push(row(
            "非模板触发器",
            &trigger.triggerid,
            &trigger.description,
            "无",
            &trigger.status,
            &trigger.priority,
            "否",
            "无",
            format!("表达式: {}", trigger.expression),
        ));
    }
    for item in &host.disabled_items {
        rows.push(row(
            "被禁用的监控项",
            &item.itemid,
            &item.name,
            &item.key,
            "禁用",
            "无",
            yes_no(item.is_template_item),
            &item.template_id,
            "监控项已被禁用".to_string(),
        ));
    }
    for trigger in &host.disabled_triggers {
        rows.push(row(
            "被禁用的触发器",
            &trigger.triggerid,
            &trigger.description,
            "无",
            "禁用",
            &trigger.priority,
            yes_no(trigger.is_template_trigger),
            &trigger.template_id,
            "触发器已被禁用".to_string(),
        ));
    }
    for issue in &host.template_items_with_non_template_triggers {
        for trigger in &issue.triggers {
            rows.push(row(
                "模板监控项中的非模板触发器",
                &trigger.triggerid,
                &trigger.description,
                &issue.item_key,
                &trigger.status,
                &trigger.priority,
                "否",
                "无",
                format!("关联的模板监控项: {}", issue.item_name),
            ));
        }
    }
    rows
}

/// 检测明细 CSV（11 列）
pub fn write_detection_detail(result: &DetectionResult, path: &Path) -> Result<()> {
    let mut writer = create_writer(path)?;
    writer.write_record(DETECTION_HEADERS)?;
    for host in &result.hosts {
        for row in detection_rows(host) {
            writer.write_record(&row)?;
        }
    }
    writer.flush()?;
    info!("详细报告已生成: {}", path.display());
    Ok(())
}

fn write_summary_counts(out: &mut String, summary: &DetectionSummary, indent: &str) {
    let lines = [
        ("非模板监控项", summary.non_template_items),
        ("非模板触发器", summary.non_template_triggers),
        ("被禁用的监控项", summary.disabled_items),
        ("被禁用的触发器", summary.disabled_triggers),
        (
            "模板监控项中的非模板触发器",
            summary.template_items_with_non_template_triggers,
        ),
    ];
    for (label, count) in lines {
        let _ = writeln!(out, "{indent}{label}: {count} 个");
    }
}

/// 汇总报告文本
pub fn render_detection_summary(result: &DetectionResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Zabbix 检测汇总报告");
    let _ = writeln!(out, "{}", "=".repeat(50));
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "生成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out);

    match &result.scope {
        DetectionScope::HostGroup(name) => {
            let _ = writeln!(out, "检测范围: 主机组 '{name}'");
        }
        DetectionScope::Host(name) => {
            let _ = writeln!(out, "检测范围: 主机 '{name}'");
        }
    }
    let _ = writeln!(out, "主机总数: {}", result.total_hosts);
    let _ = writeln!(out);

    let _ = writeln!(out, "检测结果汇总:");
    let _ = writeln!(out, "{}", "-".repeat(30));
    write_summary_counts(&mut out, &result.summary(), "");
    let _ = writeln!(out);

    if matches!(result.scope, DetectionScope::HostGroup(_)) {
        let _ = writeln!(out, "各主机详情:");
        let _ = writeln!(out, "{}", "-".repeat(30));
        for host in &result.hosts {
            let _ = writeln!(out);
            let _ = writeln!(out, "主机: {} (ID: {})", host.host_name, host.host_id);
            let mut counts = String::new();
            write_summary_counts(&mut counts, &host.summary(), "  - ");
            out.push_str(&counts);
            if !host.templates.is_empty() {
                let names: Vec<&str> = host.templates.iter().map(|t| t.name.as_str()).collect();
                let _ = writeln!(out, "  - 关联模板: {}", names.join(", "));
            }
        }
    }

    out
}

/// 汇总报告 TXT
pub fn write_detection_summary(result: &DetectionResult, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, render_detection_summary(result))?;
    info!("汇总报告已生成: {}", path.display());
    Ok(())
}

/// 写出检测明细与汇总报告，返回 (明细 CSV, 汇总 TXT)
pub fn write_detection_reports(
    result: &DetectionResult,
    report_dir: &Path,
) -> Result<(PathBuf, PathBuf)> {
    let identifier = sanitize_filename(result.scope.identifier());
    let timestamp = output::timestamp();
    let detail = report_dir.join(format!(
        "{}{}_{}.csv",
        output::DETECTION_DETAIL_PREFIX,
        identifier,
        timestamp
    ));
    let summary = report_dir.join(format!(
        "{}{}_{}.txt",
        output::DETECTION_SUMMARY_PREFIX,
        identifier,
        timestamp
    ));

    write_detection_detail(result, &detail)?;
    write_detection_summary(result, &summary)?;
    Ok((detail, summary))
}

// ============================================================================
// 主机组分析报告
// ============================================================================

pub fn write_analysis_report(rows: &[AnalysisRow], path: &Path) -> Result<()> {
    let mut writer = create_writer(path)?;
    writer.write_record([
        "主机名",
        "问题类型",
        "触发器描述",
        "监控项名称",
        "监控项键值",
        "详细信息",
    ])?;
    for row in rows {
        writer.write_record([
            &row.host_name,
            &row.issue_type,
            &row.trigger_description,
            &row.item_name,
            &row.item_key,
            &row.detail,
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_inheritance_report(issues: &[InheritanceIssue], path: &Path) -> Result<()> {
    let mut writer = create_writer(path)?;
    writer.write_record(["模板名称", "继承触发器描述", "继承来源模板"])?;
    for issue in issues {
        writer.write_record([
            &issue.template_name,
            &issue.trigger_description,
            &issue.source_template,
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triggers::LinkedItem;
    use tempfile::TempDir;

    fn record(items: Vec<LinkedItem>) -> TriggerRecord {
        TriggerRecord {
            host_name: "web-01".to_string(),
            host_id: "10084".to_string(),
            trigger_id: "200".to_string(),
            description: "CPU 过高".to_string(),
            expression: "last(/web-01/cpu)>90".to_string(),
            priority: "严重".to_string(),
            status: "启用".to_string(),
            items,
        }
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("a/b:c  d"), "a_b_c_d");
        assert_eq!(sanitize_filename("财务 系统?"), "财务_系统_");
        assert_eq!(
            sanitize_filename(&"长".repeat(150)).chars().count(),
            100
        );
    }

    #[test]
    fn test_trigger_report_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out").join("triggers.csv");

        let records = vec![
            record(vec![
                LinkedItem {
                    name: "CPU".to_string(),
                    key: "system.cpu.util".to_string(),
                },
                LinkedItem {
                    name: "Load".to_string(),
                    key: "system.cpu.load".to_string(),
                },
            ]),
            record(Vec::new()),
        ];
        write_trigger_report(&records, &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), 9);
        assert_eq!(&headers[0], "主机名");

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[1][8], "system.cpu.load");
        assert_eq!(&rows[2][7], "无关联监控项");
    }
}
