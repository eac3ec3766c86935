use crate::app::CliApp;
use crate::cli::TemplateCommand;
use crate::utils::prompt_line;
use anyhow::Result;
use std::path::Path;
use tracing::{error, info, warn};
use zabbix_core::ZabbixApi;
use zabbix_core::report::{trigger_report_path, write_trigger_report};
use zabbix_core::template::{TemplateTarget, replace_templates};
use zabbix_core::triggers::{
    CheckScope, DeletionChoice, PREVIEW_LIMIT, TriggerRecord, analyze_hosts, collect_triggers,
    delete_all, delete_selected, parse_index_selection,
};

/// 处理模板相关子命令
pub async fn handle_template_command(app: &CliApp, cmd: TemplateCommand) -> Result<()> {
    let mut client = app.connect().await?;
    let result = run_template_command(app, &client, cmd).await;
    client.logout().await;
    result
}

async fn run_template_command<A: ZabbixApi + ?Sized>(
    app: &CliApp,
    api: &A,
    cmd: TemplateCommand,
) -> Result<()> {
    let report_dir = app.config.get_report_dir();

    let (target, old_template, new_template, check_triggers) = match cmd {
        TemplateCommand::CheckTriggers { name, by_group } => {
            let scope = if by_group {
                CheckScope::Group(name)
            } else {
                CheckScope::Host(name)
            };
            let records = collect_triggers(api, &scope).await?;
            return review_triggers(api, records, &report_dir).await;
        }
        TemplateCommand::Group {
            group,
            old_template,
            new_template,
            check_triggers,
        } => (
            TemplateTarget::Group(group),
            old_template,
            new_template,
            check_triggers,
        ),
        TemplateCommand::HostName {
            host,
            old_template,
            new_template,
            check_triggers,
        } => (
            TemplateTarget::HostName(host),
            old_template,
            new_template,
            check_triggers,
        ),
        TemplateCommand::HostId {
            hostid,
            old_template,
            new_template,
            check_triggers,
        } => (
            TemplateTarget::HostId(hostid),
            old_template,
            new_template,
            check_triggers,
        ),
    };

    let report = replace_templates(api, &target, &old_template, &new_template).await?;
    info!(
        "✅ 模板替换完成: {}/{} 个主机成功",
        report.success_count(),
        report.candidates
    );

    if check_triggers && report.success_count() > 0 {
        info!("🔍 检查替换成功的主机上的非模板触发器...");
        let records = analyze_hosts(api, &report.replaced_hosts).await;
        review_triggers(api, records, &report_dir).await?;
    }
    Ok(())
}

/// 输出报告、预览并按用户选择删除非模板触发器
async fn review_triggers<A: ZabbixApi + ?Sized>(
    api: &A,
    records: Vec<TriggerRecord>,
    report_dir: &Path,
) -> Result<()> {
    if records.is_empty() {
        info!("✅ 未发现非模板触发器");
        return Ok(());
    }

    let report_path = trigger_report_path(report_dir);
    write_trigger_report(&records, &report_path)?;
    info!("📄 发现 {} 个非模板触发器，报告: {}", records.len(), report_path.display());

    info!("预览（前 {} 条）:", PREVIEW_LIMIT.min(records.len()));
    for record in records.iter().take(PREVIEW_LIMIT) {
        info!("  - {}", record.preview());
    }
    if records.len() > PREVIEW_LIMIT {
        info!("  ... 其余 {} 条见报告文件", records.len() - PREVIEW_LIMIT);
    }

    let input = prompt_line("\n请选择操作 (1-删除全部, 2-手动选择, 3-跳过): ").await?;
    let choice = input
        .as_deref()
        .map(DeletionChoice::parse)
        .unwrap_or(DeletionChoice::Skip);
    info!("选择: {}", choice);

    match choice {
        DeletionChoice::DeleteAll => {
            let deleted = delete_all(api, &records).await;
            info!("✅ 已删除 {}/{} 个触发器", deleted, records.len());
        }
        DeletionChoice::Select => {
            for (index, record) in records.iter().enumerate() {
                info!("{:>4}. {}", index + 1, record.preview());
            }
            let Some(input) = prompt_line("请输入要删除的编号（逗号分隔，如 1,3,5）: ").await? else {
                info!("已跳过删除");
                return Ok(());
            };
            let selection = match parse_index_selection(&input, records.len()) {
                Ok(selection) => selection,
                Err(e) => {
                    error!("❌ {}，未删除任何触发器", e);
                    return Err(e.into());
                }
            };
            if selection.requested() == 0 {
                info!("未选择任何触发器");
                return Ok(());
            }
            let deleted = delete_selected(api, &records, &selection).await;
            info!("✅ 已删除 {}/{} 个选中的触发器", deleted, selection.requested());
        }
        DeletionChoice::Skip => info!("已跳过删除"),
        DeletionChoice::Invalid => warn!("⚠️  无效选择，跳过删除"),
    }
    Ok(())
}
