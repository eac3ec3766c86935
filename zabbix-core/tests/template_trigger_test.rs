mod common;

use common::FakeZabbix;
use serde_json::json;
use tempfile::TempDir;
use zabbix_core::error::{ErrorKind, ZabbixError};
use zabbix_core::report::{trigger_report_path, write_trigger_report};
use zabbix_core::template::{TemplateTarget, replace_templates};
use zabbix_core::triggers::{
    CheckScope, collect_triggers, delete_all, delete_selected, parse_index_selection,
};

struct TemplateFixture {
    fake: FakeZabbix,
    old: String,
    new: String,
    other: String,
    linked: String,
    unlinked: String,
    elsewhere: String,
}

fn template_fixture() -> TemplateFixture {
    let fake = FakeZabbix::new();
    let old = fake.add_template("Template OS Linux");
    let new = fake.add_template("Linux by Zabbix agent");
    let other = fake.add_template("Template App SSH");
    let linux = fake.add_group("Linux servers");
    let windows = fake.add_group("Windows servers");

    let linked = fake.add_host("web-01", &[&linux]);
    fake.link_templates(&linked, &[&other, &old]);
    let unlinked = fake.add_host("web-02", &[&linux]);
    fake.link_templates(&unlinked, &[&other]);
    let elsewhere = fake.add_host("win-01", &[&windows]);
    fake.link_templates(&elsewhere, &[&old]);

    TemplateFixture {
        fake,
        old,
        new,
        other,
        linked,
        unlinked,
        elsewhere,
    }
}

#[tokio::test]
async fn test_replace_template_in_group() {
    let fx = template_fixture();

    let report = replace_templates(
        &fx.fake,
        &TemplateTarget::Group("Linux servers".to_string()),
        "Template OS Linux",
        "Linux by Zabbix agent",
    )
    .await
    .unwrap();

    assert_eq!(report.candidates, 1);
    assert_eq!(report.success_count(), 1);
    assert_eq!(report.replaced_hosts[0].name, "web-01");

    // 只替换旧模板，其余模板和顺序不变
    assert_eq!(fx.fake.host(&fx.linked).templates, vec![fx.other.clone(), fx.new.clone()]);
    assert_eq!(fx.fake.host(&fx.unlinked).templates, vec![fx.other.clone()]);
    // 其他分组的主机不受影响
    assert_eq!(fx.fake.host(&fx.elsewhere).templates, vec![fx.old.clone()]);
}

#[tokio::test]
async fn test_replace_template_by_host_name_and_id() {
    let fx = template_fixture();

    let report = replace_templates(
        &fx.fake,
        &TemplateTarget::HostId(fx.elsewhere.clone()),
        "Template OS Linux",
        "Linux by Zabbix agent",
    )
    .await
    .unwrap();
    assert_eq!(report.success_count(), 1);
    assert_eq!(fx.fake.host(&fx.elsewhere).templates, vec![fx.new.clone()]);

    // 主机没有链接旧模板：作为候选但替换失败
    let report = replace_templates(
        &fx.fake,
        &TemplateTarget::HostName("web-02".to_string()),
        "Template OS Linux",
        "Linux by Zabbix agent",
    )
    .await
    .unwrap();
    assert_eq!(report.candidates, 1);
    assert_eq!(report.success_count(), 0);
    assert_eq!(fx.fake.call_count("host.update"), 1);
}

#[tokio::test]
async fn test_replace_template_missing_target_or_template() {
    let fx = template_fixture();

    let err = replace_templates(
        &fx.fake,
        &TemplateTarget::Group("不存在的组".to_string()),
        "Template OS Linux",
        "Linux by Zabbix agent",
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ZabbixError::GroupNotFound { .. }));
    assert_eq!(fx.fake.call_count("template.get"), 0);

    let err = replace_templates(
        &fx.fake,
        &TemplateTarget::HostName("no-such-host".to_string()),
        "Template OS Linux",
        "Linux by Zabbix agent",
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ZabbixError::HostNotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::Ambiguity);

    let err = replace_templates(
        &fx.fake,
        &TemplateTarget::HostName("web-01".to_string()),
        "Template OS Linux",
        "不存在的模板",
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ZabbixError::TemplateNotFound { .. }));
    assert_eq!(fx.fake.call_count("host.update"), 0);
}

fn trigger_fixture() -> (FakeZabbix, String) {
    let fake = FakeZabbix::new();
    let group = fake.add_group("Linux servers");
    let web = fake.add_host("web-01", &[&group]);
    let db = fake.add_host("db-01", &[&group]);

    fake.add_trigger(json!({
        "triggerid": "20001",
        "hostid": web,
        "description": "CPU 使用率过高",
        "expression": "last(/web-01/system.cpu.util)>90",
        "priority": "4",
        "status": "0",
        "templateid": "0",
        "flags": "0",
        "items": [{"itemid": "30001", "name": "CPU utilization", "key_": "system.cpu.util"}]
    }));
    // 模板继承的触发器
    fake.add_trigger(json!({
        "triggerid": "20002",
        "hostid": web,
        "description": "Zabbix agent 不可用",
        "priority": "3",
        "status": "0",
        "templateid": "13000",
        "flags": "0"
    }));
    // 自动发现生成的触发器
    fake.add_trigger(json!({
        "triggerid": "20003",
        "hostid": web,
        "description": "磁盘 / 空间不足",
        "templateid": "0",
        "flags": "4"
    }));
    fake.add_trigger(json!({
        "triggerid": "20004",
        "hostid": db,
        "description": "MySQL 连接数过多",
        "priority": "2",
        "status": "1",
        "flags": "0"
    }));

    (fake, web)
}

#[tokio::test]
async fn test_collect_triggers_for_host_skips_template_and_discovered() {
    let (fake, web) = trigger_fixture();

    let records = collect_triggers(&fake, &CheckScope::Host("web-01".to_string()))
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.trigger_id, "20001");
    assert_eq!(record.host_id, web);
    assert_eq!(record.priority, "严重");
    assert_eq!(record.status, "启用");
    assert_eq!(record.items.len(), 1);
    assert_eq!(record.items[0].key, "system.cpu.util");
}

#[tokio::test]
async fn test_collect_triggers_for_group() {
    let (fake, _) = trigger_fixture();

    let records = collect_triggers(&fake, &CheckScope::Group("Linux servers".to_string()))
        .await
        .unwrap();

    let mut ids: Vec<&str> = records.iter().map(|r| r.trigger_id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["20001", "20004"]);
    let mysql = records.iter().find(|r| r.trigger_id == "20004").unwrap();
    assert_eq!(mysql.status, "禁用");
    assert_eq!(mysql.expression, "无表达式");

    let err = collect_triggers(&fake, &CheckScope::Host("missing".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, ZabbixError::HostNotFound { .. }));
}

#[tokio::test]
async fn test_trigger_report_is_written() {
    let (fake, _) = trigger_fixture();
    let temp_dir = TempDir::new().unwrap();
    let records = collect_triggers(&fake, &CheckScope::Group("Linux servers".to_string()))
        .await
        .unwrap();

    let path = trigger_report_path(&temp_dir.path().join("reports"));
    write_trigger_report(&records, &path).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("CPU 使用率过高"));
    assert!(content.contains("system.cpu.util"));
    assert!(content.contains("无关联监控项"));
}

#[tokio::test]
async fn test_delete_all_and_selected() {
    let (fake, _) = trigger_fixture();
    let records = collect_triggers(&fake, &CheckScope::Group("Linux servers".to_string()))
        .await
        .unwrap();
    assert_eq!(records.len(), 2);

    let selection = parse_index_selection("2,7", records.len()).unwrap();
    let deleted = delete_selected(&fake, &records, &selection).await;
    assert_eq!(deleted, 1);
    assert_eq!(fake.trigger_ids().len(), 3);
    assert!(!fake.trigger_ids().contains(&records[1].trigger_id));

    let remaining = collect_triggers(&fake, &CheckScope::Group("Linux servers".to_string()))
        .await
        .unwrap();
    let deleted = delete_all(&fake, &remaining).await;
    assert_eq!(deleted, 1);
    assert_eq!(fake.trigger_ids(), vec!["20002", "20003"]);
}

#[tokio::test]
async fn test_delete_failure_is_counted() {
    let (fake, _) = trigger_fixture();
    let records = collect_triggers(&fake, &CheckScope::Host("web-01".to_string()))
        .await
        .unwrap();

    fake.fail_method("trigger.delete");
    assert_eq!(delete_all(&fake, &records).await, 0);
    assert_eq!(fake.trigger_ids().len(), 4);
}
