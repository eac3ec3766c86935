mod common;

use common::FakeZabbix;
use tempfile::TempDir;
use zabbix_core::backup::{BackupManager, load_snapshot};
use zabbix_core::config::RenameConfig;
use zabbix_core::directives::{RenameDirective, parse_directives};
use zabbix_core::error::{ErrorKind, ZabbixError};
use zabbix_core::matcher::LetterPrefixMatcher;
use zabbix_core::rename::{
    GroupRenamer, RenameOutcome, cleanup_empty_groups, delete_empty_group, run_rename,
};

fn fast_config() -> RenameConfig {
    RenameConfig {
        request_delay_ms: 0,
        ..RenameConfig::default()
    }
}

#[tokio::test]
async fn test_prefix_match_resolves_lettered_group() {
    let fake = FakeZabbix::new();
    let gid = fake.add_group("x_财务系统");
    let config = fast_config();
    let matcher = LetterPrefixMatcher::default();
    let renamer = GroupRenamer::new(&fake, &matcher, &config);

    let group = renamer.resolve_group("财务系统").await.unwrap();
    assert_eq!(group.groupid, gid);
    assert_eq!(group.name, "x_财务系统");

    // 精确查询 + a_ ... x_ 共 25 次
    assert_eq!(fake.call_count("hostgroup.get"), 25);
}

#[tokio::test]
async fn test_exact_match_wins_over_prefix() {
    let fake = FakeZabbix::new();
    let exact = fake.add_group("财务系统");
    fake.add_group("a_财务系统");
    let config = fast_config();
    let matcher = LetterPrefixMatcher::default();
    let renamer = GroupRenamer::new(&fake, &matcher, &config);

    let group = renamer.resolve_group("财务系统").await.unwrap();
    assert_eq!(group.groupid, exact);
    assert_eq!(fake.call_count("hostgroup.get"), 1);
}

#[tokio::test]
async fn test_unknown_group_is_ambiguity_error() {
    let fake = FakeZabbix::new();
    let config = fast_config();
    let matcher = LetterPrefixMatcher::default();
    let renamer = GroupRenamer::new(&fake, &matcher, &config);

    let err = renamer.resolve_group("不存在").await.unwrap_err();
    assert!(matches!(err, ZabbixError::GroupNotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::Ambiguity);
    assert_eq!(fake.call_count("hostgroup.get"), 27);
}

#[tokio::test]
async fn test_rename_preserves_prefix() {
    let fake = FakeZabbix::new();
    let gid = fake.add_group("x_旧名称");
    let config = fast_config();
    let matcher = LetterPrefixMatcher::default();
    let renamer = GroupRenamer::new(&fake, &matcher, &config);

    let outcome = renamer
        .apply(&RenameDirective::new("旧名称", "新名称"))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        RenameOutcome::Renamed {
            from: "x_旧名称".to_string(),
            to: "x_新名称".to_string(),
        }
    );
    assert_eq!(fake.group_name(&gid).unwrap(), "x_新名称");
}

#[tokio::test]
async fn test_skip_sentinel_makes_no_calls() {
    let fake = FakeZabbix::new();
    fake.add_group("测试组");
    let config = fast_config();
    let matcher = LetterPrefixMatcher::default();
    let renamer = GroupRenamer::new(&fake, &matcher, &config);

    let outcome = renamer
        .apply(&RenameDirective::new("测试组", "无需修改"))
        .await
        .unwrap();

    assert_eq!(outcome, RenameOutcome::Skipped);
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_offline_moves_all_hosts_and_returns_group_id() {
    let fake = FakeZabbix::new();
    let gid = fake.add_group("测试组");
    let other = fake.add_group("Linux servers");
    let h1 = fake.add_host("web-01", &[&gid, &other]);
    let h2 = fake.add_host("web-02", &[&gid]);
    let config = fast_config();
    let matcher = LetterPrefixMatcher::default();
    let renamer = GroupRenamer::new(&fake, &matcher, &config);

    let outcome = renamer
        .apply(&RenameDirective::new("测试组", "下线"))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        RenameOutcome::MovedOffline {
            groupid: gid.clone(),
            hosts: 2,
        }
    );

    // 下线分组按需创建，主机只属于下线分组
    let offline = fake.group_id("下线").unwrap();
    assert_eq!(fake.host(&h1).groups, vec![offline.clone()]);
    assert_eq!(fake.host(&h2).groups, vec![offline]);
    // 原分组此时还在，等待清理
    assert!(fake.group_name(&gid).is_some());
}

#[tokio::test]
async fn test_cleanup_never_deletes_non_empty_group() {
    let fake = FakeZabbix::new();
    let empty = fake.add_group("空组");
    let busy = fake.add_group("非空组");
    fake.add_host("db-01", &[&busy]);

    assert!(!delete_empty_group(&fake, &busy, "非空组").await);
    assert_eq!(fake.call_count("hostgroup.delete"), 0);

    let deleted = cleanup_empty_groups(
        &fake,
        &[
            empty.clone(),
            busy.clone(),
            "not-a-number".to_string(),
            "999999".to_string(),
        ],
    )
    .await;

    assert_eq!(deleted, 1);
    assert!(fake.group_name(&empty).is_none());
    assert!(fake.group_name(&busy).is_some());
    assert_eq!(fake.call_count("hostgroup.delete"), 1);
}

#[tokio::test]
async fn test_run_rename_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let fake = FakeZabbix::new();
    let finance = fake.add_group("a_财务系统");
    let legacy = fake.add_group("旧系统");
    // 同名分组，精确查询返回两条
    fake.add_group("重复");
    fake.add_group("重复");
    let host = fake.add_host("legacy-01", &[&legacy]);

    let config = fast_config();
    let csv = "原系统名称,修改后系统名称\n财务系统,财务中台\n测试组,无需修改\n旧系统,下线\n重复,新\n缺失,新\n";
    let directives = parse_directives(csv.as_bytes(), &config).unwrap();
    assert_eq!(directives.len(), 4);

    let manager = BackupManager::new(temp_dir.path().to_path_buf()).unwrap();
    let matcher = LetterPrefixMatcher::from_config(&config);
    let report = run_rename(&fake, &matcher, &config, &manager, &directives)
        .await
        .unwrap();

    assert_eq!(report.renamed, 1);
    assert_eq!(report.moved_offline, 1);
    assert_eq!(report.ambiguous, 1);
    assert_eq!(report.not_found, 1);
    assert_eq!(report.deleted_groups, 1);

    assert_eq!(fake.group_name(&finance).unwrap(), "a_财务中台");
    assert!(fake.group_name(&legacy).is_none());
    assert_eq!(fake.host(&host).groups, vec![fake.group_id("下线").unwrap()]);

    // 备份先于任何修改
    let calls = fake.calls();
    assert_eq!(calls[0].0, "hostgroup.get");
    assert!(calls[0].1.get("selectHosts").is_some());
    let snapshot = load_snapshot(&report.backup_file).unwrap();
    assert_eq!(snapshot["a_财务系统"].groupid, finance);
    assert_eq!(snapshot["旧系统"].hosts[0].hostid, host);
}

#[tokio::test]
async fn test_run_rename_aborts_when_backup_fails() {
    let temp_dir = TempDir::new().unwrap();
    let fake = FakeZabbix::new();
    fake.add_group("旧系统");
    fake.fail_method("hostgroup.get");

    let config = fast_config();
    let manager = BackupManager::new(temp_dir.path().to_path_buf()).unwrap();
    let matcher = LetterPrefixMatcher::default();
    let result = run_rename(
        &fake,
        &matcher,
        &config,
        &manager,
        &[RenameDirective::new("旧系统", "新系统")],
    )
    .await;

    assert!(result.is_err());
    assert_eq!(fake.call_count("hostgroup.update"), 0);
    assert!(manager.list_backups().unwrap().is_empty());
}
