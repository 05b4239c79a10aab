//! カタログ同期のエンドツーエンドテスト

#![allow(clippy::unwrap_used)]
#![allow(clippy::indexing_slicing)]
#![allow(missing_docs)]

mod common;

use std::fs;
use std::sync::Arc;

use common::{
    ScriptedProvider,
    Workspace,
    settings,
};
use i18n_catalog_sync::catalog::DotPath;
use i18n_catalog_sync::driver::{
    Driver,
    RunMode,
    RunOptions,
};
use i18n_catalog_sync::report::LocaleStatus;
use pretty_assertions::assert_eq;
use serde_json::json;

fn sync() -> RunOptions {
    RunOptions { mode: RunMode::Sync, locales: Vec::new() }
}

fn check() -> RunOptions {
    RunOptions { mode: RunMode::Check, locales: Vec::new() }
}

fn paths(list: &[DotPath]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

#[tokio::test(start_paused = true)]
async fn missing_nested_key_is_translated_and_reported() {
    let ws = Workspace::new();
    ws.write_catalog("en", r#"{"a": {"b": "Hello"}}"#).write_catalog("zh", "{}");
    let provider = Arc::new(ScriptedProvider::tagging());
    let driver = ws.driver(settings(&["zh"]), provider.clone());

    let report = driver.run(&sync()).await.unwrap();

    let zh = &report.locales[0];
    assert_eq!(paths(&zh.missing), vec!["a.b"]);
    assert_eq!(ws.catalog_json("zh"), json!({"a": {"b": "[tr] Hello"}}));
    assert_eq!(provider.calls(), vec!["Hello"]);
}

#[tokio::test(start_paused = true)]
async fn placeholder_is_replaced_by_translation() {
    let ws = Workspace::new();
    ws.write_catalog("en", r#"{"x": "Hi"}"#).write_catalog("zh", r#"{"x": "待翻译"}"#);
    let provider = Arc::new(ScriptedProvider::tagging());
    let driver = ws.driver(settings(&["zh"]), provider.clone());

    let report = driver.run(&sync()).await.unwrap();

    assert_eq!(paths(&report.locales[0].untranslated), vec!["x"]);
    assert_eq!(provider.calls(), vec!["Hi"]);
    let value = ws.catalog_json("zh")["x"].as_str().unwrap().to_string();
    assert!(!value.contains("待翻译"));
    assert_eq!(value, "[tr] Hi");
}

#[tokio::test(start_paused = true)]
async fn extra_keys_are_reported_and_kept() {
    let ws = Workspace::new();
    let original = "{\n  \"x\": \"嗨\",\n  \"y\": \"多余\"\n}\n";
    ws.write_catalog("en", r#"{"x": "Hi"}"#).write_catalog("zh", original);
    let provider = Arc::new(ScriptedProvider::tagging());
    let driver = ws.driver(settings(&["zh"]), provider.clone());

    let report = driver.run(&sync()).await.unwrap();

    assert_eq!(paths(&report.locales[0].extra), vec!["y"]);
    assert_eq!(report.locales[0].status, LocaleStatus::Consistent);
    assert_eq!(ws.read_catalog("zh"), original);
    assert!(provider.calls().is_empty());
    assert!(!ws.backup_path("zh").exists());
}

#[tokio::test]
async fn server_errors_leave_values_as_they_were() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(500)
        .with_body("internal error")
        .expect(6)
        .create_async()
        .await;

    let ws = Workspace::new();
    ws.write_catalog("en", r#"{"z": "Zebra"}"#)
        .write_catalog("zh", r#"{"z": "待翻译 Zebra"}"#)
        .write_catalog("ar", "{}");
    let mut settings = settings(&["zh", "ar"]);
    settings.translator.endpoint = format!("{}/", server.url());
    settings.translator.base_delay_ms = 1;
    settings.translator.pacing_interval_ms = 0;
    let driver = Driver::with_http_provider({
        let mut config = i18n_catalog_sync::config::ConfigManager::new(ws.root());
        config.update_settings(settings).unwrap();
        config
    })
    .unwrap();

    let report = driver.run(&sync()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(report.failed_translations(), 2);
    assert_eq!(report.locales[0].failed.len(), 1);
    assert_eq!(report.locales[1].failed.len(), 1);
    // 既存の値はそのまま、欠落していたキーは原文で埋める
    assert_eq!(ws.read_catalog("zh"), r#"{"z": "待翻译 Zebra"}"#);
    assert_eq!(ws.catalog_json("ar"), json!({"z": "Zebra"}));
}

#[tokio::test(start_paused = true)]
async fn retries_are_bounded_per_key() {
    let ws = Workspace::new();
    ws.write_catalog("en", r#"{"a": "One", "b": "Two"}"#);
    let provider = Arc::new(ScriptedProvider::failing());
    let mut settings = settings(&["zh"]);
    settings.fill_missing_on_failure = false;
    let driver = ws.driver(settings, provider.clone());

    let report = driver.run(&sync()).await.unwrap();

    assert_eq!(provider.calls(), vec!["One", "One", "One", "Two", "Two", "Two"]);
    assert_eq!(report.locales[0].failed.len(), 2);
    assert!(matches!(report.locales[0].status, LocaleStatus::Persisted { writes: 0, backup: None, .. }));
    assert!(!ws.catalog_path("zh").exists());
}

#[tokio::test(start_paused = true)]
async fn second_run_writes_nothing() {
    let ws = Workspace::new();
    ws.write_catalog("en", r#"{"nav": {"home": "Home", "about": "About"}, "title": "Title"}"#)
        .write_catalog("zh", r#"{"nav": {"home": "首页"}, "title": "待翻译"}"#);
    let provider = Arc::new(ScriptedProvider::tagging());
    let driver = ws.driver(settings(&["zh"]), provider.clone());

    driver.run(&sync()).await.unwrap();
    let after_first = ws.read_catalog("zh");
    let backup_after_first = fs::read_to_string(ws.backup_path("zh")).unwrap();
    let calls_after_first = provider.calls().len();

    let report = driver.run(&sync()).await.unwrap();

    assert_eq!(report.locales[0].status, LocaleStatus::Consistent);
    assert_eq!(provider.calls().len(), calls_after_first);
    assert_eq!(ws.read_catalog("zh"), after_first);
    assert_eq!(fs::read_to_string(ws.backup_path("zh")).unwrap(), backup_after_first);
}

#[tokio::test(start_paused = true)]
async fn existing_translations_survive_and_backup_matches_previous_file() {
    let ws = Workspace::new();
    let original = "{\n  \"greeting\": \"你好\",\n  \"farewell\": \"待翻译\",\n  \"legacy\": \"旧\"\n}\n";
    ws.write_catalog("en", r#"{"greeting": "Hello", "farewell": "Bye", "new": "New"}"#)
        .write_catalog("zh", original);
    let driver = ws.driver(settings(&["zh"]), Arc::new(ScriptedProvider::tagging()));

    let report = driver.run(&sync()).await.unwrap();

    assert!(matches!(report.locales[0].status, LocaleStatus::Persisted { writes: 2, .. }));
    assert_eq!(
        ws.catalog_json("zh"),
        json!({"greeting": "你好", "farewell": "[tr] Bye", "legacy": "旧", "new": "[tr] New"})
    );
    assert_eq!(fs::read(ws.backup_path("zh")).unwrap(), original.as_bytes());
}

#[tokio::test(start_paused = true)]
async fn check_reports_drift_without_writing() {
    let ws = Workspace::new();
    let zh = r#"{"x": "待翻译", "extra": "多"}"#;
    ws.write_catalog("en", r#"{"x": "Hi", "y": "Yes", "z": "Zebra crossing"}"#)
        .write_catalog("zh", zh)
        .write_catalog("fr", r#"{"x": "Salut", "y": "Oui", "z": "Zebra crossing"}"#);
    let provider = Arc::new(ScriptedProvider::tagging());
    let driver = ws.driver(settings(&["zh", "fr"]), provider.clone());

    let report = driver.run(&check()).await.unwrap();

    let zh_report = &report.locales[0];
    assert_eq!(zh_report.status, LocaleStatus::Checked);
    assert_eq!(paths(&zh_report.missing), vec!["y", "z"]);
    assert_eq!(paths(&zh_report.untranslated), vec!["x"]);
    assert_eq!(paths(&zh_report.extra), vec!["extra"]);
    assert!(report.locales[1].complete());
    assert_eq!(paths(&report.locales[1].identical_to_reference), vec!["z"]);
    assert!(report.has_drift());
    assert!(provider.calls().is_empty());
    assert_eq!(ws.read_catalog("zh"), zh);
    assert!(!ws.backup_path("zh").exists());
}

#[tokio::test(start_paused = true)]
async fn undefined_keys_in_source_are_listed() {
    let ws = Workspace::new();
    ws.write_catalog("en", r#"{"nav": {"home": "Home"}, "common": {"save": "Save"}}"#)
        .write_catalog("zh", r#"{"nav": {"home": "首页"}, "common": {"save": "保存"}}"#)
        .write(
            "components/Nav.tsx",
            r#"
export function Nav() {
  const t = useTranslations("nav");
  const tCommon = useTranslations("common");
  return <a title={tCommon("save")}>{t("home")}{t("contact")}</a>;
}
"#,
        )
        .write("app/page.tsx", r#"export default function Page() { return t("hero.title"); }"#)
        .write("node_modules/pkg/components/x.tsx", r#"t("ignored.key");"#);
    let mut settings = settings(&["zh"]);
    settings.usage.enabled = true;
    let driver = ws.driver(settings, Arc::new(ScriptedProvider::tagging()));

    let report = driver.run(&check()).await.unwrap();

    let undefined: Vec<String> = report.undefined_keys.iter().map(ToString::to_string).collect();
    assert_eq!(undefined, vec!["contact (components/Nav.tsx:5)", "hero.title (app/page.tsx:1)"]);
    assert_eq!(report.used_keys, 4);
    assert!(report.has_drift());
}

#[tokio::test(start_paused = true)]
async fn json_report_uses_camel_case_fields() {
    let ws = Workspace::new();
    ws.write_catalog("en", r#"{"x": "Hi"}"#).write_catalog("zh", "{}");
    let driver = ws.driver(settings(&["zh"]), Arc::new(ScriptedProvider::tagging()));

    let report = driver.run(&check()).await.unwrap();
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["referenceLocale"], json!("en"));
    assert_eq!(value["referenceKeys"], json!(1));
    assert_eq!(value["locales"][0]["status"], json!("checked"));
    assert_eq!(value["locales"][0]["missing"], json!(["x"]));
    assert_eq!(value["locales"][0]["identicalToReference"], json!([]));
}

#[tokio::test(start_paused = true)]
async fn check_with_corrupt_catalog_is_not_clean() {
    let ws = Workspace::new();
    ws.write_catalog("en", r#"{"x": "Hi"}"#)
        .write_catalog("zh", "{ broken")
        .write_catalog("fr", r#"{"x": "Salut"}"#);
    let driver = ws.driver(settings(&["zh", "fr"]), Arc::new(ScriptedProvider::tagging()));

    let report = driver.run(&check()).await.unwrap();

    assert!(report.locales[0].aborted());
    assert_eq!(report.locales[1].status, LocaleStatus::Checked);
    assert!(!report.has_drift());
    assert!(report.has_aborted());
    assert!(!report.is_clean());
    assert_eq!(ws.read_catalog("zh"), "{ broken");
}

#[cfg(unix)]
#[tokio::test(start_paused = true)]
async fn sync_keeps_catalog_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let ws = Workspace::new();
    ws.write_catalog("en", r#"{"x": "Hi"}"#).write_catalog("zh", r#"{"x": "待翻译"}"#);
    fs::set_permissions(ws.catalog_path("zh"), fs::Permissions::from_mode(0o644)).unwrap();
    let driver = ws.driver(settings(&["zh"]), Arc::new(ScriptedProvider::tagging()));

    driver.run(&sync()).await.unwrap();

    assert_eq!(ws.catalog_json("zh"), json!({"x": "[tr] Hi"}));
    let catalog_mode = fs::metadata(ws.catalog_path("zh")).unwrap().permissions().mode() & 0o777;
    let backup_mode = fs::metadata(ws.backup_path("zh")).unwrap().permissions().mode() & 0o777;
    assert_eq!(catalog_mode, 0o644);
    assert_eq!(backup_mode, 0o644);
}
