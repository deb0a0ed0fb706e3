use luckydraw_core::{
    LotteryConfig, LotterySession, LotteryStatus, LotteryStore, RecordingAudio,
};
use luckydraw_data::{
    load_settings, load_state, load_store, load_winners, save_store, FileStore, PERSONS_FILE,
    PRIZES_FILE, SETTINGS_FILE,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

fn assets_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("assets")
}

struct TempDir(PathBuf);

impl TempDir {
    fn new(tag: &str) -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let dir = std::env::temp_dir().join(format!(
            "luckydraw-{tag}-{}-{}",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::SeqCst)
        ));
        fs::create_dir_all(&dir).expect("create temp dir");
        Self(dir)
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn copy_assets(into: &Path) {
    for file in [PERSONS_FILE, PRIZES_FILE, SETTINGS_FILE] {
        fs::copy(assets_root().join(file), into.join(file)).expect("copy asset");
    }
}

#[test]
fn bundled_assets_load() {
    let store = load_store(&assets_root()).expect("load store");
    assert!(store.persons.len() >= 100);
    let current = store.current_prize().expect("current prize");
    assert_eq!(current.id, "001");
    assert_eq!(current.leftover(), 5);
    let settings = load_settings(&assets_root()).expect("settings");
    assert_eq!(settings.display.row_count, 7);
}

#[test]
fn missing_settings_use_defaults() {
    let dir = TempDir::new("settings");
    let config = load_settings(dir.path()).expect("defaults");
    assert_eq!(config.timing.churn_interval_ms, LotteryConfig::default().timing.churn_interval_ms);
}

#[test]
fn malformed_files_report_their_path() {
    let dir = TempDir::new("malformed");
    fs::write(dir.path().join(SETTINGS_FILE), "{ not json").expect("write");
    let err = load_settings(dir.path()).unwrap_err();
    assert!(format!("{err:#}").contains(SETTINGS_FILE));
}

#[test]
fn duplicate_person_ids_are_rejected() {
    let dir = TempDir::new("dupes");
    fs::write(
        dir.path().join(PERSONS_FILE),
        r#"[{"id":1,"name":"A"},{"id":1,"name":"B"}]"#,
    )
    .expect("write");
    fs::write(dir.path().join(PRIZES_FILE), "[]").expect("write");
    let err = load_store(dir.path()).unwrap_err();
    assert!(err.to_string().contains("duplicate person id 1"));
}

#[test]
fn stale_current_prize_falls_back_to_first_open() {
    let dir = TempDir::new("stale");
    copy_assets(dir.path());
    fs::write(dir.path().join("state.json"), r#"{"currentPrize":"gone"}"#).expect("write");
    let store = load_store(dir.path()).expect("load");
    assert_eq!(store.current_prize_id.as_deref(), Some("001"));
}

#[test]
fn committed_round_is_written_back() {
    let dir = TempDir::new("commit");
    copy_assets(dir.path());
    let store = FileStore::open(dir.path()).expect("open");
    let mut session = LotterySession::new(LotteryConfig::default(), store, RecordingAudio::new(), 9);
    session.mount().expect("mount");
    session.advance(2000);
    session.enter().expect("enter");
    session.advance(2000);
    session.start().expect("start");
    session.stop().expect("stop");
    session.advance(1200);
    assert_eq!(session.status(), LotteryStatus::End);
    session.continue_round().expect("continue");

    let reloaded = load_store(dir.path()).expect("reload");
    let prize = reloaded.prize("001").expect("prize");
    assert_eq!(prize.is_used_count, 5);
    assert_eq!(prize.separate_count.count_list[0].is_used_count, 5);
    assert_eq!(reloaded.winners().count(), 5);
    let winners = load_winners(dir.path()).expect("winners");
    assert_eq!(winners.len(), 5);
    assert!(winners.iter().all(|entry| entry.prize_id == "001" && entry.prize_time.is_some()));
}

#[test]
fn failed_save_leaves_the_round_uncommitted() {
    let dir = TempDir::new("failed-save");
    copy_assets(dir.path());
    let store = FileStore::open(dir.path()).expect("open");
    let mut session = LotterySession::new(LotteryConfig::default(), store, RecordingAudio::new(), 9);
    session.mount().expect("mount");
    session.advance(2000);
    session.enter().expect("enter");
    session.advance(2000);
    session.start().expect("start");
    session.stop().expect("stop");
    session.advance(1200);

    // A plain file where the data directory was makes every save fail.
    fs::remove_dir_all(dir.path()).expect("remove dir");
    fs::write(dir.path(), b"").expect("block dir");
    assert!(session.continue_round().is_err());
    assert_eq!(session.status(), LotteryStatus::End);
    assert_eq!(session.store().winners().count(), 0);
    assert_eq!(session.store().prize("001").expect("prize").is_used_count, 0);

    fs::remove_file(dir.path()).expect("unblock");
    fs::create_dir_all(dir.path()).expect("recreate dir");
    session.continue_round().expect("retry");
    let reloaded = load_store(dir.path()).expect("reload");
    assert_eq!(reloaded.winners().count(), 5);
    assert!(reloaded.winners().all(|person| person.prize_id.len() == 1));
    assert_eq!(reloaded.prize("001").expect("prize").is_used_count, 5);
}

#[test]
fn admin_changes_persist() {
    let dir = TempDir::new("admin");
    copy_assets(dir.path());
    let mut store = FileStore::open(dir.path()).expect("open");
    store.select_prize("006").expect("select");
    assert_eq!(load_state(dir.path()).expect("state").current_prize.as_deref(), Some("006"));
    assert!(store.toggle_prize("003").expect("toggle"));
    assert!(store.select_prize("missing").is_err());

    let reloaded = load_store(dir.path()).expect("reload");
    assert!(reloaded.prize("003").expect("prize").is_used);
    assert_eq!(reloaded.current_prize().expect("current").id, "006");
}

#[test]
fn save_creates_missing_directory() {
    let dir = TempDir::new("fresh");
    let target = dir.path().join("nested");
    let store = load_store(&assets_root()).expect("load");
    save_store(&target, &store).expect("save");
    assert!(target.join(PERSONS_FILE).exists());
    assert!(load_winners(&target).expect("winners").is_empty());
}

#[test]
fn locale_spellings_normalize() {
    use luckydraw_data::normalize_locale;
    assert_eq!(normalize_locale(Some("zh-cn")), "zh_CN");
    assert_eq!(normalize_locale(Some("zh")), "zh_CN");
    assert_eq!(normalize_locale(Some(" ")), "en_US");
    assert_eq!(normalize_locale(None), "en_US");
}
