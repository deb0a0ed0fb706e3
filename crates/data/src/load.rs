use crate::schema::{LotteryConfig, PersonRecord, Prize, SavedState, WinnerEntry};
use anyhow::{bail, Context};
use luckydraw_core::MemoryStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const SETTINGS_FILE: &str = "settings.json";
pub const PERSONS_FILE: &str = "persons.json";
pub const PRIZES_FILE: &str = "prizes.json";
pub const STATE_FILE: &str = "state.json";
pub const WINNERS_FILE: &str = "winners.json";

pub const DATA_ENV: &str = "LUCKYDRAW_DATA";
pub const LANG_ENV: &str = "LUCKYDRAW_LANG";
pub const SEED_ENV: &str = "LUCKYDRAW_SEED";
pub const LOG_ENV: &str = "LUCKYDRAW_LOG";
const DEFAULT_DATA_DIR: &str = "assets";

/// `--seed` flag, then `LUCKYDRAW_SEED`.
pub fn resolve_seed(flag: Option<u64>) -> Option<u64> {
    flag.or_else(|| {
        std::env::var(SEED_ENV)
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
    })
}

/// Seed for sessions started without `--seed` or `LUCKYDRAW_SEED`.
pub fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or(0x5EED)
}

/// `--data` flag, then `LUCKYDRAW_DATA`, then `./assets`.
pub fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var_os(DATA_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

/// Missing settings fall back to defaults; a malformed file is an error.
pub fn load_settings(dir: &Path) -> anyhow::Result<LotteryConfig> {
    let path = dir.join(SETTINGS_FILE);
    if !path.exists() {
        log::info!("{} not found, using default settings", path.display());
        return Ok(LotteryConfig::default());
    }
    load_json(path)
}

pub fn load_persons(dir: &Path) -> anyhow::Result<Vec<PersonRecord>> {
    let persons: Vec<PersonRecord> = load_json(dir.join(PERSONS_FILE))?;
    let mut seen = HashSet::new();
    for person in &persons {
        if !seen.insert(person.candidate.id) {
            bail!("duplicate person id {} in {PERSONS_FILE}", person.candidate.id);
        }
    }
    Ok(persons)
}

pub fn load_prizes(dir: &Path) -> anyhow::Result<Vec<Prize>> {
    let prizes: Vec<Prize> = load_json(dir.join(PRIZES_FILE))?;
    let mut seen = HashSet::new();
    for prize in &prizes {
        if !seen.insert(prize.id.as_str()) {
            bail!("duplicate prize id {} in {PRIZES_FILE}", prize.id);
        }
        if prize.is_used_count > prize.count {
            bail!(
                "prize {} has is_used_count {} above count {}",
                prize.id,
                prize.is_used_count,
                prize.count
            );
        }
    }
    Ok(prizes)
}

pub fn load_state(dir: &Path) -> anyhow::Result<SavedState> {
    let path = dir.join(STATE_FILE);
    if !path.exists() {
        return Ok(SavedState::default());
    }
    load_json(path)
}

/// Persons, prizes and the current-prize pointer as one in-memory store.
pub fn load_store(dir: &Path) -> anyhow::Result<MemoryStore> {
    let persons = load_persons(dir)?;
    let prizes = load_prizes(dir)?;
    let state = load_state(dir)?;
    let mut store = MemoryStore::new(persons, prizes);
    if let Some(id) = state.current_prize {
        if store.prize(&id).is_some() {
            store.current_prize_id = Some(id);
        } else {
            log::warn!("saved current prize {id} no longer exists");
        }
    }
    log::info!(
        "loaded {} persons and {} prizes from {}",
        store.persons.len(),
        store.prizes.len(),
        dir.display()
    );
    Ok(store)
}

pub fn save_store(dir: &Path, store: &MemoryStore) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    save_json(dir.join(PERSONS_FILE), &store.persons)?;
    save_json(dir.join(PRIZES_FILE), &store.prizes)?;
    save_json(
        dir.join(STATE_FILE),
        &SavedState {
            current_prize: store.current_prize_id.clone(),
        },
    )?;
    let winners: Vec<WinnerEntry> = store.winners().flat_map(WinnerEntry::from_record).collect();
    save_json(dir.join(WINNERS_FILE), &winners)?;
    Ok(())
}

pub fn load_winners(dir: &Path) -> anyhow::Result<Vec<WinnerEntry>> {
    let path = dir.join(WINNERS_FILE);
    if !path.exists() {
        return Ok(Vec::new());
    }
    load_json(path)
}

/// Maps loose locale spellings (`zh`, `zh-CN`, `en`) onto `en_US`/`zh_CN`.
pub fn normalize_locale(locale: Option<&str>) -> String {
    let raw = locale.unwrap_or("en_US").trim();
    if raw.is_empty() {
        return "en_US".to_string();
    }
    let lowered = raw.replace('-', "_").to_ascii_lowercase();
    match lowered.as_str() {
        "zh" | "zh_cn" | "zh_hans" | "zh_hans_cn" => "zh_CN".to_string(),
        "en" | "en_us" => "en_US".to_string(),
        _ => raw.replace('-', "_"),
    }
}

fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> anyhow::Result<T> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value = serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(value)
}

/// Writes through a sibling temp file so readers never see a half-written file.
fn save_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> anyhow::Result<()> {
    let path = path.as_ref();
    let raw = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize {}", path.display()))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, raw).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}
