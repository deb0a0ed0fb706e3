use crate::persistence::ScriptAction;
use anyhow::{Context, Result};
use luckydraw_core::{
    Event, Key, LotteryError, LotterySession, LotteryStatus, LotteryStore, SilentAudio,
};
use luckydraw_data::{load_settings, normalize_locale, FileStore};
use std::collections::VecDeque;
use std::path::Path;

const MAX_EVENT_LOG: usize = 200;

pub type Session = LotterySession<FileStore, SilentAudio>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiLocale {
    EnUs,
    ZhCn,
}

impl UiLocale {
    pub fn from_opt(value: Option<&str>) -> Self {
        let normalized = normalize_locale(value);
        if normalized == "zh_CN" {
            Self::ZhCn
        } else {
            Self::EnUs
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Self::EnUs => "en_US",
            Self::ZhCn => "zh_CN",
        }
    }

    pub fn text<'a>(self, en: &'a str, zh: &'a str) -> &'a str {
        if matches!(self, Self::ZhCn) {
            zh
        } else {
            en
        }
    }

    pub fn status(self, status: LotteryStatus) -> &'static str {
        match status {
            LotteryStatus::Init => self.text("idle", "待机"),
            LotteryStatus::Ready => self.text("ready", "就绪"),
            LotteryStatus::Running => self.text("drawing", "抽奖中"),
            LotteryStatus::End => self.text("revealed", "已揭晓"),
        }
    }
}

/// One log line per session event.
pub fn describe_event(locale: UiLocale, event: &Event) -> String {
    match event {
        Event::Mounted { slots } => format!("{} {slots}", locale.text("cards placed:", "卡片数:")),
        Event::StatusChanged { from, to } => format!(
            "{} {} -> {}",
            locale.text("status", "状态"),
            locale.status(*from),
            locale.status(*to)
        ),
        Event::Warning(warning) => format!("{}: {warning}", locale.text("warning", "提示")),
        Event::DrawStarted {
            prize_name,
            leftover,
            ..
        } => format!(
            "{} {prize_name} x{leftover}",
            locale.text("drawing", "正在抽取")
        ),
        Event::Revealed { winners, slots, .. } => format!(
            "{} {} ({} {:?})",
            locale.text("revealed", "揭晓"),
            winners.len(),
            locale.text("slots", "卡位"),
            slots
        ),
        Event::WinEffectsFired { sound, confetti } => format!(
            "{} sound={sound} confetti={confetti}",
            locale.text("celebration", "庆祝")
        ),
        Event::Committed {
            prize_id,
            round_size,
            is_used_count,
            is_used,
        } => format!(
            "{} {prize_id} +{round_size} ({}: {is_used_count}{})",
            locale.text("recorded", "已记录"),
            locale.text("drawn", "已抽"),
            if *is_used {
                locale.text(", done", "，已抽完")
            } else {
                ""
            }
        ),
        Event::RoundDiscarded {
            prize_id,
            round_size,
        } => format!(
            "{} {prize_id} ({round_size})",
            locale.text("round discarded", "本轮作废")
        ),
        Event::RoundAborted { reason } => {
            format!("{}: {reason}", locale.text("round aborted", "本轮中止"))
        }
        Event::TornDown => locale.text("session closed", "会话已关闭").to_string(),
    }
}

pub struct App {
    pub locale: UiLocale,
    pub seed: u64,
    pub session: Session,
    pub event_log: VecDeque<String>,
    pub status_line: String,
    pub show_help: bool,
    pub should_quit: bool,
}

impl App {
    pub fn bootstrap(locale: UiLocale, seed: u64, data_dir: &Path) -> Result<Self> {
        let config = load_settings(data_dir).context("load settings")?;
        let store = FileStore::open(data_dir).context("load persons and prizes")?;
        let session = LotterySession::new(config, store, SilentAudio::default(), seed);
        Self::with_session(locale, seed, session)
    }

    pub fn with_session(locale: UiLocale, seed: u64, mut session: Session) -> Result<Self> {
        session
            .mount()
            .map_err(|err| anyhow::anyhow!(err.to_string()))
            .context("mount lottery")?;
        let mut app = Self {
            locale,
            seed,
            session,
            event_log: VecDeque::new(),
            status_line: String::new(),
            show_help: false,
            should_quit: false,
        };
        app.status_line = app.next_hint().to_string();
        app.flush_events();
        Ok(app)
    }

    pub fn on_tick(&mut self, elapsed_ms: u64) {
        self.session.advance(elapsed_ms);
        self.flush_events();
    }

    pub fn press(&mut self, key: Key) {
        let result = self.session.press(key);
        self.report(result);
    }

    /// Prize administration is only offered while no round is on screen.
    fn can_administer(&mut self) -> bool {
        let idle = matches!(
            self.session.status(),
            LotteryStatus::Init | LotteryStatus::Ready
        ) && !self.session.is_busy();
        if !idle {
            self.status_line = self
                .locale
                .text("finish the current round first", "请先完成本轮抽奖")
                .to_string();
        }
        idle
    }

    pub fn cycle_prize(&mut self, forward: bool) {
        if !self.can_administer() {
            return;
        }
        let mut ids: Vec<(u32, String)> = self
            .session
            .store()
            .prizes
            .iter()
            .map(|prize| (prize.sort, prize.id.clone()))
            .collect();
        ids.sort();
        if ids.is_empty() {
            return;
        }
        let current = self.session.store().current_prize_id.clone();
        let pos = current
            .and_then(|id| ids.iter().position(|(_, candidate)| *candidate == id))
            .unwrap_or(0);
        let next = if forward {
            (pos + 1) % ids.len()
        } else {
            (pos + ids.len() - 1) % ids.len()
        };
        let id = ids[next].1.clone();
        self.select_prize(&id);
    }

    pub fn select_prize(&mut self, id: &str) {
        if !self.can_administer() {
            return;
        }
        match self.session.store_mut().select_prize(id) {
            Ok(()) => {
                let name = self
                    .session
                    .store()
                    .prize(id)
                    .map(|prize| prize.name.clone())
                    .unwrap_or_default();
                self.status_line = format!("{} {name}", self.locale.text("prize:", "奖项:"));
            }
            Err(err) => self.status_line = err.to_string(),
        }
    }

    pub fn toggle_current_prize(&mut self) {
        let Some(id) = self.session.store().current_prize_id.clone() else {
            return;
        };
        self.toggle_prize(&id);
    }

    pub fn toggle_prize(&mut self, id: &str) {
        if !self.can_administer() {
            return;
        }
        match self.session.store_mut().toggle_prize(id) {
            Ok(used) => {
                self.status_line = format!(
                    "{id}: {}",
                    if used {
                        self.locale.text("marked drawn", "标记为已抽完")
                    } else {
                        self.locale.text("reopened", "重新开放")
                    }
                );
            }
            Err(err) => self.status_line = err.to_string(),
        }
    }

    pub fn move_to_pool(&mut self, person_id: u64) {
        if !self.can_administer() {
            return;
        }
        match self.session.store_mut().move_to_pool(person_id) {
            Ok(()) => {
                self.status_line = format!(
                    "{} {person_id}",
                    self.locale.text("returned to pool:", "已放回奖池:")
                );
            }
            Err(err) => self.status_line = err.to_string(),
        }
    }

    pub fn reset_winners(&mut self) {
        if !self.can_administer() {
            return;
        }
        match self.session.store_mut().reset_winners() {
            Ok(()) => {
                self.status_line = self
                    .locale
                    .text("all winners cleared", "已清空中奖记录")
                    .to_string();
            }
            Err(err) => self.status_line = err.to_string(),
        }
    }

    pub fn auto_perform_actions(&mut self, actions: &[ScriptAction]) -> Result<(), String> {
        for (idx, step) in actions.iter().enumerate() {
            self.perform(step)
                .map_err(|err| format!("step {} ({}): {err}", idx + 1, step.action))?;
        }
        Ok(())
    }

    pub fn perform(&mut self, step: &ScriptAction) -> Result<(), String> {
        let target = step.target.as_deref();
        let result = match step.action.as_str() {
            "enter" => self.session.enter(),
            "start" => self.session.start(),
            "stop" => self.session.stop(),
            "continue" => self.session.continue_round(),
            "quit" => self.session.quit(),
            "space" => self.session.press(Key::Space),
            "escape" => self.session.press(Key::Escape),
            "wait" => Ok(()),
            "select" => {
                self.select_prize(target.ok_or("select needs a target")?);
                Ok(())
            }
            "toggle" => {
                self.toggle_prize(target.ok_or("toggle needs a target")?);
                Ok(())
            }
            "back" => {
                let person = target
                    .and_then(|raw| raw.parse::<u64>().ok())
                    .ok_or("back needs a numeric person id")?;
                self.move_to_pool(person);
                Ok(())
            }
            "reset-winners" => {
                self.reset_winners();
                Ok(())
            }
            other => return Err(format!("unknown action {other}")),
        };
        self.report(result);
        if step.wait_ms > 0 {
            self.on_tick(step.wait_ms);
        }
        Ok(())
    }

    fn report(&mut self, result: Result<(), LotteryError>) {
        match result {
            Ok(()) => self.status_line = self.next_hint().to_string(),
            Err(err) if err.is_ignored() => {
                log::debug!("input ignored: {err}");
            }
            Err(err) => self.status_line = err.to_string(),
        }
        self.flush_events();
    }

    pub fn next_hint(&self) -> &'static str {
        if self.session.is_busy() {
            return self.locale.text("animating...", "动画中...");
        }
        match self.session.status() {
            LotteryStatus::Init => self.locale.text("Space: enter the lottery", "空格: 进入抽奖"),
            LotteryStatus::Ready => self.locale.text("Space: start drawing", "空格: 开始抽奖"),
            LotteryStatus::Running => self
                .locale
                .text("Space: stop | Esc: abandon", "空格: 停止 | Esc: 放弃"),
            LotteryStatus::End => self
                .locale
                .text("Space: record and continue", "空格: 记录并继续"),
        }
    }

    pub fn flush_events(&mut self) {
        for event in self.session.drain_events() {
            let line = describe_event(self.locale, &event);
            self.push_event_line(line);
        }
    }

    pub fn push_event_line(&mut self, line: String) {
        self.event_log.push_back(line);
        while self.event_log.len() > MAX_EVENT_LOG {
            self.event_log.pop_front();
        }
    }

    pub fn current_prize_label(&self) -> String {
        match self.session.store().current_prize() {
            Some(prize) => format!(
                "{} {} ({}/{}, {} {})",
                prize.id,
                prize.name,
                prize.is_used_count,
                prize.count,
                self.locale.text("next", "下轮"),
                prize.leftover()
            ),
            None => self.locale.text("no prize", "未选择奖项").to_string(),
        }
    }
}
