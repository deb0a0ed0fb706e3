use super::*;
use crate::*;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Key {
    Space,
    Escape,
    Other,
}

/// Everything an adapter needs to draw one frame.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub now: u64,
    pub status: LotteryStatus,
    pub busy: bool,
    pub stage: Stage,
    pub particles: Vec<Particle>,
    pub winners: Vec<Candidate>,
    pub prize: Option<Prize>,
    pub pool: usize,
    pub text: TextStyle,
}

impl<S: LotteryStore, A: AudioBackend> LotterySession<S, A> {
    /// Advances the virtual clock by `dt_ms`, firing timers and tween
    /// completions in time order.
    pub fn advance(&mut self, dt_ms: u64) {
        if self.torn_down || !self.animation.frame_active() {
            return;
        }
        let target = self.scheduler.now().saturating_add(dt_ms);
        loop {
            let previous = self.scheduler.now();
            let step = self
                .scheduler
                .next_due()
                .filter(|due| *due <= target)
                .unwrap_or(target)
                .max(previous);
            let fired = self.scheduler.advance_to(step);
            let finished = self.animation.tick(&mut self.stage, step);
            self.confetti.step(step - previous);
            self.sounds.reap(step);
            for event in finished {
                self.on_animation(event);
            }
            for (id, kind) in fired {
                self.on_task(id, kind);
            }
            if step >= target || self.torn_down {
                break;
            }
        }
    }

    fn on_animation(&mut self, event: AnimationEvent) {
        match event {
            AnimationEvent::TweenFinished {
                group: Some(group),
                target: TweenTarget::SlotRotation(_),
            } if self.pending == Some(Pending::Reveal(group)) => self.fire_win_effects(),
            AnimationEvent::TweenFinished { .. } => {}
            AnimationEvent::GroupFinished(group) => match self.pending {
                Some(Pending::Mount(current)) if current == group => {
                    self.pending = None;
                    log::debug!("initial table formation settled");
                }
                Some(Pending::Enter(current)) if current == group => {
                    self.pending = None;
                    self.finish_enter();
                }
                Some(Pending::Reveal(current)) if current == group => {
                    self.pending = None;
                    self.finish_reveal();
                }
                Some(Pending::Quit(current)) if current == group => {
                    self.pending = None;
                    self.finish_quit();
                }
                _ => log::debug!("stale animation group {group:?} finished"),
            },
        }
    }

    fn on_task(&mut self, id: TaskId, kind: TaskKind) {
        match kind {
            TaskKind::ChurnTick if self.churn == Some(id) => {
                self.churn_tick();
            }
            TaskKind::AutoStop { cycle } if self.auto_stop == Some(id) => {
                self.auto_stop = None;
                if self.status != LotteryStatus::Running || cycle != self.cycle {
                    return;
                }
                log::info!("countdown elapsed, stopping");
                if let Err(err) = self.stop() {
                    log::warn!("automatic stop failed: {err}");
                }
            }
            _ => log::debug!("stale task {id:?} ignored"),
        }
    }

    /// Swaps the content of up to `churn_batch` random non-winner slots.
    /// Returns how many slots changed.
    pub fn churn_tick(&mut self) -> usize {
        let total = self.stage.slots.len();
        if total == 0 || self.candidates.is_empty() {
            return 0;
        }
        let mut swapped = 0;
        for _ in 0..self.config.timing.churn_batch {
            let Some(index) = self.cosmetic_rng.index(total) else {
                break;
            };
            if self.stage.slots[index].winner {
                continue;
            }
            let Some(mut pick) = self.cosmetic_rng.index(self.candidates.len()) else {
                break;
            };
            let current = self.stage.slots[index].occupant.id;
            if self.candidates.len() > 1 && self.candidates[pick].id == current {
                pick = (pick + 1) % self.candidates.len();
            }
            self.stage.slots[index].occupant = self.candidates[pick].clone();
            self.restyle_slot(index, self.churn_mode);
            swapped += 1;
        }
        swapped
    }

    /// Space walks the lifecycle, Escape abandons a running draw.
    pub fn press(&mut self, key: Key) -> Result<(), LotteryError> {
        self.ensure_live()?;
        if !self.listeners.keyboard {
            log::debug!("key {key:?} ignored: keyboard listener detached");
            return Ok(());
        }
        match (key, self.status) {
            (Key::Escape, LotteryStatus::Running) => self.quit(),
            (Key::Space, LotteryStatus::Init) => self.enter(),
            (Key::Space, LotteryStatus::Ready) => self.start(),
            (Key::Space, LotteryStatus::Running) => self.stop(),
            (Key::Space, LotteryStatus::End) => self.continue_round(),
            _ => Ok(()),
        }
    }

    /// Returns whether the new viewport was taken.
    pub fn resize(&mut self, viewport: Viewport) -> bool {
        if !self.listeners.resize {
            return false;
        }
        self.config.viewport = viewport;
        true
    }

    /// Cancels every timer and animation, silences audio and releases the slots.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.scheduler.cancel_all();
        self.churn = None;
        self.auto_stop = None;
        self.animation.stop_frame_loop();
        self.sounds.stop_all();
        self.confetti.clear();
        self.stage.slots.clear();
        self.formations = Formations::default();
        self.listeners = Listeners::default();
        self.pending = None;
        self.round = None;
        self.torn_down = true;
        log::info!("lottery session torn down");
        self.events.push(Event::TornDown);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            now: self.scheduler.now(),
            status: self.status,
            busy: self.pending.is_some(),
            stage: self.stage.clone(),
            particles: self.confetti.particles().to_vec(),
            winners: self
                .round
                .as_ref()
                .map(|round| round.winners.clone())
                .unwrap_or_default(),
            prize: self.store.current_prize(),
            pool: self.pool.len(),
            text: self.config.display.text_style(),
        }
    }
}
