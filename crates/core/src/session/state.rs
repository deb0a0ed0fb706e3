use super::*;
use crate::*;

impl<S: LotteryStore, A: AudioBackend> LotterySession<S, A> {
    pub fn new(config: LotteryConfig, store: S, audio: A, seed: u64) -> Self {
        let root = RngState::from_seed(seed);
        let sounds = SoundBoard::new(audio, config.timing.audio_cap, config.display.win_music);
        let stage = Stage::new(config.camera.default_z);
        Self {
            config,
            store,
            status: LotteryStatus::Init,
            stage,
            formations: Formations::default(),
            animation: AnimationDriver::new(),
            scheduler: Scheduler::new(),
            sounds,
            confetti: ConfettiField::default(),
            guard: RevealGuard::default(),
            draw_rng: root.fork(DRAW_STREAM),
            cosmetic_rng: root.fork(COSMETIC_STREAM),
            events: EventBus::default(),
            candidates: Vec::new(),
            pool: Vec::new(),
            round: None,
            pending: None,
            churn: None,
            churn_mode: CardMode::Default,
            auto_stop: None,
            cycle: 0,
            listeners: Listeners::default(),
            torn_down: false,
        }
    }

    /// Builds one slot per candidate, scatters them and flies them into the table.
    pub fn mount(&mut self) -> Result<(), LotteryError> {
        self.ensure_live()?;
        self.ensure_idle()?;
        self.candidates = self.store.all_candidates();
        let count = self.candidates.len();
        let display = &self.config.display;
        let scatter = self.config.timing.initial_scatter;
        let rng = &mut self.cosmetic_rng;
        self.stage.slots = self
            .candidates
            .iter()
            .enumerate()
            .map(|(index, occupant)| {
                let position = Vec3::new(
                    rng.range_f64(-scatter, scatter),
                    rng.range_f64(-scatter, scatter),
                    rng.range_f64(-scatter, scatter),
                );
                CardSlot {
                    index,
                    transform: Transform::at(position),
                    visible: true,
                    winner: false,
                    occupant: occupant.clone(),
                    visual: render_card(
                        occupant,
                        &CardStyle::idle(display),
                        index,
                        CardMode::Default,
                        rng,
                    ),
                }
            })
            .collect();
        self.formations.table = table_layout(
            count,
            self.config.display.row_count,
            self.config.display.card_size,
            &self.config.table,
        );
        self.formations.sphere = sphere_layout(count, &self.config.sphere);
        self.pool = self.store.remaining_pool();
        self.listeners = Listeners {
            resize: true,
            keyboard: true,
        };
        let group = self.transform_to_table();
        self.start_churn(CardMode::Default);
        self.pending = Some(Pending::Mount(group));
        log::info!("mounted {count} card slots");
        self.events.push(Event::Mounted { slots: count });
        Ok(())
    }

    pub fn status(&self) -> LotteryStatus {
        self.status
    }

    pub fn now(&self) -> u64 {
        self.scheduler.now()
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable store access for prize/winner administration between rounds.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Candidates still drawable in the current round, after `start` removed its winners.
    pub fn pool(&self) -> &[Candidate] {
        &self.pool
    }

    pub fn round(&self) -> Option<&DrawRound> {
        self.round.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn churn_active(&self) -> bool {
        self.churn.is_some()
    }

    pub fn listeners(&self) -> Listeners {
        self.listeners
    }

    pub fn confetti(&self) -> &ConfettiField {
        &self.confetti
    }

    pub fn sounds(&self) -> &SoundBoard<A> {
        &self.sounds
    }

    pub fn animation(&self) -> &AnimationDriver {
        &self.animation
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Number of reveals started so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain().collect()
    }

    pub(super) fn ensure_live(&self) -> Result<(), LotteryError> {
        if self.torn_down {
            return Err(LotteryError::TornDown);
        }
        Ok(())
    }

    pub(super) fn ensure_idle(&self) -> Result<(), LotteryError> {
        if self.pending.is_some() {
            log::debug!("transition ignored: operation lock held");
            return Err(LotteryError::Busy);
        }
        Ok(())
    }

    pub(super) fn ensure_status(&self, allowed: &[LotteryStatus]) -> Result<(), LotteryError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            log::debug!("transition ignored while {:?}", self.status);
            Err(LotteryError::InvalidStatus(self.status))
        }
    }

    pub(super) fn set_status(&mut self, to: LotteryStatus) {
        let from = self.status;
        if from == to {
            return;
        }
        self.status = to;
        log::info!("lottery status {} -> {}", from.label(), to.label());
        self.events.push(Event::StatusChanged { from, to });
    }

    /// Starts the churn timer unless it is already running.
    pub(super) fn start_churn(&mut self, mode: CardMode) {
        self.churn_mode = mode;
        if self.churn.is_none() {
            let id = self
                .scheduler
                .every(self.config.timing.churn_interval_ms, TaskKind::ChurnTick);
            self.churn = Some(id);
        }
    }

    pub(super) fn stop_churn(&mut self) {
        if let Some(id) = self.churn.take() {
            self.scheduler.cancel(id);
        }
    }

    /// Slot transform that also flips running churn into sphere styling.
    pub(super) fn transform_slots(&mut self, targets: &[Transform]) -> GroupId {
        if self.churn.is_some() {
            self.stop_churn();
            self.start_churn(CardMode::Sphere);
        }
        let now = self.scheduler.now();
        self.animation.transform(
            &self.stage,
            targets,
            self.config.timing.transform_ms,
            now,
            &mut self.draw_rng,
        )
    }

    pub(super) fn transform_to_table(&mut self) -> GroupId {
        let targets = std::mem::take(&mut self.formations.table);
        let group = self.transform_slots(&targets);
        self.formations.table = targets;
        group
    }

    pub(super) fn transform_to_sphere(&mut self) -> GroupId {
        let targets = std::mem::take(&mut self.formations.sphere);
        let group = self.transform_slots(&targets);
        self.formations.sphere = targets;
        group
    }

    pub(super) fn restyle_slot(&mut self, index: usize, mode: CardMode) {
        let display = &self.config.display;
        let Some(slot) = self.stage.slots.get_mut(index) else {
            return;
        };
        slot.visual = render_card(
            &slot.occupant,
            &CardStyle::idle(display),
            index,
            mode,
            &mut self.cosmetic_rng,
        );
    }
}
