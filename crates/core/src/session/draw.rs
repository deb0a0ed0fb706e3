use super::*;
use crate::*;

impl<S: LotteryStore, A: AudioBackend> LotterySession<S, A> {
    /// Ready -> Running. Draws the round's winners up front; `stop` only reveals them.
    pub fn start(&mut self) -> Result<(), LotteryError> {
        self.ensure_live()?;
        self.ensure_idle()?;
        self.ensure_status(&[LotteryStatus::Ready])?;

        let (prize, pool, leftover) = match self.validate_start() {
            Ok(checked) => checked,
            Err(warning) => {
                log::warn!("start refused: {warning}");
                self.events.push(Event::Warning(warning.clone()));
                return Err(warning.into());
            }
        };

        let winners = select_winners(&pool, leftover, &mut self.draw_rng).map_err(|err| {
            log::error!("selection failed after validation: {err}");
            ValidationError::PoolExhausted {
                needed: leftover,
                available: pool.len(),
            }
        })?;
        self.pool = pool;
        self.pool
            .retain(|candidate| !winners.iter().any(|winner| winner.id == candidate.id));

        log::info!(
            "drawing {leftover} for prize {} ({} left in pool)",
            prize.name,
            self.pool.len()
        );
        self.events.push(Event::DrawStarted {
            prize_id: prize.id.clone(),
            prize_name: prize.name.clone(),
            leftover,
        });
        self.round = Some(DrawRound::new(prize, winners, leftover));

        self.sounds.play_music(SoundCue::LotteryMusic, self.scheduler.now());
        self.set_status(LotteryStatus::Running);
        let fast = self.config.timing.fast_roll;
        self.roll(fast);

        if let Some(seconds) = self.config.display.definite_time.filter(|secs| *secs > 0) {
            let id = self.scheduler.once(
                seconds.saturating_mul(1000),
                TaskKind::AutoStop { cycle: self.cycle },
            );
            self.auto_stop = Some(id);
        }
        Ok(())
    }

    /// Current prize, the applicable pool and the number still owed.
    fn validate_start(&self) -> Result<(Prize, Vec<Candidate>, usize), ValidationError> {
        let prize = self
            .store
            .current_prize()
            .ok_or(ValidationError::NoCurrentPrize)?;
        let leftover = prize.leftover() as usize;
        if prize.is_used || leftover == 0 {
            return Err(ValidationError::PrizeExhausted(prize.name.clone()));
        }
        let pool = if prize.is_all {
            self.store.pool_excluding_prize_winners(&prize.id)
        } else {
            self.store.remaining_pool()
        };
        if pool.len() < leftover {
            return Err(ValidationError::PoolExhausted {
                needed: leftover,
                available: pool.len(),
            });
        }
        Ok((prize, pool, leftover))
    }
}
