use super::*;
use crate::*;

impl<S: LotteryStore, A: AudioBackend> LotterySession<S, A> {
    /// End -> Ready: records the revealed round, then re-enters.
    pub fn continue_round(&mut self) -> Result<(), LotteryError> {
        self.ensure_live()?;
        self.ensure_idle()?;
        self.ensure_status(&[LotteryStatus::End])?;
        let Some(round) = self.round.as_ref() else {
            return Err(LotteryError::InvalidStatus(self.status));
        };

        let size = round.size();
        let mut prize = round.prize.clone();
        prize.commit(size as u32);
        self.store.commit_round(&round.winners, &prize)?;
        log::info!(
            "committed {size} winners of {} ({}/{})",
            prize.name,
            prize.is_used_count,
            prize.count
        );
        self.events.push(Event::Committed {
            prize_id: prize.id.clone(),
            round_size: size,
            is_used_count: prize.is_used_count,
            is_used: prize.is_used,
        });
        self.round = None;
        self.begin_enter();
        Ok(())
    }

    /// Running/End -> Init: drops the round without recording it.
    pub fn quit(&mut self) -> Result<(), LotteryError> {
        self.ensure_live()?;
        self.ensure_idle()?;
        self.ensure_status(&[LotteryStatus::Running, LotteryStatus::End])?;
        self.cancel_auto_stop();
        self.sounds.stop_music();
        if let Some(round) = self.round.take() {
            log::info!("discarding round of {} for {}", round.size(), round.prize.name);
            self.events.push(Event::RoundDiscarded {
                prize_id: round.prize.id,
                round_size: round.winners.len(),
            });
        }
        self.begin_return_to_idle();
        Ok(())
    }

    pub(super) fn begin_return_to_idle(&mut self) {
        self.pool = self.store.remaining_pool();
        for slot in &mut self.stage.slots {
            slot.visible = true;
        }
        self.snap_scene();
        self.tween_camera_home();
        self.stop_churn();
        let group = self.transform_to_table();
        self.start_churn(CardMode::Default);
        self.pending = Some(Pending::Quit(group));
    }

    pub(super) fn finish_quit(&mut self) {
        self.pin_camera();
        self.release_winner_slots(CardMode::Default);
        self.set_status(LotteryStatus::Init);
    }

    /// A broken invariant ends the round on the spot.
    pub(super) fn abort_round(&mut self, violation: &InvariantViolation) {
        log::error!("aborting round: {violation}");
        self.events.push(Event::RoundAborted {
            reason: violation.to_string(),
        });
        self.round = None;
        self.sounds.stop_all();
        self.begin_return_to_idle();
        self.set_status(LotteryStatus::Init);
    }
}
