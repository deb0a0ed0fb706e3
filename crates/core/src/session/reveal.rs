use super::*;
use crate::*;
use std::collections::BTreeSet;

impl<S: LotteryStore, A: AudioBackend> LotterySession<S, A> {
    /// Running -> End: flies the drawn winners into a cluster in front of the camera.
    pub fn stop(&mut self) -> Result<(), LotteryError> {
        self.ensure_live()?;
        self.ensure_idle()?;
        self.ensure_status(&[LotteryStatus::Running])?;
        let Some(mut round) = self.round.take() else {
            log::error!("running without a drawn round");
            return Err(LotteryError::InvalidStatus(self.status));
        };

        let now = self.scheduler.now();
        self.cancel_auto_stop();
        self.sounds.stop_music();
        self.sounds.play_once(SoundCue::EndChime, now);
        self.snap_scene();
        self.stop_churn();
        self.guard.reset();
        self.cycle += 1;

        round.assigned_slots = match self.assign_slots(&round) {
            Ok(slots) => slots,
            Err(violation) => {
                self.abort_round(&violation);
                return Err(violation.into());
            }
        };

        let count = round.size();
        let camera_z = self.config.camera.distance_for(count);
        self.animation.tween_to(
            &self.stage,
            TweenTarget::CameraPosition,
            Vec3::new(0.0, 0.0, camera_z),
            now,
            self.config.timing.camera_tween_ms,
            Easing::ExponentialInOut,
            None,
        );

        let scale = self.config.scale.scale_for(count);
        let card = self.config.display.card_size.scaled(scale);
        let group = self.animation.new_group();
        for (order, (winner, slot_index)) in
            round.winners.iter().zip(&round.assigned_slots).enumerate()
        {
            let (x, y) = winner_cluster_position(
                count,
                card,
                self.config.viewport,
                order,
                &self.config.cluster,
            );
            if let Some(slot) = self.stage.slots.get_mut(*slot_index) {
                slot.occupant = winner.clone();
                slot.winner = true;
                slot.visual = render_card(
                    winner,
                    &CardStyle::lucky(&self.config.display, scale),
                    *slot_index,
                    CardMode::Lucky,
                    &mut self.cosmetic_rng,
                );
            }
            self.animation.tween_to(
                &self.stage,
                TweenTarget::SlotPosition(*slot_index),
                Vec3::new(x, y, self.config.timing.reveal_depth),
                now,
                self.config.timing.reveal_position_ms,
                Easing::ExponentialInOut,
                Some(group),
            );
            self.animation.tween_to(
                &self.stage,
                TweenTarget::SlotRotation(*slot_index),
                Vec3::ZERO,
                now,
                self.config.timing.reveal_rotation_ms,
                Easing::ExponentialInOut,
                Some(group),
            );
        }
        for slot in &mut self.stage.slots {
            slot.visible = slot.winner;
        }

        log::info!(
            "revealing {count} winners of {} in slots {:?}",
            round.prize.name,
            round.assigned_slots
        );
        self.events.push(Event::Revealed {
            prize_id: round.prize.id.clone(),
            winners: round.winners.iter().map(|winner| winner.id).collect(),
            slots: round.assigned_slots.clone(),
        });
        self.round = Some(round);
        self.pending = Some(Pending::Reveal(group));
        Ok(())
    }

    fn assign_slots(&mut self, round: &DrawRound) -> Result<Vec<usize>, InvariantViolation> {
        let total = self.stage.slots.len();
        let winners = round.size();
        if winners > total {
            return Err(InvariantViolation::SlotsExhausted {
                winners,
                slots: total,
            });
        }
        let mut used = BTreeSet::new();
        let mut assigned = Vec::with_capacity(winners);
        for winner in &round.winners {
            let slot = assign_slot(&used, total, winner.id, &mut self.draw_rng).map_err(|_| {
                InvariantViolation::SlotsExhausted {
                    winners,
                    slots: total,
                }
            })?;
            if !used.insert(slot) {
                return Err(InvariantViolation::DuplicateSlot(slot));
            }
            assigned.push(slot);
        }
        if assigned.len() != winners {
            return Err(InvariantViolation::RoundSizeMismatch {
                winners,
                slots: assigned.len(),
            });
        }
        Ok(assigned)
    }

    /// First winner card to settle fires the win sound and confetti, once per reveal.
    pub(super) fn fire_win_effects(&mut self) {
        let now = self.scheduler.now();
        let sound = self.guard.take_win_sound();
        if sound {
            self.sounds.play_once(SoundCue::WinFanfare, now);
        }
        let confetti = self.guard.take_confetti();
        if confetti {
            self.confetti.burst(&mut self.cosmetic_rng);
        }
        if sound || confetti {
            self.events.push(Event::WinEffectsFired { sound, confetti });
        }
    }

    pub(super) fn finish_reveal(&mut self) {
        self.set_status(LotteryStatus::End);
    }

    pub(super) fn cancel_auto_stop(&mut self) {
        if let Some(id) = self.auto_stop.take() {
            self.scheduler.cancel(id);
        }
    }
}
