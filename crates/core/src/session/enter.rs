use super::*;
use crate::*;

impl<S: LotteryStore, A: AudioBackend> LotterySession<S, A> {
    /// Init/End -> Ready: sphere formation, camera back to default, slow roll.
    pub fn enter(&mut self) -> Result<(), LotteryError> {
        self.ensure_live()?;
        self.ensure_idle()?;
        self.ensure_status(&[LotteryStatus::Init, LotteryStatus::End])?;
        self.begin_enter();
        Ok(())
    }

    pub(super) fn begin_enter(&mut self) {
        self.pool = self.store.remaining_pool();
        for slot in &mut self.stage.slots {
            slot.visible = true;
        }
        self.sounds.stop_all();
        self.tween_camera_home();
        self.start_churn(self.churn_mode);

        let limit = self.config.display.row_count * 7;
        let highlighted: Vec<usize> = self
            .config
            .display
            .pattern_list
            .iter()
            .take(limit)
            .filter_map(|idx| idx.checked_sub(1))
            .collect();
        for index in highlighted {
            self.restyle_slot(index, CardMode::Sphere);
        }

        let group = self.transform_to_sphere();
        self.pending = Some(Pending::Enter(group));
        log::info!("entering lottery");
    }

    pub(super) fn tween_camera_home(&mut self) {
        let now = self.scheduler.now();
        self.animation.tween_to(
            &self.stage,
            TweenTarget::CameraPosition,
            Vec3::new(0.0, 0.0, self.config.camera.default_z),
            now,
            self.config.timing.camera_tween_ms,
            Easing::ExponentialInOut,
            None,
        );
    }

    /// Pins the camera at its home pose, dropping any camera tween.
    pub(super) fn pin_camera(&mut self) {
        self.animation.cancel(TweenTarget::CameraPosition);
        self.animation.cancel(TweenTarget::CameraRotation);
        self.stage.camera.position = Vec3::new(0.0, 0.0, self.config.camera.default_z);
        self.stage.camera.rotation = Euler::ZERO;
    }

    pub(super) fn roll(&mut self, spec: RollSpec) {
        self.stage.scene_rotation = Euler::ZERO;
        let now = self.scheduler.now();
        let turn = std::f64::consts::PI * spec.turns * 1000.0;
        self.animation.tween_to(
            &self.stage,
            TweenTarget::SceneRotation,
            Vec3::new(0.0, turn, 0.0),
            now,
            (spec.seconds * 1000.0) as u64,
            Easing::Linear,
            None,
        );
    }

    /// Stops the roll and snaps the scene back to its rest orientation.
    pub(super) fn snap_scene(&mut self) {
        self.animation.cancel(TweenTarget::SceneRotation);
        self.stage.scene_rotation = Euler::ZERO;
    }

    /// Winner slots of the finished round go back to ordinary cards.
    pub(super) fn release_winner_slots(&mut self, mode: CardMode) {
        let flagged: Vec<usize> = self
            .stage
            .slots
            .iter()
            .filter(|slot| slot.winner)
            .map(|slot| slot.index)
            .collect();
        for index in flagged {
            if let Some(slot) = self.stage.slots.get_mut(index) {
                slot.winner = false;
            }
            self.restyle_slot(index, mode);
        }
    }

    pub(super) fn finish_enter(&mut self) {
        self.pin_camera();
        self.release_winner_slots(CardMode::Sphere);
        self.round = None;
        self.set_status(LotteryStatus::Ready);
        let slow = self.config.timing.slow_roll;
        self.roll(slow);
    }
}
