use crate::{Easing, GroupId, RngState, Stage, Transform, Tween, TweenTarget, Vec3};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationEvent {
    TweenFinished {
        group: Option<GroupId>,
        target: TweenTarget,
    },
    GroupFinished(GroupId),
}

/// Owns every in-flight tween and applies them to a [`Stage`] on each frame.
#[derive(Debug)]
pub struct AnimationDriver {
    tweens: Vec<Tween>,
    /// Live tween count per open group. Superseded groups are dropped here
    /// and never report completion.
    groups: BTreeMap<GroupId, usize>,
    next_group: u64,
    frame_active: bool,
}

impl Default for AnimationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self {
            tweens: Vec::new(),
            groups: BTreeMap::new(),
            next_group: 1,
            frame_active: true,
        }
    }

    pub fn frame_active(&self) -> bool {
        self.frame_active
    }

    pub fn stop_frame_loop(&mut self) {
        self.frame_active = false;
        self.clear();
    }

    pub fn clear(&mut self) {
        self.tweens.clear();
        self.groups.clear();
    }

    pub fn active(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_animating(&self, target: TweenTarget) -> bool {
        self.tweens.iter().any(|tween| tween.target == target)
    }

    pub fn group_open(&self, group: GroupId) -> bool {
        self.groups.contains_key(&group)
    }

    pub fn new_group(&mut self) -> GroupId {
        let id = GroupId(self.next_group);
        self.next_group += 1;
        self.groups.insert(id, 0);
        id
    }

    fn remove_where(&mut self, mut pred: impl FnMut(&Tween) -> bool) {
        let groups = &mut self.groups;
        self.tweens.retain(|tween| {
            if !pred(tween) {
                return true;
            }
            if let Some(group) = tween.group {
                groups.remove(&group);
            }
            false
        });
    }

    pub fn cancel(&mut self, target: TweenTarget) {
        self.remove_where(|live| live.target == target);
    }

    /// Adds a tween, superseding whatever was animating the same target.
    pub fn add(&mut self, tween: Tween) {
        let target = tween.target;
        self.remove_where(|live| live.target == target);
        if let Some(group) = tween.group {
            if let Some(live) = self.groups.get_mut(&group) {
                *live += 1;
            } else {
                log::debug!("tween for {target:?} joins closed group {group:?}");
            }
        }
        self.tweens.push(tween);
    }

    /// Tweens `target` from its current stage value to `to`.
    #[allow(clippy::too_many_arguments)]
    pub fn tween_to(
        &mut self,
        stage: &Stage,
        target: TweenTarget,
        to: Vec3,
        now: u64,
        duration_ms: u64,
        easing: Easing,
        group: Option<GroupId>,
    ) {
        let from = stage.read(target).unwrap_or(to);
        self.add(Tween {
            target,
            from,
            to,
            start_ms: now,
            duration_ms,
            easing,
            group,
        });
    }

    /// Moves every slot to its target with a randomised duration in
    /// `[duration, 2 * duration)`. The returned group finishes after a clock
    /// tween of `2 * duration`, once every slot tween has also landed.
    pub fn transform(
        &mut self,
        stage: &Stage,
        targets: &[Transform],
        duration_ms: u64,
        now: u64,
        rng: &mut RngState,
    ) -> GroupId {
        self.remove_where(|tween| tween.target.is_slot() || tween.target == TweenTarget::Clock);
        let group = self.new_group();
        let span = duration_ms as f64;
        for (idx, target) in targets.iter().enumerate().take(stage.slots.len()) {
            let position_ms = (span + rng.next_f64() * span) as u64;
            self.tween_to(
                stage,
                TweenTarget::SlotPosition(idx),
                target.position,
                now,
                position_ms,
                Easing::ExponentialOut,
                Some(group),
            );
            let rotation_ms = (span + rng.next_f64() * span) as u64;
            self.tween_to(
                stage,
                TweenTarget::SlotRotation(idx),
                target.rotation.as_vec3(),
                now,
                rotation_ms,
                Easing::ExponentialOut,
                Some(group),
            );
        }
        self.tween_to(
            stage,
            TweenTarget::Clock,
            Vec3::ZERO,
            now,
            duration_ms.saturating_mul(2),
            Easing::Linear,
            Some(group),
        );
        group
    }

    /// Applies every live tween at `now` and reports completions in end-time order.
    pub fn tick(&mut self, stage: &mut Stage, now: u64) -> Vec<AnimationEvent> {
        if !self.frame_active {
            return Vec::new();
        }
        for tween in &self.tweens {
            stage.write(tween.target, tween.value_at(now));
        }
        let mut done: Vec<(u64, usize)> = self
            .tweens
            .iter()
            .enumerate()
            .filter(|(_, tween)| tween.is_done(now))
            .map(|(pos, tween)| (tween.end_ms(), pos))
            .collect();
        if done.is_empty() {
            return Vec::new();
        }
        done.sort_unstable();
        let finished: Vec<Tween> = done.iter().map(|(_, pos)| self.tweens[*pos].clone()).collect();
        self.tweens.retain(|tween| !tween.is_done(now));

        let mut events = Vec::with_capacity(finished.len() + 1);
        for tween in finished {
            events.push(AnimationEvent::TweenFinished {
                group: tween.group,
                target: tween.target,
            });
            let Some(group) = tween.group else { continue };
            let Some(live) = self.groups.get_mut(&group) else {
                continue;
            };
            *live = live.saturating_sub(1);
            if *live == 0 {
                self.groups.remove(&group);
                events.push(AnimationEvent::GroupFinished(group));
            }
        }
        events
    }
}
