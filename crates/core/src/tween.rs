use crate::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Easing {
    Linear,
    ExponentialOut,
    ExponentialInOut,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::ExponentialOut => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * t)
                }
            }
            Easing::ExponentialInOut => {
                if t <= 0.0 {
                    0.0
                } else if t >= 1.0 {
                    1.0
                } else if t < 0.5 {
                    2f64.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
        }
    }
}

/// The property a tween drives. At most one tween per target is live.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TweenTarget {
    SlotPosition(usize),
    SlotRotation(usize),
    CameraPosition,
    CameraRotation,
    SceneRotation,
    /// Drives nothing; paces a group to a fixed length.
    Clock,
}

impl TweenTarget {
    pub fn is_slot(self) -> bool {
        matches!(self, TweenTarget::SlotPosition(_) | TweenTarget::SlotRotation(_))
    }

    pub fn slot(self) -> Option<usize> {
        match self {
            TweenTarget::SlotPosition(idx) | TweenTarget::SlotRotation(idx) => Some(idx),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u64);

#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub target: TweenTarget,
    pub from: Vec3,
    pub to: Vec3,
    pub start_ms: u64,
    pub duration_ms: u64,
    pub easing: Easing,
    pub group: Option<GroupId>,
}

impl Tween {
    pub fn end_ms(&self) -> u64 {
        self.start_ms.saturating_add(self.duration_ms)
    }

    pub fn is_done(&self, now: u64) -> bool {
        now >= self.end_ms()
    }

    pub fn value_at(&self, now: u64) -> Vec3 {
        if self.duration_ms == 0 || self.is_done(now) {
            return self.to;
        }
        let elapsed = now.saturating_sub(self.start_ms) as f64;
        let t = self.easing.apply(elapsed / self.duration_ms as f64);
        self.from.lerp(self.to, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easings_hit_endpoints() {
        for easing in [Easing::Linear, Easing::ExponentialOut, Easing::ExponentialInOut] {
            assert_eq!(easing.apply(0.0).round(), 0.0);
            assert_eq!(easing.apply(1.0), 1.0);
            assert!(easing.apply(0.5) > 0.0 && easing.apply(0.5) < 1.0);
        }
        assert!((Easing::ExponentialInOut.apply(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn value_interpolates_then_settles() {
        let tween = Tween {
            target: TweenTarget::CameraPosition,
            from: Vec3::ZERO,
            to: Vec3::new(0.0, 0.0, 100.0),
            start_ms: 1000,
            duration_ms: 100,
            easing: Easing::Linear,
            group: None,
        };
        assert_eq!(tween.value_at(900), Vec3::ZERO);
        assert_eq!(tween.value_at(1050).z, 50.0);
        assert_eq!(tween.value_at(5000).z, 100.0);
        assert!(tween.is_done(1100));
    }
}
