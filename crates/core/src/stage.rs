use crate::{Candidate, CardVisual, Euler, Transform, TweenTarget, Vec3};
use serde::{Deserialize, Serialize};

/// A reusable card placeholder. Slots outlive draws; only their occupant
/// and visual change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardSlot {
    pub index: usize,
    pub transform: Transform,
    pub visible: bool,
    pub winner: bool,
    pub occupant: Candidate,
    pub visual: CardVisual,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub rotation: Euler,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub slots: Vec<CardSlot>,
    pub camera: Camera,
    /// Rotation of the whole card scene; the roll animates its y.
    pub scene_rotation: Euler,
}

impl Stage {
    pub fn new(camera_z: f64) -> Self {
        Self {
            slots: Vec::new(),
            camera: Camera {
                position: Vec3::new(0.0, 0.0, camera_z),
                rotation: Euler::ZERO,
            },
            scene_rotation: Euler::ZERO,
        }
    }

    pub fn read(&self, target: TweenTarget) -> Option<Vec3> {
        match target {
            TweenTarget::SlotPosition(idx) => self.slots.get(idx).map(|s| s.transform.position),
            TweenTarget::SlotRotation(idx) => {
                self.slots.get(idx).map(|s| s.transform.rotation.as_vec3())
            }
            TweenTarget::CameraPosition => Some(self.camera.position),
            TweenTarget::CameraRotation => Some(self.camera.rotation.as_vec3()),
            TweenTarget::SceneRotation => Some(self.scene_rotation.as_vec3()),
            TweenTarget::Clock => Some(Vec3::ZERO),
        }
    }

    pub fn write(&mut self, target: TweenTarget, value: Vec3) {
        match target {
            TweenTarget::SlotPosition(idx) => {
                if let Some(slot) = self.slots.get_mut(idx) {
                    slot.transform.position = value;
                }
            }
            TweenTarget::SlotRotation(idx) => {
                if let Some(slot) = self.slots.get_mut(idx) {
                    slot.transform.rotation = Euler::from_vec3(value);
                }
            }
            TweenTarget::CameraPosition => self.camera.position = value,
            TweenTarget::CameraRotation => self.camera.rotation = Euler::from_vec3(value),
            TweenTarget::SceneRotation => self.scene_rotation = Euler::from_vec3(value),
            TweenTarget::Clock => {}
        }
    }

    /// Slot position after the scene rotation is applied.
    pub fn world_position(&self, idx: usize) -> Option<Vec3> {
        self.slots
            .get(idx)
            .map(|slot| self.scene_rotation.rotate(slot.transform.position))
    }

    pub fn winner_slots(&self) -> impl Iterator<Item = &CardSlot> + '_ {
        self.slots.iter().filter(|slot| slot.winner)
    }
}
