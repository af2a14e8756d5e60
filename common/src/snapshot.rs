use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::config::Thresholds;

/// Full movement state of an entity after the tick `tick` was simulated.
///
/// `resource_level` feeds back into the simulation (thrust needs fuel), so it
/// is reconciled along with the kinematic fields. Absence of a snapshot is
/// expressed with `Option`, never with a zeroed value: tick 0 is real data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub tick: u64,
    pub position: Vec3,
    pub orientation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub resource_level: f32,
}

impl StateSnapshot {
    pub fn at_rest(tick: u64, position: Vec3, resource_level: f32) -> Self {
        Self {
            tick,
            position,
            orientation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            resource_level,
        }
    }

    pub fn position_error(&self, other: &StateSnapshot) -> f32 {
        self.position.distance(other.position)
    }

    /// Shortest rotation between the two orientations, in degrees.
    pub fn rotation_error_degrees(&self, other: &StateSnapshot) -> f32 {
        self.orientation
            .normalize()
            .angle_between(other.orientation.normalize())
            .to_degrees()
    }

    pub fn resource_error(&self, other: &StateSnapshot) -> f32 {
        (self.resource_level - other.resource_level).abs()
    }

    pub fn divergence_from(&self, other: &StateSnapshot) -> Divergence {
        Divergence {
            rotation_degrees: self.rotation_error_degrees(other),
            position: self.position_error(other),
            resource: self.resource_error(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Divergence {
    pub rotation_degrees: f32,
    pub position: f32,
    pub resource: f32,
}

impl Divergence {
    pub fn exceeds(&self, thresholds: &Thresholds) -> bool {
        self.rotation_degrees > thresholds.rotation_degrees
            || self.position > thresholds.position
            || self.resource > thresholds.resource
    }
}
