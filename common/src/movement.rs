use std::f32::consts::{PI, TAU};

use glam::{Quat, Vec3};

use crate::{input::InputSample, snapshot::StateSnapshot};

pub const ROTATION_SPEED: f32 = 5.0; // Slerp fraction per second toward the look heading.
pub const THRUST: f32 = 20.0; // Units per second squared.
pub const MAX_SPEED: f32 = 30.0; // Units per second.
pub const DRAG: f32 = 0.5;
pub const RESOURCE_CAPACITY: f32 = 100.0;
pub const BURN_RATE: f32 = 10.0; // Resource per second while throttling.
pub const REFILL_RATE: f32 = 5.0; // Resource per second while coasting.

/// Where every entity starts: at the origin, at rest, with a full tank.
pub fn spawn_state() -> StateSnapshot {
    StateSnapshot::at_rest(0, Vec3::ZERO, RESOURCE_CAPACITY)
}

/// Advances one entity by one fixed step.
///
/// Implementations must be pure: the same state, input and step always give
/// a bit-identical result, because the client replays history through it.
pub trait Simulation {
    fn simulate(&self, state: &StateSnapshot, input: &InputSample, dt: f32) -> StateSnapshot;
}

/// Reference movement model: turn toward the look direction, thrust forward
/// while throttling and fuel remains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShipMovement {
    pub rotation_speed: f32,
    pub thrust: f32,
    pub max_speed: f32,
    pub drag: f32,
    pub resource_capacity: f32,
    pub burn_rate: f32,
    pub refill_rate: f32,
}

impl Default for ShipMovement {
    fn default() -> Self {
        Self {
            rotation_speed: ROTATION_SPEED,
            thrust: THRUST,
            max_speed: MAX_SPEED,
            drag: DRAG,
            resource_capacity: RESOURCE_CAPACITY,
            burn_rate: BURN_RATE,
            refill_rate: REFILL_RATE,
        }
    }
}

impl Simulation for ShipMovement {
    fn simulate(&self, state: &StateSnapshot, input: &InputSample, dt: f32) -> StateSnapshot {
        let orientation = state.orientation.normalize();
        let new_orientation = self.turn(orientation, input.look_direction, dt);

        let mut velocity = state.linear_velocity;
        let mut resource_level = state.resource_level;

        if input.throttle {
            if resource_level > 0.0 {
                velocity += new_orientation * Vec3::Z * self.thrust * dt;
                resource_level = (resource_level - self.burn_rate * dt).max(0.0);
            }
        } else {
            resource_level = (resource_level + self.refill_rate * dt).min(self.resource_capacity);
        }

        velocity *= (1.0 - self.drag * dt).max(0.0);
        velocity = velocity.clamp_length_max(self.max_speed);

        StateSnapshot {
            tick: input.tick,
            position: state.position + velocity * dt,
            orientation: new_orientation,
            linear_velocity: velocity,
            angular_velocity: angular_velocity(orientation, new_orientation, dt),
            resource_level,
        }
    }
}

impl ShipMovement {
    fn turn(&self, orientation: Quat, look_direction: Vec3, dt: f32) -> Quat {
        if look_direction.length_squared() < 1e-6 {
            return orientation;
        }

        let yaw = look_direction.x.atan2(look_direction.z);
        let target = Quat::from_rotation_y(yaw);
        let t = (self.rotation_speed * dt).clamp(0.0, 1.0);

        orientation.slerp(target, t).normalize()
    }
}

fn angular_velocity(from: Quat, to: Quat, dt: f32) -> Vec3 {
    if dt <= 0.0 {
        return Vec3::ZERO;
    }

    let (axis, mut angle) = (to * from.inverse()).to_axis_angle();
    if angle > PI {
        angle -= TAU;
    }

    axis * (angle / dt)
}
