use glam::Vec3;
use serde::{Deserialize, Serialize};

/// The controls a client held during one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSample {
    pub tick: u64,
    pub look_direction: Vec3, // Planar: y is always 0.
    pub throttle: bool,
    pub fire: bool,
}

impl InputSample {
    pub fn new(tick: u64, look_direction: Vec3, throttle: bool, fire: bool) -> Self {
        Self {
            tick,
            look_direction: flatten(look_direction),
            throttle,
            fire,
        }
    }
}

pub fn flatten(direction: Vec3) -> Vec3 {
    Vec3::new(direction.x, 0.0, direction.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn look_direction_is_projected_onto_the_plane() {
        let sample = InputSample::new(4, Vec3::new(1.0, 2.0, -1.0), true, false);
        assert_eq!(sample.look_direction, Vec3::new(1.0, 0.0, -1.0));
    }

    #[test]
    fn samples_compare_by_value() {
        let a = InputSample::new(9, Vec3::Z, true, true);
        let b = InputSample::new(9, Vec3::Z, true, true);
        assert_eq!(a, b);
        assert_ne!(a, InputSample { fire: false, ..b });
    }
}
