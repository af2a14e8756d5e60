use glam::Vec3;

use common::input::{InputSample, flatten};

/// Raw controls as the device reports them right now.
pub trait InputSource {
    fn look_direction(&self) -> Vec3;
    fn throttle(&self) -> bool;
    fn fire(&self) -> bool;

    fn sample(&self, tick: u64) -> InputSample {
        InputSample::new(tick, self.look_direction(), self.throttle(), self.fire())
    }
}

/// Input driven by code rather than a device: bots, the headless client, tests.
///
/// A zero look direction (stick released) keeps the last non-zero one.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    look: Vec3,
    throttle: bool,
    fire: bool,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_look(&mut self, look: Vec3) {
        let look = flatten(look);
        if look != Vec3::ZERO {
            self.look = look;
        }
    }

    pub fn set_throttle(&mut self, throttle: bool) {
        self.throttle = throttle;
    }

    pub fn set_fire(&mut self, fire: bool) {
        self.fire = fire;
    }
}

impl InputSource for ScriptedInput {
    fn look_direction(&self) -> Vec3 {
        self.look
    }

    fn throttle(&self) -> bool {
        self.throttle
    }

    fn fire(&self) -> bool {
        self.fire
    }
}

/// Slow circles with throttle pulses, so the headless client exercises both
/// turning and fuel.
pub fn wander(input: &mut ScriptedInput, tick: u64) {
    let angle = tick as f32 * 0.01;
    input.set_look(Vec3::new(angle.sin(), 0.0, angle.cos()));
    input.set_throttle((tick / 120) % 3 != 2);
    input.set_fire(tick % 90 == 0);
}
