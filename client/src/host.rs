use common::{
    authority::ServerAuthority, config::NetcodeConfig, movement::Simulation, role::Role,
    snapshot::StateSnapshot,
};

use crate::{input::InputSource, predictor::ClientPredictor, reconcile::Reconciliation};

/// A listen-server host: owner and authority of the same entity in one
/// process, joined by an in-process loopback instead of a transport.
pub struct LocalHost<S: Simulation + Clone> {
    predictor: ClientPredictor<S>,
    authority: ServerAuthority,
    authority_simulation: S,
}

impl<S: Simulation + Clone> LocalHost<S> {
    pub fn new(spawn: StateSnapshot, config: &NetcodeConfig, simulation: S) -> Self {
        Self {
            predictor: ClientPredictor::new(Role::Both, spawn, config, simulation.clone()),
            authority: ServerAuthority::new(spawn, config.buffer_capacity),
            authority_simulation: simulation,
        }
    }

    /// One tick on both sides. The input reaches the authority within the
    /// same tick, and its snapshot is handed straight back to the predictor
    /// to be picked up on the next reconcile.
    pub fn tick(&mut self, current_tick: u64, source: &impl InputSource) -> Reconciliation {
        let input = self.predictor.predict(current_tick, source);
        self.authority.enqueue(input);

        let outcome = self
            .predictor
            .reconcile(current_tick, Some(self.authority.history()));

        let dt = self.predictor.fixed_delta();
        if let Some(snapshot) = self.authority.tick(&self.authority_simulation, dt) {
            self.predictor.receive(snapshot);
        }

        outcome
    }

    pub fn predictor(&self) -> &ClientPredictor<S> {
        &self.predictor
    }

    pub fn authority(&self) -> &ServerAuthority {
        &self.authority
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::input::ScriptedInput;
    use common::movement::{RESOURCE_CAPACITY, ShipMovement};

    fn host() -> LocalHost<ShipMovement> {
        LocalHost::new(
            StateSnapshot::at_rest(0, Vec3::ZERO, RESOURCE_CAPACITY),
            &NetcodeConfig::default(),
            ShipMovement::default(),
        )
    }

    #[test]
    fn authority_records_every_host_tick() {
        let mut host = host();
        let mut source = ScriptedInput::new();
        source.set_look(Vec3::X);

        for tick in 1..=10 {
            host.tick(tick, &source);
        }

        for tick in 1..=10 {
            assert!(host.authority().history().is_current(tick));
        }
        assert_eq!(host.authority().pending(), 0);
        assert_eq!(
            host.predictor().state().last_authoritative().map(|s| s.tick),
            Some(10)
        );
    }

    #[test]
    fn first_snapshot_is_processed_on_the_following_tick() {
        let mut host = host();
        let source = ScriptedInput::new();

        assert_eq!(host.tick(1, &source), Reconciliation::Idle);
        let second = host.tick(2, &source);

        assert_ne!(second, Reconciliation::Idle);
        assert_eq!(
            host.predictor().state().last_processed().map(|s| s.tick),
            Some(1)
        );
    }

    #[test]
    fn idle_host_agrees_with_itself() {
        let mut host = host();
        let source = ScriptedInput::new();

        for tick in 1..=30 {
            let outcome = host.tick(tick, &source);
            assert!(
                !matches!(outcome, Reconciliation::Corrected { .. }),
                "tick {tick} corrected: {outcome:?}"
            );
        }
    }
}
