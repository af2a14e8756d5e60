//! Pulls a client's predicted trajectory back onto the authority's.
//!
//! One pass per client tick walks
//! `NoPendingCorrection -> CorrectionNeeded -> Replaying -> NoPendingCorrection`,
//! stopping early when there is nothing new, not enough history, or the
//! prediction is already close enough.

use tracing::{debug, trace, warn};

use common::{
    config::Thresholds,
    movement::Simulation,
    ring::RingHistory,
    role::Role,
    snapshot::{Divergence, StateSnapshot},
};

use crate::predictor::ClientPredictionState;

/// What one reconciliation pass did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reconciliation {
    /// No authoritative snapshot yet, or it was already processed.
    Idle,
    /// The snapshot's slot has no predecessor yet; retried next tick.
    InsufficientHistory,
    /// Prediction agreed with the authority; nothing changed.
    WithinThreshold(Divergence),
    /// Snapped to the rewind reference and replayed stored inputs.
    Corrected {
        divergence: Divergence,
        replayed_ticks: u64,
    },
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    NoPendingCorrection,
    CorrectionNeeded {
        authoritative: StateSnapshot,
    },
    Replaying {
        authoritative: StateSnapshot,
        rewind: StateSnapshot,
        divergence: Divergence,
    },
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    role: Role,
    thresholds: Thresholds,
}

impl Reconciler {
    pub fn new(role: Role, thresholds: Thresholds) -> Self {
        Self { role, thresholds }
    }

    pub fn run(
        &self,
        state: &mut ClientPredictionState,
        simulation: &impl Simulation,
        dt: f32,
        current_tick: u64,
        authority_history: Option<&RingHistory<StateSnapshot>>,
    ) -> Reconciliation {
        if !self.role.predicts() {
            return Reconciliation::Idle;
        }

        let mut phase = Phase::NoPendingCorrection;

        loop {
            phase = match phase {
                Phase::NoPendingCorrection => match pending_snapshot(state) {
                    Some(authoritative) => Phase::CorrectionNeeded { authoritative },
                    None => return Reconciliation::Idle,
                },

                Phase::CorrectionNeeded { authoritative } => {
                    let buffer_index = state.predictions.index(authoritative.tick);
                    if buffer_index == 0 {
                        trace!(tick = authoritative.tick, "not enough history to reconcile");
                        return Reconciliation::InsufficientHistory;
                    }

                    let rewind = self.rewind_reference(&authoritative, authority_history);
                    let predicted = state.predictions.read(authoritative.tick);
                    let divergence = predicted.divergence_from(&rewind);

                    if !divergence.exceeds(&self.thresholds) {
                        state.last_processed = Some(authoritative);
                        return Reconciliation::WithinThreshold(divergence);
                    }

                    Phase::Replaying {
                        authoritative,
                        rewind,
                        divergence,
                    }
                }

                Phase::Replaying {
                    authoritative,
                    rewind,
                    divergence,
                } => {
                    let replayed_ticks =
                        replay(state, simulation, dt, &authoritative, rewind, current_tick);
                    state.last_processed = Some(authoritative);

                    debug!(
                        tick = authoritative.tick,
                        rotation_degrees = divergence.rotation_degrees,
                        position = divergence.position,
                        resource = divergence.resource,
                        replayed_ticks,
                        "corrected prediction"
                    );

                    return Reconciliation::Corrected {
                        divergence,
                        replayed_ticks,
                    };
                }
            };
        }
    }

    /// The state to snap back to. A co-located host reads its own authority
    /// history one tick back: the loopback snapshot arrives in the tick that
    /// produced it, before that frame has settled.
    fn rewind_reference(
        &self,
        authoritative: &StateSnapshot,
        authority_history: Option<&RingHistory<StateSnapshot>>,
    ) -> StateSnapshot {
        match (self.role, authority_history) {
            (Role::Both, Some(history)) => *history.read(authoritative.tick - 1),
            (Role::Both, None) => {
                warn!("host reconciling without authority history; using received snapshot");
                *authoritative
            }
            (Role::ClientOnly | Role::AuthorityOnly, _) => *authoritative,
        }
    }
}

fn pending_snapshot(state: &ClientPredictionState) -> Option<StateSnapshot> {
    let authoritative = state.last_authoritative?;
    if state.last_processed == Some(authoritative) {
        return None;
    }
    Some(authoritative)
}

/// Snaps the entity to `rewind`, then re-simulates every stored input after
/// the authoritative tick up to, not including, `current_tick`. Returns the
/// number of ticks re-simulated.
fn replay(
    state: &mut ClientPredictionState,
    simulation: &impl Simulation,
    dt: f32,
    authoritative: &StateSnapshot,
    rewind: StateSnapshot,
    current_tick: u64,
) -> u64 {
    state.entity = rewind;
    state.predictions.write(rewind.tick, rewind);

    let mut replayed_ticks = 0;
    let mut aliased_ticks = 0u64;

    for tick in authoritative.tick + 1..current_tick {
        if !state.inputs.is_current(tick) {
            aliased_ticks += 1;
        }

        let input = *state.inputs.read(tick);
        state.entity = simulation.simulate(&state.entity, &input, dt);
        state.predictions.write(tick, state.entity);
        replayed_ticks += 1;
    }

    if aliased_ticks > 0 {
        warn!(
            from = authoritative.tick + 1,
            to = current_tick,
            aliased_ticks,
            capacity = state.inputs.capacity(),
            "replay read inputs outside the history horizon"
        );
    }

    replayed_ticks
}

#[cfg(test)]
mod tests {
    use glam::{Quat, Vec3};

    use super::*;
    use crate::{
        input::{InputSource, ScriptedInput},
        predictor::ClientPredictor,
    };
    use common::{
        config::NetcodeConfig,
        input::InputSample,
        movement::{RESOURCE_CAPACITY, ShipMovement},
    };

    /// Holds the entity still so positions only change through corrections.
    struct Stationary;

    impl Simulation for Stationary {
        fn simulate(&self, state: &StateSnapshot, input: &InputSample, _dt: f32) -> StateSnapshot {
            StateSnapshot {
                tick: input.tick,
                ..*state
            }
        }
    }

    fn config(buffer_capacity: usize) -> NetcodeConfig {
        NetcodeConfig {
            buffer_capacity,
            ..NetcodeConfig::default()
        }
    }

    fn stationary_predictor(role: Role, buffer_capacity: usize) -> ClientPredictor<Stationary> {
        ClientPredictor::new(
            role,
            StateSnapshot::at_rest(0, Vec3::ZERO, 50.0),
            &config(buffer_capacity),
            Stationary,
        )
    }

    fn predict_through<S: Simulation>(
        predictor: &mut ClientPredictor<S>,
        ticks: std::ops::RangeInclusive<u64>,
    ) {
        let source = ScriptedInput::new();
        for tick in ticks {
            predictor.predict(tick, &source);
        }
    }

    fn authoritative_at(tick: u64, position: Vec3) -> StateSnapshot {
        StateSnapshot::at_rest(tick, position, 50.0)
    }

    #[test]
    fn no_snapshot_never_starts_a_correction() {
        let mut predictor = stationary_predictor(Role::ClientOnly, 1024);
        predict_through(&mut predictor, 1..=120);

        for tick in 121..=130 {
            assert_eq!(predictor.reconcile(tick, None), Reconciliation::Idle);
        }
        assert!(predictor.state().last_processed().is_none());
    }

    #[test]
    fn large_position_error_snaps_and_replays() {
        let mut predictor = stationary_predictor(Role::ClientOnly, 1024);
        predict_through(&mut predictor, 1..=110);
        let before_current = *predictor.state().predictions().read(110);

        let authoritative = authoritative_at(100, Vec3::new(1.0, 0.0, 0.0));
        predictor.receive(authoritative);

        let outcome = predictor.reconcile(110, None);

        let Reconciliation::Corrected {
            divergence,
            replayed_ticks,
        } = outcome
        else {
            panic!("expected a correction, got {outcome:?}");
        };
        assert_eq!(divergence.position, 1.0);
        assert_eq!(replayed_ticks, 9);

        let state = predictor.state();
        assert_eq!(state.entity().position, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(state.entity().tick, 109);
        assert_eq!(state.predictions().get(100), Some(&authoritative));
        for tick in 101..=109 {
            let replayed = state.predictions().get(tick).expect("replayed tick recorded");
            assert_eq!(replayed.position, Vec3::new(1.0, 0.0, 0.0));
        }
        assert_eq!(*state.predictions().read(110), before_current);
        assert_eq!(state.last_processed(), Some(&authoritative));
    }

    #[test]
    fn small_position_error_is_tolerated_but_marked_processed() {
        let mut predictor = stationary_predictor(Role::ClientOnly, 1024);
        predict_through(&mut predictor, 1..=110);

        let authoritative = authoritative_at(100, Vec3::new(0.1, 0.0, 0.0));
        predictor.receive(authoritative);

        let outcome = predictor.reconcile(110, None);

        assert!(matches!(outcome, Reconciliation::WithinThreshold(_)));
        assert_eq!(predictor.state().entity().position, Vec3::ZERO);
        assert_eq!(predictor.state().last_processed(), Some(&authoritative));
    }

    #[test]
    fn same_snapshot_is_processed_once() {
        let mut predictor = stationary_predictor(Role::ClientOnly, 1024);
        predict_through(&mut predictor, 1..=110);
        predictor.receive(authoritative_at(100, Vec3::new(1.0, 0.0, 0.0)));

        assert!(matches!(
            predictor.reconcile(110, None),
            Reconciliation::Corrected { .. }
        ));

        predict_through(&mut predictor, 111..=111);
        assert_eq!(predictor.reconcile(111, None), Reconciliation::Idle);
    }

    #[test]
    fn slot_zero_aborts_without_marking_processed() {
        let mut predictor = stationary_predictor(Role::ClientOnly, 1024);
        predict_through(&mut predictor, 1..=1030);

        let at_horizon = authoritative_at(1024, Vec3::new(5.0, 0.0, 0.0));
        predictor.receive(at_horizon);

        assert_eq!(
            predictor.reconcile(1030, None),
            Reconciliation::InsufficientHistory
        );
        assert_eq!(predictor.state().last_processed(), None);
        assert_eq!(predictor.state().entity().position, Vec3::ZERO);

        // Still pending, so it is retried, and a later snapshot goes through.
        assert_eq!(
            predictor.reconcile(1030, None),
            Reconciliation::InsufficientHistory
        );
        predictor.receive(authoritative_at(1025, Vec3::new(5.0, 0.0, 0.0)));
        assert!(matches!(
            predictor.reconcile(1030, None),
            Reconciliation::Corrected { .. }
        ));
    }

    #[test]
    fn genuine_tick_zero_snapshot_is_not_mistaken_for_unset() {
        let mut predictor = stationary_predictor(Role::ClientOnly, 1024);
        predict_through(&mut predictor, 1..=5);
        predictor.receive(StateSnapshot::default());

        // Tick 0 has no predecessor slot, which is a skip, not "no data".
        assert_eq!(
            predictor.reconcile(5, None),
            Reconciliation::InsufficientHistory
        );
    }

    #[test]
    fn rotation_error_over_threshold_corrects() {
        let mut predictor = stationary_predictor(Role::ClientOnly, 1024);
        predict_through(&mut predictor, 1..=20);

        let turned = StateSnapshot {
            orientation: Quat::from_rotation_y(10f32.to_radians()),
            ..authoritative_at(10, Vec3::ZERO)
        };
        predictor.receive(turned);

        let outcome = predictor.reconcile(20, None);
        let Reconciliation::Corrected { divergence, .. } = outcome else {
            panic!("expected a correction, got {outcome:?}");
        };
        assert!((divergence.rotation_degrees - 10.0).abs() < 0.05);
        assert_eq!(predictor.state().entity().orientation, turned.orientation);
    }

    #[test]
    fn rotation_error_under_threshold_is_tolerated() {
        let mut predictor = stationary_predictor(Role::ClientOnly, 1024);
        predict_through(&mut predictor, 1..=20);
        predictor.receive(StateSnapshot {
            orientation: Quat::from_rotation_y(2f32.to_radians()),
            ..authoritative_at(10, Vec3::ZERO)
        });

        assert!(matches!(
            predictor.reconcile(20, None),
            Reconciliation::WithinThreshold(_)
        ));
    }

    #[test]
    fn resource_drift_is_reconciled() {
        let mut predictor = stationary_predictor(Role::ClientOnly, 1024);
        predict_through(&mut predictor, 1..=20);
        predictor.receive(StateSnapshot::at_rest(10, Vec3::ZERO, 30.0));

        assert!(matches!(
            predictor.reconcile(20, None),
            Reconciliation::Corrected { .. }
        ));
        assert_eq!(predictor.state().entity().resource_level, 30.0);
    }

    #[test]
    fn host_rewinds_to_the_previous_authoritative_tick() {
        let mut predictor = stationary_predictor(Role::Both, 1024);
        predict_through(&mut predictor, 1..=110);

        let mut authority_history = RingHistory::new(1024);
        let settled = authoritative_at(99, Vec3::new(2.0, 0.0, 0.0));
        authority_history.write(99, settled);
        authority_history.write(100, authoritative_at(100, Vec3::new(1.0, 0.0, 0.0)));

        predictor.receive(authoritative_at(100, Vec3::new(1.0, 0.0, 0.0)));
        let outcome = predictor.reconcile(110, Some(&authority_history));

        let Reconciliation::Corrected { divergence, .. } = outcome else {
            panic!("expected a correction, got {outcome:?}");
        };
        assert_eq!(divergence.position, 2.0);
        assert_eq!(predictor.state().entity().position, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(predictor.state().predictions().get(99), Some(&settled));
    }

    #[test]
    fn remote_client_ignores_authority_history() {
        let mut predictor = stationary_predictor(Role::ClientOnly, 1024);
        predict_through(&mut predictor, 1..=110);

        let mut authority_history = RingHistory::new(1024);
        authority_history.write(99, authoritative_at(99, Vec3::new(2.0, 0.0, 0.0)));

        predictor.receive(authoritative_at(100, Vec3::new(1.0, 0.0, 0.0)));
        predictor.reconcile(110, Some(&authority_history));

        assert_eq!(predictor.state().entity().position, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn authority_only_role_never_reconciles() {
        let mut predictor = stationary_predictor(Role::AuthorityOnly, 1024);
        predict_through(&mut predictor, 1..=20);
        predictor.receive(authoritative_at(10, Vec3::new(9.0, 0.0, 0.0)));

        assert_eq!(predictor.reconcile(20, None), Reconciliation::Idle);
    }

    #[test]
    fn replay_past_the_horizon_still_completes() {
        let mut predictor = stationary_predictor(Role::ClientOnly, 8);
        predict_through(&mut predictor, 1..=40);

        predictor.receive(authoritative_at(5, Vec3::new(3.0, 0.0, 0.0)));
        let outcome = predictor.reconcile(40, None);

        let Reconciliation::Corrected { replayed_ticks, .. } = outcome else {
            panic!("expected a correction, got {outcome:?}");
        };
        assert_eq!(replayed_ticks, 34);
        assert_eq!(predictor.state().entity().position, Vec3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn replay_is_deterministic() {
        let source = {
            let mut source = ScriptedInput::new();
            source.set_look(Vec3::new(1.0, 0.0, 0.4));
            source.set_throttle(true);
            source
        };
        let spawn = StateSnapshot::at_rest(0, Vec3::ZERO, RESOURCE_CAPACITY);
        let authoritative = StateSnapshot {
            position: Vec3::new(4.0, 0.0, -2.0),
            ..StateSnapshot::at_rest(30, Vec3::ZERO, RESOURCE_CAPACITY)
        };

        let run = || {
            let mut predictor = ClientPredictor::new(
                Role::ClientOnly,
                spawn,
                &NetcodeConfig::default(),
                ShipMovement::default(),
            );
            for tick in 1..=60 {
                predictor.predict(tick, &source);
            }
            predictor.receive(authoritative);
            predictor.reconcile(60, None);
            *predictor.state().entity()
        };

        let first = run();
        let second = run();
        assert_eq!(first, second);
        assert_eq!(first.position.x.to_bits(), second.position.x.to_bits());
    }

    #[test]
    fn corrected_trajectory_matches_authority_replay() {
        let movement = ShipMovement::default();
        let dt = NetcodeConfig::default().fixed_delta();
        let mut source = ScriptedInput::new();
        source.set_look(Vec3::new(-0.2, 0.0, 1.0));
        source.set_throttle(true);

        let mut predictor = ClientPredictor::new(
            Role::ClientOnly,
            StateSnapshot::at_rest(0, Vec3::ZERO, RESOURCE_CAPACITY),
            &NetcodeConfig::default(),
            movement,
        );
        for tick in 1..=50 {
            predictor.predict(tick, &source);
        }

        // The authority spawned the entity elsewhere.
        let mut truth = StateSnapshot::at_rest(0, Vec3::new(10.0, 0.0, 0.0), RESOURCE_CAPACITY);
        for tick in 1..=20 {
            truth = movement.simulate(&truth, &source.sample(tick), dt);
        }
        predictor.receive(truth);
        predictor.reconcile(50, None);

        let mut expected = truth;
        for tick in 21..50 {
            expected = movement.simulate(&expected, &source.sample(tick), dt);
        }
        assert_eq!(*predictor.state().entity(), expected);
        assert_eq!(predictor.state().predictions().get(49), Some(&expected));
    }
}
