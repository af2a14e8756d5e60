use common::{
    config::NetcodeConfig, input::InputSample, movement::Simulation, ring::RingHistory,
    role::Role, snapshot::StateSnapshot,
};

use crate::{
    input::InputSource,
    reconcile::{Reconciler, Reconciliation},
};

/// Everything the owning client keeps about its entity. Only the owner's tick
/// routine touches it.
#[derive(Debug, Clone)]
pub struct ClientPredictionState {
    pub(crate) inputs: RingHistory<InputSample>,
    pub(crate) predictions: RingHistory<StateSnapshot>,
    pub(crate) entity: StateSnapshot,
    pub(crate) last_authoritative: Option<StateSnapshot>,
    pub(crate) last_processed: Option<StateSnapshot>,
}

impl ClientPredictionState {
    pub fn new(spawn: StateSnapshot, buffer_capacity: usize) -> Self {
        Self {
            inputs: RingHistory::new(buffer_capacity),
            predictions: RingHistory::new(buffer_capacity),
            entity: spawn,
            last_authoritative: None,
            last_processed: None,
        }
    }

    pub fn inputs(&self) -> &RingHistory<InputSample> {
        &self.inputs
    }

    pub fn predictions(&self) -> &RingHistory<StateSnapshot> {
        &self.predictions
    }

    /// Live state of the local entity.
    pub fn entity(&self) -> &StateSnapshot {
        &self.entity
    }

    pub fn last_authoritative(&self) -> Option<&StateSnapshot> {
        self.last_authoritative.as_ref()
    }

    pub fn last_processed(&self) -> Option<&StateSnapshot> {
        self.last_processed.as_ref()
    }
}

/// Runs the owning client's side of one entity: predict every tick, then let
/// the reconciler pull the prediction back toward the authority.
pub struct ClientPredictor<S: Simulation> {
    simulation: S,
    fixed_delta: f32,
    state: ClientPredictionState,
    reconciler: Reconciler,
}

impl<S: Simulation> ClientPredictor<S> {
    pub fn new(role: Role, spawn: StateSnapshot, config: &NetcodeConfig, simulation: S) -> Self {
        Self {
            simulation,
            fixed_delta: config.fixed_delta(),
            state: ClientPredictionState::new(spawn, config.buffer_capacity),
            reconciler: Reconciler::new(role, config.thresholds),
        }
    }

    /// Samples input for `current_tick`, records it and predicts the result.
    /// The returned sample is what the caller hands to the transport.
    pub fn predict(&mut self, current_tick: u64, source: &impl InputSource) -> InputSample {
        let input = source.sample(current_tick);
        self.state.inputs.write(current_tick, input);

        let predicted = self
            .simulation
            .simulate(&self.state.entity, &input, self.fixed_delta);
        self.state.entity = predicted;
        self.state.predictions.write(current_tick, predicted);

        input
    }

    /// Checks the pending authoritative snapshot, if any. Runs every tick,
    /// since a snapshot may have arrived in an earlier frame.
    ///
    /// `authority_history` is only consulted when this process is also the
    /// authority ([`Role::Both`]).
    pub fn reconcile(
        &mut self,
        current_tick: u64,
        authority_history: Option<&RingHistory<StateSnapshot>>,
    ) -> Reconciliation {
        self.reconciler.run(
            &mut self.state,
            &self.simulation,
            self.fixed_delta,
            current_tick,
            authority_history,
        )
    }

    /// Records the newest snapshot from the authority. Processing happens on
    /// the next [`ClientPredictor::reconcile`].
    pub fn receive(&mut self, snapshot: StateSnapshot) {
        self.state.last_authoritative = Some(snapshot);
    }

    pub fn state(&self) -> &ClientPredictionState {
        &self.state
    }

    pub fn fixed_delta(&self) -> f32 {
        self.fixed_delta
    }
}
