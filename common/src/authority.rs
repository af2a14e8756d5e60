use std::collections::VecDeque;

use tracing::debug;

use crate::{
    input::InputSample, movement::Simulation, ring::RingHistory, snapshot::StateSnapshot,
};

/// Authoritative side of one entity: a FIFO of received inputs and the
/// history of states they produced.
#[derive(Debug, Clone)]
pub struct ServerAuthority {
    queue: VecDeque<InputSample>, // Arrival order, not tick order.
    history: RingHistory<StateSnapshot>,
    state: StateSnapshot,
}

impl ServerAuthority {
    /// The spawn state is the authoritative record for its own tick.
    pub fn new(spawn: StateSnapshot, buffer_capacity: usize) -> Self {
        let mut history = RingHistory::new(buffer_capacity);
        history.write(spawn.tick, spawn);

        Self {
            queue: VecDeque::new(),
            history,
            state: spawn,
        }
    }

    /// Accepts an input regardless of its tick; the transport guarantees no order.
    pub fn enqueue(&mut self, input: InputSample) {
        self.queue.push_back(input);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Drains the whole queue, one simulation step per input, and returns the
    /// state produced by the last one. Intermediate states only go to history.
    pub fn tick(&mut self, simulation: &impl Simulation, dt: f32) -> Option<StateSnapshot> {
        let mut processed = 0usize;
        let mut latest = None;

        while let Some(input) = self.queue.pop_front() {
            self.state = simulation.simulate(&self.state, &input, dt);
            self.history.write(input.tick, self.state);
            latest = Some(self.state);
            processed += 1;
        }

        if processed > 1 {
            debug!(processed, "drained input backlog");
        }

        latest
    }

    pub fn history(&self) -> &RingHistory<StateSnapshot> {
        &self.history
    }

    pub fn state(&self) -> &StateSnapshot {
        &self.state
    }
}
