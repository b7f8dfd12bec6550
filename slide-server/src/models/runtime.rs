use crate::models::{CoverState, DeviceSnapshot};
use crate::services::state::{StateMachine, sanitize_position};

/// Per-entity view of a slide, cached between polls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceRuntime {
    pub state: CoverState,
    /// Last observed fraction, 0.0 fully open
    pub position: Option<f64>,
    pub calibration_time_ms: Option<u64>,
    pub hardware_revision: Option<i64>,
    pub zone_id: Option<i64>,
    /// Number of open/close moves started so far
    pub moves: u64,
    /// Value of `moves` when the last stop was issued
    pub stopped_at: u64,
    pub online: bool,
}

impl DeviceRuntime {
    pub fn from_snapshot(snapshot: &DeviceSnapshot, machine: &StateMachine) -> Self {
        let mut runtime = Self::default();
        runtime.apply_snapshot(snapshot, machine);
        runtime
    }

    /// Fold a reported position into the runtime state.
    ///
    /// An absent position means the slide did not answer; the last known
    /// position and state are kept.
    pub fn observe(&mut self, position: Option<f64>, machine: &StateMachine) {
        match position.and_then(sanitize_position) {
            Some(position) => {
                self.state = machine.derive_state(self.state, self.position, position);
                self.position = Some(position);
                self.online = true;
            }
            None => self.online = false,
        }
    }

    /// Register a new open/close, returning its sequence number.
    pub fn begin_move(&mut self) -> u64 {
        self.moves += 1;
        self.moves
    }

    /// Mark every move started so far as stopped.
    pub fn stop(&mut self) {
        self.stopped_at = self.moves;
    }

    /// Whether a stop was issued after `move_id` started.
    pub fn is_stopped(&self, move_id: u64) -> bool {
        self.stopped_at >= move_id
    }

    pub fn apply_snapshot(&mut self, snapshot: &DeviceSnapshot, machine: &StateMachine) {
        if snapshot.calibration_time_ms.is_some() {
            self.calibration_time_ms = snapshot.calibration_time_ms;
        }
        if snapshot.hardware_revision.is_some() {
            self.hardware_revision = snapshot.hardware_revision;
        }
        self.zone_id = snapshot.zone_id;

        if snapshot.online {
            self.observe(snapshot.position, machine);
        } else {
            self.online = false;
        }
    }
}
