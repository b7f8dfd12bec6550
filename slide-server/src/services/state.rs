//! Reconciliation of raw slide positions into discrete cover states.
//!
//! Positions are fractions where 0.0 is fully open and 1.0 fully closed.
//! A band of `offset` at either end of the travel absorbs sensor jitter, so a
//! slide resting a few percent away from its limit still reads as open or
//! closed.

use std::cmp::Ordering;

use crate::models::CoverState;

/// Width of the band near either extreme.
pub const DEFAULT_OFFSET: f64 = 0.15;

/// Clamp a reported position into [0.0, 1.0], discarding values that are not numbers.
pub fn sanitize_position(position: f64) -> Option<f64> {
    position.is_finite().then(|| position.clamp(0.0, 1.0))
}

/// Direction of travel between two observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    /// First observation, or no movement
    Steady,
    /// Moving towards closed
    Increasing,
    /// Moving towards open
    Decreasing,
}

impl Trend {
    pub fn between(previous: Option<f64>, current: f64) -> Self {
        match previous.and_then(|previous| current.partial_cmp(&previous)) {
            None | Some(Ordering::Equal) => Trend::Steady,
            Some(Ordering::Greater) => Trend::Increasing,
            Some(Ordering::Less) => Trend::Decreasing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateMachine {
    offset: f64,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self {
            offset: DEFAULT_OFFSET,
        }
    }
}

impl StateMachine {
    /// Offsets outside [0.0, 0.5] are clamped so the two bands never overlap.
    pub fn new(offset: f64) -> Self {
        let offset = if offset.is_finite() { offset.clamp(0.0, 0.5) } else { DEFAULT_OFFSET };
        Self { offset }
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn is_closed_position(&self, position: f64) -> bool {
        position >= 1.0 - self.offset
    }

    pub fn is_open_position(&self, position: f64) -> bool {
        position <= self.offset
    }

    /// Resting state for a position without any motion context.
    ///
    /// Positions between the bands read as open.
    pub fn classify(&self, position: f64) -> CoverState {
        if self.is_closed_position(position) {
            CoverState::Closed
        } else {
            CoverState::Open
        }
    }

    /// Derive the state of a slide from two consecutive observations.
    ///
    /// A poll always resolves to a resting state whatever the trend; opening
    /// and closing only come from commands, and are overwritten here once the
    /// next position is reported.
    pub fn derive_state(
        &self,
        previous_state: CoverState,
        previous_position: Option<f64>,
        current_position: f64,
    ) -> CoverState {
        let current = current_position.clamp(0.0, 1.0);

        let trend = Trend::between(previous_position, current);
        let state = self.classify(current);

        if state != previous_state {
            tracing::trace!(
                "state {} -> {} ({:?}, position {:?} -> {})",
                previous_state,
                state,
                trend,
                previous_position,
                current
            );
        }

        state
    }

    /// Position on a 0-100 scale as presented to the host.
    ///
    /// Values inside either band snap to the extreme, everything else is
    /// scaled and truncated.
    pub fn current_cover_position(&self, position: f64) -> u8 {
        let position = position.clamp(0.0, 1.0);
        let position = if self.is_open_position(position) || self.is_closed_position(position) {
            position.round()
        } else {
            position
        };

        (position * 100.0) as u8
    }
}

/// Convert a 0-100 host position into a fraction.
pub fn position_from_percent(percent: u8) -> f64 {
    f64::from(percent.min(100)) / 100.0
}
