mod coordinator;
mod event_bus;
mod sequencer;
mod shutdown;
pub mod state;

pub use coordinator::*;
pub use event_bus::*;
pub use sequencer::*;
pub use shutdown::*;
pub use state::StateMachine;
