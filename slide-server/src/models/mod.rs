mod cover;
mod runtime;
mod snapshot;
mod switch;

pub use cover::*;
pub use runtime::*;
pub use snapshot::*;
pub use switch::*;
