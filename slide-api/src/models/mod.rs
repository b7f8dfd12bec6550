mod auth;
mod slide;

pub use auth::*;
pub use slide::*;
