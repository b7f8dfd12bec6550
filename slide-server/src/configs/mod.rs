pub mod settings;

pub use settings::{Cloud, Coordinator, CoverSettings, Logger, Server, Settings};
