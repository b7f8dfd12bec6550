use std::fmt;

use serde::{Deserialize, Serialize};

pub const MANUFACTURER: &str = "Innovation in Motion B.V.";
pub const MODEL: &str = "Slide";
pub const SOFTWARE_VERSION: &str = "1.0";

/// Discrete lifecycle state of a slide.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverState {
    Open,
    Closed,
    Opening,
    Closing,
    #[default]
    Unknown,
}

impl fmt::Display for CoverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoverState::Open => "open",
            CoverState::Closed => "closed",
            CoverState::Opening => "opening",
            CoverState::Closing => "closing",
            CoverState::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// State reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverStatus {
    Open,
    Closed,
    Opening,
    Closing,
    Unavailable,
}

impl CoverStatus {
    pub fn new(state: CoverState, online: bool) -> Self {
        match (online, state) {
            (false, _) | (true, CoverState::Unknown) => CoverStatus::Unavailable,
            (true, CoverState::Open) => CoverStatus::Open,
            (true, CoverState::Closed) => CoverStatus::Closed,
            (true, CoverState::Opening) => CoverStatus::Opening,
            (true, CoverState::Closing) => CoverStatus::Closing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Curtain,
}

/// Registry entry describing the physical slide behind an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Hardware address of the slide
    pub identifier: String,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub sw_version: String,
    /// Board revision reported by the slide
    pub hw_version: Option<i64>,
    pub zone_id: Option<i64>,
    /// Entities attached to the same device
    pub linked_entities: Vec<String>,
}

/// Host-facing projection of a cover entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverView {
    pub unique_id: String,
    pub name: String,
    pub status: CoverStatus,
    /// Position on a 0-100 scale, 100 fully closed
    pub position: Option<u8>,
    pub is_opening: bool,
    pub is_closing: bool,
    pub is_open: Option<bool>,
    pub is_closed: Option<bool>,
    pub available: bool,
    pub assumed_state: bool,
    pub device_class: DeviceClass,
    pub slide_setup: Option<serde_json::Value>,
    pub curtain_type: Option<serde_json::Value>,
    pub device: DeviceInfo,
}

/// Movement requested by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum CoverCommand {
    Open,
    Close,
    Stop,
    SetPosition { position: u8 },
}

/// Acknowledgement of a command handed to the sequencer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandAccepted {
    pub unique_id: String,
    #[serde(flatten)]
    pub command: CoverCommand,
}
