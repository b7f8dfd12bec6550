use serde::{Deserialize, Serialize};

pub const TOUCH_AND_GO_NAME: &str = "Touch and Go";
pub const TOUCH_AND_GO_SUFFIX: &str = "_touch_and_go";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityCategory {
    Config,
}

/// Host-facing projection of a configuration switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchView {
    pub unique_id: String,
    pub name: String,
    /// Unique id of the cover owning this setting
    pub device: String,
    pub state: Option<bool>,
    pub is_on: bool,
    pub is_off: bool,
    pub entity_category: EntityCategory,
}
