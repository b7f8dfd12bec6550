use serde::{Deserialize, Serialize};

pub type SlideId = i64;

/// Prefix the cloud puts in front of the hardware address of a slide.
pub const DEVICE_ID_PREFIX: &str = "slide_";

/// Raw telemetry of a slide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlideInfo {
    /// Fractional position, 0.0 fully open and 1.0 fully closed
    #[serde(default)]
    pub pos: Option<f64>,
    /// Duration of a full traverse in milliseconds
    #[serde(default)]
    pub calib_time: Option<u64>,
    /// Hardware board revision
    #[serde(default)]
    pub board_rev: Option<i64>,
    #[serde(default)]
    pub touch_go: Option<bool>,
}

/// One entry of the account overview.
///
/// Every field is optional on the wire; callers decide which ones are
/// required and skip entries that lack them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlideRecord {
    #[serde(default)]
    pub id: Option<SlideId>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub zone_id: Option<i64>,
    #[serde(default)]
    pub touch_go: Option<bool>,
    #[serde(default)]
    pub slide_setup: Option<serde_json::Value>,
    #[serde(default)]
    pub curtain_type: Option<serde_json::Value>,
    #[serde(default)]
    pub device_info: Option<SlideInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverviewResponse {
    #[serde(default)]
    pub slides: Vec<SlideRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoResponse {
    pub data: SlideInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionRequest {
    pub pos: f64,
}

/// Strip the cloud prefix from a device id, leaving the hardware address.
pub fn unique_id(device_id: &str) -> String {
    device_id.replace(DEVICE_ID_PREFIX, "")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_overview_decodes_partial_records() {
        let overview: OverviewResponse = serde_json::from_value(json!({
            "slides": [
                {
                    "id": 12,
                    "device_id": "slide_300000000001",
                    "device_name": "Living Room",
                    "zone_id": 3,
                    "touch_go": true,
                    "slide_setup": "middle",
                    "curtain_type": 0,
                    "device_info": { "pos": 0.42, "calib_time": 8000, "board_rev": 1 }
                },
                { "id": 13, "device_name": "Attic" }
            ]
        }))
        .unwrap();

        assert_eq!(overview.slides.len(), 2);

        let first = &overview.slides[0];
        assert_eq!(first.id, Some(12));
        assert_eq!(first.touch_go, Some(true));
        let info = first.device_info.as_ref().unwrap();
        assert_eq!(info.pos, Some(0.42));
        assert_eq!(info.calib_time, Some(8000));
        assert_eq!(info.board_rev, Some(1));

        let second = &overview.slides[1];
        assert_eq!(second.device_id, None);
        assert_eq!(second.device_info, None);
    }

    #[test]
    fn test_unique_id_strips_prefix() {
        assert_eq!(unique_id("slide_300000000001"), "300000000001");
        assert_eq!(unique_id("300000000001"), "300000000001");
    }
}
