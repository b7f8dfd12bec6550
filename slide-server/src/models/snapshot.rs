use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use slide_api::{SlideId, SlideRecord, unique_id};
use time::OffsetDateTime;

use crate::errors::RecordError;
use crate::services::state::sanitize_position;

/// Raw telemetry of one slide as of the last poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    /// Cloud device id, `slide_` followed by the hardware address
    pub device_id: String,
    /// Hardware address, stable across accounts
    pub unique_id: String,
    /// Numeric id used to address commands
    pub slide_id: SlideId,
    pub name: String,
    /// Fraction in [0.0, 1.0]; absent while the slide is unreachable
    pub position: Option<f64>,
    pub calibration_time_ms: Option<u64>,
    pub hardware_revision: Option<i64>,
    pub zone_id: Option<i64>,
    pub touch_and_go_enabled: Option<bool>,
    pub slide_setup: Option<serde_json::Value>,
    pub curtain_type: Option<serde_json::Value>,
    pub online: bool,
}

impl TryFrom<SlideRecord> for DeviceSnapshot {
    type Error = RecordError;

    fn try_from(record: SlideRecord) -> Result<Self, Self::Error> {
        let label = record
            .device_id
            .clone()
            .or_else(|| record.id.map(|id| id.to_string()))
            .unwrap_or_else(|| "<unnamed>".to_string());
        let missing = |field: &'static str| RecordError::MalformedDeviceRecord {
            record: label.clone(),
            field,
        };

        let slide_id = record.id.ok_or_else(|| missing("id"))?;
        let device_id = record.device_id.ok_or_else(|| missing("device_id"))?;
        let info = record.device_info.ok_or_else(|| missing("device_info"))?;

        let unique_id = unique_id(&device_id);
        let position = info.pos.and_then(sanitize_position);

        Ok(Self {
            name: record.device_name.unwrap_or_else(|| unique_id.clone()),
            device_id,
            unique_id,
            slide_id,
            position,
            calibration_time_ms: info.calib_time,
            hardware_revision: info.board_rev,
            zone_id: record.zone_id,
            touch_and_go_enabled: record.touch_go.or(info.touch_go),
            slide_setup: record.slide_setup,
            curtain_type: record.curtain_type,
            online: position.is_some(),
        })
    }
}

/// Every slide of the account, keyed by device id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotCollection {
    devices: BTreeMap<String, DeviceSnapshot>,
    #[serde(with = "time::serde::rfc3339")]
    fetched_at: OffsetDateTime,
}

impl SnapshotCollection {
    pub fn new(devices: impl IntoIterator<Item = DeviceSnapshot>) -> Self {
        Self {
            devices: devices
                .into_iter()
                .map(|device| (device.device_id.clone(), device))
                .collect(),
            fetched_at: OffsetDateTime::now_utc(),
        }
    }

    /// Build a collection from an overview, returning the records that were skipped.
    pub fn from_records(records: Vec<SlideRecord>) -> (Self, Vec<RecordError>) {
        let mut devices = Vec::with_capacity(records.len());
        let mut rejected = Vec::new();

        for record in records {
            match DeviceSnapshot::try_from(record) {
                Ok(device) => devices.push(device),
                Err(e) => rejected.push(e),
            }
        }

        (Self::new(devices), rejected)
    }

    /// Copy of this collection with every slide marked unreachable.
    ///
    /// Positions and attributes are preserved.
    pub fn mark_offline(&self) -> Self {
        let mut devices = self.devices.clone();
        for device in devices.values_mut() {
            device.online = false;
        }

        Self {
            devices,
            fetched_at: self.fetched_at,
        }
    }

    pub fn get(&self, device_id: &str) -> Option<&DeviceSnapshot> {
        self.devices.get(device_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceSnapshot> {
        self.devices.values()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn online_count(&self) -> usize {
        self.devices.values().filter(|device| device.online).count()
    }

    pub fn fetched_at(&self) -> OffsetDateTime {
        self.fetched_at
    }
}
