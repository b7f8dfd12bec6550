#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("Malformed device record {record}: missing {field}")]
    MalformedDeviceRecord { record: String, field: &'static str },
}
