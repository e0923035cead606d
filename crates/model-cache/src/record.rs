//! Device record encoding
//!
//! Status and result lists hold JSON objects of the form
//! `{"cache_device_id": <id>, "<payload field>": {...}}`.

use cache_core::{id_from_value, DeviceId, Error, Payload, Result};
use serde_json::Value;

/// Record field holding the device id
pub const DEVICE_ID_FIELD: &str = "cache_device_id";

/// Kind of per-device record list
pub trait RecordKind: Send + Sync + 'static {
    /// Name used in logs and error messages
    const NAME: &'static str;

    /// Field holding the record payload
    const PAYLOAD_FIELD: &'static str;

    /// Store key of this list for an endpoint
    fn key(endpoint_id: &str) -> String;
}

/// Device status records
#[derive(Debug, Clone, Copy)]
pub struct StatusKind;

impl RecordKind for StatusKind {
    const NAME: &'static str = "status";
    const PAYLOAD_FIELD: &'static str = "status";

    fn key(endpoint_id: &str) -> String {
        crate::keys::status_key(endpoint_id)
    }
}

/// Device deployment result records
#[derive(Debug, Clone, Copy)]
pub struct ResultKind;

impl RecordKind for ResultKind {
    const NAME: &'static str = "result";
    const PAYLOAD_FIELD: &'static str = "result";

    fn key(endpoint_id: &str) -> String {
        crate::keys::result_key(endpoint_id)
    }
}

/// Serialize a device record
pub fn encode<K: RecordKind>(device_id: &str, payload: Payload) -> String {
    let mut record = Payload::new();
    record.insert(
        DEVICE_ID_FIELD.to_string(),
        Value::String(device_id.to_string()),
    );
    record.insert(K::PAYLOAD_FIELD.to_string(), Value::Object(payload));
    Value::Object(record).to_string()
}

/// Parse a raw device record into its device id and payload
///
/// # Errors
/// `Error::Decode` if the record is not a JSON object, has no usable
/// device id, or its payload is missing or not an object.
pub fn decode<K: RecordKind>(raw: &str) -> Result<(DeviceId, Payload)> {
    let mut record: Payload = serde_json::from_str(raw)?;

    let device_id = record
        .get(DEVICE_ID_FIELD)
        .and_then(id_from_value)
        .ok_or_else(|| {
            Error::decode(format!(
                "{} record has no usable `{}`",
                K::NAME,
                DEVICE_ID_FIELD
            ))
        })?;

    match record.remove(K::PAYLOAD_FIELD) {
        Some(Value::Object(payload)) => Ok((device_id, payload)),
        Some(other) => Err(Error::decode(format!(
            "{} payload of device {} is not an object: {}",
            K::NAME,
            device_id,
            other
        ))),
        None => Err(Error::decode(format!(
            "{} record of device {} has no `{}` field",
            K::NAME,
            device_id,
            K::PAYLOAD_FIELD
        ))),
    }
}

/// String form of a required payload field
pub(crate) fn required_id(payload: &Payload, field: &str, device_id: &str) -> Result<String> {
    payload.get(field).and_then(id_from_value).ok_or_else(|| {
        Error::decode(format!(
            "payload of device {} has no usable `{}`",
            device_id, field
        ))
    })
}
