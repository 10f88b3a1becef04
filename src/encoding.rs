use time::OffsetDateTime;
use tracing::debug;

use crate::constants::{
    DisplayUnit, FINISH_PAYLOAD, FRAME_OVERHEAD, INIT_PAYLOAD_TAIL, MAGIC_BYTE, MAX_PAYLOAD_LEN,
    TYPE_FINISH_MEASUREMENT, TYPE_INIT2, TYPE_SET_TIME, TYPE_SET_UNIT, Y2K_START,
};
use crate::error::{Result, ScaleError};

/// Low 8 bits of the sum of `bytes`.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Frames `payload` as `[type, len, MAGIC, payload.., checksum]`.
pub fn encode(msg_type: u8, payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(ScaleError::encoding(format!(
            "payload too large: {} bytes (max {})",
            payload.len(),
            MAX_PAYLOAD_LEN
        )));
    }

    let mut bytes = Vec::with_capacity(payload.len() + FRAME_OVERHEAD);
    bytes.push(msg_type);
    bytes.push((payload.len() + FRAME_OVERHEAD) as u8);
    bytes.push(MAGIC_BYTE);
    bytes.extend_from_slice(payload);
    bytes.push(checksum(&bytes));

    debug!("SEND {}", hex::encode(&bytes));
    Ok(bytes)
}

/// Tells the scale which unit to display, parsed from "KG", "LB", "WE" or "STONE".
pub fn init_frame(display_unit: &str) -> Result<Vec<u8>> {
    let unit: DisplayUnit = display_unit.parse()?;
    init_frame_for(unit)
}

pub fn init_frame_for(unit: DisplayUnit) -> Result<Vec<u8>> {
    let mut payload = [0u8; 5];
    payload[0] = unit.code();
    payload[1..].copy_from_slice(&INIT_PAYLOAD_TAIL);
    encode(TYPE_SET_UNIT, &payload)
}

/// Sets the scale clock. The wire value is whole seconds since 2000-01-01 UTC,
/// little-endian. `None` means now.
pub fn set_time_frame(timestamp: Option<OffsetDateTime>) -> Result<Vec<u8>> {
    let timestamp = timestamp.unwrap_or_else(OffsetDateTime::now_utc);
    let since_y2k = timestamp.unix_timestamp() - Y2K_START;
    let seconds = u32::try_from(since_y2k).map_err(|_| {
        ScaleError::encoding(format!("timestamp {} is outside the scale clock range", timestamp))
    })?;
    encode(TYPE_SET_TIME, &seconds.to_le_bytes())
}

pub fn init2_frame() -> Result<Vec<u8>> {
    encode(TYPE_INIT2, &[])
}

pub fn finish_measurement_frame() -> Result<Vec<u8>> {
    encode(TYPE_FINISH_MEASUREMENT, &FINISH_PAYLOAD)
}
