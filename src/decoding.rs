use tracing::debug;

use crate::constants::{
    MacAddress, Record, FRAME_OVERHEAD, HEADER_LEN, MAC_LEN, MAGIC_BYTE, TYPE_HELLO, TYPE_WEIGHT,
    WEIGHT_PAYLOAD_LEN,
};
use crate::encoding::checksum;
use crate::error::{Result, ScaleError};

/// Validates a complete frame and splits it into its type and payload.
///
/// Checks run in wire order: length byte, checksum, then magic.
pub fn decode(frame: &[u8]) -> Result<(u8, &[u8])> {
    debug!("RECV {}", hex::encode(frame));

    if frame.len() < FRAME_OVERHEAD {
        return Err(ScaleError::FrameTooShort {
            expected: FRAME_OVERHEAD,
            actual: frame.len(),
        });
    }

    let declared = frame[1] as usize;
    if frame.len() != declared {
        return Err(ScaleError::LengthMismatch {
            expected: declared,
            actual: frame.len(),
        });
    }

    let (body, trailer) = frame.split_at(frame.len() - 1);
    let computed = checksum(body);
    if computed != trailer[0] {
        return Err(ScaleError::ChecksumMismatch {
            expected: computed,
            actual: trailer[0],
        });
    }

    if frame[2] != MAGIC_BYTE {
        return Err(ScaleError::MagicMismatch(frame[2]));
    }

    Ok((frame[0], &body[HEADER_LEN..]))
}

/// Maps a decoded payload onto a [`Record`]. Unrecognised types never fail.
pub fn interpret(msg_type: u8, payload: &[u8]) -> Result<Record> {
    match msg_type {
        TYPE_WEIGHT => decode_weight(payload),
        TYPE_HELLO => decode_hello(payload),
        _ => Ok(Record::Unknown {
            msg_type,
            payload: payload.to_vec(),
        }),
    }
}

pub fn decode_record(frame: &[u8]) -> Result<Record> {
    let (msg_type, payload) = decode(frame)?;
    interpret(msg_type, payload)
}

impl TryFrom<&[u8]> for Record {
    type Error = ScaleError;

    fn try_from(frame: &[u8]) -> Result<Self> {
        decode_record(frame)
    }
}

// Big-endian u16 weight in hundredths of a kg, u8 final flag, u16 + u16 stability.
fn decode_weight(payload: &[u8]) -> Result<Record> {
    if payload.len() < WEIGHT_PAYLOAD_LEN {
        return Err(ScaleError::malformed(
            TYPE_WEIGHT,
            format!("weight payload needs {} bytes, got {}", WEIGHT_PAYLOAD_LEN, payload.len()),
        ));
    }

    let raw_weight = u16::from_be_bytes([payload[0], payload[1]]);
    Ok(Record::Weight {
        weight_kg: raw_weight as f32 / 100.0,
        final_flag: payload[2],
        stability_1: u16::from_be_bytes([payload[3], payload[4]]),
        stability_2: u16::from_be_bytes([payload[5], payload[6]]),
    })
}

fn decode_hello(payload: &[u8]) -> Result<Record> {
    if payload.len() < MAC_LEN {
        return Err(ScaleError::malformed(
            TYPE_HELLO,
            format!("hello payload needs {} bytes, got {}", MAC_LEN, payload.len()),
        ));
    }

    let mut mac = [0u8; MAC_LEN];
    mac.copy_from_slice(&payload[..MAC_LEN]);
    mac.reverse();

    Ok(Record::Hello {
        mac: MacAddress(mac),
        unknown: payload[MAC_LEN..].to_vec(),
    })
}
