use std::fmt;
use std::str::FromStr;

use crate::error::ScaleError;

pub const MAGIC_BYTE: u8 = 0x15;

/// Type, length and magic bytes in front of the payload.
pub const HEADER_LEN: usize = 3;
/// Header plus the trailing checksum byte.
pub const FRAME_OVERHEAD: usize = HEADER_LEN + 1;
pub const MAX_FRAME_LEN: usize = u8::MAX as usize;
pub const MAX_PAYLOAD_LEN: usize = MAX_FRAME_LEN - FRAME_OVERHEAD;

/// Seconds between the unix epoch and 2000-01-01T00:00:00Z.
pub const Y2K_START: i64 = 946_684_800;

pub const TYPE_WEIGHT: u8 = 0x10;
pub const TYPE_HELLO: u8 = 0x12;
pub const TYPE_SET_UNIT: u8 = 0x13;
pub const TYPE_TIME_REQUEST: u8 = 0x14;
pub const TYPE_FINISH_MEASUREMENT: u8 = 0x1f;
pub const TYPE_SET_TIME: u8 = 0x20;
pub const TYPE_INIT2_REQUEST: u8 = 0x21;
pub const TYPE_INIT2: u8 = 0x22;

pub(crate) const INIT_PAYLOAD_TAIL: [u8; 4] = [0x10, 0xbe, 0x34, 0x00];
pub(crate) const FINISH_PAYLOAD: [u8; 1] = [0x10];

pub(crate) const WEIGHT_PAYLOAD_LEN: usize = 7;
pub(crate) const MAC_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayUnit {
    #[default]
    Kg,
    Lb,
    We,
    Stone,
}

impl DisplayUnit {
    pub fn code(&self) -> u8 {
        match *self {
            DisplayUnit::Kg => 1,
            DisplayUnit::Lb => 2,
            DisplayUnit::We => 4,
            DisplayUnit::Stone => 8,
        }
    }
}

impl FromStr for DisplayUnit {
    type Err = ScaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "KG" => Ok(DisplayUnit::Kg),
            "LB" => Ok(DisplayUnit::Lb),
            "WE" => Ok(DisplayUnit::We),
            "STONE" => Ok(DisplayUnit::Stone),
            _ => Err(ScaleError::UnknownUnit(s.to_string())),
        }
    }
}

impl fmt::Display for DisplayUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DisplayUnit::Kg => "KG",
            DisplayUnit::Lb => "LB",
            DisplayUnit::We => "WE",
            DisplayUnit::Stone => "STONE",
        };
        f.write_str(name)
    }
}

/// Device address in display order (the hello payload carries it reversed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacAddress(pub [u8; 6]);

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Hello { mac: MacAddress, unknown: Vec<u8> },
    /// `weight_kg` is the raw hundredths divided by 100 in `f32`, so it is the
    /// nearest `f32` to the reading rather than an exact decimal.
    Weight { weight_kg: f32, final_flag: u8, stability_1: u16, stability_2: u16 },
    Unknown { msg_type: u8, payload: Vec<u8> },
}

impl Record {
    pub fn msg_type(&self) -> u8 {
        match self {
            Record::Hello { .. } => TYPE_HELLO,
            Record::Weight { .. } => TYPE_WEIGHT,
            Record::Unknown { msg_type, .. } => *msg_type,
        }
    }

    /// True for a weight sample the scale has settled on.
    pub fn is_final(&self) -> bool {
        matches!(self, Record::Weight { final_flag, .. } if *final_flag != 0)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Record::Hello { mac, unknown } => {
                write!(f, "hello mac={} unknown={}", mac, hex::encode(unknown))
            }
            Record::Weight { weight_kg, final_flag, stability_1, stability_2 } => write!(
                f,
                "weight {:.2} kg final={} stability={}/{}",
                weight_kg, final_flag, stability_1, stability_2
            ),
            Record::Unknown { msg_type, payload } => {
                write!(f, "unknown type=0x{:02x} payload={}", msg_type, hex::encode(payload))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_unit_parse() {
        assert_eq!("KG".parse::<DisplayUnit>().unwrap(), DisplayUnit::Kg);
        assert_eq!("stone".parse::<DisplayUnit>().unwrap().code(), 8);
        assert!(matches!("XX".parse::<DisplayUnit>(), Err(ScaleError::UnknownUnit(u)) if u == "XX"));
    }

    #[test]
    fn test_mac_display() {
        let mac = MacAddress([0xd0, 0x3e, 0x7d, 0x01, 0x02, 0xff]);
        assert_eq!(mac.to_string(), "d03e7d0102ff");
    }

    #[test]
    fn test_record_final() {
        let weight = Record::Weight { weight_kg: 70.1, final_flag: 1, stability_1: 0, stability_2: 0 };
        assert!(weight.is_final());
        assert_eq!(weight.msg_type(), TYPE_WEIGHT);

        let unknown = Record::Unknown { msg_type: 0x14, payload: vec![] };
        assert!(!unknown.is_final());
        assert_eq!(unknown.msg_type(), TYPE_TIME_REQUEST);
    }
}
