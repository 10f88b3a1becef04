//! Wire protocol for Etekcity Bluetooth scales.
//!
//! Every message is a single frame:
//!
//! ```text
//! +------+--------+-------+-------------------+----------+
//! | type | length | 0x15  | payload[0..len-4] | checksum |
//! +------+--------+-------+-------------------+----------+
//! ```
//!
//! `length` counts the whole frame and `checksum` is the sum of every
//! preceding byte, mod 256. [`decode_record`] turns an inbound frame into a
//! [`Record`]; the `*_frame` constructors build the host side of the
//! handshake, and [`EtekcityScale`] answers a device over any transport.

pub mod constants;
pub mod decoding;
pub mod encoding;
pub mod error;
pub mod logging;
pub mod scale;

pub use constants::{DisplayUnit, MacAddress, Record};
pub use decoding::{decode, decode_record, interpret};
pub use encoding::{
    encode, finish_measurement_frame, init2_frame, init_frame, init_frame_for, set_time_frame,
};
pub use error::{Result, ScaleError};
pub use scale::{respond, respond_at, EtekcityScale, FrameWriter, ScaleConfig};
