use std::future::Future;
use std::io;

use futures::{Stream, StreamExt};
use time::OffsetDateTime;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::constants::{DisplayUnit, MacAddress, Record, TYPE_INIT2_REQUEST, TYPE_TIME_REQUEST};
use crate::decoding::decode_record;
use crate::encoding::{finish_measurement_frame, init2_frame, init_frame_for, set_time_frame};
use crate::error::{Result, ScaleError};

#[derive(Debug, Clone)]
pub struct ScaleConfig {
    pub display_unit: DisplayUnit,
    /// Replies buffered between the notification handler and the write loop.
    pub queue_capacity: usize,
    /// Source of the time sent in set-time replies.
    pub clock: fn() -> OffsetDateTime,
}

impl Default for ScaleConfig {
    fn default() -> Self {
        Self {
            display_unit: DisplayUnit::Kg,
            queue_capacity: 16,
            clock: OffsetDateTime::now_utc,
        }
    }
}

/// Sink for outgoing frames, e.g. a GATT write characteristic.
pub trait FrameWriter {
    fn write_frame(&mut self, frame: &[u8]) -> impl Future<Output = io::Result<()>>;
}

impl FrameWriter for Vec<Vec<u8>> {
    async fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.push(frame.to_vec());
        Ok(())
    }
}

/// The frame the host sends back for `record`, if any.
///
/// hello -> set unit, 0x14 -> set time, 0x21 -> init2, final weight -> finish.
pub fn respond(record: &Record, unit: DisplayUnit) -> Result<Option<Vec<u8>>> {
    respond_at(record, unit, OffsetDateTime::now_utc())
}

/// [`respond`] with an explicit time for the set-time reply.
pub fn respond_at(record: &Record, unit: DisplayUnit, now: OffsetDateTime) -> Result<Option<Vec<u8>>> {
    let reply = match record {
        Record::Hello { .. } => init_frame_for(unit)?,
        Record::Unknown { msg_type: TYPE_TIME_REQUEST, .. } => set_time_frame(Some(now))?,
        Record::Unknown { msg_type: TYPE_INIT2_REQUEST, .. } => init2_frame()?,
        Record::Weight { .. } if record.is_final() => finish_measurement_frame()?,
        _ => return Ok(None),
    };
    Ok(Some(reply))
}

pub struct EtekcityScale {
    config: ScaleConfig,
    current_weight: Mutex<Option<f32>>,
    final_weight: Mutex<Option<f32>>,
    device_mac: Mutex<Option<MacAddress>>,
}

impl EtekcityScale {
    pub fn new(config: ScaleConfig) -> Self {
        Self {
            config,
            current_weight: Mutex::new(None),
            final_weight: Mutex::new(None),
            device_mac: Mutex::new(None),
        }
    }

    /// Drives one connection: every item of `notifications` is one complete
    /// frame from the scale, replies go out through `writer` in order.
    ///
    /// Returns when the notification stream ends and queued replies are
    /// written, or on the first write error.
    pub async fn run<S, W>(&self, notifications: S, writer: &mut W) -> Result<()>
    where
        S: Stream<Item = Vec<u8>>,
        W: FrameWriter,
    {
        let (queue, mut pending) = mpsc::channel::<Vec<u8>>(self.config.queue_capacity.max(1));

        let write_loop = async move {
            while let Some(frame) = pending.recv().await {
                writer.write_frame(&frame).await?;
            }
            Ok::<(), ScaleError>(())
        };

        tokio::try_join!(self.handle_notifications(notifications, queue), write_loop)?;
        Ok(())
    }

    async fn handle_notifications<S>(&self, notifications: S, queue: mpsc::Sender<Vec<u8>>) -> Result<()>
    where
        S: Stream<Item = Vec<u8>>,
    {
        let mut notifications = std::pin::pin!(notifications);
        while let Some(notification) = notifications.next().await {
            let record = match decode_record(&notification) {
                Ok(record) => record,
                Err(e) => {
                    warn!(error = %e, frame = %hex::encode(&notification), "Dropping notification");
                    continue;
                }
            };

            record.log();
            self.track(&record).await;

            let reply = match respond_at(&record, self.config.display_unit, (self.config.clock)()) {
                Ok(Some(reply)) => reply,
                Ok(None) => continue,
                Err(e) => {
                    warn!(error = %e, msg_type = record.msg_type(), "Skipping reply");
                    continue;
                }
            };
            if queue.send(reply).await.is_err() {
                debug!("Write loop gone, stopping notification handler");
                break;
            }
        }
        info!("End of notifications");

        Ok(())
    }

    async fn track(&self, record: &Record) {
        match record {
            Record::Hello { mac, .. } => *self.device_mac.lock().await = Some(*mac),
            Record::Weight { weight_kg, .. } => {
                *self.current_weight.lock().await = Some(*weight_kg);
                if record.is_final() {
                    *self.final_weight.lock().await = Some(*weight_kg);
                }
            }
            Record::Unknown { .. } => {}
        }
    }

    pub async fn current_weight(&self) -> Option<f32> {
        *self.current_weight.lock().await
    }

    pub async fn final_weight(&self) -> Option<f32> {
        *self.final_weight.lock().await
    }

    pub async fn device_mac(&self) -> Option<MacAddress> {
        *self.device_mac.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{TYPE_FINISH_MEASUREMENT, TYPE_INIT2, TYPE_SET_TIME, TYPE_SET_UNIT};

    fn weight(final_flag: u8) -> Record {
        Record::Weight { weight_kg: 80.0, final_flag, stability_1: 0, stability_2: 0 }
    }

    #[test]
    fn test_respond_to_handshake() {
        let hello = Record::Hello { mac: MacAddress([0; 6]), unknown: vec![] };
        let reply = respond(&hello, DisplayUnit::Lb).unwrap().unwrap();
        assert_eq!(reply[0], TYPE_SET_UNIT);
        assert_eq!(reply[3], 2);

        let time_req = Record::Unknown { msg_type: TYPE_TIME_REQUEST, payload: vec![] };
        assert_eq!(respond(&time_req, DisplayUnit::Kg).unwrap().unwrap()[0], TYPE_SET_TIME);

        let init2_req = Record::Unknown { msg_type: TYPE_INIT2_REQUEST, payload: vec![1] };
        assert_eq!(respond(&init2_req, DisplayUnit::Kg).unwrap().unwrap()[0], TYPE_INIT2);
    }

    #[test]
    fn test_respond_to_weights() {
        assert!(respond(&weight(0), DisplayUnit::Kg).unwrap().is_none());
        let reply = respond(&weight(1), DisplayUnit::Kg).unwrap().unwrap();
        assert_eq!(reply[0], TYPE_FINISH_MEASUREMENT);
    }

    #[test]
    fn test_respond_at_uses_given_time() {
        let time_req = Record::Unknown { msg_type: TYPE_TIME_REQUEST, payload: vec![] };
        let now = OffsetDateTime::from_unix_timestamp(946_684_800 + 100).unwrap();
        let reply = respond_at(&time_req, DisplayUnit::Kg, now).unwrap().unwrap();
        assert_eq!(&reply[3..7], &[0x64, 0x00, 0x00, 0x00]);

        let before_y2k = OffsetDateTime::UNIX_EPOCH;
        assert!(matches!(
            respond_at(&time_req, DisplayUnit::Kg, before_y2k),
            Err(ScaleError::Encoding(_))
        ));
    }

    #[test]
    fn test_respond_ignores_other_types() {
        let other = Record::Unknown { msg_type: 0x99, payload: vec![] };
        assert!(respond(&other, DisplayUnit::Kg).unwrap().is_none());
    }
}
