use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::constants::Record;

/// Installs a stderr subscriber. `RUST_LOG` wins over `verbose` when set.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("etekcity_scale={level}"))
    });

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr));
    let _ = subscriber.try_init();
}

impl Record {
    pub fn log(&self) {
        match self {
            Record::Hello { mac, unknown } => {
                info!(%mac, unknown = %hex::encode(unknown), "Hello")
            }
            Record::Weight { weight_kg, final_flag, stability_1, stability_2 } => info!(
                weight_kg,
                final_flag,
                stability_1,
                stability_2,
                "Weight"
            ),
            Record::Unknown { msg_type, payload } => info!(
                msg_type = %format!("0x{:02x}", msg_type),
                payload = %hex::encode(payload),
                "Unknown message type"
            ),
        }
    }
}
