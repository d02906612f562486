//! image-transceiver entry point.
//!
//! Launches the lifecycle supervisor, optionally starts the listener, and
//! logs every host notification until Ctrl-C.

use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use image_transceiver::config::TransceiverConfig;
use image_transceiver::domain::NotificationPayload;
use image_transceiver::lifecycle;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = TransceiverConfig::from_env();
    tracing::info!(host = %config.host, port = config.port, "starting image-transceiver");

    let transceiver = lifecycle::launch(config.clone(), &tokio::runtime::Handle::current());
    let mut notifications = transceiver.context.notifications.subscribe();
    tokio::spawn(async move {
        loop {
            match notifications.recv().await {
                Ok(notification) => {
                    let detail = match &notification.payload {
                        NotificationPayload::PictCha(uri) => format!("{} bytes", uri.len()),
                        NotificationPayload::ComfyuiCommand(command) => command.clone(),
                    };
                    tracing::info!(
                        topic = %notification.topic,
                        key = notification.payload.key(),
                        %detail,
                        "host notification"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "notification logger lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    if config.autostart {
        let status = transceiver.lifecycle.start().await?;
        tracing::info!(running = status.running, addr = ?status.local_addr, "autostart complete");
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown requested");
    transceiver.lifecycle.shutdown().await?;
    transceiver.task.await?;

    Ok(())
}

/// Installs the global subscriber. `LOG_FORMAT=json` selects JSON output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json")) {
        builder.json().init();
    } else {
        builder.init();
    }
}
