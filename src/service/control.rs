//! Control command protocol.
//!
//! `config` rewrites the listener port and requests a restart.
//! `enqueue_prompt` and `abort_workflow` are forwarded to the host as
//! `comfyui_command` notifications without touching local state.

use serde_json::Value;

use crate::app_state::TransceiverContext;
use crate::domain::{Command, CommandTag, NotificationPayload, TRANSCEIVER_MSG};
use crate::error::TransceiverError;
use crate::lifecycle::ServerOperation;

/// What a handled command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlOutcome {
    /// A `config` command was applied.
    Configured {
        /// Port written to the server configuration, if any.
        port: Option<u16>,
        /// Whether a restart was requested.
        restart_requested: bool,
    },
    /// A command was forwarded to the host.
    Forwarded {
        /// Forwarded command tag.
        command: CommandTag,
        /// Number of notification receivers that got it.
        delivered: usize,
    },
}

/// Interprets one structured frame.
///
/// The restart triggered by a port change is only enqueued; it runs on the
/// supervisor after this call returns and aborts the current connection.
/// The port is written only while the supervisor is still listening, so a
/// `config` that fails with [`TransceiverError::ControlChannelClosed`]
/// leaves the server configuration unchanged.
///
/// # Errors
///
/// - Parse errors from [`Command::parse`].
/// - [`TransceiverError::NotImplemented`] for a recognized tag without a
///   handler.
/// - [`TransceiverError::ControlChannelClosed`] if a restart could not be
///   enqueued.
pub async fn handle_command(
    document: &Value,
    context: &TransceiverContext,
) -> Result<ControlOutcome, TransceiverError> {
    let command = Command::parse(document)?;
    tracing::debug!(command = %command.tag(), "incoming command");

    match command {
        Command::Config { port } => {
            let mut dirty = false;
            if port.is_some() && context.lifecycle.is_closed() {
                return Err(TransceiverError::ControlChannelClosed);
            }
            if let Some(port) = port {
                let previous = context.server_config.set_port(port).await;
                tracing::info!(previous, port, "listener port updated");
                dirty = true;
            }
            if dirty {
                context.lifecycle.submit(ServerOperation::Restart)?;
            }
            Ok(ControlOutcome::Configured {
                port,
                restart_requested: dirty,
            })
        }
        Command::EnqueuePrompt | Command::AbortWorkflow => {
            let tag = command.tag();
            let delivered = context.notifications.publish(
                TRANSCEIVER_MSG,
                NotificationPayload::ComfyuiCommand(tag.as_str().to_string()),
            );
            tracing::info!(command = %tag, delivered, "forwarded command to host");
            Ok(ControlOutcome::Forwarded {
                command: tag,
                delivered,
            })
        }
        Command::Attention => Err(TransceiverError::NotImplemented(
            command.tag().as_str().to_string(),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use tokio::runtime::Handle;
    use tokio::sync::mpsc;

    use super::*;
    use crate::config::TransceiverConfig;
    use crate::lifecycle::{ControlRequest, LifecycleHandle};

    fn make_context() -> (TransceiverContext, mpsc::UnboundedReceiver<ControlRequest>) {
        let (handle, requests) = LifecycleHandle::channel(Handle::current(), Duration::from_secs(1));
        let context = TransceiverContext::new(&TransceiverConfig::default(), handle);
        (context, requests)
    }

    #[tokio::test]
    async fn config_port_updates_and_requests_restart() {
        let (context, mut requests) = make_context();

        let outcome = handle_command(&json!({"command": "config", "port": 9999}), &context).await;
        let Ok(outcome) = outcome else {
            panic!("config should succeed");
        };
        assert_eq!(
            outcome,
            ControlOutcome::Configured {
                port: Some(9999),
                restart_requested: true
            }
        );
        assert_eq!(context.server_config.port().await, 9999);

        let Ok(request) = requests.try_recv() else {
            panic!("restart should be enqueued");
        };
        assert_eq!(request.operation, ServerOperation::Restart);
    }

    #[tokio::test]
    async fn config_with_closed_supervisor_keeps_port() {
        let (context, requests) = make_context();
        drop(requests);

        let outcome = handle_command(&json!({"command": "config", "port": 9999}), &context).await;
        assert!(matches!(outcome, Err(TransceiverError::ControlChannelClosed)));
        assert_eq!(context.server_config.port().await, 8765);
    }

    #[tokio::test]
    async fn config_without_port_is_noop() {
        let (context, mut requests) = make_context();

        let outcome = handle_command(&json!({"command": "config"}), &context).await;
        assert!(matches!(
            outcome,
            Ok(ControlOutcome::Configured {
                port: None,
                restart_requested: false
            })
        ));
        assert_eq!(context.server_config.port().await, 8765);
        assert!(requests.try_recv().is_err());
    }

    #[tokio::test]
    async fn forwarded_commands_publish_notification() {
        let (context, _requests) = make_context();
        let mut rx = context.notifications.subscribe();

        for tag in ["enqueue_prompt", "abort_workflow"] {
            let outcome = handle_command(&json!({"command": tag}), &context).await;
            let Ok(ControlOutcome::Forwarded { command, delivered }) = outcome else {
                panic!("{tag} should be forwarded");
            };
            assert_eq!(command.as_str(), tag);
            assert_eq!(delivered, 1);

            let Ok(notification) = rx.recv().await else {
                panic!("expected a notification");
            };
            assert_eq!(
                notification.payload,
                NotificationPayload::ComfyuiCommand(tag.to_string())
            );
        }
    }

    #[tokio::test]
    async fn unknown_command_is_protocol_error() {
        let (context, _requests) = make_context();
        let result = handle_command(&json!({"command": "dance"}), &context).await;
        assert!(matches!(result, Err(TransceiverError::UnknownCommand(_))));
    }

    #[tokio::test]
    async fn attention_tag_is_not_implemented() {
        let (context, _requests) = make_context();
        let result = handle_command(&json!({"command": "command"}), &context).await;
        assert!(matches!(result, Err(TransceiverError::NotImplemented(_))));
    }
}
