//! Control commands carried by structured frames.
//!
//! A structured frame names its command in a mandatory `command` field:
//!
//! ```json
//! {"command": "config", "port": 9000}
//! {"command": "enqueue_prompt"}
//! {"command": "abort_workflow"}
//! ```

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::TransceiverError;

/// Name of the field that carries the command tag.
pub const COMMAND_FIELD: &str = "command";

/// Name of the optional listener port field of a `config` command.
pub const PORT_FIELD: &str = "port";

/// Recognized command tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandTag {
    /// The tag `command` itself. Recognized, never handled.
    Attention,
    /// Update listener configuration.
    Config,
    /// Ask the host to queue the current graph.
    EnqueuePrompt,
    /// Ask the host to interrupt the running graph.
    AbortWorkflow,
}

impl CommandTag {
    /// Wire name of the tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Attention => "command",
            Self::Config => "config",
            Self::EnqueuePrompt => "enqueue_prompt",
            Self::AbortWorkflow => "abort_workflow",
        }
    }
}

impl fmt::Display for CommandTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandTag {
    type Err = TransceiverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "command" => Ok(Self::Attention),
            "config" => Ok(Self::Config),
            "enqueue_prompt" => Ok(Self::EnqueuePrompt),
            "abort_workflow" => Ok(Self::AbortWorkflow),
            other => Err(TransceiverError::UnknownCommand(other.to_string())),
        }
    }
}

/// A parsed control command with its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// See [`CommandTag::Attention`].
    Attention,
    /// Listener configuration update. `port` is `None` when absent.
    Config {
        /// New listener port.
        port: Option<u16>,
    },
    /// See [`CommandTag::EnqueuePrompt`].
    EnqueuePrompt,
    /// See [`CommandTag::AbortWorkflow`].
    AbortWorkflow,
}

impl Command {
    /// Parses a command from a structured frame.
    ///
    /// # Errors
    ///
    /// - [`TransceiverError::MalformedCommand`] if the document has no
    ///   string `command` field, or `port` is not an integer in `0..=65535`.
    /// - [`TransceiverError::UnknownCommand`] if the tag is not recognized.
    pub fn parse(document: &Value) -> Result<Self, TransceiverError> {
        let tag = document
            .get(COMMAND_FIELD)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                TransceiverError::MalformedCommand(format!(
                    "expected an object with a string \"{COMMAND_FIELD}\" field"
                ))
            })?
            .parse::<CommandTag>()?;

        Ok(match tag {
            CommandTag::Attention => Self::Attention,
            CommandTag::Config => Self::Config {
                port: parse_port(document)?,
            },
            CommandTag::EnqueuePrompt => Self::EnqueuePrompt,
            CommandTag::AbortWorkflow => Self::AbortWorkflow,
        })
    }

    /// Returns the tag of this command.
    #[must_use]
    pub const fn tag(&self) -> CommandTag {
        match self {
            Self::Attention => CommandTag::Attention,
            Self::Config { .. } => CommandTag::Config,
            Self::EnqueuePrompt => CommandTag::EnqueuePrompt,
            Self::AbortWorkflow => CommandTag::AbortWorkflow,
        }
    }
}

fn parse_port(document: &Value) -> Result<Option<u16>, TransceiverError> {
    let Some(raw) = document.get(PORT_FIELD) else {
        return Ok(None);
    };
    raw.as_u64()
        .and_then(|port| u16::try_from(port).ok())
        .map(Some)
        .ok_or_else(|| TransceiverError::MalformedCommand(format!("invalid port {raw}")))
}
