//! Message listing adapter.
//!
//! Default collaborator: `termux-sms-list`, which prints a JSON array like
//!   [{"threadid": 4, "type": "inbox", "read": true, "number": "+123",
//!     "received": "2024-01-01 10:15:00", "body": "Paid 1,200- balance:5,000", "_id": 77}]

use std::io;
use std::process::{Command, ExitStatus, Stdio};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::types::Message;

pub const DEFAULT_SMS_COMMAND: &str = "termux-sms-list";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("{command} exited with {status}: {stderr}")]
    Exit {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("malformed output from {command}: {source}")]
    Parse {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Anything that can list every SMS on the device.
pub trait MessageSource {
    fn list_messages(&self) -> Result<Vec<Message>, SourceError>;
}

/// Lists messages by running an external command and parsing its JSON stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSource {
    command: String,
    args: Vec<String>,
}

impl Default for CommandSource {
    fn default() -> Self {
        Self::new(DEFAULT_SMS_COMMAND, Vec::new())
    }
}

impl CommandSource {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

impl MessageSource for CommandSource {
    fn list_messages(&self) -> Result<Vec<Message>, SourceError> {
        debug!(command = %self.command, args = ?self.args, "listing messages");
        let output = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| SourceError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(SourceError::Exit {
                command: self.command.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_message_list(&output.stdout).map_err(|source| SourceError::Parse {
            command: self.command.clone(),
            source,
        })
    }
}

/// Parse the JSON array printed by the listing command.
pub fn parse_message_list(raw: &[u8]) -> Result<Vec<Message>, serde_json::Error> {
    serde_json::from_slice(raw)
}

/// Messages whose sender is exactly `bank_number`.
///
/// A failing source is logged and treated as "no messages" so the pass can
/// carry on.
pub fn fetch_bank_messages(source: &dyn MessageSource, bank_number: &str) -> Vec<Message> {
    let all = match source.list_messages() {
        Ok(all) => all,
        Err(e) => {
            warn!("Error getting messages: {e}");
            return Vec::new();
        }
    };

    let total = all.len();
    let bank: Vec<Message> = all.into_iter().filter(|m| m.number == bank_number).collect();
    info!("Found {} messages from bank ({} total)", bank.len(), total);
    bank
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticSource(Vec<Message>);

    impl MessageSource for StaticSource {
        fn list_messages(&self) -> Result<Vec<Message>, SourceError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenSource;

    impl MessageSource for BrokenSource {
        fn list_messages(&self) -> Result<Vec<Message>, SourceError> {
            Err(SourceError::Parse {
                command: "fake".to_string(),
                source: serde_json::from_str::<Vec<Message>>("not json").unwrap_err(),
            })
        }
    }

    #[test]
    fn test_fetch_keeps_only_bank_sender() {
        let src = StaticSource(vec![
            Message::new("+123", "Paid 10-", "2024-01-01 10:00:00"),
            Message::new("+999", "hello", "2024-01-01 11:00:00"),
            Message::new("+1234", "Paid 20-", "2024-01-01 12:00:00"),
            Message::new("+123", "Paid 30-", "2024-01-01 13:00:00"),
        ]);

        let msgs = fetch_bank_messages(&src, "+123");
        assert_eq!(msgs.len(), 2);
        assert!(msgs.iter().all(|m| m.number == "+123"));
    }

    #[test]
    fn test_fetch_failure_is_empty() {
        assert!(fetch_bank_messages(&BrokenSource, "+123").is_empty());
    }

    #[test]
    fn test_parse_termux_listing() {
        let raw = br#"[
            {"threadid": 4, "type": "inbox", "read": true, "number": "+123",
             "received": "2024-01-01 10:15:00", "body": "Paid 1,200- balance:5,000", "_id": 77},
            {"number": "+123", "received": "2024-01-02 08:00:00"}
        ]"#;

        let msgs = parse_message_list(raw).unwrap();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].body.as_deref(), Some("Paid 1,200- balance:5,000"));
        assert_eq!(msgs[1].body, None);
    }

    #[test]
    fn test_null_sender_keeps_rest_of_listing() {
        let raw = br#"[
            {"number": null, "received": "2024-01-01 09:00:00", "body": "promo"},
            {"number": "+123", "received": "2024-01-01 10:15:00", "body": "Paid 5-"}
        ]"#;

        let msgs = parse_message_list(raw).unwrap();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].number, "");

        let src = StaticSource(msgs);
        assert_eq!(fetch_bank_messages(&src, "+123").len(), 1);
    }

    #[test]
    fn test_parse_rejects_non_list() {
        assert!(parse_message_list(b"{\"number\": \"+123\"}").is_err());
        assert!(parse_message_list(b"").is_err());
    }

    #[test]
    fn test_missing_command_is_spawn_error() {
        let src = CommandSource::new("smsledger-no-such-command", Vec::new());
        assert!(matches!(src.list_messages(), Err(SourceError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_source_reads_stdout() {
        let src = CommandSource::new(
            "sh",
            vec![
                "-c".to_string(),
                r#"printf '%s' '[{"number":"+123","body":"Paid 5-","received":"2024-01-01 09:00:00"}]'"#
                    .to_string(),
            ],
        );

        let msgs = src.list_messages().unwrap();
        assert_eq!(msgs, vec![Message::new("+123", "Paid 5-", "2024-01-01 09:00:00")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_source_nonzero_exit() {
        let src = CommandSource::new("sh", vec!["-c".to_string(), "echo boom >&2; exit 3".to_string()]);

        match src.list_messages() {
            Err(SourceError::Exit { stderr, .. }) => assert_eq!(stderr, "boom"),
            other => panic!("expected exit error, got {other:?}"),
        }
    }
}
