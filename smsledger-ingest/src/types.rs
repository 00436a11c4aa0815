use serde::{Deserialize, Deserializer};

/// One SMS as emitted by the message-listing command.
///
/// Only the fields the pipeline reads are kept; anything else in the JSON
/// (thread ids, read flags, ...) is ignored. `body` and `received` are optional
/// so a single odd entry does not fail the whole listing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Message {
    /// Sender address or short code; `null` reads as empty
    #[serde(default, deserialize_with = "null_as_empty")]
    pub number: String,
    #[serde(default)]
    pub body: Option<String>,
    /// "YYYY-MM-DD HH:MM:SS"
    #[serde(default)]
    pub received: Option<String>,
}

fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

impl Message {
    pub fn new(number: impl Into<String>, body: impl Into<String>, received: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            body: Some(body.into()),
            received: Some(received.into()),
        }
    }
}
