use serde::{Deserialize, Serialize};

/// Chrome's documented limit for a single host -> browser message (1 MiB).
pub const CHROME_MAX_TO_BROWSER: usize = 1_048_576;

/// Limit this crate applies to browser -> host messages under
/// [`HostConfig::chrome_limits`] (64 MiB).
pub const CHROME_MAX_FROM_BROWSER: usize = 64 * 1_048_576;

/// Host-level limits. The default imposes none, matching the bare protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Reject incoming frames whose declared length exceeds this, before reading the payload.
    pub max_incoming_len: Option<usize>,
    /// Reject outgoing messages whose UTF-8 length exceeds this, before acquiring the output stream.
    pub max_outgoing_len: Option<usize>,
}

impl HostConfig {
    /// Limits matching what Chrome accepts and sends.
    pub fn chrome_limits() -> Self {
        Self {
            max_incoming_len: Some(CHROME_MAX_FROM_BROWSER),
            max_outgoing_len: Some(CHROME_MAX_TO_BROWSER),
        }
    }

    pub fn with_max_incoming_len(mut self, max: usize) -> Self {
        self.max_incoming_len = Some(max);
        self
    }

    pub fn with_max_outgoing_len(mut self, max: usize) -> Self {
        self.max_outgoing_len = Some(max);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unbounded() {
        let config = HostConfig::default();
        assert_eq!(config.max_incoming_len, None);
        assert_eq!(config.max_outgoing_len, None);
    }

    #[test]
    fn missing_fields_deserialize_as_unbounded() {
        let config: HostConfig = serde_json::from_str(r#"{"max_outgoing_len": 16}"#).unwrap();
        assert_eq!(config, HostConfig::default().with_max_outgoing_len(16));
    }
}
