use eb_codec::MessageMetadata;

use crate::error::MessageError;

/// Reserved metadata key prefix. Only `eb-status` is recognized; any other
/// `eb-*` key is dropped (with a warning) rather than forwarded to the
/// response transport.
pub const RESERVED_PREFIX: &str = "eb-";
/// The one recognized reserved key: overrides the response status code.
pub const STATUS_KEY: &str = "eb-status";

/// `(metadata, data)` pair returned to a request/response source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyData {
    pub metadata: MessageMetadata,
    pub data: Vec<u8>,
}

impl ReplyData {
    pub fn new(metadata: MessageMetadata, data: Vec<u8>) -> Self {
        Self { metadata, data }
    }

    /// Parse and validate the `eb-status` override, if present.
    ///
    /// Returns `Ok(None)` when absent. A present-but-invalid value (not a
    /// base-10 integer, or out of `[100,599]`) is a `MessageError`, not a
    /// silent fallback — callers decide what default status to use instead.
    pub fn status_override(&self) -> Result<Option<u16>, MessageError> {
        let Some(raw) = self.metadata.get(STATUS_KEY) else {
            return Ok(None);
        };
        let code: u16 = raw
            .parse()
            .map_err(|_| MessageError::InvalidStatus(raw.to_string()))?;
        if !(100..=599).contains(&code) {
            return Err(MessageError::InvalidStatus(raw.to_string()));
        }
        Ok(Some(code))
    }

    /// Metadata safe to copy verbatim into transport response headers:
    /// every `eb-*` key is stripped. Unknown `eb-*` keys are dropped with a
    /// `tracing::warn!` — only `eb-status` is ever consumed.
    pub fn transport_metadata(&self) -> MessageMetadata {
        let mut out = MessageMetadata::new();
        for (k, v) in self.metadata.iter() {
            if k == STATUS_KEY {
                continue;
            }
            if k.starts_with(RESERVED_PREFIX) {
                tracing::warn!(key = %k, "dropping unrecognized eb-* reply metadata key");
                continue;
            }
            out.insert(k.clone(), v.clone());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(pairs: &[(&str, &str)], data: &[u8]) -> ReplyData {
        let metadata = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ReplyData::new(metadata, data.to_vec())
    }

    // Status override recognized, eb-* not forwarded.
    #[test]
    fn status_override_and_non_reserved_forwarding() {
        let r = reply(&[("eb-status", "202"), ("content-type", "text/plain")], b"ok");
        assert_eq!(r.status_override().unwrap(), Some(202));
        let transport = r.transport_metadata();
        assert_eq!(transport.get("content-type"), Some("text/plain"));
        assert!(transport.get("eb-status").is_none());
    }

    #[test]
    fn unknown_eb_key_is_dropped() {
        let r = reply(&[("eb-header", "x"), ("keep-me", "y")], b"");
        let transport = r.transport_metadata();
        assert!(transport.get("eb-header").is_none());
        assert_eq!(transport.get("keep-me"), Some("y"));
    }

    #[test]
    fn status_override_absent_is_none() {
        let r = reply(&[("content-type", "text/plain")], b"");
        assert_eq!(r.status_override().unwrap(), None);
    }

    #[test]
    fn status_override_out_of_range_is_error() {
        let r = reply(&[("eb-status", "99")], b"");
        assert!(r.status_override().is_err());
        let r = reply(&[("eb-status", "600")], b"");
        assert!(r.status_override().is_err());
    }

    #[test]
    fn status_override_non_integer_is_error() {
        let r = reply(&[("eb-status", "not-a-number")], b"");
        assert!(r.status_override().is_err());
    }
}
