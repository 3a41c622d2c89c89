//! Correlation-ID is a UUID tagging one store request in logs and headers

use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue};
use uuid::Uuid;

/// Correlation-ID for matching a request with its log lines
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct CorrelationId(Uuid);

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl CorrelationId {
    pub const HEADER_NAME: &'static str = "correlation-id";

    pub fn new() -> Self {
        CorrelationId(Uuid::new_v4())
    }

    pub fn insert_into_header_map(&self, h: &mut HeaderMap) -> Result<(), InvalidHeaderValue> {
        h.insert(
            Self::HEADER_NAME,
            HeaderValue::from_str(
                self.0
                    .hyphenated()
                    .encode_lower(&mut Uuid::encode_buffer()),
            )?,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_carries_display_form() {
        let mut headers = HeaderMap::new();
        let cid = CorrelationId::new();
        cid.insert_into_header_map(&mut headers).unwrap();

        let value = headers.get(CorrelationId::HEADER_NAME).unwrap().to_str().unwrap();
        assert_eq!(value, cid.to_string());
        assert!(Uuid::parse_str(value).is_ok());
    }

    #[test]
    fn test_fresh_id_per_request() {
        assert_ne!(CorrelationId::new(), CorrelationId::new());
    }
}
