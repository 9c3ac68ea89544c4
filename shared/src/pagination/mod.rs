//! Opaque pagination cursors and page envelopes.
//!
//! A cursor travels to clients as `next_token`: the base64url (no padding)
//! encoding of `{"last_id": .., "last_created_at": ..}` with absent fields
//! omitted. The format is part of the public contract and must stay
//! byte-stable.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Result, ServiceError};

pub const DEFAULT_PAGE_SIZE: usize = 25;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_created_at: Option<String>,
}

#[derive(Error, Debug)]
pub enum CursorError {
    #[error("token is not valid base64url: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("token does not contain a cursor: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Encodes a cursor into an opaque token. No cursor yields an empty token.
pub fn encode_cursor(cursor: Option<&Cursor>) -> Result<String> {
    match cursor {
        None => Ok(String::new()),
        Some(cursor) => {
            let bytes = serde_json::to_vec(cursor)?;
            Ok(URL_SAFE_NO_PAD.encode(bytes))
        }
    }
}

/// Decodes an opaque token. An empty token is "no cursor", not an error.
pub fn decode_cursor(token: &str) -> std::result::Result<Option<Cursor>, CursorError> {
    if token.is_empty() {
        return Ok(None);
    }
    let bytes = URL_SAFE_NO_PAD.decode(token)?;
    let cursor = serde_json::from_slice(&bytes)?;
    Ok(Some(cursor))
}

/// Parses a caller supplied page size.
///
/// Empty input falls back to `default_limit`, values above `max_limit` are
/// capped, and anything unparsable or not positive is rejected.
pub fn parse_limit(raw: &str, default_limit: usize, max_limit: usize) -> Result<usize> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(default_limit);
    }
    let limit: i64 = match raw.parse() {
        Ok(limit) => limit,
        // Too large for i64 but still a positive number
        Err(_) if raw.bytes().all(|b| b.is_ascii_digit()) => return Ok(max_limit),
        Err(_) => {
            return Err(ServiceError::InvalidLimit(format!(
                "'{}' is not a number",
                raw
            )))
        }
    };
    if limit <= 0 {
        return Err(ServiceError::InvalidLimit(
            "limit must be positive".to_string(),
        ));
    }
    Ok((limit as u64).min(max_limit as u64) as usize)
}

/// One page of a listable collection.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<Cursor>,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
            has_more: self.has_more,
        }
    }

    pub fn into_response(self) -> Result<PageResponse<T>> {
        let next_token = encode_cursor(self.next_cursor.as_ref())?;
        Ok(PageResponse {
            count: self.items.len(),
            items: self.items,
            next_token,
            has_more: self.has_more,
        })
    }
}

// Response DTO shared by every list endpoint
#[derive(Serialize, Debug)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub count: usize,
    #[serde(rename = "nextToken", skip_serializing_if = "String::is_empty")]
    pub next_token: String,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_round_trip() {
        let cursors = vec![
            Cursor {
                last_id: Some("team-42".to_string()),
                last_created_at: Some("2025-03-01T10:00:00Z".to_string()),
            },
            Cursor {
                last_id: Some("only-id".to_string()),
                last_created_at: None,
            },
            Cursor::default(),
        ];

        for cursor in cursors {
            let token = encode_cursor(Some(&cursor)).unwrap();
            assert!(!token.contains('='), "token must not be padded: {}", token);
            let decoded = decode_cursor(&token).unwrap();
            assert_eq!(decoded, Some(cursor));
        }
    }

    #[test]
    fn test_empty_cursor_and_token() {
        assert_eq!(encode_cursor(None).unwrap(), "");
        assert_eq!(decode_cursor("").unwrap(), None);
    }

    #[test]
    fn test_token_format_is_stable() {
        let cursor = Cursor {
            last_id: Some("abc".to_string()),
            last_created_at: None,
        };
        let token = encode_cursor(Some(&cursor)).unwrap();
        let raw = URL_SAFE_NO_PAD.decode(&token).unwrap();
        assert_eq!(String::from_utf8(raw).unwrap(), r#"{"last_id":"abc"}"#);
    }

    #[test]
    fn test_malformed_token_is_an_error() {
        assert!(matches!(
            decode_cursor("%%%not-base64%%%"),
            Err(CursorError::Encoding(_))
        ));
        let not_json = URL_SAFE_NO_PAD.encode("plain text");
        assert!(matches!(
            decode_cursor(&not_json),
            Err(CursorError::Payload(_))
        ));

        let err: ServiceError = decode_cursor("%%%").unwrap_err().into();
        assert_eq!(err.code(), "invalid_cursor");
    }

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit("", 25, 100).unwrap(), 25);
        assert_eq!(parse_limit("10", 25, 100).unwrap(), 10);
        assert_eq!(parse_limit(" 7 ", 25, 100).unwrap(), 7);
        assert_eq!(parse_limit("1000", 25, 100).unwrap(), 100);
        assert!(matches!(
            parse_limit("0", 25, 100),
            Err(ServiceError::InvalidLimit(_))
        ));
        assert!(matches!(
            parse_limit("-3", 25, 100),
            Err(ServiceError::InvalidLimit(_))
        ));
        assert!(matches!(
            parse_limit("abc", 25, 100),
            Err(ServiceError::InvalidLimit(_))
        ));
    }

    #[test]
    fn test_page_response_omits_empty_token() {
        let page = Page {
            items: vec![1, 2, 3],
            next_cursor: None,
            has_more: false,
        };
        let json = serde_json::to_value(page.into_response().unwrap()).unwrap();
        assert_eq!(json["count"], 3);
        assert_eq!(json["hasMore"], false);
        assert!(json.get("nextToken").is_none());
    }
}
