//! Continuation token codec
//!
//! Tokens are opaque to callers and carry everything needed to resume a
//! scan: the remote cursor (or a first-page sentinel), a raw-item offset
//! into the page that cursor fetches, and an optional scan mode. Decoding
//! is total: anything that is not a well-formed v2 envelope degrades to the
//! legacy interpretation of "raw remote cursor, offset zero".

use base64::prelude::*;
use serde::{Deserialize, Serialize};

const TOKEN_PREFIX: &str = "v2.";
const TOKEN_VERSION: u32 = 2;
/// Marks "no remote cursor yet" inside the envelope, since the cursor slot
/// must always hold a non-empty string
const FIRST_PAGE_SENTINEL: &str = "$start";

/// A decoded continuation token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageToken {
    /// Versioned token produced by [`encode`]
    V2 {
        /// Remote cursor; None means start from the first page
        cursor: Option<String>,
        /// Raw-item offset into the page the cursor fetches
        offset: usize,
        /// Scan mode tag carried across resumptions
        mode: Option<String>,
    },
    /// Anything else: the raw string is treated as an opaque remote cursor
    Legacy { cursor: Option<String> },
}

impl PageToken {
    pub fn cursor(&self) -> Option<&str> {
        match self {
            Self::V2 { cursor, .. } => cursor.as_deref(),
            Self::Legacy { cursor } => cursor.as_deref(),
        }
    }

    pub fn offset(&self) -> usize {
        match self {
            Self::V2 { offset, .. } => *offset,
            Self::Legacy { .. } => 0,
        }
    }

    pub fn mode(&self) -> Option<&str> {
        match self {
            Self::V2 { mode, .. } => mode.as_deref(),
            Self::Legacy { .. } => None,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy { .. })
    }
}

/// Wire envelope: {"v":2,"c":cursor-or-sentinel,"o":offset,"m":mode?}
#[derive(Serialize, Deserialize)]
struct TokenEnvelope {
    v: u32,
    c: String,
    o: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    m: Option<String>,
}

/// Encode a continuation token. An absent or empty cursor becomes the
/// first-page sentinel.
pub fn encode(cursor: Option<&str>, offset: usize, mode: Option<&str>) -> String {
    let envelope = TokenEnvelope {
        v: TOKEN_VERSION,
        c: match cursor {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => FIRST_PAGE_SENTINEL.to_string(),
        },
        o: offset as u64,
        m: mode.map(str::to_string),
    };
    let json = serde_json::to_vec(&envelope).expect("token envelope serializes");
    format!("{TOKEN_PREFIX}{}", BASE64_URL_SAFE_NO_PAD.encode(json))
}

/// Decode a continuation token. Never fails: missing input starts from the
/// beginning, and malformed input falls back to the legacy interpretation
/// using the raw token string as the cursor.
pub fn decode(token: Option<&str>) -> PageToken {
    let Some(raw) = token.filter(|t| !t.is_empty()) else {
        return PageToken::Legacy { cursor: None };
    };
    let Some(encoded) = raw.strip_prefix(TOKEN_PREFIX) else {
        return PageToken::Legacy {
            cursor: Some(raw.to_string()),
        };
    };
    let parsed = BASE64_URL_SAFE_NO_PAD
        .decode(encoded)
        .ok()
        .and_then(|bytes| serde_json::from_slice::<TokenEnvelope>(&bytes).ok());
    match parsed {
        Some(envelope) if envelope.v == TOKEN_VERSION && !envelope.c.is_empty() => PageToken::V2 {
            cursor: (envelope.c != FIRST_PAGE_SENTINEL).then_some(envelope.c),
            offset: envelope.o as usize,
            mode: envelope.m,
        },
        _ => PageToken::Legacy {
            cursor: Some(raw.to_string()),
        },
    }
}
