// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 signer contributors

//! Pipeline items
//!
//! Items are never mutated; each stage turns what it receives into new items.

use std::fmt;

use crate::errors::{DigestError, DigestResult};

/// A value flowing through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// Entry token, usually an index
    Int(i64),
    /// Digest or other text
    Text(String),
    /// Raw payload; must be UTF-8 to be hashed
    Bytes(Vec<u8>),
}

impl Item {
    /// Parse a command-line token
    ///
    /// A token becomes [`Item::Int`] only when it is already in canonical
    /// decimal form, so `"007"`, `"+5"` and `"-0"` stay text and hash as typed.
    pub fn parse(token: &str) -> Self {
        match token.parse::<i64>() {
            Ok(n) if n.to_string() == token => Self::Int(n),
            _ => Self::Text(token.to_string()),
        }
    }

    /// Canonical string form of this item
    pub fn canonical(&self) -> DigestResult<String> {
        self.clone().into_canonical()
    }

    /// Consume the item, producing its canonical string form
    ///
    /// Integers render as base-10 decimal. Bytes that are not valid UTF-8
    /// fail with [`DigestError::InvalidItemType`].
    pub fn into_canonical(self) -> DigestResult<String> {
        match self {
            Self::Int(n) => Ok(n.to_string()),
            Self::Text(s) => Ok(s),
            Self::Bytes(bytes) => {
                String::from_utf8(bytes).map_err(|e| DigestError::InvalidItemType {
                    item: format!(
                        "{} bytes, invalid UTF-8 at offset {}",
                        e.as_bytes().len(),
                        e.utf8_error().valid_up_to()
                    ),
                })
            }
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
            Self::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}

impl From<i64> for Item {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Item {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<String> for Item {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for Item {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Item {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}
