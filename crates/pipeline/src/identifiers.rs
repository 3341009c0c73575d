//! Newtype domain identifiers.
//!
//! Every domain concept that has an identity is represented as a distinct newtype
//! wrapping a primitive. This prevents accidentally interchanging a
//! [`PipelineId`] with some other integer, or a raw channel name with a resolved
//! [`ChannelId`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Macro for u64-wrapped newtypes (provider-assigned integers).
// Generates: struct (Copy), new(), as_u64(), Display.
// ---------------------------------------------------------------------------
macro_rules! u64_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            /// Creates a new identifier from a raw integer.
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            /// Returns the underlying integer value.
            pub fn as_u64(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers — provider-integer-backed
// ---------------------------------------------------------------------------

u64_id! {
    /// Identifies a build pipeline definition within the CI provider's project.
    ///
    /// Carries no structure beyond integer equality.
    PipelineId
}

impl PipelineId {
    /// Parses a non-negative integer literal (ASCII digits only).
    ///
    /// Signs, whitespace, and values that overflow `u64` are rejected.
    pub fn parse_literal(token: &str) -> Option<Self> {
        if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        token.parse().ok().map(Self)
    }
}

// ---------------------------------------------------------------------------
// Identifiers — String-backed (messaging platform)
// ---------------------------------------------------------------------------

string_id! {
    /// A resolved, stable channel identifier (e.g. `"C024BE91L"`).
    ///
    /// Registry keys are always of this type, never a human-readable name.
    ChannelId
}

/// Channel id used when the configured default channel cannot be resolved.
pub const DEFAULT_CHANNEL_FALLBACK: &str = "C_DEFAULT_FALLBACK";

impl ChannelId {
    /// The [`DEFAULT_CHANNEL_FALLBACK`] channel.
    pub fn fallback() -> Self {
        Self(DEFAULT_CHANNEL_FALLBACK.to_string())
    }
}

/// A channel reference as it may appear in persisted data or configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    /// Human-readable name with the leading `#` marker (e.g. `"#builds"`).
    Name(String),
    /// Already-resolved stable identifier.
    Id(ChannelId),
}

impl ChannelRef {
    /// Classifies a raw channel string. Returns `None` for an empty string.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.starts_with('#') {
            Some(Self::Name(raw.to_string()))
        } else {
            ChannelId::new(raw).map(Self::Id)
        }
    }
}

// ---------------------------------------------------------------------------
// Identifiers — UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies the handling of one inbound command.
///
/// Generated fresh for every command; recorded on the dispatch span so all
/// provider calls made on behalf of a single command can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a new random request identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
