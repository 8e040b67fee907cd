//! `.msg` parsing: directory headers, property records and the recursive
//! message builder.

pub mod builder;
pub mod decoder;
pub mod header;
pub mod naming;
pub mod walker;

use serde::{Deserialize, Serialize};

pub use builder::{parse_message, parse_msg_file, MsgParser};

/// Default limit on embedded-message nesting.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// What to do when a variable-size property's backing stream is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingStreamPolicy {
    /// Abort the parse with `MissingAuxiliaryStream`.
    #[default]
    Fail,
    /// Store an empty value of the declared type and continue.
    Empty,
}

/// Parser settings. Also the `[parser]` section of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Maximum depth of embedded messages (the root message is depth 0).
    pub max_depth: usize,
    /// Handling of missing auxiliary streams, applied to every property.
    pub missing_streams: MissingStreamPolicy,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            missing_streams: MissingStreamPolicy::Fail,
        }
    }
}
