//! Server settings received from the editor.

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::Value;

/// Configuration section the editor publishes our settings under.
pub const CONFIGURATION_SECTION: &str = "trlcServer";

/// How much of the workspace each validation pass covers.
///
/// Full mode walks the whole workspace; partial mode analyzes only the
/// documents the editor has open. Cross-file rename is gated on full mode
/// because partial analysis cannot enumerate every reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsingMode {
    #[default]
    Full,
    Partial,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub parsing: ParsingMode,
    /// Scan-only roots registered before the workspace itself.
    pub include_paths: Vec<PathBuf>,
}

impl Settings {
    /// Decode settings from `initializationOptions` or from the object a
    /// `workspace/didChangeConfiguration` notification carries. Accepts the
    /// settings either at the top level or nested under the
    /// [`CONFIGURATION_SECTION`] key; malformed values fall back to `None`
    /// so a bad client payload never breaks the server.
    pub fn from_value(value: &Value) -> Option<Self> {
        let section = value.get(CONFIGURATION_SECTION).unwrap_or(value);
        serde_json::from_value(section.clone()).ok()
    }
}
