use ledgeracio_core::constants::{DEFAULT_MAX_ALLOWLIST_ENTRIES, DEFAULT_TARGET_ID};
use serde::{Deserialize, Serialize};

/// Runtime configuration for the device application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Condensed review: nominations show only the call and its targets.
    pub expert_mode: bool,
    /// Reported by the version instruction.
    pub test_mode: bool,
    /// Largest allowlist accepted in one upload.
    pub max_allowlist_entries: u32,
    /// Hardware target id reported by the version instruction.
    pub target_id: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            expert_mode: false,
            test_mode: false,
            max_allowlist_entries: DEFAULT_MAX_ALLOWLIST_ENTRIES,
            target_id: DEFAULT_TARGET_ID,
        }
    }
}
