use serde::{Deserialize, Serialize};

/// Per-user profile record held by the metadata store.
/// Read/merge-write only — writes never destroy unspecified fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "displayName", default)]
    pub display_name: String,
    /// Standing instructions prepended to every AI operation for this user.
    #[serde(rename = "customInstructions", default)]
    pub custom_instructions: String,
}
