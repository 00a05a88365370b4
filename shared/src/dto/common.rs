use serde::{Deserialize, Serialize};

/// Common error response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    /// Error message
    #[serde(alias = "message")]
    pub error: String,
}

/// Acknowledgement returned by delete and publish mutations
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SuccessResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}
