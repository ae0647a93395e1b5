//! User profile model for storage and API.

use super::Role;
use serde::{Deserialize, Serialize};

/// User profile stored in Firestore.
///
/// The document ID is the identity provider's user ID. The role stored here
/// is the source the identity provider copies into new session claims; it is
/// never consulted per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Identity provider user ID (also used as document ID)
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    #[serde(default)]
    pub phone: Option<String>,
    /// When the profile was created (RFC3339)
    pub created_at: String,
    /// Last modification (RFC3339)
    pub updated_at: String,
}

/// Only the document ID of a stored record, used for cascade deletes.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRef {
    #[serde(rename = "_firestore_id", default)]
    pub doc_id: Option<String>,
}
