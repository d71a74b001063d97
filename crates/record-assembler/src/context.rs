//! Client identity and collection layout

use serde::{Deserialize, Serialize};
use storage::CollectionPath;
use tracing::info;

/// Anonymous user identity. Sign-in always succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
}

impl Identity {
    /// Sign in anonymously under `uid`
    pub fn anonymous(uid: impl Into<String>) -> Self {
        let identity = Self { uid: uid.into() };
        info!("Signed in anonymously as {}", identity.uid);
        identity
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::anonymous("anonymous")
    }
}

/// Kind of persisted record; each kind has its own collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordKind {
    Analysis,
    EyeTest,
}

impl RecordKind {
    fn collection_name(&self) -> &'static str {
        match self {
            RecordKind::Analysis => "analyses",
            RecordKind::EyeTest => "eyeTests",
        }
    }

    /// Collection holding this kind of record for `identity`
    pub fn collection_path(&self, identity: &Identity) -> CollectionPath {
        CollectionPath::new(format!("users/{}/{}", identity.uid, self.collection_name()))
    }
}
