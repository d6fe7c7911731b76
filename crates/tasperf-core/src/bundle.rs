//! Crypto material produced by the helper service for one signing attempt.

use serde::{Deserialize, Serialize};

/// Pre-generated signing material. Fetched fresh for every signing
/// iteration and dropped when the iteration ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoBundle {
    /// DER public key, standard base64.
    pub public_key_base64: String,
    /// Proof of possession: the identity email signed with the private key, base64.
    pub signed_email_address: String,
    /// Signature over the artifact hash, base64.
    #[serde(default)]
    pub artifact_signature: String,
    /// Hex-encoded SHA-256 of the artifact.
    pub artifact_hash: String,
}

impl CryptoBundle {
    /// The artifact signature, if the helper supplied one.
    pub fn artifact_signature(&self) -> Option<&str> {
        if self.artifact_signature.is_empty() {
            None
        } else {
            Some(&self.artifact_signature)
        }
    }
}
