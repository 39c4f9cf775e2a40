//! Encrypted secret-material messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One unit of secret material distributed for a specific environment
/// version, encrypted to a single recipient.
///
/// The payload is opaque here: it was produced by
/// [`crate::core::crypto::encrypt_for`] against the recipient's cipher key
/// and only the recipient's private key can open it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: u64,
    /// Armored ciphertext, base64 on the wire.
    #[serde(with = "payload_encoding")]
    pub payload: Vec<u8>,
    /// User id of the sending project member.
    pub sender: String,
    /// User id of the receiving project member.
    pub recipient: String,
    /// Environment the material belongs to.
    pub environment_id: String,
    /// Version marker the material was captured at.
    pub version_id: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

mod payload_encoding {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(de)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}
