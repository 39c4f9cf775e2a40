//! Envelope encryption.
//!
//! Payloads that leave the local machine are encrypted to a single
//! recipient's public key; only that recipient's private key can open
//! them. Recipients are age x25519 keys or SSH public keys, told apart by
//! the `ssh-` prefix. Decryption resolves a matching local private key
//! through the pluggable [`KeyResolver`] capability.

use std::io::{Read, Write};

use tracing::trace;
use zeroize::Zeroizing;

use crate::core::domain::keyring::SSH_KEY_PREFIX;
use crate::error::{CryptoError, Result};

mod resolver;

pub use resolver::{KeyResolver, SshDirResolver, StaticResolver};

/// Parse a public key string into an age recipient.
///
/// SSH-prefixed keys become SSH recipients; anything else must be a raw
/// x25519 recipient (`age1...`).
///
/// # Errors
///
/// Returns `CryptoError::InvalidKeyFormat` when neither parse succeeds.
pub fn parse_recipient(public_key: &str) -> Result<Box<dyn age::Recipient + Send>> {
    if public_key.starts_with(SSH_KEY_PREFIX) {
        let recipient: age::ssh::Recipient = public_key
            .parse()
            .map_err(|_| CryptoError::InvalidKeyFormat(public_key.to_string()))?;
        Ok(Box::new(recipient))
    } else {
        let recipient: age::x25519::Recipient = public_key
            .parse()
            .map_err(|_| CryptoError::InvalidKeyFormat(public_key.to_string()))?;
        Ok(Box::new(recipient))
    }
}

/// Encrypt `plaintext` so only the holder of the private key matching
/// `public_key` can read it. Output is ASCII-armored.
///
/// No network or disk access; deterministic modulo age's randomness.
pub fn encrypt_for(public_key: &str, plaintext: &[u8]) -> Result<Vec<u8>> {
    trace!(plaintext_len = plaintext.len(), "encrypting for recipient");

    let recipient = parse_recipient(public_key)?;

    let encryptor =
        age::Encryptor::with_recipients(std::iter::once(&*recipient as &dyn age::Recipient))
            .map_err(|e| CryptoError::EncryptFailed(e.to_string()))?;

    let mut ciphertext = Vec::new();
    let armor = age::armor::ArmoredWriter::wrap_output(
        &mut ciphertext,
        age::armor::Format::AsciiArmor,
    )?;
    let mut writer = encryptor
        .wrap_output(armor)
        .map_err(|e| CryptoError::EncryptFailed(e.to_string()))?;

    writer.write_all(plaintext)?;
    writer
        .finish()
        .map_err(|e| CryptoError::EncryptFailed(e.to_string()))?
        .finish()
        .map_err(|e| CryptoError::EncryptFailed(e.to_string()))?;

    trace!(ciphertext_len = ciphertext.len(), "encrypted");

    Ok(ciphertext)
}

/// Decrypt a payload addressed to `target_public_key`.
///
/// The resolver locates a local private key whose derived public key
/// equals the target; the plaintext buffer is zeroed on drop.
///
/// # Errors
///
/// `CryptoError::KeyNotFound` when the resolver has no matching identity,
/// `CryptoError::DecryptFailed` on malformed ciphertext or a scheme
/// mismatch.
pub fn decrypt_with(
    resolver: &dyn KeyResolver,
    target_public_key: &str,
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    trace!(ciphertext_len = ciphertext.len(), "decrypting");

    let identity = resolver.resolve(target_public_key)?;

    let reader = age::armor::ArmoredReader::new(ciphertext);
    let decryptor = age::Decryptor::new(reader)
        .map_err(|e| CryptoError::DecryptFailed(e.to_string()))?;

    let mut plaintext = Zeroizing::new(Vec::new());
    let mut reader = decryptor
        .decrypt(std::iter::once(&*identity as &dyn age::Identity))
        .map_err(|e| CryptoError::DecryptFailed(e.to_string()))?;

    reader.read_to_end(&mut plaintext)?;

    trace!(plaintext_len = plaintext.len(), "decrypted");

    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_with_x25519_key() {
        let identity = age::x25519::Identity::generate();
        let public = identity.to_public().to_string();

        let resolver = StaticResolver::from_identity(&identity);

        let ciphertext = encrypt_for(&public, b"hello world").unwrap();
        assert_ne!(ciphertext.as_slice(), b"hello world");

        let plaintext = decrypt_with(&resolver, &public, &ciphertext).unwrap();
        assert_eq!(plaintext.as_slice(), b"hello world");
    }

    #[test]
    fn decrypting_with_unrelated_key_fails() {
        let sender_target = age::x25519::Identity::generate();
        let other = age::x25519::Identity::generate();

        let ciphertext =
            encrypt_for(&sender_target.to_public().to_string(), b"hello world").unwrap();

        // The resolver only knows the unrelated key: no identity matches
        // the target public key.
        let resolver = StaticResolver::from_identity(&other);
        let err = decrypt_with(
            &resolver,
            &sender_target.to_public().to_string(),
            &ciphertext,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Crypto(CryptoError::KeyNotFound)
        ));

        // Resolving the unrelated identity succeeds, but the payload was
        // not addressed to it.
        let err = decrypt_with(&resolver, &other.to_public().to_string(), &ciphertext)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Crypto(CryptoError::DecryptFailed(_))
        ));
    }

    #[test]
    fn garbage_key_is_invalid_format() {
        let err = encrypt_for("definitely-not-a-key", b"x").unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Crypto(CryptoError::InvalidKeyFormat(_))
        ));
    }

    #[test]
    fn ssh_prefixed_garbage_is_invalid_format() {
        let err = encrypt_for("ssh-ed25519 not-base64", b"x").unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Crypto(CryptoError::InvalidKeyFormat(_))
        ));
    }

    #[test]
    fn malformed_ciphertext_is_a_decrypt_failure() {
        let identity = age::x25519::Identity::generate();
        let resolver = StaticResolver::from_identity(&identity);

        let err = decrypt_with(
            &resolver,
            &identity.to_public().to_string(),
            b"not an age file",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            crate::error::Error::Crypto(CryptoError::DecryptFailed(_))
        ));
    }
}
