use base64::{engine::general_purpose::STANDARD, Engine as _};
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM, NONCE_LEN};
use ring::digest;
use ring::rand::{SecureRandom, SystemRandom};
use tracing::warn;

use crate::models::SecurityError;

/// AES-256-GCM cipher for contact details, notes and message bodies.
///
/// The key is the SHA-256 digest of the configured secret. Ciphertexts are
/// stored as base64 of `nonce || ciphertext || tag`.
pub struct FieldCipher {
    key: LessSafeKey,
    rng: SystemRandom,
}

impl FieldCipher {
    pub fn new(secret: &str) -> Result<Self, SecurityError> {
        let key_bytes = digest::digest(&digest::SHA256, secret.as_bytes());
        let unbound = UnboundKey::new(&AES_256_GCM, key_bytes.as_ref())
            .map_err(|_| SecurityError::Encryption("invalid key length".to_string()))?;

        Ok(Self {
            key: LessSafeKey::new(unbound),
            rng: SystemRandom::new(),
        })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, SecurityError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let mut nonce_bytes = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce_bytes)
            .map_err(|_| SecurityError::Encryption("nonce generation failed".to_string()))?;

        let mut in_out = plaintext.as_bytes().to_vec();
        self.key
            .seal_in_place_append_tag(
                Nonce::assume_unique_for_key(nonce_bytes),
                Aad::empty(),
                &mut in_out,
            )
            .map_err(|_| SecurityError::Encryption("seal failed".to_string()))?;

        let mut output = Vec::with_capacity(NONCE_LEN + in_out.len());
        output.extend_from_slice(&nonce_bytes);
        output.extend_from_slice(&in_out);
        Ok(STANDARD.encode(output))
    }

    pub fn try_decrypt(&self, encoded: &str) -> Result<String, SecurityError> {
        let raw = STANDARD
            .decode(encoded)
            .map_err(|e| SecurityError::Encryption(format!("not base64: {}", e)))?;

        if raw.len() < NONCE_LEN + AES_256_GCM.tag_len() {
            return Err(SecurityError::Encryption("ciphertext too short".to_string()));
        }

        let (nonce_bytes, ciphertext) = raw.split_at(NONCE_LEN);
        let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
            .map_err(|_| SecurityError::Encryption("bad nonce".to_string()))?;

        let mut in_out = ciphertext.to_vec();
        let plaintext = self
            .key
            .open_in_place(nonce, Aad::empty(), &mut in_out)
            .map_err(|_| SecurityError::Encryption("authentication failed".to_string()))?;

        String::from_utf8(plaintext.to_vec())
            .map_err(|_| SecurityError::Encryption("plaintext is not UTF-8".to_string()))
    }

    /// Decrypts `value`, handing it back unchanged when it is not one of our ciphertexts.
    pub fn decrypt(&self, value: &str) -> String {
        if value.is_empty() {
            return String::new();
        }

        match self.try_decrypt(value) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                warn!(target: "security", "Decryption failed (data may not be encrypted): {}", e);
                value.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypts_and_decrypts() {
        let cipher = FieldCipher::new("secret").unwrap();
        let encrypted = cipher.encrypt("jane@example.com").unwrap();

        assert_ne!(encrypted, "jane@example.com");
        assert_eq!(cipher.decrypt(&encrypted), "jane@example.com");
    }

    #[test]
    fn fresh_nonce_per_call() {
        let cipher = FieldCipher::new("secret").unwrap();
        assert_ne!(cipher.encrypt("same").unwrap(), cipher.encrypt("same").unwrap());
    }

    #[test]
    fn empty_passes_through() {
        let cipher = FieldCipher::new("secret").unwrap();
        assert_eq!(cipher.encrypt("").unwrap(), "");
        assert_eq!(cipher.decrypt(""), "");
    }

    #[test]
    fn plaintext_is_returned_unchanged() {
        let cipher = FieldCipher::new("secret").unwrap();
        assert_eq!(cipher.decrypt("555-0100"), "555-0100");
    }

    #[test]
    fn other_key_cannot_decrypt() {
        let encrypted = FieldCipher::new("one").unwrap().encrypt("notes").unwrap();
        let other = FieldCipher::new("two").unwrap();

        assert!(other.try_decrypt(&encrypted).is_err());
        assert_eq!(other.decrypt(&encrypted), encrypted);
    }
}
