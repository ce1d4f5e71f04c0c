//! Vault cryptography: snapshot sealing and passcode key derivation.
//!
//! The vault's entry map is sealed as a single ChaCha20-Poly1305 blob with a
//! fresh 96-bit nonce per seal. Custom-passcode vaults wrap the master key
//! with a key derived from the passcode via Argon2id.
//!
//! # Security Parameters
//!
//! - Argon2id, 64 MB memory, 3 iterations, 1 lane — tuned for an interactive
//!   PIN prompt rather than a rarely-entered master password
//! - 256-bit keys, 128-bit salts
//! - Keys travel in `Zeroizing` wrappers and are wiped when dropped

use crate::error::{Result, VaultError};
use argon2::{Algorithm, Argon2, ParamsBuilder, Version};
use chacha20poly1305::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

/// Length of vault keys in bytes (256 bits).
pub const KEY_LENGTH: usize = 32;

/// Length of the passcode salt in bytes.
pub const SALT_LENGTH: usize = 16;

/// Length of the AEAD nonce in bytes (96 bits).
pub const NONCE_LENGTH: usize = 12;

/// Argon2id memory cost in KB (64 MB).
const MEMORY_COST_KB: u32 = 65_536;

/// Argon2id time cost (iterations).
const TIME_COST: u32 = 3;

/// Argon2id parallelism (lanes).
const PARALLELISM: u32 = 1;

/// A sealed ciphertext with the nonce used to produce it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealedBlob {
    /// Random nonce used for this seal
    pub nonce: [u8; NONCE_LENGTH],
    /// Ciphertext plus authentication tag
    pub ciphertext: Vec<u8>,
}

/// Generate a random 256-bit master key.
#[must_use]
pub fn generate_key() -> Zeroizing<[u8; KEY_LENGTH]> {
    let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
    rand::rngs::OsRng.fill_bytes(&mut *key);
    key
}

/// Generate a random salt for passcode key derivation.
#[must_use]
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    let mut salt = [0u8; SALT_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive a 256-bit wrapping key from a custom passcode using Argon2id.
pub fn derive_passcode_key(passcode: &str, salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LENGTH]>> {
    if salt.len() != SALT_LENGTH {
        return Err(VaultError::KeyDerivation(format!(
            "invalid salt length: expected {SALT_LENGTH} bytes, got {}",
            salt.len()
        )));
    }

    let params = ParamsBuilder::new()
        .m_cost(MEMORY_COST_KB)
        .t_cost(TIME_COST)
        .p_cost(PARALLELISM)
        .output_len(KEY_LENGTH)
        .build()
        .map_err(|e| VaultError::KeyDerivation(format!("invalid Argon2 parameters: {e}")))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_LENGTH]);
    argon2
        .hash_password_into(passcode.as_bytes(), salt, &mut *key)
        .map_err(|e| VaultError::KeyDerivation(format!("derivation failed: {e}")))?;

    Ok(key)
}

/// Seal plaintext bytes under the given key with a fresh nonce.
pub fn seal(plaintext: &[u8], key: &[u8; KEY_LENGTH]) -> Result<SealedBlob> {
    let nonce_bytes = ChaCha20Poly1305::generate_nonce(&mut OsRng);
    let nonce: [u8; NONCE_LENGTH] = nonce_bytes
        .as_slice()
        .try_into()
        .map_err(|_| VaultError::Encryption("nonce length mismatch".to_string()))?;

    let cipher = ChaCha20Poly1305::new(key.into());
    let ciphertext = cipher
        .encrypt(&nonce_bytes, plaintext)
        .map_err(|e| VaultError::Encryption(format!("seal failed: {e}")))?;

    Ok(SealedBlob { nonce, ciphertext })
}

/// Open a sealed blob with the given key.
///
/// Fails with `VaultError::Decryption` if the key is wrong or the blob has
/// been tampered with.
pub fn unseal(blob: &SealedBlob, key: &[u8; KEY_LENGTH]) -> Result<Zeroizing<Vec<u8>>> {
    let cipher = ChaCha20Poly1305::new(key.into());
    let nonce = Nonce::from_slice(&blob.nonce);
    let plaintext = cipher
        .decrypt(nonce, blob.ciphertext.as_ref())
        .map_err(|e| VaultError::Decryption(format!("unseal failed: {e}")))?;
    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_unseal_roundtrip() {
        let key = generate_key();
        let blob = seal(b"session tokens", &key).expect("seal");
        let opened = unseal(&blob, &key).expect("unseal");
        assert_eq!(&*opened, b"session tokens");
    }

    #[test]
    fn test_fresh_nonce_per_seal() {
        let key = generate_key();
        let a = seal(b"same", &key).expect("seal a");
        let b = seal(b"same", &key).expect("seal b");
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.ciphertext, b.ciphertext);
    }

    #[test]
    fn test_wrong_key_fails() {
        let key = generate_key();
        let other = generate_key();
        let blob = seal(b"secret", &key).expect("seal");

        let result = unseal(&blob, &other);
        assert!(matches!(result, Err(VaultError::Decryption(_))));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let key = generate_key();
        let mut blob = seal(b"secret", &key).expect("seal");
        if let Some(byte) = blob.ciphertext.first_mut() {
            *byte ^= 0xFF;
        }

        let result = unseal(&blob, &key);
        assert!(matches!(result, Err(VaultError::Decryption(_))));
    }

    #[test]
    fn test_passcode_key_is_deterministic() {
        let salt = generate_salt();
        let a = derive_passcode_key("4242", &salt).expect("derive a");
        let b = derive_passcode_key("4242", &salt).expect("derive b");
        assert_eq!(*a, *b);
    }

    #[test]
    fn test_passcode_key_varies_with_passcode_and_salt() {
        let salt = generate_salt();
        let a = derive_passcode_key("4242", &salt).expect("derive a");
        let b = derive_passcode_key("4243", &salt).expect("derive b");
        assert_ne!(*a, *b);

        let other_salt = generate_salt();
        let c = derive_passcode_key("4242", &other_salt).expect("derive c");
        assert_ne!(*a, *c);
    }

    #[test]
    fn test_invalid_salt_length() {
        let result = derive_passcode_key("4242", &[0u8; 4]);
        assert!(matches!(result, Err(VaultError::KeyDerivation(_))));
    }

    #[test]
    fn test_sealed_blob_serialization() {
        let key = generate_key();
        let blob = seal(b"payload", &key).expect("seal");

        let json = serde_json::to_string(&blob).expect("serialize");
        let parsed: SealedBlob = serde_json::from_str(&json).expect("deserialize");

        let opened = unseal(&parsed, &key).expect("unseal");
        assert_eq!(&*opened, b"payload");
    }
}
