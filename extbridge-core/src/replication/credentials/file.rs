//! File-backed credential store with optional encryption at rest
//!
//! One file per profile identity, named `cred-<hex(identity)>.bin`.
//!
//! Encrypted file format:
//! ```text
//! [Magic: 8 bytes "EBCS0001"]
//! [Version: 1 byte]
//! [Salt: 16 bytes]
//! [Nonce: 12 bytes]
//! [Ciphertext + AEAD tag: variable]
//! ```
//! Without a passphrase the payload follows an `EBCS_RAW` + version header.

use super::{CredentialStore, CredentialStoreError};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{Argon2, Params};
use rand::RngCore;
use std::fs;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

const MAGIC_HEADER: &[u8; 8] = b"EBCS0001";
const RAW_HEADER: &[u8; 8] = b"EBCS_RAW";
const FORMAT_VERSION: u8 = 1;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// magic(8) + version(1) + salt(16) + nonce(12)
const HEADER_SIZE: usize = 8 + 1 + SALT_LEN + NONCE_LEN;

const FILE_PREFIX: &str = "cred-";
const FILE_SUFFIX: &str = ".bin";

pub struct FileCredentialStore {
    base_path: PathBuf,
    passphrase: Option<Zeroizing<String>>,
}

impl FileCredentialStore {
    /// Open (or create) a credential directory
    pub fn new(base_path: PathBuf, passphrase: Option<&str>) -> Result<Self, CredentialStoreError> {
        fs::create_dir_all(&base_path)?;

        Ok(Self {
            base_path,
            passphrase: passphrase.map(|p| Zeroizing::new(p.to_string())),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn secret_path(&self, profile_id: &str) -> PathBuf {
        self.base_path
            .join(format!("{}{}{}", FILE_PREFIX, hex::encode(profile_id), FILE_SUFFIX))
    }

    fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, CredentialStoreError> {
        let Some(passphrase) = &self.passphrase else {
            let mut result = Vec::with_capacity(9 + data.len());
            result.extend_from_slice(RAW_HEADER);
            result.push(FORMAT_VERSION);
            result.extend_from_slice(data);
            return Ok(result);
        };

        let mut salt = [0u8; SALT_LEN];
        rand::rng().fill_bytes(&mut salt);
        let key = derive_key(passphrase, &salt)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let cipher = Aes256Gcm::new_from_slice(key.as_slice())
            .map_err(|e| CredentialStoreError::Encryption(format!("Invalid key: {}", e)))?;
        let ciphertext = cipher
            .encrypt(nonce, data)
            .map_err(|e| CredentialStoreError::Encryption(format!("Encryption failed: {}", e)))?;

        let mut result = Vec::with_capacity(HEADER_SIZE + ciphertext.len());
        result.extend_from_slice(MAGIC_HEADER);
        result.push(FORMAT_VERSION);
        result.extend_from_slice(&salt);
        result.extend_from_slice(&nonce_bytes);
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    fn decrypt(&self, data: &[u8]) -> Result<Zeroizing<Vec<u8>>, CredentialStoreError> {
        if data.len() < 9 {
            return Err(CredentialStoreError::Decryption("File too short".to_string()));
        }

        if &data[0..8] == RAW_HEADER {
            if self.passphrase.is_some() {
                return Err(CredentialStoreError::Decryption(
                    "Encrypted credential expected, found unencrypted".to_string(),
                ));
            }
            return Ok(Zeroizing::new(data[9..].to_vec()));
        }

        if &data[0..8] != MAGIC_HEADER {
            return Err(CredentialStoreError::Decryption("Invalid magic header".to_string()));
        }

        let version = data[8];
        if version != FORMAT_VERSION {
            return Err(CredentialStoreError::Decryption(format!(
                "Unsupported version: {}",
                version
            )));
        }

        if data.len() < HEADER_SIZE + TAG_LEN {
            return Err(CredentialStoreError::Decryption("Truncated file".to_string()));
        }

        let Some(passphrase) = &self.passphrase else {
            return Err(CredentialStoreError::Decryption(
                "Passphrase required to decrypt".to_string(),
            ));
        };

        let salt = &data[9..9 + SALT_LEN];
        let nonce = Nonce::from_slice(&data[9 + SALT_LEN..HEADER_SIZE]);
        let key = derive_key(passphrase, salt)?;

        let cipher = Aes256Gcm::new_from_slice(key.as_slice())
            .map_err(|e| CredentialStoreError::Decryption(format!("Invalid key: {}", e)))?;

        // Tag mismatch means a wrong passphrase or a tampered file.
        let plaintext = cipher
            .decrypt(nonce, &data[HEADER_SIZE..])
            .map_err(|_| CredentialStoreError::InvalidPassphrase)?;

        Ok(Zeroizing::new(plaintext))
    }

    fn write_atomic(&self, path: &Path, data: &[u8]) -> Result<(), CredentialStoreError> {
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, data)?;
        fs::rename(temp_path, path)?;
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn save_secret(&self, profile_id: &str, secret: &str) -> Result<(), CredentialStoreError> {
        let encrypted = self.encrypt(secret.as_bytes())?;
        self.write_atomic(&self.secret_path(profile_id), &encrypted)
    }

    fn load_secret(&self, profile_id: &str) -> Result<Zeroizing<String>, CredentialStoreError> {
        let path = self.secret_path(profile_id);
        if !path.exists() {
            return Err(CredentialStoreError::NotFound(profile_id.to_string()));
        }

        let plaintext = self.decrypt(&fs::read(&path)?)?;
        let secret = std::str::from_utf8(&plaintext)
            .map_err(|e| CredentialStoreError::Decryption(format!("Secret is not UTF-8: {}", e)))?;
        Ok(Zeroizing::new(secret.to_string()))
    }

    fn delete_secret(&self, profile_id: &str) -> Result<(), CredentialStoreError> {
        match fs::remove_file(self.secret_path(profile_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn list_profile_ids(&self) -> Result<Vec<String>, CredentialStoreError> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(&self.base_path)? {
            let filename = entry?.file_name();
            let filename = filename.to_string_lossy();

            let Some(encoded) = filename
                .strip_prefix(FILE_PREFIX)
                .and_then(|s| s.strip_suffix(FILE_SUFFIX))
            else {
                continue;
            };

            if let Some(id) = hex::decode(encoded).ok().and_then(|b| String::from_utf8(b).ok()) {
                ids.push(id);
            }
        }

        Ok(ids)
    }
}

/// Derive a 256-bit key from the passphrase with Argon2id
fn derive_key(passphrase: &str, salt: &[u8]) -> Result<Zeroizing<[u8; 32]>, CredentialStoreError> {
    let params = Params::new(
        19 * 1024, // 19 MiB memory cost
        2,         // iterations
        1,         // lanes
        Some(32),
    )
    .map_err(|e| CredentialStoreError::Encryption(format!("Invalid Argon2 params: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; 32]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut key[..])
        .map_err(|e| CredentialStoreError::Encryption(format!("Key derivation failed: {}", e)))?;

    Ok(key)
}
