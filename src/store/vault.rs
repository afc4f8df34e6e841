// ABOUTME: age-based sealing of credentials stored on disk.
// ABOUTME: Loads or creates an X25519 identity file with owner-only permissions.

use age::secrecy::ExposeSecret;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::Secret;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("failed to access identity file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("identity file {path} has insecure permissions {mode:o} (expected 600)")]
    InsecurePermissions { path: PathBuf, mode: u32 },

    #[error("invalid identity in {path}: {message}")]
    InvalidIdentity { path: PathBuf, message: String },

    #[error("encryption failed: {0}")]
    Encrypt(String),

    #[error("decryption failed: {0}")]
    Decrypt(String),
}

/// Seals and opens secrets with a single age identity.
#[derive(Clone)]
pub struct Vault {
    identity: age::x25519::Identity,
    recipient: age::x25519::Recipient,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("recipient", &self.recipient.to_string())
            .finish()
    }
}

impl Vault {
    /// Vault with a fresh, unsaved identity.
    pub fn generate() -> Self {
        Self::from_identity(age::x25519::Identity::generate())
    }

    fn from_identity(identity: age::x25519::Identity) -> Self {
        let recipient = identity.to_public();
        Self {
            identity,
            recipient,
        }
    }

    /// Load the identity at `path`, creating it first if it does not exist.
    pub fn load_or_create(path: &Path) -> Result<Self, VaultError> {
        if !path.exists() {
            Self::create_identity(path)?;
            tracing::info!(path = %path.display(), "created secrets identity");
        }
        Self::load(path)
    }

    pub fn load(path: &Path) -> Result<Self, VaultError> {
        #[cfg(unix)]
        check_permissions(path)?;

        let contents = fs::read_to_string(path).map_err(|source| VaultError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let identity = contents
            .lines()
            .map(str::trim)
            .find(|line| !line.starts_with('#') && !line.is_empty())
            .ok_or_else(|| VaultError::InvalidIdentity {
                path: path.to_path_buf(),
                message: "file is empty".to_string(),
            })?
            .parse::<age::x25519::Identity>()
            .map_err(|e| VaultError::InvalidIdentity {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        Ok(Self::from_identity(identity))
    }

    fn create_identity(path: &Path) -> Result<(), VaultError> {
        let io_err = |source| VaultError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        #[cfg(unix)]
        let mut file = {
            use std::os::unix::fs::OpenOptionsExt;
            fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .mode(0o600)
                .open(path)
                .map_err(io_err)?
        };

        #[cfg(not(unix))]
        let mut file = fs::File::create(path).map_err(io_err)?;

        let identity = age::x25519::Identity::generate();
        writeln!(file, "# created: {}", Utc::now().format("%Y-%m-%d %H:%M:%S")).map_err(io_err)?;
        writeln!(file, "# public key: {}", identity.to_public()).map_err(io_err)?;
        writeln!(file, "{}", identity.to_string().expose_secret()).map_err(io_err)?;
        Ok(())
    }

    /// Encrypt to the vault's own recipient, base64 encoded for text storage.
    pub fn seal(&self, secret: &Secret) -> Result<String, VaultError> {
        let encryptor = age::Encryptor::with_recipients(vec![Box::new(self.recipient.clone())])
            .ok_or_else(|| VaultError::Encrypt("no recipients".to_string()))?;

        let mut encrypted = vec![];
        let mut writer = encryptor
            .wrap_output(&mut encrypted)
            .map_err(|e| VaultError::Encrypt(e.to_string()))?;
        writer
            .write_all(secret.expose().as_bytes())
            .map_err(|e| VaultError::Encrypt(e.to_string()))?;
        writer
            .finish()
            .map_err(|e| VaultError::Encrypt(e.to_string()))?;

        Ok(STANDARD.encode(encrypted))
    }

    pub fn open(&self, sealed: &str) -> Result<Secret, VaultError> {
        let ciphertext = STANDARD
            .decode(sealed.trim())
            .map_err(|e| VaultError::Decrypt(e.to_string()))?;

        let age::Decryptor::Recipients(decryptor) = age::Decryptor::new(&ciphertext[..])
            .map_err(|e| VaultError::Decrypt(e.to_string()))?
        else {
            return Err(VaultError::Decrypt(
                "passphrase-encrypted data is not supported".to_string(),
            ));
        };

        let identity: &dyn age::Identity = &self.identity;
        let mut reader = decryptor
            .decrypt(std::iter::once(identity))
            .map_err(|e| VaultError::Decrypt(e.to_string()))?;

        let mut plaintext = String::new();
        reader
            .read_to_string(&mut plaintext)
            .map_err(|e| VaultError::Decrypt(e.to_string()))?;
        Ok(Secret::new(plaintext))
    }
}

#[cfg(unix)]
fn check_permissions(path: &Path) -> Result<(), VaultError> {
    use std::os::unix::fs::MetadataExt;

    let metadata = fs::metadata(path).map_err(|source| VaultError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mode = metadata.mode() & 0o777;
    if mode & 0o077 != 0 {
        return Err(VaultError::InsecurePermissions {
            path: path.to_path_buf(),
            mode,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_then_open() {
        let vault = Vault::generate();
        let sealed = vault.seal(&Secret::new("hunter22")).unwrap();
        assert!(!sealed.contains("hunter22"));
        assert_eq!(vault.open(&sealed).unwrap().expose(), "hunter22");
    }

    #[test]
    fn sealing_is_randomized() {
        let vault = Vault::generate();
        let secret = Secret::new("same");
        assert_ne!(vault.seal(&secret).unwrap(), vault.seal(&secret).unwrap());
    }

    #[test]
    fn other_identity_cannot_open() {
        let sealed = Vault::generate().seal(&Secret::new("x")).unwrap();
        assert!(matches!(
            Vault::generate().open(&sealed),
            Err(VaultError::Decrypt(_))
        ));
    }

    #[test]
    fn identity_file_is_created_once_and_reused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys/identity.txt");

        let first = Vault::load_or_create(&path).unwrap();
        let sealed = first.seal(&Secret::new("persisted")).unwrap();

        let second = Vault::load_or_create(&path).unwrap();
        assert_eq!(second.open(&sealed).unwrap().expose(), "persisted");
    }

    #[cfg(unix)]
    #[test]
    fn rejects_world_readable_identity() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.txt");
        Vault::load_or_create(&path).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        assert!(matches!(
            Vault::load(&path),
            Err(VaultError::InsecurePermissions { mode: 0o644, .. })
        ));
    }
}
