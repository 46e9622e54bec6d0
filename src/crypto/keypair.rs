//! X25519 identity and recipient keypairs
//!
//! Implements the asymmetric half of the secrets store: an environment's
//! private identity file and the derivable public recipient key, plus the
//! ECIES wrap/unwrap of per-file symmetric keys (X25519 ECDH, HKDF-SHA256,
//! AES-256-GCM).

use std::fs;
use std::path::Path;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use hkdf::Hkdf;
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};

use crate::crypto::aead::{VaultKey, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
use crate::error::{TallyError, TallyResult};

/// Size of an X25519 public key in bytes
const PUBLIC_KEY_SIZE: usize = 32;

/// HKDF context string binding derived keys to this wrap scheme
const WRAP_CONTEXT: &[u8] = b"tally-file-key-wrap";

/// A public recipient key, printable and shareable
#[derive(Clone, PartialEq, Eq)]
pub struct Recipient {
    public: PublicKey,
}

impl Recipient {
    /// Parse a recipient from its hex encoding
    pub fn from_hex(encoded: &str) -> TallyResult<Self> {
        let bytes = hex::decode(encoded.trim())
            .map_err(|e| TallyError::Encryption(format!("Invalid public key encoding: {}", e)))?;
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(TallyError::Encryption(format!(
                "Invalid public key size: expected {}, got {}",
                PUBLIC_KEY_SIZE,
                bytes.len()
            )));
        }
        let mut key = [0u8; PUBLIC_KEY_SIZE];
        key.copy_from_slice(&bytes);
        Ok(Self {
            public: PublicKey::from(key),
        })
    }

    /// Encode the recipient as hex
    pub fn to_hex(&self) -> String {
        hex::encode(self.public.as_bytes())
    }
}

impl std::fmt::Display for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::fmt::Debug for Recipient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Recipient").field(&self.to_hex()).finish()
    }
}

/// A private identity, kept outside version control
///
/// The public recipient key is always derivable from the identity.
pub struct Identity {
    secret: StaticSecret,
}

impl Identity {
    /// Generate a fresh identity from the system's secure random source
    pub fn generate() -> Self {
        Self {
            secret: StaticSecret::random_from_rng(OsRng),
        }
    }

    /// Derive the public recipient key
    pub fn recipient(&self) -> Recipient {
        Recipient {
            public: PublicKey::from(&self.secret),
        }
    }

    /// Load an identity from a key file
    ///
    /// The file holds the hex-encoded secret on the last non-comment line;
    /// a missing file is a configuration error naming the configured path.
    pub fn load(path: &Path) -> TallyResult<Self> {
        if !path.exists() {
            return Err(TallyError::Config(format!(
                "Identity file not found: {}",
                path.display()
            )));
        }
        let contents = fs::read_to_string(path).map_err(|e| {
            TallyError::Io(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&contents).map_err(|e| {
            TallyError::Config(format!("Invalid identity file {}: {}", path.display(), e))
        })
    }

    /// Parse an identity from key-file contents
    fn parse(contents: &str) -> Result<Self, String> {
        let line = contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .next_back()
            .ok_or_else(|| "no key material found".to_string())?;

        let bytes = hex::decode(line).map_err(|e| format!("bad hex: {}", e))?;
        if bytes.len() != KEY_SIZE {
            return Err(format!(
                "expected {} key bytes, got {}",
                KEY_SIZE,
                bytes.len()
            ));
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&bytes);
        Ok(Self {
            secret: StaticSecret::from(key),
        })
    }

    /// Write the identity to a key file with owner-only permissions
    ///
    /// The header comment carries the derived public key so operators can
    /// read it without a tool invocation.
    pub fn save(&self, path: &Path) -> TallyResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                TallyError::Io(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let contents = format!(
            "# tally identity file\n# public key: {}\n{}\n",
            self.recipient().to_hex(),
            hex::encode(self.secret.to_bytes())
        );

        fs::write(path, contents)
            .map_err(|e| TallyError::Io(format!("Failed to write {}: {}", path.display(), e)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| {
                TallyError::Io(format!(
                    "Failed to set permissions on {}: {}",
                    path.display(),
                    e
                ))
            })?;
        }

        Ok(())
    }
}

// Never print secret material in Debug output
impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("public_key", &self.recipient().to_hex())
            .finish_non_exhaustive()
    }
}

/// Wrap a file key to a recipient (X25519 ECDH + HKDF-SHA256 + AES-256-GCM)
///
/// Returns a base64 string laid out as `ephemeral_public || nonce ||
/// ciphertext+tag`. A fresh ephemeral keypair is used per wrap.
pub fn wrap_file_key(file_key: &VaultKey, recipient: &Recipient) -> TallyResult<String> {
    let ephemeral_secret = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = PublicKey::from(&ephemeral_secret);

    let shared_secret = ephemeral_secret.diffie_hellman(&recipient.public);

    let hk = Hkdf::<Sha256>::new(None, shared_secret.as_bytes());
    let mut derived_key = [0u8; KEY_SIZE];
    hk.expand(WRAP_CONTEXT, &mut derived_key)
        .map_err(|e| TallyError::Encryption(format!("Key derivation failed: {}", e)))?;

    let cipher = Aes256Gcm::new_from_slice(&derived_key)
        .map_err(|e| TallyError::Encryption(format!("Failed to create cipher: {}", e)))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, file_key.as_bytes().as_ref())
        .map_err(|e| TallyError::Encryption(format!("Key wrap failed: {}", e)))?;

    let mut packed = Vec::with_capacity(PUBLIC_KEY_SIZE + NONCE_SIZE + ciphertext.len());
    packed.extend_from_slice(ephemeral_public.as_bytes());
    packed.extend_from_slice(&nonce_bytes);
    packed.extend_from_slice(&ciphertext);

    Ok(STANDARD.encode(packed))
}

/// Unwrap a file key with a private identity
///
/// Fails with an `Authentication` error when the wrapped key was not
/// produced for this identity or has been corrupted.
pub fn unwrap_file_key(wrapped: &str, identity: &Identity) -> TallyResult<VaultKey> {
    let packed = STANDARD
        .decode(wrapped.trim())
        .map_err(|_| TallyError::Authentication("invalid wrapped-key encoding".to_string()))?;

    if packed.len() < PUBLIC_KEY_SIZE + NONCE_SIZE + TAG_SIZE {
        return Err(TallyError::Authentication(
            "wrapped key too short".to_string(),
        ));
    }

    let mut ephemeral_bytes = [0u8; PUBLIC_KEY_SIZE];
    ephemeral_bytes.copy_from_slice(&packed[..PUBLIC_KEY_SIZE]);
    let ephemeral_public = PublicKey::from(ephemeral_bytes);
    let nonce = Nonce::from_slice(&packed[PUBLIC_KEY_SIZE..PUBLIC_KEY_SIZE + NONCE_SIZE]);
    let ciphertext = &packed[PUBLIC_KEY_SIZE + NONCE_SIZE..];

    let shared_secret = identity.secret.diffie_hellman(&ephemeral_public);

    let hk = Hkdf::<Sha256>::new(None, shared_secret.as_bytes());
    let mut derived_key = [0u8; KEY_SIZE];
    hk.expand(WRAP_CONTEXT, &mut derived_key)
        .map_err(|e| TallyError::Encryption(format!("Key derivation failed: {}", e)))?;

    let cipher = Aes256Gcm::new_from_slice(&derived_key)
        .map_err(|e| TallyError::Encryption(format!("Failed to create cipher: {}", e)))?;

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| TallyError::Authentication("invalid identity or corrupted data".to_string()))?;

    VaultKey::from_bytes(&plaintext)
}
