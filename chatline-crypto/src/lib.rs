use std::fmt;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine as _;
use base64::prelude::BASE64_STANDARD;
use rand::RngCore as _;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// Length of a symmetric key in bytes.
pub const KEY_LEN: usize = 32;
/// Length of the AES-GCM nonce prepended to every envelope.
pub const NONCE_LEN: usize = 12;
/// Length of the AES-GCM authentication tag.
pub const TAG_LEN: usize = 16;

const CHAT_KEY_DOMAIN: &[u8] = b"chatline/chat-key/v1";

fn other_error(message: impl ToString) -> Error {
    Box::new(std::io::Error::other(message.to_string()))
}

/// Deployment-wide secret that conversation keys are derived from.
///
/// Every client of one deployment must hold the same secret to read each
/// other's messages. It is generated once and stored with the client
/// configuration, never embedded in code. Anyone holding it can read every
/// conversation of the deployment, so it only protects message text from
/// readers of the backing store. Real end-to-end confidentiality needs keys
/// negotiated per conversation between the two participants or managed
/// server-side.
///
/// # Examples
///
/// ```
/// use chatline_crypto::MasterSecret;
///
/// let secret = MasterSecret::generate();
/// let restored = MasterSecret::from_hex(&secret.to_hex()).unwrap();
///
/// let key = secret.chat_key("u1_u2");
/// let envelope = key.seal(b"hello").unwrap();
/// assert_eq!(restored.chat_key("u1_u2").open(&envelope).unwrap(), b"hello");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct MasterSecret {
    bytes: [u8; KEY_LEN],
}

impl MasterSecret {
    /// Generate a new random secret using the OS random number generator.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Parse a secret previously produced by [`MasterSecret::to_hex`].
    pub fn from_hex(encoded: &str) -> Result<Self, Error> {
        let decoded = hex::decode(encoded.trim())?;
        let bytes: [u8; KEY_LEN] = decoded
            .try_into()
            .map_err(|v: Vec<u8>| other_error(format!("expected {KEY_LEN} bytes, got {}", v.len())))?;
        Ok(Self { bytes })
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Derive the symmetric key of one conversation.
    ///
    /// The derivation is deterministic, so both directions of a conversation
    /// resolve to the same key as long as `context` is the same string.
    pub fn chat_key(&self, context: &str) -> ChatKey {
        let mut hasher = Sha256::new();
        hasher.update(CHAT_KEY_DOMAIN);
        hasher.update((self.bytes.len() as u32).to_be_bytes());
        hasher.update(self.bytes);
        hasher.update(context.as_bytes());
        let derived: [u8; KEY_LEN] = hasher.finalize().into();
        ChatKey::from_bytes(derived)
    }
}

impl fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterSecret(..)")
    }
}

/// Symmetric key sealing the text of a single conversation with AES-256-GCM.
///
/// Sealed payloads are text envelopes: base64 of `nonce || ciphertext || tag`.
///
/// # Examples
///
/// ```
/// use chatline_crypto::ChatKey;
///
/// let key = ChatKey::generate();
/// let envelope = key.seal(b"Hello, world!").unwrap();
/// assert_eq!(key.open(&envelope).unwrap(), b"Hello, world!");
///
/// // A different key cannot open the envelope
/// assert!(ChatKey::generate().open(&envelope).is_err());
/// ```
#[derive(Clone)]
pub struct ChatKey {
    cipher: Aes256Gcm,
}

impl ChatKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self::from_bytes(bytes)
    }

    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(&bytes);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Encrypt `plaintext` with a fresh random nonce and return the envelope.
    pub fn seal(&self, plaintext: impl AsRef<[u8]>) -> Result<String, Error> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        let ciphertext = self.seal_nonce(&nonce, plaintext.as_ref())?;
        let mut envelope = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        envelope.extend_from_slice(&nonce);
        envelope.extend_from_slice(&ciphertext);
        Ok(BASE64_STANDARD.encode(envelope))
    }

    /// Decrypt an envelope produced by [`ChatKey::seal`].
    ///
    /// Fails on malformed base64, truncated envelopes and on authentication
    /// failure, which is what a wrong key looks like.
    pub fn open(&self, envelope: &str) -> Result<Vec<u8>, Error> {
        let data = BASE64_STANDARD.decode(envelope.trim())?;
        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(other_error("envelope is too short"));
        }
        let (nonce, ciphertext) = data.split_at(NONCE_LEN);
        self.open_nonce(nonce, ciphertext)
    }

    pub fn seal_nonce(&self, nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, Error> {
        if nonce.len() != NONCE_LEN {
            return Err(other_error("invalid nonce length"));
        }
        let nonce = Nonce::from_slice(nonce);
        self.cipher.encrypt(nonce, plaintext).map_err(other_error)
    }

    pub fn open_nonce(&self, nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, Error> {
        if nonce.len() != NONCE_LEN {
            return Err(other_error("invalid nonce length"));
        }
        let nonce = Nonce::from_slice(nonce);
        self.cipher.decrypt(nonce, ciphertext).map_err(other_error)
    }
}

impl fmt::Debug for ChatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ChatKey(..)")
    }
}
