//! Key management and transaction signing.
//!
//! # Security
//! - Seed material is loaded ONLY from the environment
//! - Keys are never logged or serialized
//! - Malformed seeds fail at construction, never at sign time

use base64::{engine::general_purpose::STANDARD, Engine as _};
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};

use crate::blockchain::types::{ChainError, ChainResult, ED25519_FLAG};

/// Environment variable holding the signer seed.
pub const SIGNER_SEED_ENV_VAR: &str = "WAGER_SIGNER_SEED";

type Blake2b256 = Blake2b<U32>;

const SEED_LEN: usize = 32;
const SIGNATURE_LEN: usize = 64;
const PUBLIC_KEY_LEN: usize = 32;

/// Sui signature envelope: `flag || signature || public key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope(Vec<u8>);

impl SignedEnvelope {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Base64 form expected by `sui_executeTransactionBlock`.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }

    pub fn flag(&self) -> u8 {
        self.0[0]
    }

    fn signature_bytes(&self) -> &[u8] {
        &self.0[1..1 + SIGNATURE_LEN]
    }

    fn public_key_bytes(&self) -> &[u8] {
        &self.0[1 + SIGNATURE_LEN..]
    }
}

/// Ed25519 signer for Sui transactions.
#[derive(Clone)]
pub struct Signer {
    key: SigningKey,
    address: String,
}

impl Signer {
    /// Create a signer from seed material.
    ///
    /// Accepts hex (with or without `0x`) or standard base64. A 33-byte
    /// value whose first byte is the Ed25519 flag has the flag stripped.
    pub fn from_seed(material: &str) -> ChainResult<Self> {
        let raw = decode_seed(material.trim())?;
        let seed: [u8; SEED_LEN] = match raw.len() {
            SEED_LEN => raw.as_slice().try_into().map_err(|_| seed_length_error(raw.len()))?,
            n if n == SEED_LEN + 1 && raw[0] == ED25519_FLAG => {
                (&raw[1..]).try_into().map_err(|_| seed_length_error(raw.len()))?
            }
            n => return Err(seed_length_error(n)),
        };

        let key = SigningKey::from_bytes(&seed);
        let address = derive_address(&key.verifying_key());

        tracing::info!(address = %address, "Signer initialized");

        Ok(Self { key, address })
    }

    /// Load the signer from `WAGER_SIGNER_SEED`.
    pub fn from_env() -> ChainResult<Self> {
        let seed = std::env::var(SIGNER_SEED_ENV_VAR).map_err(|_| {
            ChainError::Wallet(format!("Environment variable {} not set", SIGNER_SEED_ENV_VAR))
        })?;
        Self::from_seed(&seed)
    }

    /// The signer's Sui address.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn public_key(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.key.verifying_key().to_bytes()
    }

    /// Sign `bytes` and wrap the result in the Sui envelope.
    pub fn sign(&self, bytes: &[u8]) -> SignedEnvelope {
        let signature = self.key.sign(bytes);
        let mut envelope = Vec::with_capacity(1 + SIGNATURE_LEN + PUBLIC_KEY_LEN);
        envelope.push(ED25519_FLAG);
        envelope.extend_from_slice(&signature.to_bytes());
        envelope.extend_from_slice(&self.public_key());
        SignedEnvelope(envelope)
    }

    /// Check that `envelope` was produced by this signer over exactly `bytes`.
    pub fn verify(&self, bytes: &[u8], envelope: &SignedEnvelope) -> bool {
        if envelope.as_bytes().len() != 1 + SIGNATURE_LEN + PUBLIC_KEY_LEN
            || envelope.flag() != ED25519_FLAG
            || envelope.public_key_bytes() != self.public_key()
        {
            return false;
        }
        let Ok(signature) = Signature::from_slice(envelope.signature_bytes()) else {
            return false;
        };
        self.key.verifying_key().verify(bytes, &signature).is_ok()
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer").field("address", &self.address).finish()
    }
}

fn seed_length_error(len: usize) -> ChainError {
    ChainError::Wallet(format!(
        "seed must be {} bytes (optionally prefixed by the scheme flag), got {}",
        SEED_LEN, len
    ))
}

fn decode_seed(material: &str) -> ChainResult<Vec<u8>> {
    if material.is_empty() {
        return Err(ChainError::Wallet("seed is empty".into()));
    }
    let hex_part = material.strip_prefix("0x").unwrap_or(material);
    if hex_part.len() % 2 == 0 && hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return hex::decode(hex_part).map_err(|e| ChainError::Wallet(format!("Invalid hex seed: {}", e)));
    }
    STANDARD
        .decode(material)
        .map_err(|e| ChainError::Wallet(format!("Seed is neither hex nor base64: {}", e)))
}

/// `0x` + hex(blake2b-256(flag || public key)).
fn derive_address(public_key: &VerifyingKey) -> String {
    let mut hasher = Blake2b256::new();
    hasher.update([ED25519_FLAG]);
    hasher.update(public_key.as_bytes());
    format!("0x{}", hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SEED_HEX: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";

    #[test]
    fn test_signer_from_hex_seed() {
        let signer = Signer::from_seed(TEST_SEED_HEX).unwrap();
        assert!(signer.address().starts_with("0x"));
        assert_eq!(signer.address().len(), 66);
        assert_eq!(
            hex::encode(signer.public_key()),
            "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a"
        );
    }

    #[test]
    fn test_signer_with_0x_prefix() {
        let plain = Signer::from_seed(TEST_SEED_HEX).unwrap();
        let prefixed = Signer::from_seed(&format!("0x{}", TEST_SEED_HEX)).unwrap();
        assert_eq!(plain.address(), prefixed.address());
    }

    #[test]
    fn test_signer_from_base64_with_flag() {
        let mut raw = vec![ED25519_FLAG];
        raw.extend(hex::decode(TEST_SEED_HEX).unwrap());
        let flagged = Signer::from_seed(&STANDARD.encode(&raw)).unwrap();
        let plain = Signer::from_seed(TEST_SEED_HEX).unwrap();
        assert_eq!(flagged.address(), plain.address());
    }

    #[test]
    fn test_invalid_seed_length() {
        let err = Signer::from_seed("abcd").unwrap_err();
        assert!(err.to_string().contains("seed must be 32 bytes"));
        assert!(Signer::from_seed("").is_err());
        assert!(Signer::from_seed("not-a-seed!!").is_err());
    }

    #[test]
    fn test_envelope_layout_and_determinism() {
        let signer = Signer::from_seed(TEST_SEED_HEX).unwrap();
        let first = signer.sign(b"tx bytes");
        let second = signer.sign(b"tx bytes");
        assert_eq!(first, second);
        assert_eq!(first.as_bytes().len(), 97);
        assert_eq!(first.flag(), ED25519_FLAG);
        assert_eq!(&first.as_bytes()[65..], &signer.public_key());
    }

    #[test]
    fn test_envelope_verifies_only_original_bytes() {
        let signer = Signer::from_seed(TEST_SEED_HEX).unwrap();
        let envelope = signer.sign(b"tx bytes");
        assert!(signer.verify(b"tx bytes", &envelope));
        assert!(!signer.verify(b"tx bytez", &envelope));
    }

    #[test]
    fn test_debug_hides_key() {
        let signer = Signer::from_seed(TEST_SEED_HEX).unwrap();
        let shown = format!("{:?}", signer);
        assert!(!shown.contains(TEST_SEED_HEX));
        assert!(shown.contains(signer.address()));
    }
}
