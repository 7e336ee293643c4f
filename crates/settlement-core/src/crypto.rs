use sha2::Digest;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

const HASH_BYTE_COUNT: usize = 32;
const PUBLIC_KEY_BYTE_COUNT: usize = 32;
const SIGNATURE_BYTE_COUNT: usize = 64;

/// Error raised when an opaque byte value cannot be parsed from hex.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("expected {expected} bytes but got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], ParseError> {
    let bytes = hex::decode(s.trim()).map_err(|e| ParseError::InvalidHex(e.to_string()))?;
    let actual = bytes.len();
    bytes.try_into().map_err(|_| ParseError::InvalidLength {
        expected: N,
        actual,
    })
}

/// SHA-256 digest used as transaction identity.
#[derive(Copy, Clone, Hash, Ord, PartialOrd, Eq, PartialEq)]
pub struct Hash([u8; HASH_BYTE_COUNT]);

impl Hash {
    pub const fn from_bytes(bytes: [u8; HASH_BYTE_COUNT]) -> Self {
        Self(bytes)
    }

    pub fn digest(data: &[u8]) -> Self {
        let mut output = [0; HASH_BYTE_COUNT];
        output.copy_from_slice(&sha2::Sha256::digest(data));
        Self(output)
    }

    pub const fn as_bytes(&self) -> &[u8; HASH_BYTE_COUNT] {
        &self.0
    }
}

/// Owner key of an output. Never interpreted beyond its bytes.
#[derive(Copy, Clone, Hash, Eq, PartialEq)]
pub struct PublicKey([u8; PUBLIC_KEY_BYTE_COUNT]);

impl PublicKey {
    pub const fn from_bytes(bytes: [u8; PUBLIC_KEY_BYTE_COUNT]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; PUBLIC_KEY_BYTE_COUNT] {
        &self.0
    }
}

#[derive(Copy, Clone, Hash, Eq, PartialEq)]
pub struct Signature([u8; SIGNATURE_BYTE_COUNT]);

impl Signature {
    pub const fn from_bytes(bytes: [u8; SIGNATURE_BYTE_COUNT]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; SIGNATURE_BYTE_COUNT] {
        &self.0
    }
}

macro_rules! hex_display {
    ($($ty:ident),*) => {
        $(
            impl Display for $ty {
                fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", hex::encode(self.0))
                }
            }

            impl Debug for $ty {
                fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}({})", stringify!($ty), hex::encode(self.0))
                }
            }

            impl FromStr for $ty {
                type Err = ParseError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    decode_fixed(s).map(Self)
                }
            }
        )*
    };
}

hex_display!(Hash, PublicKey, Signature);

/// Checks that `signature` authenticates `message` under `key`.
///
/// Implementations must be deterministic and free of side effects: the
/// validator may call them any number of times for the same input.
pub trait SignatureVerifier {
    fn verify(&self, key: &PublicKey, message: &[u8], signature: &Signature) -> bool;
}

impl<V: SignatureVerifier + ?Sized> SignatureVerifier for &V {
    fn verify(&self, key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
        (**self).verify(key, message, signature)
    }
}

/// Ed25519 signature verification.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify(&self, key: &PublicKey, message: &[u8], signature: &Signature) -> bool {
        use ed25519_dalek::Verifier;

        // Bytes that are not a curve point cannot own anything.
        let Ok(key) = ed25519_dalek::VerifyingKey::from_bytes(key.as_bytes()) else {
            return false;
        };
        let signature = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
        key.verify(message, &signature).is_ok()
    }
}
