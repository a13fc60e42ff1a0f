//! Deterministic content fingerprints
//!
//! A fingerprint is a SHA256 digest over an ordered sequence of inputs.
//! Same inputs in the same order always produce the same fingerprint, in
//! this process or any other. Every input is framed with a type tag and a
//! length prefix before hashing, so `["ab", "c"]` and `["a", "bc"]` can
//! never collide.

use crate::error::{DroverError, DroverResult};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::PathBuf;

const LITERAL_TAG: u8 = 0x01;
const FILE_TAG: u8 = 0x02;

/// A single fingerprint input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FingerprintInput {
    /// Raw bytes: source text, argument values, version strings
    Literal(Vec<u8>),
    /// A file reference; both the path and the file contents are hashed
    File(PathBuf),
}

impl FingerprintInput {
    /// Literal input from anything byte-representable
    pub fn literal(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Literal(bytes.into())
    }

    /// File input; the file is read when the fingerprint is computed
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }
}

/// An opaque, fixed-length content identifier used as a cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Compute the fingerprint of an ordered input sequence.
    ///
    /// Pure apart from reading declared file inputs. An unreadable file is
    /// an error, never an empty input: a fingerprint must not look stable
    /// while its inputs are missing.
    pub fn compute(inputs: &[FingerprintInput]) -> DroverResult<Self> {
        let mut hasher = Sha256::new();

        for input in inputs {
            match input {
                FingerprintInput::Literal(bytes) => {
                    hasher.update([LITERAL_TAG]);
                    frame(&mut hasher, bytes);
                }
                FingerprintInput::File(path) => {
                    let contents = fs::read(path).map_err(|e| DroverError::InputUnavailable {
                        path: path.clone(),
                        source: e,
                    })?;
                    hasher.update([FILE_TAG]);
                    frame(&mut hasher, path.to_string_lossy().as_bytes());
                    frame(&mut hasher, &contents);
                }
            }
        }

        Ok(Self(hasher.finalize().into()))
    }

    /// Full lowercase hex form, used for on-disk entry and artifact names
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 12 hex characters, for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }

    /// Parse a full 64-character hex form back into a fingerprint
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(arr))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Length-prefixed framing: u64 big-endian byte count, then the bytes
pub(crate) fn frame(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}
