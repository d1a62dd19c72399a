//! Ed25519 key material for certificate signing and verification

use crate::{CoreError, Result};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ed25519 key pair held by an issuing authority
#[derive(Clone)]
pub struct KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generate a new Ed25519 key pair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();

        KeyPair {
            signing_key,
            verifying_key,
        }
    }

    /// Create a key pair from signing key bytes
    pub fn from_signing_key_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let signing_key = SigningKey::from_bytes(bytes);
        let verifying_key = signing_key.verifying_key();

        Ok(KeyPair {
            signing_key,
            verifying_key,
        })
    }

    /// Get the public half of this key pair
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: self.verifying_key,
        }
    }

    /// Sign data with this key pair
    pub fn sign(&self, data: &[u8]) -> Signature {
        self.signing_key.sign(data)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Public key carried on a certificate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    verifying_key: VerifyingKey,
}

impl PublicKey {
    /// Create from public key bytes
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let verifying_key = VerifyingKey::from_bytes(bytes)
            .map_err(|e| CoreError::InvalidPublicKey(e.to_string()))?;

        Ok(PublicKey { verifying_key })
    }

    /// Get public key bytes
    pub fn to_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Hex rendering of the key bytes, used in canonical encodings
    pub fn to_hex(&self) -> String {
        hex::encode(self.verifying_key.to_bytes())
    }

    /// Verify a signature against data
    pub fn verify(&self, data: &[u8], signature: &Signature) -> Result<()> {
        self.verifying_key
            .verify(data, signature)
            .map_err(|e| CoreError::InvalidSignatureEncoding(e.to_string()))
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<PublicKey, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let encoded: String = Deserialize::deserialize(deserializer)?;
        let bytes = hex::decode(&encoded)
            .ok_or_else(|| serde::de::Error::custom("invalid public key hex"))?;
        if bytes.len() != 32 {
            return Err(serde::de::Error::custom("invalid public key length"));
        }

        let mut key_bytes = [0u8; 32];
        key_bytes.copy_from_slice(&bytes);

        PublicKey::from_bytes(&key_bytes)
            .map_err(|e| serde::de::Error::custom(format!("invalid public key: {}", e)))
    }
}

mod hex {
    use std::fmt::Write;

    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().fold(String::new(), |mut output, b| {
            let _ = write!(output, "{:02x}", b);
            output
        })
    }

    /// Decode untrusted hex input; odd lengths and non-hex bytes are `None`
    pub fn decode(s: &str) -> Option<Vec<u8>> {
        if s.len() % 2 != 0 || !s.is_ascii() {
            return None;
        }
        s.as_bytes()
            .chunks(2)
            .map(|pair| {
                if !pair.iter().all(u8::is_ascii_hexdigit) {
                    return None;
                }
                let chunk = std::str::from_utf8(pair).ok()?;
                u8::from_str_radix(chunk, 16).ok()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let keypair = KeyPair::generate();
        let data = b"credential payload";
        let signature = keypair.sign(data);

        let public_key = keypair.public_key();
        assert!(public_key.verify(data, &signature).is_ok());

        // A signature over different content must not verify
        let other = keypair.sign(b"different payload");
        assert!(public_key.verify(data, &other).is_err());
    }

    #[test]
    fn test_public_key_round_trip() {
        let keypair = KeyPair::generate();
        let public_key = keypair.public_key();

        let reconstructed = PublicKey::from_bytes(&public_key.to_bytes()).unwrap();
        assert_eq!(public_key, reconstructed);
    }

    #[test]
    fn test_deserialize_rejects_hostile_hex_without_panicking() {
        // Malformed key material from a host must surface as a serde error
        for input in ["\"abc\"", "\"zz\"", "\"+1ab\"", "\"\\u00e9f\"", "\"deadbeef\"", "\"\""] {
            assert!(serde_json::from_str::<PublicKey>(input).is_err());
        }

        let keypair = KeyPair::generate();
        let json = serde_json::to_string(&keypair.public_key()).unwrap();
        let parsed: PublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, keypair.public_key());
    }

    #[test]
    fn test_keypair_from_bytes_is_deterministic() {
        let keypair = KeyPair::generate();
        let bytes = keypair.signing_key.to_bytes();

        let reconstructed = KeyPair::from_signing_key_bytes(&bytes).unwrap();
        let data = b"stable message";
        assert_eq!(keypair.sign(data), reconstructed.sign(data));
    }
}
