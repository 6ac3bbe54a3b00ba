//! Crypto collaborator boundary (ç6). RSA recovery, 3DES/AES, hashing and
//! RNG are invoked through these traits rather than implemented here — the
//! teacher's `crypto::chain`/`crypto::ca_keys` modules did their own RSA
//! math inline; this generalization keeps the same CA-key-store shape but
//! moves verification itself behind a narrow interface, per ç1's explicit
//! exclusion of cryptographic primitives from this crate's scope.

use std::error::Error;
use std::fmt::Display;

use crypto_bigint::U2048;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum CryptoError {
    InvalidKeyMaterial(String),
    VerificationFailed(String),
    Unavailable,
}

impl Display for CryptoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CryptoError::InvalidKeyMaterial(msg) => write!(f, "invalid key material: {msg}"),
            CryptoError::VerificationFailed(msg) => write!(f, "verification failed: {msg}"),
            CryptoError::Unavailable => write!(f, "crypto collaborator unavailable"),
        }
    }
}

impl Error for CryptoError {}

/// A CA public key as looked up from the key store: big-endian modulus plus
/// exponent, matching the shape recovered RSA keys take throughout EMV Book 2.
#[derive(Debug, Clone)]
pub struct CaPublicKey {
    pub modulus: U2048,
    pub exponent: Vec<u8>,
}

/// `get(rid, index) -> Option<CaPublicKey>` (ç6). Keyed by the AID's RID
/// (first 5 bytes) and the card-supplied CA key index (tag 0x8F).
pub trait CaKeyStore {
    fn get(&self, rid: &[u8; 5], index: u8) -> Option<CaPublicKey>;
}

/// Outcome of offline data authentication for one method.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OdaMethod {
    Sda,
    Dda,
    Cda,
}

/// The narrow crypto interface a kernel calls into; never implemented in
/// this crate. `generate_random`/`hash` also live here since both SDA/DDA
/// dynamic data and the Unpredictable Number depend on them.
pub trait CryptoProvider {
    fn verify_sda(
        &self,
        ca_key: &CaPublicKey,
        issuer_cert: &[u8],
        ssad: &[u8],
    ) -> Result<(), CryptoError>;

    fn verify_dda(
        &self,
        ca_key: &CaPublicKey,
        icc_pk_cert: &[u8],
        dynamic_data: &[u8],
    ) -> Result<(), CryptoError>;

    fn verify_cda(
        &self,
        ca_key: &CaPublicKey,
        icc_pk_cert: &[u8],
        cryptogram_data: &[u8],
    ) -> Result<(), CryptoError>;

    fn encrypt_triple_des(&self, block: &[u8; 8], key: &[u8]) -> Result<[u8; 8], CryptoError>;

    fn encrypt_aes_ecb(&self, block: &[u8; 16], key: &[u8]) -> Result<[u8; 16], CryptoError>;

    fn generate_random(&self, n: usize) -> Vec<u8>;

    fn hash_sha(&self, algo: ShaAlgorithm, data: &[u8]) -> Vec<u8>;
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ShaAlgorithm {
    Sha1,
    Sha256,
}

/// `performCdcvm() -> {Success, Failed(reason), Unavailable}` (ç6). The
/// kernel suspends on this call exactly as it does on a transceive.
pub trait CdcvmProvider {
    fn perform_cdcvm(&mut self) -> CdcvmResult;
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum CdcvmResult {
    Success,
    Failed(String),
    Unavailable,
}
