//! Cipher suite registry.
//!
//! Maps a negotiated suite to its key geometry, AEAD confidentiality limit
//! and cipher constructors. Suites are chosen per encryption level at
//! runtime, so the concrete RustCrypto ciphers are dispatched through enums
//! rather than a compile-time provider parameter.

use crate::crypto::rustcrypto::{
    Aes128GcmAead, Aes256GcmAead, Aes256HeaderProtection, AesHeaderProtection,
    ChaCha20Poly1305Aead, ChaChaHeaderProtection,
};
use crate::crypto::{Aead, HeaderProtection};
use crate::error::Error;

/// AEAD authentication tag length; 16 for every QUIC v1 suite.
pub const TAG_LEN: usize = 16;

/// Hash function backing a suite's key schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashId {
    Sha256,
    Sha384,
}

impl HashId {
    /// Hash output length in bytes — also the traffic secret length.
    pub const fn output_len(self) -> usize {
        match self {
            HashId::Sha256 => 32,
            HashId::Sha384 => 48,
        }
    }
}

/// Supported packet protection suites (RFC 9001 §5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteId {
    Aes128Gcm,
    Aes256Gcm,
    ChaCha20Poly1305,
}

impl SuiteId {
    /// AEAD key length in bytes.
    pub const fn key_len(self) -> usize {
        match self {
            SuiteId::Aes128Gcm => 16,
            SuiteId::Aes256Gcm | SuiteId::ChaCha20Poly1305 => 32,
        }
    }

    /// AEAD IV length in bytes; 12 for every QUIC v1 suite.
    pub const fn iv_len(self) -> usize {
        12
    }

    /// Header protection key length in bytes.
    pub const fn hp_key_len(self) -> usize {
        match self {
            SuiteId::Aes128Gcm => 16,
            SuiteId::Aes256Gcm | SuiteId::ChaCha20Poly1305 => 32,
        }
    }

    /// AEAD authentication tag length in bytes.
    pub const fn tag_len(self) -> usize {
        TAG_LEN
    }

    /// Maximum number of packets that may be sealed under one set of keys
    /// (RFC 9001 §6.6 confidentiality limits).
    pub const fn max_pkts_per_epoch(self) -> u64 {
        match self {
            SuiteId::Aes128Gcm | SuiteId::Aes256Gcm => 1 << 23,
            SuiteId::ChaCha20Poly1305 => 1 << 62,
        }
    }

    /// Construct the payload AEAD for this suite.
    pub fn aead(self, key: &[u8]) -> Result<SuiteAead, Error> {
        Ok(match self {
            SuiteId::Aes128Gcm => SuiteAead::Aes128Gcm(Aes128GcmAead::new(key)?),
            SuiteId::Aes256Gcm => SuiteAead::Aes256Gcm(Aes256GcmAead::new(key)?),
            SuiteId::ChaCha20Poly1305 => {
                SuiteAead::ChaCha20Poly1305(ChaCha20Poly1305Aead::new(key)?)
            }
        })
    }

    /// Construct the header protection cipher for this suite.
    pub fn header_protection(self, key: &[u8]) -> Result<SuiteHp, Error> {
        Ok(match self {
            SuiteId::Aes128Gcm => SuiteHp::Aes128(AesHeaderProtection::new(key)?),
            SuiteId::Aes256Gcm => SuiteHp::Aes256(Aes256HeaderProtection::new(key)?),
            SuiteId::ChaCha20Poly1305 => SuiteHp::ChaCha20(ChaChaHeaderProtection::new(key)?),
        })
    }
}

/// Payload AEAD dispatched over the negotiated suite.
pub enum SuiteAead {
    Aes128Gcm(Aes128GcmAead),
    Aes256Gcm(Aes256GcmAead),
    ChaCha20Poly1305(ChaCha20Poly1305Aead),
}

impl SuiteAead {
    /// Encrypt `buf[..payload_len]` in place; see [`Aead::seal_in_place`].
    pub fn seal_in_place(
        &self,
        nonce: &[u8],
        aad: &[u8],
        buf: &mut [u8],
        payload_len: usize,
    ) -> Result<usize, Error> {
        match self {
            SuiteAead::Aes128Gcm(a) => a.seal_in_place(nonce, aad, buf, payload_len),
            SuiteAead::Aes256Gcm(a) => a.seal_in_place(nonce, aad, buf, payload_len),
            SuiteAead::ChaCha20Poly1305(a) => a.seal_in_place(nonce, aad, buf, payload_len),
        }
    }

    /// Decrypt `buf[..ciphertext_len]` in place; see [`Aead::open_in_place`].
    pub fn open_in_place(
        &self,
        nonce: &[u8],
        aad: &[u8],
        buf: &mut [u8],
        ciphertext_len: usize,
    ) -> Result<usize, Error> {
        match self {
            SuiteAead::Aes128Gcm(a) => a.open_in_place(nonce, aad, buf, ciphertext_len),
            SuiteAead::Aes256Gcm(a) => a.open_in_place(nonce, aad, buf, ciphertext_len),
            SuiteAead::ChaCha20Poly1305(a) => a.open_in_place(nonce, aad, buf, ciphertext_len),
        }
    }
}

/// Header protection cipher dispatched over the negotiated suite.
pub enum SuiteHp {
    Aes128(AesHeaderProtection),
    Aes256(Aes256HeaderProtection),
    ChaCha20(ChaChaHeaderProtection),
}

impl SuiteHp {
    /// Compute the 5-byte mask from a 16-byte ciphertext sample.
    pub fn mask(&self, sample: &[u8]) -> [u8; 5] {
        match self {
            SuiteHp::Aes128(h) => h.mask(sample),
            SuiteHp::Aes256(h) => h.mask(sample),
            SuiteHp::ChaCha20(h) => h.mask(sample),
        }
    }
}
