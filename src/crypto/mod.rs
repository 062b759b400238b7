//! Cryptographic traits and packet key material.
//!
//! QUIC packet protection needs three primitives: an AEAD for the payload,
//! HKDF for key derivation, and a header protection cipher. The traits here
//! are implemented by the RustCrypto backends in [`rustcrypto`]; the suite
//! registry dispatches over them at runtime so each encryption level can
//! carry a different negotiated suite.

pub mod key_schedule;
pub mod rustcrypto;

use zeroize::Zeroize;

use crate::error::Error;
use crate::suite::{SuiteAead, SuiteHp};

/// Encryption level — determines which keys protect a packet.
///
/// Initial and Handshake are transient and discarded as the handshake
/// progresses; ZeroRtt may be discarded early; OneRtt persists and is the
/// only level eligible for key update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Initial,
    ZeroRtt,
    Handshake,
    /// 1-RTT application data.
    OneRtt,
}

impl Level {
    pub(crate) const COUNT: usize = 4;

    pub(crate) fn index(self) -> usize {
        match self {
            Level::Initial => 0,
            Level::ZeroRtt => 1,
            Level::Handshake => 2,
            Level::OneRtt => 3,
        }
    }
}

/// Authenticated Encryption with Associated Data.
///
/// QUIC mandates support for AES-128-GCM; ChaCha20-Poly1305 is preferred
/// on targets without AES hardware.
pub trait Aead {
    /// Key length in bytes.
    const KEY_LEN: usize;
    /// Nonce length in bytes (always 12 for QUIC).
    const NONCE_LEN: usize;
    /// Authentication tag length in bytes (always 16 for QUIC).
    const TAG_LEN: usize;

    /// Encrypt in place.
    ///
    /// `buf[..payload_len]` contains the plaintext. The buffer must have
    /// room for the authentication tag (`buf.len() >= payload_len + TAG_LEN`).
    ///
    /// Returns the total length of ciphertext + tag.
    fn seal_in_place(
        &self,
        nonce: &[u8],
        aad: &[u8],
        buf: &mut [u8],
        payload_len: usize,
    ) -> Result<usize, Error>;

    /// Decrypt in place.
    ///
    /// `buf[..ciphertext_len]` contains ciphertext + authentication tag.
    ///
    /// Returns the plaintext length on success.
    fn open_in_place(
        &self,
        nonce: &[u8],
        aad: &[u8],
        buf: &mut [u8],
        ciphertext_len: usize,
    ) -> Result<usize, Error>;
}

/// Header protection cipher.
///
/// A mask derived from a 16-byte sample of the encrypted payload is XORed
/// into the first byte and packet number bytes of each packet.
pub trait HeaderProtection {
    /// Compute a 5-byte mask from a 16-byte sample.
    ///
    /// - `mask[0]` is XORed with the first byte of the packet header
    ///   (lower 4 bits for long headers, lower 5 bits for short headers)
    /// - `mask[1..5]` are XORed with the packet number bytes
    fn mask(&self, sample: &[u8]) -> [u8; 5];
}

/// HKDF-Expand (RFC 5869) over a fixed hash function.
///
/// The TX record layer only ever expands: traffic secrets arrive
/// pre-extracted from the TLS layer.
pub trait Hkdf {
    /// Hash output length in bytes (e.g., 32 for SHA-256).
    const HASH_LEN: usize;

    /// HKDF-Expand: expand a pseudorandom key with info into output
    /// keying material.
    fn expand(&self, prk: &[u8], info: &[u8], okm: &mut [u8]) -> Result<(), Error>;
}

/// Packet protection keys for one encryption level, TX direction.
pub struct ElKeys {
    pub aead: SuiteAead,
    pub header_protection: SuiteHp,
    /// Nonce base — XORed with the packet number to form the per-packet nonce.
    pub iv: [u8; 12],
}

impl ElKeys {
    /// Compute the AEAD nonce for a given packet number.
    ///
    /// The nonce is formed by XORing the IV with the packet number
    /// (left-padded to 12 bytes).
    pub fn nonce(&self, packet_number: u64) -> [u8; 12] {
        let mut nonce = self.iv;
        let pn_bytes = packet_number.to_be_bytes();
        for i in 0..8 {
            nonce[4 + i] ^= pn_bytes[i];
        }
        nonce
    }
}

impl Drop for ElKeys {
    fn drop(&mut self) {
        self.iv.zeroize();
    }
}
