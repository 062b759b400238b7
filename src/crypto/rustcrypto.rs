//! RustCrypto-backed implementations of the packet protection traits.

use zeroize::Zeroize;

use crate::crypto::{Aead as AeadTrait, HeaderProtection, Hkdf as HkdfTrait};
use crate::error::Error;

// ---- HKDF ----

/// HKDF-Expand using SHA-256 (via the `hkdf` crate).
pub struct HkdfSha256;

impl HkdfTrait for HkdfSha256 {
    const HASH_LEN: usize = 32;

    fn expand(&self, prk: &[u8], info: &[u8], okm: &mut [u8]) -> Result<(), Error> {
        let hk = hkdf::Hkdf::<sha2::Sha256>::from_prk(prk).map_err(|_| Error::Crypto)?;
        hk.expand(info, okm).map_err(|_| Error::Crypto)
    }
}

/// HKDF-Expand using SHA-384 (for the AES-256-GCM suite).
pub struct HkdfSha384;

impl HkdfTrait for HkdfSha384 {
    const HASH_LEN: usize = 48;

    fn expand(&self, prk: &[u8], info: &[u8], okm: &mut [u8]) -> Result<(), Error> {
        let hk = hkdf::Hkdf::<sha2::Sha384>::from_prk(prk).map_err(|_| Error::Crypto)?;
        hk.expand(info, okm).map_err(|_| Error::Crypto)
    }
}

// ---- GCM AEADs ----

macro_rules! gcm_aead {
    ($name:ident, $cipher:ty, $key_len:expr, $doc:literal) => {
        #[doc = $doc]
        pub struct $name {
            cipher: $cipher,
        }

        impl $name {
            pub fn new(key: &[u8]) -> Result<Self, Error> {
                use aes_gcm::KeyInit;
                if key.len() != <Self as AeadTrait>::KEY_LEN {
                    return Err(Error::Crypto);
                }
                let cipher = <$cipher>::new_from_slice(key).map_err(|_| Error::Crypto)?;
                Ok(Self { cipher })
            }
        }

        impl AeadTrait for $name {
            const KEY_LEN: usize = $key_len;
            const NONCE_LEN: usize = 12;
            const TAG_LEN: usize = 16;

            fn seal_in_place(
                &self,
                nonce: &[u8],
                aad: &[u8],
                buf: &mut [u8],
                payload_len: usize,
            ) -> Result<usize, Error> {
                use aes_gcm::aead::AeadInPlace;
                use aes_gcm::Nonce;

                if nonce.len() != 12 {
                    return Err(Error::Crypto);
                }
                let total = payload_len + Self::TAG_LEN;
                if buf.len() < total {
                    return Err(Error::BufferTooSmall { needed: total });
                }

                let tag = self
                    .cipher
                    .encrypt_in_place_detached(Nonce::from_slice(nonce), aad, &mut buf[..payload_len])
                    .map_err(|_| Error::Crypto)?;
                buf[payload_len..total].copy_from_slice(&tag);
                Ok(total)
            }

            fn open_in_place(
                &self,
                nonce: &[u8],
                aad: &[u8],
                buf: &mut [u8],
                ciphertext_len: usize,
            ) -> Result<usize, Error> {
                use aes_gcm::aead::AeadInPlace;
                use aes_gcm::{Nonce, Tag};

                if nonce.len() != 12 || ciphertext_len < Self::TAG_LEN {
                    return Err(Error::Crypto);
                }
                let plaintext_len = ciphertext_len - Self::TAG_LEN;
                let mut tag_bytes = [0u8; 16];
                tag_bytes.copy_from_slice(&buf[plaintext_len..ciphertext_len]);
                self.cipher
                    .decrypt_in_place_detached(
                        Nonce::from_slice(nonce),
                        aad,
                        &mut buf[..plaintext_len],
                        &Tag::from(tag_bytes),
                    )
                    .map_err(|_| Error::Crypto)?;
                Ok(plaintext_len)
            }
        }
    };
}

gcm_aead!(Aes128GcmAead, aes_gcm::Aes128Gcm, 16, "AES-128-GCM AEAD.");
gcm_aead!(Aes256GcmAead, aes_gcm::Aes256Gcm, 32, "AES-256-GCM AEAD.");

// ---- ChaCha20-Poly1305 AEAD ----

/// ChaCha20-Poly1305 AEAD.
pub struct ChaCha20Poly1305Aead {
    cipher: chacha20poly1305::ChaCha20Poly1305,
}

impl ChaCha20Poly1305Aead {
    pub fn new(key: &[u8]) -> Result<Self, Error> {
        use chacha20poly1305::KeyInit;
        if key.len() != Self::KEY_LEN {
            return Err(Error::Crypto);
        }
        let cipher =
            chacha20poly1305::ChaCha20Poly1305::new_from_slice(key).map_err(|_| Error::Crypto)?;
        Ok(Self { cipher })
    }
}

impl AeadTrait for ChaCha20Poly1305Aead {
    const KEY_LEN: usize = 32;
    const NONCE_LEN: usize = 12;
    const TAG_LEN: usize = 16;

    fn seal_in_place(
        &self,
        nonce: &[u8],
        aad: &[u8],
        buf: &mut [u8],
        payload_len: usize,
    ) -> Result<usize, Error> {
        use chacha20poly1305::aead::AeadInPlace;

        if nonce.len() != 12 {
            return Err(Error::Crypto);
        }
        let total = payload_len + Self::TAG_LEN;
        if buf.len() < total {
            return Err(Error::BufferTooSmall { needed: total });
        }

        let tag = self
            .cipher
            .encrypt_in_place_detached(
                chacha20poly1305::Nonce::from_slice(nonce),
                aad,
                &mut buf[..payload_len],
            )
            .map_err(|_| Error::Crypto)?;
        buf[payload_len..total].copy_from_slice(&tag);
        Ok(total)
    }

    fn open_in_place(
        &self,
        nonce: &[u8],
        aad: &[u8],
        buf: &mut [u8],
        ciphertext_len: usize,
    ) -> Result<usize, Error> {
        use chacha20poly1305::aead::AeadInPlace;

        if nonce.len() != 12 || ciphertext_len < Self::TAG_LEN {
            return Err(Error::Crypto);
        }
        let plaintext_len = ciphertext_len - Self::TAG_LEN;
        let mut tag_bytes = [0u8; 16];
        tag_bytes.copy_from_slice(&buf[plaintext_len..ciphertext_len]);
        self.cipher
            .decrypt_in_place_detached(
                chacha20poly1305::Nonce::from_slice(nonce),
                aad,
                &mut buf[..plaintext_len],
                &chacha20poly1305::Tag::from(tag_bytes),
            )
            .map_err(|_| Error::Crypto)?;
        Ok(plaintext_len)
    }
}

// ---- AES-ECB header protection ----

macro_rules! aes_hp {
    ($name:ident, $cipher:ty, $key_len:expr, $doc:literal) => {
        #[doc = $doc]
        pub struct $name {
            cipher: $cipher,
        }

        impl $name {
            pub fn new(key: &[u8]) -> Result<Self, Error> {
                use aes::cipher::KeyInit;
                if key.len() != $key_len {
                    return Err(Error::Crypto);
                }
                let cipher = <$cipher>::new_from_slice(key).map_err(|_| Error::Crypto)?;
                Ok(Self { cipher })
            }
        }

        impl HeaderProtection for $name {
            fn mask(&self, sample: &[u8]) -> [u8; 5] {
                use aes::cipher::BlockEncrypt;
                use aes::Block;

                let mut block = Block::clone_from_slice(&sample[..16]);
                self.cipher.encrypt_block(&mut block);
                let mut mask = [0u8; 5];
                mask.copy_from_slice(&block[..5]);
                mask
            }
        }
    };
}

aes_hp!(AesHeaderProtection, aes::Aes128, 16, "AES-128-ECB header protection.");
aes_hp!(Aes256HeaderProtection, aes::Aes256, 32, "AES-256-ECB header protection.");

// ---- ChaCha20 header protection ----

/// ChaCha20 header protection.
///
/// The first 4 sample bytes form the block counter (little-endian), the
/// remaining 12 the nonce; the mask is the first 5 keystream bytes.
pub struct ChaChaHeaderProtection {
    key: [u8; 32],
}

impl ChaChaHeaderProtection {
    pub fn new(key: &[u8]) -> Result<Self, Error> {
        if key.len() != 32 {
            return Err(Error::Crypto);
        }
        let mut k = [0u8; 32];
        k.copy_from_slice(key);
        Ok(Self { key: k })
    }
}

impl HeaderProtection for ChaChaHeaderProtection {
    fn mask(&self, sample: &[u8]) -> [u8; 5] {
        use chacha20::cipher::{KeyIvInit, StreamCipher, StreamCipherSeek};

        let counter = u32::from_le_bytes([sample[0], sample[1], sample[2], sample[3]]);
        let mut nonce = [0u8; 12];
        nonce.copy_from_slice(&sample[4..16]);

        // The chacha20 crate starts at counter 0; seek to the sampled counter.
        let mut cipher = chacha20::ChaCha20::new((&self.key).into(), (&nonce).into());
        cipher.seek(counter as u64 * 64);

        let mut mask = [0u8; 5];
        cipher.apply_keystream(&mut mask);
        mask
    }
}

impl Drop for ChaChaHeaderProtection {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}
