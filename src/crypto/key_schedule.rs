//! QUIC packet key derivation (RFC 9001 §5.1, §6.1).
//!
//! Traffic secrets arrive from the TLS layer already extracted; this module
//! only expands them into packet protection keys ("quic key", "quic iv",
//! "quic hp") and next-generation secrets ("quic ku").

use zeroize::Zeroize;

use crate::crypto::rustcrypto::{HkdfSha256, HkdfSha384};
use crate::crypto::{ElKeys, Hkdf};
use crate::error::Error;
use crate::suite::{HashId, SuiteId};

/// HKDF-Expand-Label as defined in RFC 8446 §7.1 with an empty context,
/// which is all QUIC ever uses.
///
/// Constructs the HkdfLabel structure
/// `u16 length || opaque label<7..255> = "tls13 " + label || opaque context<0..255> = ""`
/// and calls HKDF-Expand(secret, HkdfLabel, out.len()).
pub fn hkdf_expand_label<H: Hkdf>(
    hkdf: &H,
    secret: &[u8],
    label: &[u8],
    out: &mut [u8],
) -> Result<(), Error> {
    let prefix = b"tls13 ";
    let full_label_len = prefix.len() + label.len();
    // u16 length + label length byte + label + empty-context length byte.
    let info_len = 2 + 1 + full_label_len + 1;

    // Stack buffer; 64 bytes is ample for any QUIC label.
    if info_len > 64 {
        return Err(Error::Crypto);
    }
    let mut info = [0u8; 64];
    info[..2].copy_from_slice(&(out.len() as u16).to_be_bytes());
    info[2] = full_label_len as u8;
    info[3..3 + prefix.len()].copy_from_slice(prefix);
    info[3 + prefix.len()..3 + full_label_len].copy_from_slice(label);
    info[3 + full_label_len] = 0;

    hkdf.expand(secret, &info[..info_len], out)
}

fn expand_label(md: HashId, secret: &[u8], label: &[u8], out: &mut [u8]) -> Result<(), Error> {
    match md {
        HashId::Sha256 => hkdf_expand_label(&HkdfSha256, secret, label, out),
        HashId::Sha384 => hkdf_expand_label(&HkdfSha384, secret, label, out),
    }
}

/// Derive TX packet protection keys from a traffic secret (RFC 9001 §5.1).
///
/// Fails with [`Error::BadSecretLen`] if the secret length does not equal
/// the hash output length of `md`. Raw key bytes are wiped once the cipher
/// instances are constructed.
pub fn derive_el_keys(md: HashId, suite: SuiteId, secret: &[u8]) -> Result<ElKeys, Error> {
    if secret.len() != md.output_len() {
        return Err(Error::BadSecretLen {
            expected: md.output_len(),
        });
    }

    let mut key = [0u8; 32];
    let mut iv = [0u8; 12];
    let mut hp = [0u8; 32];

    let derived = expand_and_build(
        md,
        suite,
        secret,
        &mut key[..suite.key_len()],
        &mut iv,
        &mut hp[..suite.hp_key_len()],
    );

    key.zeroize();
    hp.zeroize();
    iv.zeroize();
    derived
}

fn expand_and_build(
    md: HashId,
    suite: SuiteId,
    secret: &[u8],
    key: &mut [u8],
    iv: &mut [u8; 12],
    hp: &mut [u8],
) -> Result<ElKeys, Error> {
    expand_label(md, secret, b"quic key", key)?;
    expand_label(md, secret, b"quic iv", iv)?;
    expand_label(md, secret, b"quic hp", hp)?;

    let aead = suite.aead(key)?;
    let header_protection = suite.header_protection(hp)?;
    Ok(ElKeys {
        aead,
        header_protection,
        iv: *iv,
    })
}

/// Derive the next-generation traffic secret for a key update.
///
/// Per RFC 9001 §6.1: `new_secret = HKDF-Expand-Label(current, "quic ku",
/// "", Hash.length)`. `out` must be exactly one hash output long.
pub fn derive_next_secret(md: HashId, current: &[u8], out: &mut [u8]) -> Result<(), Error> {
    if current.len() != md.output_len() || out.len() != md.output_len() {
        return Err(Error::BadSecretLen {
            expected: md.output_len(),
        });
    }
    expand_label(md, current, b"quic ku", out)
}
