//! Packet sealing: header finalization, AEAD protection and header
//! protection, written in one pass directly into the target buffer.

use crate::crypto::ElKeys;
use crate::error::Error;
use crate::packet::{
    encode_long_header, encode_pn, encode_short_header, PacketType, TxHeader, MAX_CID_LEN,
};
use crate::suite::TAG_LEN;

/// Header protection samples 16 bytes of ciphertext (RFC 9001 §5.4.2),
/// taken 4 bytes past the start of the packet number field.
const SAMPLE_LEN: usize = 16;

/// Validated sealing dimensions, computed before any state is touched.
#[derive(Debug, PartialEq)]
pub(crate) struct SealPlan {
    /// Total plaintext payload across all iovecs.
    pub(crate) payload_len: usize,
    /// Exact size of the sealed packet.
    pub(crate) sealed_len: usize,
}

/// Validate the packet shape and compute its sealed size.
///
/// Everything that can make [`seal`] fail for reasons other than buffer
/// space is rejected here, so callers can finalize or allocate datagrams
/// knowing the subsequent seal will succeed.
pub(crate) fn plan(hdr: &TxHeader<'_>, payload: &[&[u8]]) -> Result<SealPlan, Error> {
    if !(1..=4).contains(&hdr.pn_len) {
        return Err(Error::BadPacketShape);
    }
    if hdr.packet_type.is_long() {
        if hdr.dcid.len() > MAX_CID_LEN || hdr.scid.len() > MAX_CID_LEN {
            return Err(Error::BadPacketShape);
        }
        if hdr.packet_type != PacketType::Initial && !hdr.token.is_empty() {
            return Err(Error::BadPacketShape);
        }
    }

    let payload_len: usize = payload.iter().map(|iov| iov.len()).sum();

    // The ciphertext must reach from the sample offset (4 - pn_len past the
    // first PN byte) to the end of a full sample.
    if payload_len + TAG_LEN < (4 - hdr.pn_len) + SAMPLE_LEN {
        return Err(Error::BadPacketShape);
    }

    Ok(SealPlan {
        payload_len,
        sealed_len: hdr.sealed_len(payload_len),
    })
}

/// Seal one packet into `out`, returning its total length.
///
/// Steps, in order: serialize the header with the Length field filled in,
/// encode the truncated packet number, gather the payload iovecs (the
/// single copy on the TX path), AEAD-seal in place with the header as
/// associated data, then mask the first byte and PN bytes with the header
/// protection mask derived from the ciphertext sample.
pub(crate) fn seal(
    keys: &ElKeys,
    hdr: &TxHeader<'_>,
    payload: &[&[u8]],
    pn: u64,
    key_phase: bool,
    plan: &SealPlan,
    out: &mut [u8],
) -> Result<usize, Error> {
    let total = plan.sealed_len;
    if out.len() < total {
        return Err(Error::BufferTooSmall { needed: total });
    }

    let hdr_len = if hdr.packet_type.is_long() {
        let length_field = hdr.pn_len + plan.payload_len + TAG_LEN;
        encode_long_header(hdr, length_field, out)?
    } else {
        encode_short_header(hdr, key_phase, out)?
    };

    encode_pn(pn, hdr.pn_len, &mut out[hdr_len..])?;
    let pn_end = hdr_len + hdr.pn_len;

    let mut pos = pn_end;
    for iov in payload {
        out[pos..pos + iov.len()].copy_from_slice(iov);
        pos += iov.len();
    }

    // Associated data is the serialized header including the PN field.
    let (header, body) = out[..total].split_at_mut(pn_end);
    let ct_len = keys
        .aead
        .seal_in_place(&keys.nonce(pn), header, body, plan.payload_len)?;
    debug_assert_eq!(pn_end + ct_len, total);

    let sample_off = 4 - hdr.pn_len;
    let mask = keys
        .header_protection
        .mask(&body[sample_off..sample_off + SAMPLE_LEN]);

    let first_byte_bits = if hdr.packet_type.is_long() { 0x0f } else { 0x1f };
    out[0] ^= mask[0] & first_byte_bits;
    for i in 0..hdr.pn_len {
        out[hdr_len + i] ^= mask[1 + i];
    }

    Ok(total)
}
