/// Errors surfaced by the TX record layer.
///
/// Every failure path is local: apart from [`Error::EpochExhausted`], which
/// permanently disables the affected encryption level, a failed operation
/// leaves the record layer unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A secret was already provided for this encryption level. Secrets
    /// cannot be replaced; key updates derive new keys from existing ones.
    AlreadyProvisioned,
    /// The encryption level was discarded and cannot be re-provisioned.
    AlreadyDiscarded,
    /// Secret length does not match the hash output length.
    BadSecretLen { expected: usize },
    /// Requested MDPL is below the QUIC minimum datagram size.
    MdplTooSmall { min: usize },
    /// No keys at this encryption level — never provisioned or discarded.
    NoKeys,
    /// Key update is only possible once the 1-RTT level is provisioned.
    WrongLevel,
    /// A key update is already pending.
    UpdateInFlight,
    /// Key update requires the Initial and Handshake levels to be
    /// discarded first.
    PrereqNotMet,
    /// Packet header is malformed: `pn_len` out of range, connection ID
    /// too long, or payload too short for the header protection sample.
    BadPacketShape,
    /// Sealed packet cannot fit even into an empty datagram at the
    /// current MDPL.
    PacketTooLarge,
    /// Packet count limit for the current key epoch reached. The level is
    /// permanently unusable; the caller must tear the connection down.
    EpochExhausted,
    /// A `local` address was supplied but the sink is absent or does not
    /// support local addressing.
    LocalAddrUnsupported,
    /// No sink is configured.
    SinkMissing,
    /// The sink reported a non-transient failure.
    SinkFailed,
    /// Caller-provided buffer too small.
    BufferTooSmall { needed: usize },
    /// AEAD or key derivation failure.
    Crypto,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::AlreadyProvisioned => write!(f, "encryption level already provisioned"),
            Error::AlreadyDiscarded => write!(f, "encryption level already discarded"),
            Error::BadSecretLen { expected } => {
                write!(f, "secret length mismatch, expected {expected} bytes")
            }
            Error::MdplTooSmall { min } => write!(f, "MDPL below minimum of {min} bytes"),
            Error::NoKeys => write!(f, "no keys at this encryption level"),
            Error::WrongLevel => write!(f, "operation requires the 1-RTT encryption level"),
            Error::UpdateInFlight => write!(f, "key update already pending"),
            Error::PrereqNotMet => {
                write!(f, "Initial and Handshake levels must be discarded first")
            }
            Error::BadPacketShape => write!(f, "malformed packet header"),
            Error::PacketTooLarge => write!(f, "sealed packet exceeds MDPL"),
            Error::EpochExhausted => write!(f, "packet limit for current key epoch reached"),
            Error::LocalAddrUnsupported => write!(f, "sink does not support local addresses"),
            Error::SinkMissing => write!(f, "no datagram sink configured"),
            Error::SinkFailed => write!(f, "datagram sink failed"),
            Error::BufferTooSmall { needed } => {
                write!(f, "buffer too small, need {needed} bytes")
            }
            Error::Crypto => write!(f, "cryptographic error"),
        }
    }
}
