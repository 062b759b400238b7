//! Per-encryption-level TX key state.
//!
//! Each level is a one-shot slot: unset until a secret is provided, active
//! while keys exist, discarded forever after. Only the 1-RTT level carries
//! a pending next-generation key set between `trigger_key_update` and the
//! first packet sealed under the new phase.

use zeroize::Zeroize;

use crate::crypto::key_schedule::{derive_el_keys, derive_next_secret};
use crate::crypto::ElKeys;
use crate::error::Error;
use crate::suite::{HashId, SuiteId};

/// Largest supported hash output (SHA-384).
const MAX_SECRET_LEN: usize = 48;

/// A traffic secret, wiped on drop.
///
/// Kept alongside the derived keys because key updates derive the next
/// secret from it ("quic ku"); QUIC never introduces fresh entropy after
/// a level is set up.
pub(crate) struct TrafficSecret {
    buf: [u8; MAX_SECRET_LEN],
    len: usize,
}

impl TrafficSecret {
    fn new(secret: &[u8]) -> Self {
        let mut buf = [0u8; MAX_SECRET_LEN];
        buf[..secret.len()].copy_from_slice(secret);
        TrafficSecret {
            buf,
            len: secret.len(),
        }
    }

    fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl Drop for TrafficSecret {
    fn drop(&mut self) {
        self.buf.zeroize();
    }
}

/// Keys staged by a key update, waiting for the first packet of the new
/// phase.
struct PendingKeys {
    secret: TrafficSecret,
    keys: ElKeys,
}

/// Live key state for one encryption level.
pub(crate) struct ElState {
    suite: SuiteId,
    md: HashId,
    secret: TrafficSecret,
    keys: ElKeys,
    next: Option<PendingKeys>,
    key_phase: bool,
    pub(crate) epoch_pkt_count: u64,
}

impl ElState {
    /// Derive and install keys from a traffic secret.
    pub(crate) fn provision(suite: SuiteId, md: HashId, secret: &[u8]) -> Result<Self, Error> {
        let keys = derive_el_keys(md, suite, secret)?;
        Ok(ElState {
            suite,
            md,
            secret: TrafficSecret::new(secret),
            keys,
            next: None,
            key_phase: false,
            epoch_pkt_count: 0,
        })
    }

    pub(crate) fn suite(&self) -> SuiteId {
        self.suite
    }

    pub(crate) fn key_phase(&self) -> bool {
        self.key_phase
    }

    pub(crate) fn keys(&self) -> &ElKeys {
        &self.keys
    }

    pub(crate) fn epoch_exhausted(&self) -> bool {
        self.epoch_pkt_count >= self.suite.max_pkts_per_epoch()
    }

    /// Stage the next key generation and flip the key phase
    /// (RFC 9001 §6).
    ///
    /// The staged keys take effect on the next packet sealed; a failed
    /// derivation leaves the state untouched.
    pub(crate) fn trigger_key_update(&mut self) -> Result<(), Error> {
        if self.next.is_some() {
            return Err(Error::UpdateInFlight);
        }

        let mut next_secret = [0u8; MAX_SECRET_LEN];
        let len = self.md.output_len();
        let result = derive_next_secret(self.md, self.secret.as_slice(), &mut next_secret[..len])
            .and_then(|()| derive_el_keys(self.md, self.suite, &next_secret[..len]));

        let keys = match result {
            Ok(keys) => keys,
            Err(e) => {
                next_secret.zeroize();
                return Err(e);
            }
        };

        self.next = Some(PendingKeys {
            secret: TrafficSecret::new(&next_secret[..len]),
            keys,
        });
        next_secret.zeroize();
        self.key_phase = !self.key_phase;
        Ok(())
    }

    pub(crate) fn update_pending(&self) -> bool {
        self.next.is_some()
    }

    /// Keys the next packet will be sealed under: the staged
    /// next-generation keys if an update is pending, the current keys
    /// otherwise. Does not mutate; callers promote via
    /// [`promote_pending`](Self::promote_pending) only once the packet is
    /// safely sealed.
    pub(crate) fn seal_keys(&self) -> &ElKeys {
        match &self.next {
            Some(pending) => &pending.keys,
            None => &self.keys,
        }
    }

    /// Switch to the staged key generation, if any. Called immediately
    /// before sealing; the first packet of the new phase starts a fresh
    /// epoch.
    pub(crate) fn promote_pending(&mut self) {
        if let Some(pending) = self.next.take() {
            self.secret = pending.secret;
            self.keys = pending.keys;
            self.epoch_pkt_count = 0;
        }
    }
}

/// One-shot lifecycle of an encryption level's key slot.
pub(crate) enum ElSlot {
    Unset,
    Active(ElState),
    Discarded,
}

impl ElSlot {
    pub(crate) fn active(&self) -> Option<&ElState> {
        match self {
            ElSlot::Active(el) => Some(el),
            _ => None,
        }
    }

    pub(crate) fn active_mut(&mut self) -> Option<&mut ElState> {
        match self {
            ElSlot::Active(el) => Some(el),
            _ => None,
        }
    }

    pub(crate) fn is_discarded(&self) -> bool {
        matches!(self, ElSlot::Discarded)
    }
}
