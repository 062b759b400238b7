//! The TX record layer facade.
//!
//! [`Qtx`] accepts logical packets from the upper layer, seals them under
//! the keys of their encryption level, coalesces the sealed packets into
//! datagrams bounded by the MDPL, and queues finished datagrams for a
//! [`DgramSink`]. It is a plain state machine: nothing here blocks, spawns
//! or performs I/O beyond invoking the sink from [`Qtx::flush_net`], and it
//! expects a single logical owner (callers serialize access).

pub mod dgram;
pub mod keys;
pub mod seal;
pub mod sink;

pub use dgram::Datagram;
pub use sink::{DgramSink, SinkError};

use alloc::boxed::Box;
use core::net::SocketAddr;

use crate::crypto::Level;
use crate::error::Error;
use crate::packet::{TxHeader, MIN_INITIAL_DGRAM_LEN};
use crate::suite::{HashId, SuiteId};
use crate::tx::dgram::{CoalescingDgram, TxQueue, MIN_COALESCING_SPACE};
use crate::tx::keys::{ElSlot, ElState};

/// Construction parameters for [`Qtx::new`].
pub struct QtxArgs {
    /// Initial datagram sink; may be absent until transmission is needed.
    pub sink: Option<Box<dyn DgramSink>>,
    /// Initial maximum datagram payload length. The caller is responsible
    /// for choosing at least [`MIN_INITIAL_DGRAM_LEN`] while the Initial
    /// level is in use.
    pub mdpl: usize,
}

/// A logical packet to be sealed and transmitted.
///
/// Borrowed only for the duration of [`Qtx::write_pkt`]; the payload is
/// expressed as iovecs and copied exactly once, as it is encrypted into
/// the staging datagram. Zero-length iovecs are permitted.
pub struct TxPacket<'a> {
    pub hdr: TxHeader<'a>,
    pub payload: &'a [&'a [u8]],
    /// Full packet number; encoded truncated to `hdr.pn_len` bytes.
    pub pn: u64,
    /// Destination address, passed through to the sink.
    pub peer: Option<SocketAddr>,
    /// Source address; only valid when the sink supports local addressing.
    pub local: Option<SocketAddr>,
    /// Hold the datagram open for more packets. Not a guarantee: the
    /// record layer still finalizes when the packet is short-header or no
    /// useful space remains.
    pub coalesce: bool,
}

/// Transmit-side QUIC record layer.
pub struct Qtx {
    els: [ElSlot; Level::COUNT],
    mdpl: usize,
    cur: Option<CoalescingDgram>,
    queue: TxQueue,
    sink: Option<Box<dyn DgramSink>>,
}

impl Qtx {
    /// A fresh record layer with no encryption levels provisioned.
    pub fn new(args: QtxArgs) -> Self {
        Qtx {
            els: [ElSlot::Unset, ElSlot::Unset, ElSlot::Unset, ElSlot::Unset],
            mdpl: args.mdpl,
            cur: None,
            queue: TxQueue::new(),
            sink: args.sink,
        }
    }

    // ---- Secret management ----

    /// Derive and install TX keys for an encryption level.
    ///
    /// Can be called once per level; a level cannot be re-keyed after
    /// provisioning or revived after [`discard_enc_level`](Self::discard_enc_level).
    pub fn provide_secret(
        &mut self,
        level: Level,
        suite: SuiteId,
        md: HashId,
        secret: &[u8],
    ) -> Result<(), Error> {
        let slot = &mut self.els[level.index()];
        match slot {
            ElSlot::Discarded => Err(Error::AlreadyDiscarded),
            ElSlot::Active(_) => Err(Error::AlreadyProvisioned),
            ElSlot::Unset => {
                *slot = ElSlot::Active(ElState::provision(suite, md, secret)?);
                Ok(())
            }
        }
    }

    /// Discard key material for an encryption level. Idempotent; keys are
    /// wiped and the level can never seal again.
    ///
    /// A packet already committed to the coalescing datagram is not
    /// recalled; use [`finish_dgram`](Self::finish_dgram) and
    /// [`flush_net`](Self::flush_net) to push it out first if needed.
    pub fn discard_enc_level(&mut self, level: Level) {
        self.els[level.index()] = ElSlot::Discarded;
    }

    // ---- Packet transmission ----

    /// Seal one packet and append it to the coalescing datagram, starting
    /// a new datagram when necessary.
    ///
    /// On failure nothing is mutated: the queue, the coalescing datagram
    /// and all counters read exactly as before the call.
    pub fn write_pkt(&mut self, pkt: &TxPacket<'_>) -> Result<(), Error> {
        if pkt.local.is_some()
            && !self
                .sink
                .as_ref()
                .is_some_and(|s| s.supports_local_addr())
        {
            return Err(Error::LocalAddrUnsupported);
        }

        let plan = seal::plan(&pkt.hdr, pkt.payload)?;

        let level = pkt.hdr.packet_type.enc_level();
        let el = self.els[level.index()]
            .active_mut()
            .ok_or(Error::NoKeys)?;
        if el.epoch_exhausted() {
            return Err(Error::EpochExhausted);
        }

        match self.cur.take() {
            Some(mut cd)
                if cd.matches_addrs(&pkt.peer, &pkt.local)
                    && cd.remaining() >= plan.sealed_len =>
            {
                match seal::seal(
                    el.seal_keys(),
                    &pkt.hdr,
                    pkt.payload,
                    pkt.pn,
                    el.key_phase(),
                    &plan,
                    cd.scratch(),
                ) {
                    Ok(n) => {
                        cd.commit(n);
                        el.promote_pending();
                        el.epoch_pkt_count += 1;
                        self.cur = Some(cd);
                    }
                    Err(e) => {
                        self.cur = Some(cd);
                        return Err(e);
                    }
                }
            }
            prev => {
                if plan.sealed_len > self.mdpl {
                    self.cur = prev;
                    return Err(Error::PacketTooLarge);
                }

                // Seal into a fresh datagram first; the previous one is
                // only finalized, and a staged key update only promoted,
                // once this packet is safely in place.
                let mut fresh =
                    CoalescingDgram::new(self.queue.take_buf(), self.mdpl, pkt.peer, pkt.local);
                match seal::seal(
                    el.seal_keys(),
                    &pkt.hdr,
                    pkt.payload,
                    pkt.pn,
                    el.key_phase(),
                    &plan,
                    fresh.scratch(),
                ) {
                    Ok(n) => {
                        fresh.commit(n);
                        el.promote_pending();
                        el.epoch_pkt_count += 1;
                        if let Some(p) = prev {
                            self.queue.push(p.finish());
                        }
                        self.cur = Some(fresh);
                    }
                    Err(e) => {
                        self.queue.recycle(fresh.into_buf());
                        self.cur = prev;
                        return Err(e);
                    }
                }
            }
        }

        // A short-header packet has no Length field and must stay last in
        // its datagram; finalize immediately. Otherwise keep the datagram
        // open only while the caller asks for it and useful space remains.
        let finalize = !pkt.coalesce
            || !pkt.hdr.packet_type.is_long()
            || self
                .cur
                .as_ref()
                .map_or(true, |cd| cd.remaining() < MIN_COALESCING_SPACE);
        if finalize {
            self.finish_dgram();
        }

        Ok(())
    }

    /// Finalize the coalescing datagram, if any, and queue it.
    pub fn finish_dgram(&mut self) {
        if let Some(cd) = self.cur.take() {
            self.queue.push(cd.finish());
        }
    }

    /// Drain queued datagrams to the sink, in FIFO order.
    ///
    /// Does not touch the coalescing datagram; call
    /// [`finish_dgram`](Self::finish_dgram) first to push that out too.
    /// A transient sink failure stops the drain and leaves the remaining
    /// datagrams queued. Returns the number of datagrams handed over.
    pub fn flush_net(&mut self) -> Result<usize, Error> {
        let sink = self.sink.as_mut().ok_or(Error::SinkMissing)?;
        let mut sent = 0;

        while !self.queue.is_empty() {
            let chunk = self.queue.contiguous();
            let chunk_len = chunk.len();
            match sink.send(chunk) {
                Ok(0) | Err(SinkError::WouldBlock) => break,
                Ok(n) => {
                    let n = n.min(chunk_len);
                    self.queue.consume(n);
                    sent += n;
                    if n < chunk_len {
                        break;
                    }
                }
                Err(SinkError::Fatal) => return Err(Error::SinkFailed),
            }
        }

        Ok(sent)
    }

    /// Remove and return the head queued datagram. Diagnostic use; the
    /// coalescing datagram is never popped.
    pub fn pop_net(&mut self) -> Option<Datagram> {
        self.queue.pop()
    }

    // ---- Counters ----

    /// Fully-formed datagrams awaiting the sink.
    pub fn queue_len_datagrams(&self) -> usize {
        self.queue.len()
    }

    /// Payload bytes across all queued datagrams, excluding the coalescing
    /// datagram.
    pub fn queue_len_bytes(&self) -> usize {
        self.queue.bytes()
    }

    /// Bytes in the coalescing datagram, or 0 if there is none.
    pub fn cur_dgram_len_bytes(&self) -> usize {
        self.cur.as_ref().map_or(0, CoalescingDgram::len)
    }

    /// Packets committed to the coalescing datagram but not yet finalized
    /// into a queued datagram.
    pub fn unflushed_pkt_count(&self) -> usize {
        self.cur.as_ref().map_or(0, CoalescingDgram::pkt_count)
    }

    // ---- Configuration ----

    /// Replace or clear the datagram sink.
    pub fn set_sink(&mut self, sink: Option<Box<dyn DgramSink>>) {
        self.sink = sink;
    }

    /// Change the MDPL for datagrams started from now on. The open
    /// coalescing datagram, if any, keeps the MDPL it was created with.
    pub fn set_mdpl(&mut self, mdpl: usize) -> Result<(), Error> {
        if mdpl < MIN_INITIAL_DGRAM_LEN {
            return Err(Error::MdplTooSmall {
                min: MIN_INITIAL_DGRAM_LEN,
            });
        }
        self.mdpl = mdpl;
        Ok(())
    }

    /// The MDPL applied to newly started datagrams.
    pub fn mdpl(&self) -> usize {
        self.mdpl
    }

    // ---- Key update ----

    /// Stage a key update for the 1-RTT level (RFC 9001 §6).
    ///
    /// The key phase bit inverts on the next packet sealed, which is also
    /// the first packet protected by the new keys. Fails if the 1-RTT
    /// level is not provisioned, if the Initial or Handshake levels have
    /// not been discarded yet, or if an update is already pending. A
    /// failed trigger leaves all state unchanged.
    pub fn trigger_key_update(&mut self) -> Result<(), Error> {
        let prereqs_met = self.els[Level::Initial.index()].is_discarded()
            && self.els[Level::Handshake.index()].is_discarded();
        let el = self.els[Level::OneRtt.index()]
            .active_mut()
            .ok_or(Error::WrongLevel)?;
        if !prereqs_met {
            return Err(Error::PrereqNotMet);
        }
        el.trigger_key_update()
    }

    // ---- Key expiration ----

    /// Packets sealed under the current key epoch at `level`, or `None` if
    /// the level has no keys.
    pub fn cur_epoch_pkt_count(&self, level: Level) -> Option<u64> {
        self.els[level.index()]
            .active()
            .map(|el| el.epoch_pkt_count)
    }

    /// Packet limit of the suite configured at `level`, or `None` if the
    /// level has no keys.
    pub fn max_epoch_pkt_count(&self, level: Level) -> Option<u64> {
        self.els[level.index()]
            .active()
            .map(|el| el.suite().max_pkts_per_epoch())
    }
}
