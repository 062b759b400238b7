//! Datagram assembly: the coalescing datagram and the TX queue.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::net::SocketAddr;

/// Smallest sealed packet worth leaving room for: a short-header packet
/// with an empty DCID, a 1-byte packet number and the minimum ciphertext
/// that still yields a header protection sample.
pub(crate) const MIN_COALESCING_SPACE: usize = 1 + 1 + 3 + 16;

/// How many staging buffers to keep around for reuse.
const MAX_SPARE_BUFS: usize = 4;

/// A finished UDP datagram awaiting transmission.
#[derive(Debug)]
pub struct Datagram {
    pub bytes: Vec<u8>,
    pub peer: Option<SocketAddr>,
    pub local: Option<SocketAddr>,
}

/// The in-progress coalescing datagram.
///
/// Holds a staging buffer sized to the MDPL in force when it was opened;
/// sealed packets are written directly into the unused tail and committed
/// once complete, so a failed seal never leaves partial data behind.
pub(crate) struct CoalescingDgram {
    buf: Vec<u8>,
    used: usize,
    pkt_count: usize,
    peer: Option<SocketAddr>,
    local: Option<SocketAddr>,
}

impl CoalescingDgram {
    pub(crate) fn new(
        mut buf: Vec<u8>,
        mdpl: usize,
        peer: Option<SocketAddr>,
        local: Option<SocketAddr>,
    ) -> Self {
        buf.clear();
        buf.resize(mdpl, 0);
        CoalescingDgram {
            buf,
            used: 0,
            pkt_count: 0,
            peer,
            local,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.used
    }

    pub(crate) fn pkt_count(&self) -> usize {
        self.pkt_count
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.used
    }

    pub(crate) fn matches_addrs(
        &self,
        peer: &Option<SocketAddr>,
        local: &Option<SocketAddr>,
    ) -> bool {
        self.peer == *peer && self.local == *local
    }

    /// Unused tail of the staging buffer, for the sealer to write into.
    pub(crate) fn scratch(&mut self) -> &mut [u8] {
        &mut self.buf[self.used..]
    }

    /// Commit `n` bytes previously written into [`scratch`](Self::scratch)
    /// as one complete packet.
    pub(crate) fn commit(&mut self, n: usize) {
        debug_assert!(n <= self.remaining());
        self.used += n;
        self.pkt_count += 1;
    }

    pub(crate) fn finish(mut self) -> Datagram {
        self.buf.truncate(self.used);
        Datagram {
            bytes: self.buf,
            peer: self.peer,
            local: self.local,
        }
    }

    /// Abandon the datagram, reclaiming its staging buffer. Only valid
    /// while no packet has been committed.
    pub(crate) fn into_buf(self) -> Vec<u8> {
        debug_assert_eq!(self.pkt_count, 0);
        self.buf
    }
}

/// FIFO of finished datagrams plus a small free list of staging buffers.
pub(crate) struct TxQueue {
    dgrams: VecDeque<Datagram>,
    bytes: usize,
    spare_bufs: Vec<Vec<u8>>,
}

impl TxQueue {
    pub(crate) fn new() -> Self {
        TxQueue {
            dgrams: VecDeque::new(),
            bytes: 0,
            spare_bufs: Vec::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.dgrams.len()
    }

    pub(crate) fn bytes(&self) -> usize {
        self.bytes
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.dgrams.is_empty()
    }

    pub(crate) fn push(&mut self, dgram: Datagram) {
        self.bytes += dgram.bytes.len();
        self.dgrams.push_back(dgram);
    }

    pub(crate) fn pop(&mut self) -> Option<Datagram> {
        let dgram = self.dgrams.pop_front()?;
        self.bytes -= dgram.bytes.len();
        Some(dgram)
    }

    /// Head of the queue as a contiguous slice, for batch submission.
    pub(crate) fn contiguous(&mut self) -> &[Datagram] {
        self.dgrams.make_contiguous();
        self.dgrams.as_slices().0
    }

    /// Drop the first `n` datagrams after a successful send, recycling
    /// their buffers.
    pub(crate) fn consume(&mut self, n: usize) {
        for _ in 0..n {
            if let Some(dgram) = self.pop() {
                self.recycle(dgram.bytes);
            }
        }
    }

    /// Take a staging buffer, reusing a spare when one is available.
    pub(crate) fn take_buf(&mut self) -> Vec<u8> {
        self.spare_bufs.pop().unwrap_or_default()
    }

    pub(crate) fn recycle(&mut self, buf: Vec<u8>) {
        if self.spare_bufs.len() < MAX_SPARE_BUFS {
            self.spare_bufs.push(buf);
        }
    }
}
