//! Datagram sink abstraction.

use crate::tx::dgram::Datagram;

/// Failure modes a sink may report from [`DgramSink::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkError {
    /// The sink cannot accept more datagrams right now. Unsent datagrams
    /// stay queued; the caller retries `flush_net` later.
    WouldBlock,
    /// The sink is broken. Unsent datagrams stay queued; the caller may
    /// install a replacement sink and retry.
    Fatal,
}

/// Where finished datagrams go.
///
/// The record layer does not care whether this is a UDP socket, a
/// `sendmmsg`-style batcher, or a test capture. Implementations take a
/// batch so they can submit multiple datagrams in one system call.
pub trait DgramSink {
    /// Send as many of `dgrams` as possible, in order, and return how many
    /// were accepted. Partial success is allowed; returning `Ok(0)` is
    /// equivalent to [`SinkError::WouldBlock`].
    fn send(&mut self, dgrams: &[Datagram]) -> Result<usize, SinkError>;

    /// Whether the sink honours [`Datagram::local`]. When `false`, packets
    /// submitted to the record layer must not carry a local address.
    fn supports_local_addr(&self) -> bool {
        false
    }
}
