//! Transmit-side QUIC record layer.
//!
//! Accepts logical packets from an upper layer, protects them per RFC 9001
//! (AEAD sealing and header protection), coalesces them into UDP datagrams
//! under an MDPL budget, and queues the datagrams for a pluggable sink.
//! Sans-I/O: scheduling, loss recovery and the receive path live elsewhere.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod error;
pub mod varint;

pub mod crypto;
pub mod packet;
pub mod suite;

pub mod tx;

pub use crypto::Level;
pub use error::Error;
pub use packet::{PacketType, TxHeader};
pub use suite::{HashId, SuiteId};
pub use tx::{Datagram, DgramSink, Qtx, QtxArgs, SinkError, TxPacket};
