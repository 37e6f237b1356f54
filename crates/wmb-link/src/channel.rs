//! In-memory transport.
//!
//! Two connected [`ChannelTransport`] ends behave like a host sink and a
//! device on the same mesh. Used for loopback testing and simulators.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use tracing::trace;

use crate::error::LinkError;
use crate::transport::{InboundFrame, OutboundFrame, Transport};

/// One end of an in-memory link.
#[derive(Debug)]
pub struct ChannelTransport {
    address: u32,
    tx: Sender<InboundFrame>,
    rx: Receiver<InboundFrame>,
}

impl ChannelTransport {
    /// Create two connected ends with the given mesh addresses.
    pub fn pair(a: u32, b: u32) -> (ChannelTransport, ChannelTransport) {
        let (a_tx, b_rx) = crossbeam_channel::unbounded();
        let (b_tx, a_rx) = crossbeam_channel::unbounded();
        (
            ChannelTransport {
                address: a,
                tx: a_tx,
                rx: a_rx,
            },
            ChannelTransport {
                address: b,
                tx: b_tx,
                rx: b_rx,
            },
        )
    }

    /// Mesh address of this end.
    pub fn address(&self) -> u32 {
        self.address
    }

    /// Deliver a frame to the peer exactly as given, bypassing the send
    /// options.
    pub fn inject(&self, frame: InboundFrame) -> Result<(), LinkError> {
        self.tx.send(frame).map_err(|_| LinkError::Closed)
    }
}

impl Transport for ChannelTransport {
    fn send(&mut self, frame: &OutboundFrame) -> Result<(), LinkError> {
        trace!(
            from = self.address,
            to = frame.destination,
            len = frame.data.len(),
            "channel send"
        );
        let delivered = InboundFrame {
            source: self.address,
            source_endpoint: frame.options.source_endpoint,
            destination_endpoint: frame.options.destination_endpoint,
            hop_count: 1,
            travel_time_ms: frame.options.initial_delay_ms,
            data: frame.data.clone(),
        };
        self.tx.send(delivered).map_err(|_| LinkError::Closed)
    }

    fn receive(&mut self, timeout: Duration) -> Result<Option<InboundFrame>, LinkError> {
        match self.rx.recv_timeout(timeout) {
            Ok(frame) => Ok(Some(frame)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(LinkError::Closed),
        }
    }
}
