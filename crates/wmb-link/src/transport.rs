//! Transport seam.
//!
//! The mesh transport (sink management, routing, fragmentation) lives
//! outside this workspace. It is reached through the [`Transport`] trait,
//! which moves whole frames to and from a device address.

use std::time::Duration;

use crate::error::LinkError;

/// Transport parameters attached to every outgoing frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOptions {
    pub source_endpoint: u8,
    pub destination_endpoint: u8,
    /// Quality-of-service class.
    pub qos: u8,
    /// Delay before transmission.
    pub initial_delay_ms: u32,
    /// Unacknowledged CSMA-CA transmission.
    pub unack_csma_ca: bool,
    /// Maximum number of hops.
    pub hop_limit: u8,
}

/// A frame on its way to a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundFrame {
    /// Mesh address of the device.
    pub destination: u32,
    pub options: SendOptions,
    /// Complete frame, checksum included.
    pub data: Vec<u8>,
}

/// A frame delivered by the transport, already reassembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    /// Mesh address of the sender.
    pub source: u32,
    pub source_endpoint: u8,
    pub destination_endpoint: u8,
    /// Hops the frame travelled.
    pub hop_count: u8,
    /// Time spent in the mesh.
    pub travel_time_ms: u32,
    /// Complete frame, checksum included.
    pub data: Vec<u8>,
}

/// Byte-oriented send/receive primitive.
pub trait Transport {
    /// Hand a frame to the transport.
    fn send(&mut self, frame: &OutboundFrame) -> Result<(), LinkError>;

    /// Wait up to `timeout` for the next inbound frame.
    ///
    /// Returns `Ok(None)` when nothing arrived in time.
    fn receive(&mut self, timeout: Duration) -> Result<Option<InboundFrame>, LinkError>;
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn send(&mut self, frame: &OutboundFrame) -> Result<(), LinkError> {
        (**self).send(frame)
    }

    fn receive(&mut self, timeout: Duration) -> Result<Option<InboundFrame>, LinkError> {
        (**self).receive(timeout)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, frame: &OutboundFrame) -> Result<(), LinkError> {
        (**self).send(frame)
    }

    fn receive(&mut self, timeout: Duration) -> Result<Option<InboundFrame>, LinkError> {
        (**self).receive(timeout)
    }
}
