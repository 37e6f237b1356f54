//! Controller: commands out, decoded replies in.

use std::time::{Duration, Instant};

use metrics::{counter, gauge, histogram};
use tracing::{debug, info, trace, warn};
use wmb_metrics::{metric_defs, LinkLabels};
use wmb_protocol::{Command, FrameCodec, Message};

use crate::config::LinkConfig;
use crate::error::{ConfigError, LinkError};
use crate::transport::{InboundFrame, OutboundFrame, Transport};

/// A decoded frame from a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Mesh address of the sender.
    pub source: u32,
    /// Hops the frame travelled.
    pub hop_count: u8,
    /// Time spent in the mesh.
    pub travel_time_ms: u32,
    /// Decoded content.
    pub message: Message,
}

/// Sends commands to one device and decodes what comes back.
///
/// The controller owns its transport; it holds no state between calls
/// other than the configuration.
pub struct Controller<T: Transport> {
    transport: T,
    config: LinkConfig,
    labels: LinkLabels,
}

impl<T: Transport> Controller<T> {
    /// Create a controller after validating the configuration.
    pub fn new(transport: T, config: LinkConfig) -> Result<Self, LinkError> {
        config.validate()?;
        if config.destination == 0 {
            return Err(ConfigError::MissingDestination.into());
        }
        let labels = LinkLabels::new(config.destination, config.framing.as_str());
        Ok(Self {
            transport,
            config,
            labels,
        })
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Access the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Release the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }

    fn codec(&self) -> &'static dyn FrameCodec {
        self.config.framing.codec()
    }

    /// Encode and send a command. Returns the frame size.
    pub fn send(&mut self, command: &Command) -> Result<usize, LinkError> {
        let data = match self.codec().encode_command(command) {
            Ok(data) => data,
            Err(err) => {
                counter!(
                    metric_defs::ENCODE_FAILURES.name,
                    &self.labels.with(&[("kind", err.kind().to_string())])
                )
                .increment(1);
                return Err(err.into());
            }
        };
        let len = data.len();

        let frame = OutboundFrame {
            destination: self.config.destination,
            options: self.config.send_options(),
            data,
        };
        self.transport.send(&frame)?;

        debug!(
            destination = self.config.destination,
            command = command.code().name(),
            framing = %self.config.framing,
            len,
            "sent command"
        );
        let labels = self.labels.to_labels();
        counter!(
            metric_defs::FRAMES_SENT.name,
            &self.labels.with(&[("command", command.code().name().to_string())])
        )
        .increment(1);
        counter!(metric_defs::BYTES_SENT.name, &labels).increment(len as u64);
        histogram!(metric_defs::FRAME_SIZE.name, &labels).record(len as f64);

        Ok(len)
    }

    /// Wait up to `timeout` for the next frame on the controller's endpoint
    /// and decode it.
    ///
    /// Frames addressed to other endpoints are dropped. A frame that fails
    /// verification or decoding is reported as an error.
    pub fn poll(&mut self, timeout: Duration) -> Result<Option<Reply>, LinkError> {
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let Some(frame) = self.transport.receive(remaining)? else {
                return Ok(None);
            };

            if !self.is_for_us(&frame) {
                trace!(
                    source = frame.source,
                    src_ep = frame.source_endpoint,
                    dst_ep = frame.destination_endpoint,
                    "ignoring frame for another endpoint"
                );
                counter!(metric_defs::FRAMES_IGNORED.name, &self.labels.to_labels()).increment(1);
                if remaining.is_zero() {
                    return Ok(None);
                }
                continue;
            }

            counter!(metric_defs::FRAMES_RECEIVED.name, &self.labels.to_labels()).increment(1);
            return self.decode(frame).map(Some);
        }
    }

    fn is_for_us(&self, frame: &InboundFrame) -> bool {
        frame.destination_endpoint == self.config.source_endpoint
            && frame.source_endpoint == self.config.destination_endpoint
    }

    fn decode(&self, frame: InboundFrame) -> Result<Reply, LinkError> {
        match self.codec().decode_message(&frame.data) {
            Ok(message) => {
                info!(
                    source = frame.source,
                    hops = frame.hop_count,
                    travel_ms = frame.travel_time_ms,
                    "decoded message: {message:?}"
                );
                Ok(Reply {
                    source: frame.source,
                    hop_count: frame.hop_count,
                    travel_time_ms: frame.travel_time_ms,
                    message,
                })
            }
            Err(err) => {
                warn!(
                    source = frame.source,
                    kind = err.kind(),
                    len = frame.data.len(),
                    "failed to decode message: {err}"
                );
                counter!(
                    metric_defs::DECODE_FAILURES.name,
                    &self.labels.with(&[("kind", err.kind().to_string())])
                )
                .increment(1);
                Err(err.into())
            }
        }
    }

    /// Send a command and wait for the device's answer to it.
    ///
    /// Frames that fail to decode, and messages for other commands, are
    /// skipped until the configured reply timeout elapses.
    pub fn request(&mut self, command: &Command) -> Result<Reply, LinkError> {
        let code = command.code();
        let timeout = self.config.reply_timeout();
        let command_labels = self.labels.with(&[("command", code.name().to_string())]);

        self.send(command)?;
        let started = Instant::now();
        let deadline = started + timeout;
        let pending = gauge!(metric_defs::PENDING_REQUESTS.name, &self.labels.to_labels());
        pending.increment(1.0);

        let result = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                counter!(metric_defs::REQUEST_TIMEOUTS.name, &command_labels).increment(1);
                warn!(command = code.name(), ?timeout, "no reply");
                break Err(LinkError::Timeout {
                    command: code,
                    timeout,
                });
            }

            match self.poll(remaining) {
                Ok(Some(reply)) if is_answer_to(&reply.message, code) => {
                    let elapsed = started.elapsed();
                    counter!(metric_defs::REPLIES_MATCHED.name, &command_labels).increment(1);
                    histogram!(metric_defs::REPLY_LATENCY.name, &command_labels)
                        .record(elapsed.as_secs_f64() * 1000.0);
                    break Ok(reply);
                }
                Ok(Some(reply)) => {
                    debug!(
                        expected = code.name(),
                        got = reply.message.code().name(),
                        "skipping unrelated message"
                    );
                }
                Ok(None) => {}
                Err(LinkError::Protocol(_)) => {}
                Err(err) => break Err(err),
            }
        };

        pending.decrement(1.0);
        result
    }
}

fn is_answer_to(message: &Message, code: wmb_protocol::CommandCode) -> bool {
    matches!(message, Message::Answer { command, .. } if *command == code)
}
