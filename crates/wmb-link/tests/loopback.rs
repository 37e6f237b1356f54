//! Controller tests over the in-memory transport, with a simulated device
//! on the other end.

use std::collections::VecDeque;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use wmb_link::{
    ChannelTransport, ConfigError, Controller, InboundFrame, LinkConfig, LinkError, OutboundFrame,
    SendOptions, Transport,
};
use wmb_protocol::{
    checksum, AckStatus, AntennaConfig, Answer, Command, CommandCode, DeviceMode,
    DiagnosticsSnapshot, EmbeddedProtocol, FrameCodec, Message, ModbusPort, ModbusResponse,
    ProtocolError, StructuredCodec, ValidationError,
};

const HOST: u32 = 1;
const DEVICE: u32 = 0x00AB_CDEF;

// ============================================================================
// Simulated device
// ============================================================================

fn device_options() -> SendOptions {
    SendOptions {
        source_endpoint: 66,
        destination_endpoint: 77,
        qos: 0,
        initial_delay_ms: 0,
        unack_csma_ca: false,
        hop_limit: 15,
    }
}

fn answer_for(command: &Command) -> Answer {
    match command {
        Command::Diagnostics => Answer::Diagnostics(DiagnosticsSnapshot {
            firmware_version: "1.2.3".to_string(),
            uptime_secs: 120,
            device_mode: DeviceMode::ModbusMaster,
            antenna: AntennaConfig::Internal,
            reset_count: 4,
            modbus_requests: 10,
            modbus_errors: 1,
        }),
        Command::ModbusOneShot { port, .. } => Answer::ModbusResponse(ModbusResponse {
            status: AckStatus::Ok,
            port: *port,
            config_index: None,
            protocol: EmbeddedProtocol::ModbusRtu,
            frame: vec![0x01, 0x03, 0x02, 0x00, 0x2A, 0x39, 0x9B],
        }),
        _ => Answer::Ack(AckStatus::Ok),
    }
}

/// Answer every structured command until the host end goes away.
fn spawn_device(mut end: ChannelTransport) -> JoinHandle<Vec<Command>> {
    thread::spawn(move || {
        let mut seen = Vec::new();
        while let Ok(Some(frame)) = end.receive(Duration::from_secs(5)) {
            let Ok(Message::Command(command)) = StructuredCodec.decode_message(&frame.data) else {
                continue;
            };
            let reply = Message::Answer {
                command: command.code(),
                answer: answer_for(&command),
            };
            let data = StructuredCodec.encode_message(&reply).unwrap();
            end.send(&OutboundFrame {
                destination: frame.source,
                options: device_options(),
                data,
            })
            .unwrap();
            seen.push(command);
        }
        seen
    })
}

fn inbound(data: Vec<u8>) -> InboundFrame {
    InboundFrame {
        source: DEVICE,
        source_endpoint: 66,
        destination_endpoint: 77,
        hop_count: 2,
        travel_time_ms: 35,
        data,
    }
}

fn config() -> LinkConfig {
    LinkConfig {
        reply_timeout_ms: 2_000,
        ..LinkConfig::for_destination(DEVICE)
    }
}

// ============================================================================
// Recording transport
// ============================================================================

#[derive(Default)]
struct RecordingTransport {
    sent: Vec<OutboundFrame>,
    inbox: VecDeque<InboundFrame>,
}

impl Transport for RecordingTransport {
    fn send(&mut self, frame: &OutboundFrame) -> Result<(), LinkError> {
        self.sent.push(frame.clone());
        Ok(())
    }

    fn receive(&mut self, _timeout: Duration) -> Result<Option<InboundFrame>, LinkError> {
        Ok(self.inbox.pop_front())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_request_reset_is_acknowledged() {
    let (host, device) = ChannelTransport::pair(HOST, DEVICE);
    let device = spawn_device(device);

    let mut controller = Controller::new(host, config()).unwrap();
    let reply = controller.request(&Command::DeviceReset).unwrap();

    assert_eq!(reply.source, DEVICE);
    assert_eq!(
        reply.message,
        Message::Answer {
            command: CommandCode::DeviceReset,
            answer: Answer::Ack(AckStatus::Ok)
        }
    );

    drop(controller);
    assert_eq!(device.join().unwrap(), vec![Command::DeviceReset]);
}

#[test]
fn test_request_sequence() {
    let (host, device) = ChannelTransport::pair(HOST, DEVICE);
    let device = spawn_device(device);
    let mut controller = Controller::new(host, config()).unwrap();

    let reply = controller.request(&Command::Diagnostics).unwrap();
    let Message::Answer {
        answer: Answer::Diagnostics(diag),
        ..
    } = &reply.message
    else {
        panic!("expected diagnostics, got {:?}", reply.message);
    };
    assert_eq!(diag.firmware_version, "1.2.3");

    let one_shot =
        Command::modbus_one_shot(ModbusPort::Two, vec![0x01, 0x03, 0x00, 0x00, 0x00, 0x01])
            .unwrap();
    let reply = controller.request(&one_shot).unwrap();
    let Message::Answer {
        answer: Answer::ModbusResponse(resp),
        ..
    } = &reply.message
    else {
        panic!("expected a Modbus response, got {:?}", reply.message);
    };
    assert_eq!(resp.port, ModbusPort::Two);
    assert!(!resp.is_periodic());

    drop(controller);
    assert_eq!(device.join().unwrap().len(), 2);
}

#[test]
fn test_send_uses_configured_options() {
    let config = LinkConfig {
        qos: 1,
        hop_limit: 4,
        initial_delay_ms: 250,
        unack_csma_ca: true,
        ..LinkConfig::for_destination(DEVICE)
    };
    let mut controller = Controller::new(RecordingTransport::default(), config).unwrap();

    let len = controller.send(&Command::DeviceReset).unwrap();

    let transport = controller.into_inner();
    assert_eq!(transport.sent.len(), 1);
    let frame = &transport.sent[0];
    assert_eq!(frame.destination, DEVICE);
    assert_eq!(frame.data.len(), len);
    assert_eq!(
        frame.options,
        SendOptions {
            source_endpoint: 77,
            destination_endpoint: 66,
            qos: 1,
            initial_delay_ms: 250,
            unack_csma_ca: true,
            hop_limit: 4,
        }
    );
    assert_eq!(
        frame.data,
        vec![0x08, 0x47, 0x10, 0x01, 0x18, 0x01, 0x2A, 0x04, 0x0A, 0x02, 0x0A, 0x00, 0xEF, 0x30]
    );
}

#[test]
fn test_length_prefixed_framing() {
    let config = LinkConfig {
        framing: "length-prefixed".parse().unwrap(),
        ..LinkConfig::for_destination(DEVICE)
    };
    let mut controller = Controller::new(RecordingTransport::default(), config).unwrap();
    controller.send(&Command::DeviceReset).unwrap();

    let transport = controller.into_inner();
    assert_eq!(
        transport.sent[0].data,
        vec![0x47, 0x01, 0x01, 0x00, 0x00, 0xD3, 0x7C]
    );
}

#[test]
fn test_invalid_command_is_not_sent() {
    let mut controller =
        Controller::new(RecordingTransport::default(), LinkConfig::for_destination(DEVICE))
            .unwrap();
    let cmd = Command::ModbusOneShot {
        port: ModbusPort::NoEffect,
        frame: vec![0x01],
    };

    assert!(matches!(
        controller.send(&cmd),
        Err(LinkError::Protocol(ProtocolError::Validation(
            ValidationError::NoEffectPort { .. }
        )))
    ));
    assert!(controller.into_inner().sent.is_empty());
}

#[test]
fn test_poll_ignores_other_endpoints() {
    let (host, device) = ChannelTransport::pair(HOST, DEVICE);
    let mut controller = Controller::new(host, config()).unwrap();

    let ack = StructuredCodec
        .encode_answer(CommandCode::AntennaConfig, &Answer::Ack(AckStatus::Ok))
        .unwrap();
    device
        .inject(InboundFrame {
            source_endpoint: 1,
            destination_endpoint: 1,
            ..inbound(b"pong".to_vec())
        })
        .unwrap();
    device.inject(inbound(ack)).unwrap();

    let reply = controller.poll(Duration::from_secs(1)).unwrap().unwrap();
    assert_eq!(reply.hop_count, 2);
    assert_eq!(reply.travel_time_ms, 35);
    assert_eq!(reply.message.code(), CommandCode::AntennaConfig);

    assert_eq!(controller.poll(Duration::from_millis(20)).unwrap(), None);
}

#[test]
fn test_poll_reports_corrupt_frames() {
    let (host, device) = ChannelTransport::pair(HOST, DEVICE);
    let mut controller = Controller::new(host, config()).unwrap();

    let mut frame = StructuredCodec
        .encode_answer(CommandCode::DeviceReset, &Answer::Ack(AckStatus::Ok))
        .unwrap();
    frame[3] ^= 0x10;
    device.inject(inbound(frame)).unwrap();

    let mut not_a_message = vec![0xFF, 0xFF, 0xFF];
    checksum::append(&mut not_a_message);
    device.inject(inbound(not_a_message)).unwrap();

    let err = controller.poll(Duration::from_secs(1)).unwrap_err();
    assert_eq!(err.kind(), "checksum_mismatch");

    let err = controller.poll(Duration::from_secs(1)).unwrap_err();
    assert_eq!(err.kind(), "deserialization");
}

#[test]
fn test_request_skips_noise_until_matching_answer() {
    let (host, device) = ChannelTransport::pair(HOST, DEVICE);
    let mut controller = Controller::new(host, config()).unwrap();

    // Queued before the request goes out: corruption, an unrelated answer,
    // then the answer we are waiting for.
    device.inject(inbound(vec![0x00, 0x01, 0x02])).unwrap();
    let unrelated = StructuredCodec
        .encode_answer(CommandCode::Diagnostics, &Answer::Ack(AckStatus::Busy))
        .unwrap();
    device.inject(inbound(unrelated)).unwrap();
    let wanted = StructuredCodec
        .encode_answer(CommandCode::BaudrateConfig, &Answer::Ack(AckStatus::InvalidArgument))
        .unwrap();
    device.inject(inbound(wanted)).unwrap();

    let cmd = Command::SetBaudrate {
        port: ModbusPort::One,
        baudrate: wmb_protocol::BaudRate::B38400,
    };
    let reply = controller.request(&cmd).unwrap();
    let Message::Answer { answer, .. } = &reply.message else {
        panic!("expected an answer");
    };
    assert!(!answer.is_success());
    assert_eq!(answer, &Answer::Ack(AckStatus::InvalidArgument));
}

#[test]
fn test_request_times_out() {
    let (host, _device) = ChannelTransport::pair(HOST, DEVICE);
    let config = LinkConfig {
        reply_timeout_ms: 50,
        ..LinkConfig::for_destination(DEVICE)
    };
    let mut controller = Controller::new(host, config).unwrap();

    let err = controller.request(&Command::Diagnostics).unwrap_err();
    assert!(matches!(
        err,
        LinkError::Timeout {
            command: CommandCode::Diagnostics,
            ..
        }
    ));
}

#[test]
fn test_closed_transport() {
    let (host, device) = ChannelTransport::pair(HOST, DEVICE);
    drop(device);
    let mut controller = Controller::new(host, config()).unwrap();

    assert!(matches!(
        controller.request(&Command::DeviceReset),
        Err(LinkError::Closed)
    ));
}

#[test]
fn test_controller_rejects_bad_config() {
    let (host, _device) = ChannelTransport::pair(HOST, DEVICE);
    assert!(matches!(
        Controller::new(host, LinkConfig::default()),
        Err(LinkError::Config(ConfigError::MissingDestination))
    ));

    let (host, _device) = ChannelTransport::pair(HOST, DEVICE);
    let config = LinkConfig {
        hop_limit: 16,
        ..LinkConfig::for_destination(DEVICE)
    };
    assert!(matches!(
        Controller::new(host, config),
        Err(LinkError::Config(ConfigError::HopLimit { value: 16, max: 15 }))
    ));
}
