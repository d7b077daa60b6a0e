//! Drive a simulated board with a host command stream and print what it does.
//!
//! Run with: cargo run -p pinwire --example blink

use pinwire::device::{Protocol, ProtocolConfig, SimulatedBoard};
use pinwire::frame::args::{SetDigitalOutLevelArgs, SetPinDigitalOutArgs};
use pinwire::frame::{decode_all, IncomingMessage, Outgoing};
use pinwire::transport::MemoryChannel;

const LED_PIN: u8 = 0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut proto = Protocol::new(ProtocolConfig::default(), SimulatedBoard::default());
    proto.initialize()?;

    let mut commands = vec![IncomingMessage::SetPinDigitalOut(SetPinDigitalOutArgs {
        pin: LED_PIN,
        value: false,
        open_drain: false,
    })];
    for i in 0..6 {
        commands.push(IncomingMessage::SetDigitalOutLevel(SetDigitalOutLevelArgs {
            pin: LED_PIN,
            value: i % 2 == 0,
        }));
    }

    let mut stream = Vec::new();
    for cmd in &commands {
        stream.extend_from_slice(&cmd.to_bytes()?);
    }

    // Deliver the stream the way a serial link might: in uneven pieces.
    for piece in stream.chunks(3) {
        proto.on_bytes_received(piece)?;
    }

    let mut channel = MemoryChannel::new();
    while !proto.queue().is_empty() {
        proto.on_tick(&mut channel)?;
    }

    for call in proto.hardware().calls() {
        println!("hardware: {call:?}");
    }
    for msg in decode_all::<Outgoing>(&channel.written())? {
        println!("sent:     {msg:?}");
    }
    Ok(())
}
