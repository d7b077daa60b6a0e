use std::sync::Arc;

use pinwire_frame::args::EstablishConnectionArgs;
use pinwire_frame::{
    Incoming, IncomingMessage, MessageDecoder, OutgoingMessage, OutgoingQueue, Received,
    TransmitPump, PROTOCOL_MAGIC,
};
use pinwire_transport::Channel;
use tracing::{debug, info};

use crate::config::ProtocolConfig;
use crate::dispatch::Dispatcher;
use crate::error::{DeviceError, Result};
use crate::hardware::Hardware;
use crate::sender::MessageSender;

/// One protocol session bound to one channel.
///
/// Owns the decoder, the dispatcher and the transmit pump. The outgoing
/// queue is shared with every [`MessageSender`] handed out by
/// [`Protocol::sender`].
pub struct Protocol<H: Hardware> {
    config: ProtocolConfig,
    hardware: H,
    decoder: MessageDecoder<Incoming>,
    dispatcher: Dispatcher,
    sender: MessageSender,
    pump: TransmitPump,
}

impl<H: Hardware> Protocol<H> {
    /// Create a session. Call [`Protocol::initialize`] before feeding bytes.
    pub fn new(config: ProtocolConfig, hardware: H) -> Self {
        let queue = Arc::new(OutgoingQueue::new(config.queue_capacity));
        Self {
            decoder: MessageDecoder::with_policy(config.failure_policy),
            dispatcher: Dispatcher::new(config.board),
            sender: MessageSender::new(queue),
            pump: TransmitPump::new(),
            hardware,
            config,
        }
    }

    /// Start a fresh session on a newly connected channel.
    ///
    /// Drops any partial message and every queued byte, clears a halt, then
    /// queues ESTABLISH_CONNECTION.
    pub fn initialize(&mut self) -> Result<()> {
        self.decoder.reset();
        self.sender.queue().clear();
        self.pump.reset();

        let identity = self.config.identity;
        self.sender
            .send(&OutgoingMessage::EstablishConnection(EstablishConnectionArgs {
                magic: PROTOCOL_MAGIC,
                hardware: identity.hardware,
                bootloader: identity.bootloader,
                firmware: identity.firmware,
            }))?;
        info!(
            hardware = identity.hardware,
            bootloader = identity.bootloader,
            firmware = identity.firmware,
            "protocol session initialized"
        );
        Ok(())
    }

    /// Feed a chunk received from the channel.
    ///
    /// Commands completed by this chunk are dispatched in order. Failures are
    /// handled per the configured [`pinwire_frame::FailurePolicy`].
    ///
    /// A HARD_RESET ends the session: nothing after it in the chunk runs, the
    /// outgoing queue is dropped and the decoder stays halted until the next
    /// [`Protocol::initialize`].
    pub fn on_bytes_received(&mut self, chunk: &[u8]) -> Result<()> {
        let Self {
            decoder,
            dispatcher,
            hardware,
            sender,
            ..
        } = self;

        let mut reset = false;
        let outcome = decoder.feed(chunk, |received: Received<'_, IncomingMessage>| {
            if reset {
                return Ok(());
            }
            dispatcher
                .dispatch(&mut *hardware, sender, &received.message, received.wire)
                .map_err(DeviceError::from)?;
            reset = matches!(received.message, IncomingMessage::HardReset(_));
            Ok(())
        });

        if reset {
            self.decoder.halt();
            self.sender.queue().clear();
            self.pump.reset();
            info!("hard reset, session stopped until initialize");
        }
        outcome
    }

    /// Periodic step: UART housekeeping, then one transmit pump step.
    ///
    /// Returns the number of bytes handed to the channel.
    pub fn on_tick<C>(&mut self, channel: &mut C) -> Result<usize>
    where
        C: Channel + ?Sized,
    {
        self.hardware.uart_tasks();
        let written = self.pump.tick(self.sender.queue(), channel)?;
        if written > 0 {
            debug!(written, "transmit pump wrote");
        }
        Ok(written)
    }

    /// Queue a message from the application.
    pub fn send_message(&self, message: &OutgoingMessage) -> Result<()> {
        self.sender.send(message)?;
        Ok(())
    }

    /// A handle for producers outside the receive path.
    pub fn sender(&self) -> MessageSender {
        self.sender.clone()
    }

    /// The shared outgoing queue.
    pub fn queue(&self) -> &OutgoingQueue {
        self.sender.queue()
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    /// Consume the session and return its hardware.
    pub fn into_hardware(self) -> H {
        self.hardware
    }

    /// Whether a failure stopped decoding until the next
    /// [`Protocol::initialize`].
    pub fn is_halted(&self) -> bool {
        self.decoder.is_halted()
    }

    /// Commands decoded since creation.
    pub fn decoded_count(&self) -> u64 {
        self.decoder.decoded_count()
    }

    /// Commands dropped while resynchronizing.
    pub fn dropped_count(&self) -> u64 {
        self.decoder.dropped_count()
    }

    /// The transmit pump, for its counters.
    pub fn pump(&self) -> &TransmitPump {
        &self.pump
    }
}

impl<H: Hardware + std::fmt::Debug> std::fmt::Debug for Protocol<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Protocol")
            .field("config", &self.config)
            .field("hardware", &self.hardware)
            .field("decoder", &self.decoder)
            .field("pump", &self.pump)
            .field("queued", &self.queue().len())
            .finish()
    }
}
