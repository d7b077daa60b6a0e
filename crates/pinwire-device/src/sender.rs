use std::sync::Arc;

use bytes::BytesMut;
use pinwire_frame::args::{ReportDigitalInStatusArgs, UartReportTxStatusArgs};
use pinwire_frame::{OutgoingMessage, OutgoingQueue};
use tracing::debug;

/// Cloneable handle for putting messages on the outgoing queue.
///
/// Event sources outside the receive path (change-notify interrupts, UART
/// receive handlers, the application) hold a clone and send through it. Each
/// message lands in the queue whole or not at all.
#[derive(Debug, Clone)]
pub struct MessageSender {
    queue: Arc<OutgoingQueue>,
}

impl MessageSender {
    pub fn new(queue: Arc<OutgoingQueue>) -> Self {
        Self { queue }
    }

    /// The queue this sender writes to.
    pub fn queue(&self) -> &Arc<OutgoingQueue> {
        &self.queue
    }

    /// Encode and enqueue a message, trailer included.
    pub fn send(&self, message: &OutgoingMessage) -> pinwire_frame::Result<()> {
        let ty = message.message_type();
        let mut header = BytesMut::with_capacity(1 + ty.outgoing_arg_size());
        message.encode_header(&mut header)?;
        let mut trailer = BytesMut::new();
        message.encode_trailer(&mut trailer);

        self.queue.enqueue_with_trailer(&header, &trailer)?;
        debug!(
            ty = ty.outgoing_name(),
            tag = ty.tag(),
            len = header.len() + trailer.len(),
            "message queued"
        );
        Ok(())
    }

    /// Enqueue an already encoded message unchanged.
    pub fn send_raw(&self, wire: &[u8]) -> pinwire_frame::Result<()> {
        self.queue.enqueue(wire)?;
        Ok(())
    }

    /// Report the level of a digital input.
    pub fn report_digital_in_status(&self, pin: u8, level: bool) -> pinwire_frame::Result<()> {
        self.send(&OutgoingMessage::ReportDigitalInStatus(
            ReportDigitalInStatusArgs { pin, level },
        ))
    }

    /// Report how many bytes a UART still has to transmit.
    pub fn report_uart_tx_status(
        &self,
        uart_num: u8,
        bytes_remaining: u16,
    ) -> pinwire_frame::Result<()> {
        self.send(&OutgoingMessage::UartReportTxStatus(
            UartReportTxStatusArgs {
                uart_num,
                bytes_remaining,
            },
        ))
    }
}
