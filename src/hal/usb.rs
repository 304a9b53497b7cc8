//! Seam to the external software-USB transport.

/// One vendor control request as decoded by the transport.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ControlRequest {
    /// Request code (`bRequest`)
    pub request: u8,
    /// First parameter word (`wValue`)
    pub value: u16,
    /// Second parameter word (`wIndex`)
    pub index: u16,
}

/// The low-level USB engine the control loop polls.
///
/// The implementation owns the receive buffer, the transmitter state, the
/// interrupt-pending flag and the device address; it does the bit-level and
/// enumeration work but no bootloader protocol work. The control loop is
/// the only caller, and it never calls from interrupt context.
pub trait UsbLink {
    /// Both data lines are being held low: the host is driving a bus reset.
    fn reset_asserted(&self) -> bool;

    /// No packet is currently on the wire.
    fn bus_quiet(&self) -> bool;

    /// A bus event arrived and has not been acknowledged yet.
    fn interrupt_pending(&self) -> bool;

    /// Acknowledge the pending bus event.
    fn acknowledge_interrupt(&mut self);

    /// Run the receiver for the packet currently arriving on the bus.
    fn service(&mut self);

    /// Forget the assigned device address after a bus reset.
    fn note_bus_reset(&mut self);

    /// Take one buffered control request, freeing the receive buffer for
    /// the next packet.
    fn take_request(&mut self) -> Option<ControlRequest>;

    /// Queue reply data for the control transfer being processed.
    fn submit_reply(&mut self, data: &[u8]);

    /// Build one outbound packet if the transmitter is idle and reply data
    /// is queued.
    fn pump_tx(&mut self);

    /// Release the pull-up so the host sees a disconnect.
    fn disconnect(&mut self);

    /// Reconnect and reinitialize the receiver.
    fn connect(&mut self);

    /// Disable the engine entirely before handing off to the application.
    fn shutdown(&mut self);
}
