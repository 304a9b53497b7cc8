//! Shared test doubles for the hardware seams. Host-only; the real
//! implementations live in the integrating firmware (and `avr` for the
//! chip-side pieces).

use std::cell::Cell;
use std::collections::VecDeque;

use crate::hal::{Board, ControlRequest, ProgramMemory, UsbLink};

pub const FLASH_SIZE: usize = 4096;

/// In-memory flash with a one-page hardware buffer, recording the order of
/// every buffer fill, erase and page write.
pub struct MemFlash {
    pub cells: [u8; FLASH_SIZE],
    pub buffer: [u8; 64],
    pub fills: Vec<(u16, u16)>,
    pub erases: Vec<u16>,
    pub writes: Vec<u16>,
    pub buffer_clears: usize,
    pub read_reenabled: bool,
}

impl MemFlash {
    pub fn new() -> Self {
        Self {
            cells: [0xFF; FLASH_SIZE],
            buffer: [0xFF; 64],
            fills: Vec::new(),
            erases: Vec::new(),
            writes: Vec::new(),
            buffer_clears: 0,
            read_reenabled: false,
        }
    }

    /// Flash that already carries an application: the relocation table holds
    /// a non-blank user reset vector.
    pub fn with_application() -> Self {
        let mut flash = Self::new();
        let vector = (Self::BOOTLOADER_ADDRESS - 4) as usize;
        flash.cells[vector] = 0x12;
        flash.cells[vector + 1] = 0xC5;
        flash
    }
}

impl ProgramMemory for MemFlash {
    const PAGE_SIZE: u16 = 64;
    const BOOTLOADER_ADDRESS: u16 = 0x0E00;
    const WRITE_HALTS_FETCH: bool = true;
    const WRITE_TIMING_MS: u8 = 5;
    const SIGNATURE: [u8; 2] = [0x93, 0x0B];

    fn fill_word(&mut self, address: u16, word: u16) {
        let offset = (address % Self::PAGE_SIZE) as usize;
        self.buffer[offset] = word as u8;
        self.buffer[offset + 1] = (word >> 8) as u8;
        self.fills.push((address, word));
    }

    fn clear_buffer(&mut self) {
        self.buffer = [0xFF; 64];
        self.buffer_clears += 1;
    }

    fn erase_page(&mut self, address: u16) {
        let base = (address & !(Self::PAGE_SIZE - 1)) as usize;
        self.cells[base..base + 64].fill(0xFF);
        self.erases.push(address);
    }

    fn write_page(&mut self, address: u16) {
        let base = (address & !(Self::PAGE_SIZE - 1)) as usize;
        self.cells[base..base + 64].copy_from_slice(&self.buffer);
        self.writes.push(base as u16);
        // the hardware invalidates the buffer after a write
        self.buffer = [0xFF; 64];
    }

    fn busy_wait(&mut self) {
        unreachable!("WRITE_HALTS_FETCH chips never busy-wait");
    }

    fn read_byte(&self, address: u16) -> u8 {
        self.cells[address as usize]
    }

    fn enable_read(&mut self) {
        self.read_reenabled = true;
    }
}

/// Minimal flash whose reserved region sits above relative-jump range, for
/// exercising the absolute vector patch form.
pub struct FarFlash {
    pub fills: Vec<(u16, u16)>,
    pub busy_waits: usize,
}

impl FarFlash {
    pub fn new() -> Self {
        Self {
            fills: Vec::new(),
            busy_waits: 0,
        }
    }
}

impl ProgramMemory for FarFlash {
    const PAGE_SIZE: u16 = 128;
    const BOOTLOADER_ADDRESS: u16 = 0x7000;
    const WRITE_HALTS_FETCH: bool = false;
    const WRITE_TIMING_MS: u8 = 0x80 | 5;
    const SIGNATURE: [u8; 2] = [0x95, 0x0F];

    fn fill_word(&mut self, address: u16, word: u16) {
        self.fills.push((address, word));
    }

    fn clear_buffer(&mut self) {}
    fn erase_page(&mut self, _address: u16) {}
    fn write_page(&mut self, _address: u16) {}

    fn busy_wait(&mut self) {
        self.busy_waits += 1;
    }

    fn read_byte(&self, _address: u16) -> u8 {
        0xFF
    }
}

/// Scripted transport. Queued entries are handed out one per drain; the
/// interrupt flag is raised while entries remain, so the wait step breaks
/// early exactly like live traffic would. `None` entries model bus events
/// that carry no request for us.
pub struct ScriptedUsb {
    queue: VecDeque<Option<ControlRequest>>,
    reset_ticks: Cell<u16>,
    pub replies: Vec<Vec<u8>>,
    pub tx_pumps: usize,
    pub bus_resets: usize,
    pub disconnects: usize,
    pub connects: usize,
    pub shut_down: bool,
}

impl ScriptedUsb {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            reset_ticks: Cell::new(0),
            replies: Vec::new(),
            tx_pumps: 0,
            bus_resets: 0,
            disconnects: 0,
            connects: 0,
            shut_down: false,
        }
    }

    pub fn push(&mut self, request: ControlRequest) {
        self.queue.push_back(Some(request));
    }

    /// Queue a bus event that delivers no request addressed to us.
    pub fn push_empty(&mut self) {
        self.queue.push_back(None);
    }

    /// Drive both data lines low for the next `ticks` bus samples.
    pub fn assert_reset_for(&mut self, ticks: u16) {
        self.reset_ticks.set(ticks);
    }
}

impl UsbLink for ScriptedUsb {
    fn reset_asserted(&self) -> bool {
        let left = self.reset_ticks.get();
        if left > 0 {
            self.reset_ticks.set(left - 1);
            true
        } else {
            false
        }
    }

    fn bus_quiet(&self) -> bool {
        true
    }

    fn interrupt_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    fn acknowledge_interrupt(&mut self) {}

    fn service(&mut self) {}

    fn note_bus_reset(&mut self) {
        self.bus_resets += 1;
    }

    fn take_request(&mut self) -> Option<ControlRequest> {
        self.queue.pop_front().flatten()
    }

    fn submit_reply(&mut self, data: &[u8]) {
        self.replies.push(data.to_vec());
    }

    fn pump_tx(&mut self) {
        self.tx_pumps += 1;
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
    }

    fn connect(&mut self) {
        self.connects += 1;
    }

    fn shutdown(&mut self) {
        self.shut_down = true;
    }
}

/// Board double recording every hook invocation.
#[derive(Default)]
pub struct TestBoard<const AUTO_EXIT: u16> {
    pub start: bool,
    pub osccal: Option<u8>,
    pub led_calls: usize,
    pub entered: bool,
    pub exited: bool,
    pub wd_disarms: usize,
    pub wd_services: usize,
    pub calibrations: usize,
}

impl<const AUTO_EXIT: u16> Board for TestBoard<AUTO_EXIT> {
    const AUTO_EXIT_MS: u16 = AUTO_EXIT;
    const AUTO_EXIT_NO_USB_MS: u16 = 0;

    fn start_condition(&mut self) -> bool {
        self.start
    }

    fn enter_hook(&mut self) {
        self.entered = true;
    }

    fn exit_hook(&mut self) {
        self.exited = true;
    }

    fn led_update(&mut self, _phase: u8) {
        self.led_calls += 1;
    }

    fn disarm_watchdog(&mut self) {
        self.wd_disarms += 1;
    }

    fn service_watchdog(&mut self) {
        self.wd_services += 1;
    }

    fn calibrate_oscillator(&mut self) {
        self.calibrations += 1;
        self.osccal = Some(0x77);
    }

    fn oscillator_calibration(&self) -> Option<u8> {
        self.osccal
    }

    fn restore_oscillator(&mut self) {}

    fn launch_application(&mut self) -> ! {
        panic!("launch_application reached");
    }
}
