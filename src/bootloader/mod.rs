//! Top-level cooperative control loop and lifecycle handling.
//!
//! Single logical thread, no preemption: the transport is polled, never
//! interrupt-driven, so command dispatch and the loop body touch the shared
//! protocol state (write address, pending command, idle counter) strictly
//! in sequence. Dispatch only ever runs inside the loop's drain step, which
//! is why none of that state needs locking.

use embedded_hal::blocking::delay::{DelayMs, DelayUs};

use crate::config::{POLL_SLICE_MS, POLL_TICK_US, RESET_DETECT_TICKS, RESYNC_QUIET_US, SLICE_TICKS};
use crate::flash::PageProgrammer;
use crate::hal::{Board, ControlRequest, ProgramMemory, UsbLink};
use crate::log;
use crate::protocol::{DeviceInfo, PendingCommand, Request};

/// Time the pull-up is released during the disconnect/reconnect cycle so
/// the host notices the device and re-enumerates.
const REENUMERATE_MS: u16 = 300;

/// The bootloader proper: command dispatch, the polling loop, and the
/// irreversible handoff to the application.
pub struct Bootloader<M, U, B, D>
where
    M: ProgramMemory,
    U: UsbLink,
    B: Board,
    D: DelayUs<u16> + DelayMs<u16>,
{
    programmer: PageProgrammer<M>,
    usb: U,
    board: B,
    delay: D,
    pending: PendingCommand,
    idle_ticks: u16,
}

impl<M, U, B, D> Bootloader<M, U, B, D>
where
    M: ProgramMemory,
    U: UsbLink,
    B: Board,
    D: DelayUs<u16> + DelayMs<u16>,
{
    pub fn new(flash: M, usb: U, board: B, delay: D) -> Self {
        let osccal = board.oscillator_calibration();
        Self {
            programmer: PageProgrammer::new(flash, osccal),
            usb,
            board,
            delay,
            pending: PendingCommand::None,
            idle_ticks: 0,
        }
    }

    /// Whether the bootloader should take over after this reset: the board's
    /// start condition holds, or there is no application to run (blank
    /// relocated reset vector).
    pub fn should_run(&mut self) -> bool {
        self.board.start_condition() || !self.programmer.application_present()
    }

    /// Service the host until an exit condition is met: an exit command
    /// followed by a full idle slice, or the idle timeout with a program
    /// present. Returns with the transport shut down; the caller finishes
    /// with [`Bootloader::leave`].
    pub fn run(&mut self) {
        self.init_hardware();
        self.board.enter_hook();
        self.seed_idle_counter();
        self.pending = PendingCommand::None;
        log::info!("bootloader running");

        loop {
            // 1. wait out one poll slice, breaking early on bus traffic;
            //    a sustained low state on both lines is a host reset
            let slice_expired = self.wait_for_traffic();

            // 2. the watchdog keeps running across erase/write stalls
            self.board.service_watchdog();

            // 3. deferred flash work scheduled by the dispatcher
            match self.pending {
                PendingCommand::Erase => self.programmer.erase_application(),
                PendingCommand::CommitPage => self.programmer.commit_page(),
                _ => {}
            }

            // 4. exit is honored only after a full slice with no traffic,
            //    so a transaction in flight is never cut short; all other
            //    deferred commands are single-shot
            if self.pending == PendingCommand::Exit {
                if slice_expired {
                    log::info!("exit command honored");
                    break;
                }
            } else {
                self.pending = PendingCommand::None;
            }

            // 5. drain one inbound packet, then pump the transmitter
            if let Some(req) = self.usb.take_request() {
                self.handle_request(req);
            }
            self.usb.pump_tx();

            // 6. idle bookkeeping and auto-exit; never exit into blank
            //    memory, keep waiting for a valid upload instead
            self.idle_ticks = self.idle_ticks.wrapping_add(1);
            if self.auto_exit_due() {
                log::info!("idle timeout, application present");
                break;
            }

            // 7. activity indicator, duty cycle from the idle counter
            self.board.led_update(self.idle_ticks as u8);

            // 8. a packet arrived while we were busy; wait for the bus to
            //    go quiet so the next packet is sampled from its start
            if self.usb.interrupt_pending() {
                self.resync();
            }
        }

        self.teardown();
    }

    /// Hand control to the application through the relocated reset vector.
    /// Irreversible: never returns, and no bootloader state survives into
    /// the application's execution context.
    pub fn leave(mut self) -> ! {
        self.board.disarm_watchdog();
        self.board.restore_oscillator();
        self.programmer.enable_read();
        self.board.launch_application()
    }

    /// Dispatch one control request. Runs synchronously inside the drain
    /// step of [`Bootloader::run`].
    fn handle_request(&mut self, req: ControlRequest) {
        // any traffic addressed to us defers the idle timeout
        self.idle_ticks &= 0x00FF;

        match Request::try_from(req.request) {
            Ok(Request::DeviceInfo) => {
                self.usb.submit_reply(&DeviceInfo::of::<M>().encode());
            }
            Ok(Request::TransferPage) => {
                self.programmer.begin_page(req.index);
            }
            Ok(Request::WriteData) => {
                self.programmer.write_word(req.value);
                self.programmer.write_word(req.index);
                if self.programmer.at_page_boundary() {
                    // ask the loop to flush on its next cycle
                    self.pending = PendingCommand::CommitPage;
                }
            }
            Ok(Request::EraseApplication) | Ok(Request::Exit) | Err(_) => {
                self.pending = PendingCommand::deferred(req.request);
            }
        }
    }

    /// Step 1: sample the bus for up to one poll slice. Returns true when
    /// the full slice elapsed with no traffic.
    ///
    /// While waiting, ~100 us of both data lines held low is taken as a
    /// host bus reset: the device address is forgotten and the oscillator
    /// recalibrated, once per reset event.
    fn wait_for_traffic(&mut self) -> bool {
        let mut ticks = SLICE_TICKS;
        let mut reset_ctr = RESET_DETECT_TICKS;
        loop {
            if !self.usb.reset_asserted() {
                // idle or live traffic; rearm the reset detector
                reset_ctr = RESET_DETECT_TICKS;
            } else if reset_ctr > 0 {
                reset_ctr -= 1;
                if reset_ctr == 0 {
                    log::trace!("bus reset detected");
                    self.usb.note_bus_reset();
                    self.board.calibrate_oscillator();
                    self.programmer.set_osccal(self.board.oscillator_calibration());
                }
            }

            if self.usb.interrupt_pending() {
                self.usb.service();
                // clear again in case a timeout occurred during sync
                self.usb.acknowledge_interrupt();
                return false;
            }

            ticks -= 1;
            if ticks == 0 {
                return true;
            }
            self.delay.delay_us(POLL_TICK_US);
        }
    }

    /// Step 6 predicate: the configured idle timeout elapsed and there is a
    /// program to run.
    fn auto_exit_due(&self) -> bool {
        B::AUTO_EXIT_MS != 0
            && self.idle_ticks == B::AUTO_EXIT_MS / POLL_SLICE_MS
            && self.programmer.application_present()
    }

    /// Step 8: a packet collided with command processing. Wait until the
    /// bus has been quiet for a full settle interval so we resynchronize on
    /// the next packet boundary instead of reading a torn one.
    fn resync(&mut self) {
        let mut quiet = 0;
        while quiet < RESYNC_QUIET_US {
            if self.usb.bus_quiet() {
                quiet += 1;
            } else {
                quiet = 0;
            }
            self.delay.delay_us(1);
        }
        self.usb.acknowledge_interrupt();
    }

    /// Reset-safe hardware baseline: neutralize the watchdog, then force
    /// the host to re-enumerate with a disconnect/reconnect cycle.
    fn init_hardware(&mut self) {
        self.board.disarm_watchdog();
        self.usb.disconnect();
        self.delay.delay_ms(REENUMERATE_MS);
        self.usb.connect();
    }

    /// Bias the idle counter so a device that never sees USB traffic leaves
    /// after the shorter `AUTO_EXIT_NO_USB_MS` budget. Only the high byte
    /// is seeded; traffic clears exactly that byte.
    fn seed_idle_counter(&mut self) {
        self.idle_ticks = if B::AUTO_EXIT_NO_USB_MS > 0 {
            (((B::AUTO_EXIT_MS - B::AUTO_EXIT_NO_USB_MS) / POLL_SLICE_MS) >> 8) << 8
        } else {
            0
        };
    }

    fn teardown(&mut self) {
        self.board.exit_hook();
        self.usb.disconnect();
        self.usb.shutdown();
    }
}
