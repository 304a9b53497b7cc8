//! Board integration seam: entry condition, indicator, watchdog and
//! oscillator hooks supplied by the build environment.

/// Build-time board configuration and hardware hooks.
///
/// Everything here is resolved at compile time; there is no runtime
/// configuration surface.
pub trait Board {
    /// Idle time in milliseconds after which the loop hands off to the
    /// application; 0 disables the timeout. Traffic only clears the high
    /// byte of the idle counter, so timeouts short enough to fit in the low
    /// byte (below ~1.3 s) cannot be deferred by traffic — keep this at
    /// 1000 ms or more.
    const AUTO_EXIT_MS: u16;

    /// Shorter idle budget applied when no USB traffic is seen at all,
    /// e.g. the device is powered but not plugged in; 0 disables the bias.
    const AUTO_EXIT_NO_USB_MS: u16;

    /// Entry condition evaluated once after reset (jumper state, reset
    /// cause, ...). The implementation is responsible for releasing any
    /// pins it claimed before returning.
    fn start_condition(&mut self) -> bool;

    /// Pre-loop hardware setup (indicator pin direction etc).
    fn enter_hook(&mut self);

    /// Pre-exit teardown of whatever [`Board::enter_hook`] claimed.
    fn exit_hook(&mut self);

    /// Drive the activity indicator. `phase` is the low byte of the idle
    /// counter; the duty cycle is derived from its low bits.
    fn led_update(&mut self, phase: u8);

    /// Clear the watchdog reset flag and neutralize the watchdog, falling
    /// back to the longest timeout where it is fused on.
    fn disarm_watchdog(&mut self);

    /// Service the watchdog; called once per loop iteration.
    fn service_watchdog(&mut self);

    /// Trim the oscillator against the host's bus timing. Called exactly
    /// once per detected bus reset; crystal-clocked boards leave this empty.
    fn calibrate_oscillator(&mut self);

    /// Current oscillator calibration byte, or `None` when the board does
    /// not persist one across uploads.
    fn oscillator_calibration(&self) -> Option<u8>;

    /// Restore the power-up oscillator calibration before handoff.
    fn restore_oscillator(&mut self);

    /// Jump to the relocated application reset vector. Never returns; must
    /// not leave any bootloader stack or register state for the
    /// application to observe.
    fn launch_application(&mut self) -> !;
}
