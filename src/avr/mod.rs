//! ATtiny85 building blocks: SPM flash driver, oscillator calibration
//! storage, watchdog control, calibrated busy-wait delays and the final
//! jump into the application.
//!
//! The software USB transceiver is not here; it is board-specific and
//! supplied by the integrating firmware through the `UsbLink` seam.

pub mod clock;
pub mod flash;
pub mod watchdog;

pub use clock::{CycleDelay, Osccal};
pub use flash::Tiny85Flash;
pub use watchdog::Watchdog;

use crate::config::SAVED_RESET_VECTOR_OFFSET;

/// Jump into the application through the relocated user reset vector kept
/// just below the reserved region. Never returns; no stack state survives
/// the jump.
pub fn launch_application() -> ! {
    let target_word = (flash::BOOTLOADER_ADDRESS - SAVED_RESET_VECTOR_OFFSET) / 2;
    unsafe {
        core::arch::asm!(
            "movw r30, {target}",
            "ijmp",
            target = in(reg_iw) target_word,
            options(noreturn),
        );
    }
}

/// Flash a numeric code on a PORTB pin. Debug aid for boards with an
/// indicator LED; not referenced by the protocol core.
pub fn blink_code(count: u8, pin: u8) {
    use embedded_hal::blocking::delay::DelayMs;

    let mut delay = CycleDelay::new();
    unsafe {
        let portb = avr_device::attiny85::PORTB::ptr();
        (*portb).ddrb.modify(|r, w| w.bits(r.bits() | (1 << pin)));
        for _ in 0..count {
            (*portb).portb.modify(|r, w| w.bits(r.bits() | (1 << pin)));
            delay.delay_ms(300u16);
            (*portb).portb.modify(|r, w| w.bits(r.bits() & !(1 << pin)));
            delay.delay_ms(300u16);
        }
        (*portb).ddrb.modify(|r, w| w.bits(r.bits() & !(1 << pin)));
    }
}
