//! Watchdog control for the ATtiny85.

use avr_device::attiny85::WDT;

pub struct Watchdog {
    _private: (),
}

impl Watchdog {
    #[inline]
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Clear the watchdog reset flag and neutralize the timer. The timeout
    /// is left at its maximum so a watchdog fused permanently on cannot
    /// fire inside a flash operation.
    pub fn disarm(&mut self) {
        unsafe {
            let cpu = avr_device::attiny85::CPU::ptr();
            // clear WDRF only, keep the other reset cause flags readable
            (*cpu).mcusr.modify(|r, w| w.bits(r.bits() & !0x08));

            let wdt = WDT::ptr();
            // timed sequence: change-enable, then longest timeout
            (*wdt).wdtcr.write(|w| w.bits(0x18));
            (*wdt).wdtcr.write(|w| w.bits(0x07));
        }
    }

    /// Reset the watchdog count.
    #[inline]
    pub fn service(&mut self) {
        unsafe {
            avr_device::asm::wdr();
        }
    }
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new()
    }
}
