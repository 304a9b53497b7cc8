//! Oscillator calibration storage and calibrated busy-wait delays.

use embedded_hal::blocking::delay::{DelayMs, DelayUs};

use crate::config::{BLANK, CPU_FREQ_HZ};

/// Busy-wait delay for the configured core clock. The spin loop costs four
/// cycles per iteration; callers account for their own call overhead when
/// picking tick constants.
pub struct CycleDelay {
    _private: (),
}

impl CycleDelay {
    #[inline]
    pub fn new() -> Self {
        Self { _private: () }
    }

    #[inline(always)]
    fn spin(iterations: u32) {
        let mut left = iterations;
        while left > 0 {
            avr_device::asm::nop();
            left -= 1;
        }
    }
}

impl Default for CycleDelay {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayUs<u16> for CycleDelay {
    fn delay_us(&mut self, us: u16) {
        Self::spin(us as u32 * (CPU_FREQ_HZ / 4_000_000));
    }
}

impl DelayMs<u16> for CycleDelay {
    fn delay_ms(&mut self, ms: u16) {
        for _ in 0..ms {
            self.delay_us(1000);
        }
    }
}

/// Power-up oscillator calibration plus access to the live OSCCAL register.
pub struct Osccal {
    power_up: u8,
}

impl Osccal {
    /// Capture the power-up calibration before anything retunes the clock.
    pub fn capture() -> Self {
        Self {
            power_up: Self::read(),
        }
    }

    fn read() -> u8 {
        unsafe { (*avr_device::attiny85::CPU::ptr()).osccal.read().bits() }
    }

    /// Current calibration value.
    pub fn current(&self) -> u8 {
        Self::read()
    }

    /// Retune the oscillator. The nop gives the clock a cycle to settle.
    pub fn set(&mut self, value: u8) {
        unsafe {
            (*avr_device::attiny85::CPU::ptr())
                .osccal
                .write(|w| w.bits(value));
            avr_device::asm::nop();
        }
    }

    /// Apply a calibration byte persisted by a previous upload, so USB
    /// timing is valid from the first packet. Blank flash leaves the
    /// power-up value in place.
    pub fn load_saved(&mut self, stored: u8) {
        if stored != BLANK {
            self.set(stored);
        }
    }

    /// Put the power-up calibration back before handing off.
    pub fn restore_power_up(&mut self) {
        let value = self.power_up;
        self.set(value);
    }
}
