#![cfg_attr(not(test), no_std)]

//! Flash-programming core of a self-contained USB bootloader for
//! ATtiny-class AVR microcontrollers.
//!
//! The bootloader lives in a reserved region at the top of flash and lets a
//! host reprogram the application over a software USB link, without a
//! dedicated programmer. This crate implements the command protocol and the
//! timing-critical control loop around it: buffering and committing pages,
//! patching the reset vector so the device can never be bricked by a failed
//! upload, and deciding when to hand control to the application.
//!
//! The bit-level USB engine is not part of this crate. It is a
//! board-specific, hand-tuned transceiver that the integrating firmware
//! supplies through the [`UsbLink`] trait, together with a [`Board`]
//! implementation (entry condition, indicator, watchdog, oscillator hooks)
//! and a [`ProgramMemory`] implementation for the chip's self-programming
//! interface. On AVR targets the [`avr`] module provides the ATtiny85
//! building blocks for everything except the transport.
//!
//! The host drives five vendor control requests: query the device
//! descriptor, begin a page transfer, stream data words, erase the
//! application, and exit. Erase and exit are deferred into the control loop
//! so flash operations never run inside the transport's timing window.
//!
//! Safety model: the application region is erased top-down so the vector
//! table survives as long as possible, address zero is always written first
//! after an erase, and the word landing in the reset vector is rewritten to
//! jump into the bootloader. Power loss in the middle of a page write
//! remains a residual risk; the ordering only narrows the window.

pub mod bootloader;
pub mod config;
pub mod flash;
pub mod hal;
pub mod protocol;

#[cfg(all(target_arch = "avr", feature = "attiny85"))]
pub mod avr;

mod log;

#[cfg(test)]
mod mock;

pub use bootloader::Bootloader;
pub use flash::PageProgrammer;
pub use hal::{Board, ControlRequest, ProgramMemory, UsbLink, VectorPatch};
pub use protocol::{DeviceInfo, PendingCommand, Request};
