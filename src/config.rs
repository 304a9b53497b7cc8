//! Build-time configuration constants for the bootloader core.

/// CPU frequency in Hz (PLL clock required for software USB timing)
pub const CPU_FREQ_HZ: u32 = 16_500_000;

/// Length of one control-loop poll slice in milliseconds
pub const POLL_SLICE_MS: u16 = 5;

/// Granularity of the bus-sampling wait inside a poll slice, in microseconds
pub const POLL_TICK_US: u16 = 5;

/// Bus-sampling ticks per poll slice
pub const SLICE_TICKS: u16 = POLL_SLICE_MS * 1000 / POLL_TICK_US;

/// Consecutive ticks with both data lines low that count as a host bus
/// reset (~100 us)
pub const RESET_DETECT_TICKS: u16 = 100 / POLL_TICK_US;

/// Quiet time required on the bus before repolling after a missed packet;
/// longer than the end-of-packet gap so the next packet is sampled from its
/// first bit
pub const RESYNC_QUIET_US: u16 = 9;

/// Bytes reserved at the top of the application region for the relocation
/// table: saved oscillator calibration byte plus relocated user reset vector
pub const RELOCATION_TABLE_SIZE: u16 = 6;

/// Byte offset below the reserved region of the relocated user reset vector
pub const SAVED_RESET_VECTOR_OFFSET: u16 = 4;

/// Byte offset below the reserved region of the saved oscillator
/// calibration byte
pub const SAVED_OSCCAL_OFFSET: u16 = 6;

/// Word index of the reset vector in the interrupt vector table
pub const RESET_VECTOR_WORD: u16 = 0;

/// Value of an erased flash byte
pub const BLANK: u8 = 0xFF;
