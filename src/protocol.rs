//! Wire protocol: vendor request codes, the deferred-command register and
//! the device descriptor.

use num_enum::TryFromPrimitive;

use crate::config::RELOCATION_TABLE_SIZE;
use crate::hal::ProgramMemory;

/// Vendor control requests understood by the bootloader.
#[derive(Clone, Copy, PartialEq, Eq, Debug, TryFromPrimitive)]
#[repr(u8)]
pub enum Request {
    /// Return the 6-byte device descriptor.
    DeviceInfo = 0,
    /// Begin a page transfer at the page containing the address in wIndex.
    TransferPage = 1,
    /// Erase the whole application region (deferred).
    EraseApplication = 2,
    /// Append the two data words carried in wValue and wIndex.
    WriteData = 3,
    /// Leave the bootloader once the bus has gone idle (deferred).
    Exit = 4,
}

/// The host-visible command space is 6 bits wide. Deferred codes are masked
/// with this before they reach the pending slot, which keeps the internal
/// commit command (code 64) unreachable from the wire.
pub const HOST_COMMAND_MASK: u8 = 0x3F;

/// Single-slot register of deferred work for the control loop. A new host
/// command overwrites the previous value; there is no queue, the loop
/// drains the slot before the transport can produce the next request.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum PendingCommand {
    #[default]
    None,
    /// Host requested a full application erase.
    Erase,
    /// Host requested exit; persists until a full idle slice has passed.
    Exit,
    /// Internal: the page buffer is full and must be committed. Never
    /// produced by [`PendingCommand::deferred`].
    CommitPage,
}

impl PendingCommand {
    /// Decode a host-supplied deferred command byte.
    pub fn deferred(code: u8) -> Self {
        match code & HOST_COMMAND_MASK {
            c if c == Request::EraseApplication as u8 => PendingCommand::Erase,
            c if c == Request::Exit as u8 => PendingCommand::Exit,
            _ => PendingCommand::None,
        }
    }
}

/// Immutable 6-byte device descriptor returned for [`Request::DeviceInfo`].
///
/// Wire layout, fixed order: application capacity high byte, low byte, page
/// size, write timing (bit 7 set: erase takes a quarter of the write time),
/// signature byte 1, signature byte 2.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DeviceInfo {
    /// Bytes available to the application, net of the relocation table.
    pub progmem_size: u16,
    /// Page size in bytes; 256 is reported as 0 in the 8-bit wire field.
    pub page_size: u8,
    /// Page write duration hint in milliseconds, with the erase-time flag
    /// in bit 7.
    pub write_timing_ms: u8,
    /// Device signature bytes.
    pub signature: [u8; 2],
}

impl DeviceInfo {
    /// Descriptor for a given chip, computed once at build configuration
    /// time.
    pub fn of<M: ProgramMemory>() -> Self {
        Self {
            progmem_size: M::BOOTLOADER_ADDRESS - RELOCATION_TABLE_SIZE,
            page_size: M::PAGE_SIZE as u8,
            write_timing_ms: M::WRITE_TIMING_MS,
            signature: M::SIGNATURE,
        }
    }

    pub fn encode(&self) -> [u8; 6] {
        [
            (self.progmem_size >> 8) as u8,
            self.progmem_size as u8,
            self.page_size,
            self.write_timing_ms,
            self.signature[0],
            self.signature[1],
        ]
    }

    pub fn decode(raw: &[u8; 6]) -> Self {
        Self {
            progmem_size: (raw[0] as u16) << 8 | raw[1] as u16,
            page_size: raw[2],
            write_timing_ms: raw[3],
            signature: [raw[4], raw[5]],
        }
    }
}
