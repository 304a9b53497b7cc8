//! Page buffer writer and flash commit engine.

use crate::config::{BLANK, RESET_VECTOR_WORD, SAVED_OSCCAL_OFFSET, SAVED_RESET_VECTOR_OFFSET};
use crate::hal::{ProgramMemory, VectorPatch};
use crate::log;

/// Accumulates words into the hardware page buffer and commits finished
/// pages, maintaining the invariants that keep the device recoverable:
/// writes always start at address zero after an erase, the word landing in
/// the reset vector always points into the bootloader, and the reserved
/// region is never erased or overwritten.
///
/// Owns the write address. It is only ever mutated from the dispatch path
/// and the control-loop body, which run sequentially (see `bootloader`).
pub struct PageProgrammer<M: ProgramMemory> {
    flash: M,
    address: u16,
    osccal: Option<u8>,
}

impl<M: ProgramMemory> PageProgrammer<M> {
    pub fn new(flash: M, osccal: Option<u8>) -> Self {
        Self {
            flash,
            address: 0,
            osccal,
        }
    }

    /// Next write position as a byte address.
    #[inline]
    pub fn address(&self) -> u16 {
        self.address
    }

    /// Refresh the calibration byte substituted near the top of flash.
    pub fn set_osccal(&mut self, osccal: Option<u8>) {
        self.osccal = osccal;
    }

    /// Begin a page transfer at the page containing `requested`.
    ///
    /// Ignored while the write address is zero: address zero must always be
    /// reached through the post-erase path so the vector table is the first
    /// page written, and masking the request to a page boundary closes the
    /// partial-page-write hole. The hardware buffer is cleared in case a
    /// failed write left stale words behind.
    pub fn begin_page(&mut self, requested: u16) {
        if self.address == 0 {
            return;
        }
        self.address = requested & !(M::PAGE_SIZE - 1);
        self.flash.clear_buffer();
    }

    /// Append one word at the current address and advance by two.
    ///
    /// The reset-vector slot never receives the host's literal bytes; it is
    /// rewritten into a jump to the bootloader entry. The slot holding the
    /// saved oscillator calibration likewise keeps the live calibration
    /// value. Both substitutions are invisible to the host.
    pub fn write_word(&mut self, mut word: u16) {
        match M::VECTOR_PATCH {
            VectorPatch::Relative => {
                if self.address == RESET_VECTOR_WORD * 2 {
                    word = 0xC000 + (M::BOOTLOADER_ADDRESS / 2) - 1;
                }
            }
            VectorPatch::Absolute => {
                if self.address == RESET_VECTOR_WORD * 2 {
                    word = 0x940C;
                } else if self.address == (RESET_VECTOR_WORD + 1) * 2 {
                    word = M::BOOTLOADER_ADDRESS / 2;
                }
            }
        }
        if let Some(cal) = self.osccal {
            if self.address == M::BOOTLOADER_ADDRESS - SAVED_OSCCAL_OFFSET {
                word = cal as u16;
            }
        }
        self.flash.fill_word(self.address, word);
        self.address = self.address.wrapping_add(2);
    }

    /// Whether the last append finished a page.
    #[inline]
    pub fn at_page_boundary(&self) -> bool {
        self.address & (M::PAGE_SIZE - 1) == 0
    }

    /// Erase the application region, last page first, so the vector table
    /// survives as long as possible if power fails mid-erase.
    pub fn erase_application(&mut self) {
        let mut ptr = M::BOOTLOADER_ADDRESS;
        while ptr != 0 {
            ptr -= M::ERASE_SIZE;
            self.flash.erase_page(ptr);
            if !M::WRITE_HALTS_FETCH {
                self.flash.busy_wait();
            }
        }
        // The reset vector must be the first thing written afterwards.
        self.address = 0;
        log::info!("application erased");
    }

    /// Commit the page buffer to the page that was just filled. Pages at or
    /// above the reserved region are silently dropped; the protocol has no
    /// error channel, so the guard is the defense.
    pub fn commit_page(&mut self) {
        if self.address.wrapping_sub(2) < M::BOOTLOADER_ADDRESS {
            log::trace!("commit page at {}", self.address.wrapping_sub(2));
            self.flash.write_page(self.address.wrapping_sub(2));
            if !M::WRITE_HALTS_FETCH {
                self.flash.busy_wait();
            }
        }
    }

    /// A program is present when the relocated reset vector is not blank.
    pub fn application_present(&self) -> bool {
        self.flash
            .read_byte(M::BOOTLOADER_ADDRESS - SAVED_RESET_VECTOR_OFFSET + 1)
            != BLANK
    }

    /// Restore read access to the reprogrammed region before handoff.
    pub fn enable_read(&mut self) {
        self.flash.enable_read();
    }

    #[cfg(test)]
    pub(crate) fn flash(&self) -> &M {
        &self.flash
    }

    #[cfg(test)]
    pub(crate) fn set_address(&mut self, address: u16) {
        self.address = address;
    }
}
