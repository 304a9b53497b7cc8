//! Self-programming seam to the chip's non-volatile program memory.

/// Form of the jump written over the application's reset vector.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VectorPatch {
    /// Single relative jump; used when the reserved region starts within
    /// relative-jump range.
    Relative,
    /// Absolute jump opcode followed by the target operand in the next word.
    Absolute,
}

/// Program-memory self-programming interface plus the capability constants
/// that select among chip-family code paths at build time.
///
/// Implementations own the hardware page buffer. All addresses are byte
/// addresses into program memory; words are little-endian instruction words.
pub trait ProgramMemory {
    /// Write page size in bytes, a power of two. The protocol addresses at
    /// most 256 bytes per page.
    const PAGE_SIZE: u16;

    /// Erase granularity in bytes; a multiple of [`Self::PAGE_SIZE`] on
    /// chips whose erase operation covers several write pages.
    const ERASE_SIZE: u16 = Self::PAGE_SIZE;

    /// First byte address of the reserved bootloader region. Must be a
    /// multiple of [`Self::ERASE_SIZE`].
    const BOOTLOADER_ADDRESS: u16;

    /// Whether erase/write operations stall instruction fetch. When false
    /// the commit engine busy-waits after each operation instead.
    const WRITE_HALTS_FETCH: bool;

    /// Page write duration hint in milliseconds, reported to the host.
    /// Bit 7 set means a page erase takes a quarter of the write time.
    const WRITE_TIMING_MS: u8;

    /// Device signature bytes reported to the host.
    const SIGNATURE: [u8; 2];

    /// Jump form used when patching the reset vector, derived from whether
    /// the reserved region is reachable with a relative jump.
    const VECTOR_PATCH: VectorPatch = if Self::BOOTLOADER_ADDRESS < 0x2000 {
        VectorPatch::Relative
    } else {
        VectorPatch::Absolute
    };

    /// Load one word into the hardware page buffer.
    fn fill_word(&mut self, address: u16, word: u16);

    /// Discard any stale contents of the page buffer.
    fn clear_buffer(&mut self);

    /// Erase the page containing `address`.
    fn erase_page(&mut self, address: u16);

    /// Commit the page buffer to the page containing `address`.
    fn write_page(&mut self, address: u16);

    /// Block until a pending erase/write has physically completed. Only
    /// called on chips with `WRITE_HALTS_FETCH == false`.
    fn busy_wait(&mut self);

    /// Read one byte of program memory.
    fn read_byte(&self, address: u16) -> u8;

    /// Restore normal read access to the reprogrammed region before
    /// handoff, on chips that gate it.
    fn enable_read(&mut self) {}
}
