pub mod board;
pub mod flash;
pub mod usb;

// Re-export the seam types used throughout the crate
pub use board::Board;
pub use flash::{ProgramMemory, VectorPatch};
pub use usb::{ControlRequest, UsbLink};
