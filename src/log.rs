//! Trace hooks. With the `defmt-log` feature these forward to `defmt`;
//! otherwise they compile to nothing, which is what a code-size-constrained
//! bootloader wants when no probe is attached.

#[cfg(feature = "defmt-log")]
pub(crate) use defmt::{info, trace};

#[cfg(not(feature = "defmt-log"))]
macro_rules! info {
    ( $( $x:expr ),* $(,)? ) => {};
}

#[cfg(not(feature = "defmt-log"))]
macro_rules! trace {
    ( $( $x:expr ),* $(,)? ) => {};
}

#[cfg(not(feature = "defmt-log"))]
pub(crate) use {info, trace};
