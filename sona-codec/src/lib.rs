//! Bit- and byte-level codecs shared by the file I/O and analysis layers.
//!
//! All conversion functions are total on their input domain; encoders
//! saturate silently on overflow.

mod bits;
mod endian;
mod g711;
mod ieee;
mod pcm;

pub use bits::{bit_clr, bit_set, bit_val};
pub use endian::{Endian, Orientation};
pub use g711::{alaw_to_i16, alaw_to_ulaw, i16_to_alaw, i16_to_ulaw, ulaw_to_alaw, ulaw_to_i16};
pub use ieee::{read_ieee_extended, write_ieee_extended, XFP_SIZE};
pub use pcm::{
    binoff16_to_i16, binoff24_to_i32, binoff8_to_i16, binoff8_to_i8, i24_to_i32, i32_to_i24,
};
