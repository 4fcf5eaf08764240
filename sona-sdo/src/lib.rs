//! Signal data objects: a uniform in-memory representation of sampled
//! and framed signals together with a polymorphic file I/O layer for
//! the supported speech/audio file formats.

pub mod aucheck;
pub mod dataobj;
pub mod error;
pub mod fio;
pub mod formats;
pub mod frame;
pub mod keywords;
pub mod label;
pub mod time;

pub use dataobj::{
    AscFormat, Backing, DataBuffer, DataCoding, DataDescriptor, DataFormat, DataObject, DataType,
    FileData, FileFormat, GenericData, MetaVar, OpenMode,
};
pub use error::{message_for, Result, SonaError};
pub use fio::{read_line_any, CloseAction, FlushOpts};
pub use frame::{get_sample_slice, ANA_BUF_BYTES};
pub use label::{add_label, estimate_ref_rate, Label, LabelPosition};

pub use sona_codec::{Endian, Orientation};
