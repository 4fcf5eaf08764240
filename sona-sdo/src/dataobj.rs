//! The signal data object: a uniform in-memory representation of a
//! sampled or framed signal, its record layout and its (optional) file
//! binding.

use crate::error::{Result, SonaError};
use crate::label::Label;
use std::any::Any;
use std::fmt;
use std::fs::File;
use std::path::PathBuf;

/// File formats. Not every format listed is writable; see the format
/// driver table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    #[default]
    Undefined,
    /// headerless or unsupported format
    Raw,
    /// xassp ASCII
    Xassp,
    /// labels in IPdS 'MIX' format
    IpdsMix,
    /// labels in IPdS 'SAMPA' format
    IpdsSampa,
    /// Apple Audio Interchange File Format
    Aiff,
    /// AIFF extended for compressed data
    Aifc,
    /// Kay Elemetrics Computerized Speech Lab
    Csl,
    /// Kungliga Tekniska Hoegskolan Stockholm / snack
    Kth,
    /// Sun/NeXT audio format
    Snd,
    /// NIST SPeech HEader REsources
    Nist,
    /// Simple Signal File Format
    Ssff,
    /// IBM/Microsoft RIFF-WAVE
    Wave,
    /// RIFF-WAVE extensible format
    WaveX,
    /// ESPS xlabel
    Xlabel,
}

/// Basic data layout in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileData {
    #[default]
    Undefined,
    Ascii,
    Binary,
}

/// Semantic kind of the data in one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataType {
    #[default]
    Undefined,
    /// time in seconds
    Time,
    /// record/sample/frame number
    RecordNr,
    /// sampled data (audio/sound/speech)
    Sample,
    /// peak magnitude
    Magnitude,
    /// energy (sum of squares)
    Energy,
    /// power (mean energy)
    Power,
    /// RMS amplitude (dB)
    Rms,
    /// zero-crossing rate
    Zcr,
    /// pitch/F0
    Pitch,
    /// normalized 1st autocorrelation coefficient
    Ac1,
    /// 1st order LP coefficient
    Lp1,
    /// probability
    Probability,
    /// autocorrelation function
    Acf,
    /// cross-correlation function
    Ccf,
    /// LP filter (A-) coefficients
    Lpc,
    /// reflection coefficients
    Rfc,
    /// area function
    Arf,
    /// log area ratios
    Lar,
    /// cepstral coefficients from LP
    LpCepstrum,
    /// filter gain (dB)
    Gain,
    /// PQ parameters (2nd order filters)
    Pqp,
    /// formant frequencies and bandwidths
    Ffb,
    /// formant frequencies
    Ffr,
    /// formant bandwidths
    Fbw,
    /// complex spectrum
    Dft,
    /// linear amplitude spectrum
    FtAmplitude,
    /// linear power spectrum
    FtSquare,
    /// power spectrum in dB
    FtPower,
    /// phase spectrum
    FtPhase,
    /// LP smoothed spectrum
    FtLpSmoothed,
    /// cepstrally smoothed spectrum
    FtCepSmoothed,
    /// cepstrum
    FtCepstrum,
    /// mel frequency cepstral coefficients
    Mfcc,
    /// general annotation
    Tag,
    /// markers (unique name for a point in time)
    Marker,
    /// labels (descriptive name for a stretch)
    Label,
    /// epochs
    Epoch,
    /// electro-palatograph data
    Epg,
    /// electro-magnetic articulograph data
    Ema,
}

impl DataType {
    pub fn is_label(self) -> bool {
        matches!(self, DataType::Tag | DataType::Marker | DataType::Label)
    }
}

/// Physical encoding of one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataFormat {
    #[default]
    Undefined,
    /// bit array
    Bit,
    /// variable length character array
    Str,
    Char,
    UInt8,
    Int8,
    UInt16,
    Int16,
    /// packed 3-byte integer
    UInt24,
    Int24,
    UInt32,
    Int32,
    UInt64,
    Int64,
    /// IEEE 754 single precision
    Real32,
    /// IEEE 754 double precision
    Real64,
}

impl DataFormat {
    /// Storage size of one value in bytes; 0 for variable-size formats.
    pub fn size(self) -> usize {
        use DataFormat::*;
        match self {
            Undefined | Bit | Str => 0,
            Char | UInt8 | Int8 => 1,
            UInt16 | Int16 => 2,
            UInt24 | Int24 => 3,
            UInt32 | Int32 | Real32 => 4,
            UInt64 | Int64 | Real64 => 8,
        }
    }

    pub fn is_integer(self) -> bool {
        use DataFormat::*;
        matches!(
            self,
            UInt8 | Int8 | UInt16 | Int16 | UInt24 | Int24 | UInt32 | Int32 | UInt64 | Int64
        )
    }
}

/// Interpretation of the raw values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataCoding {
    #[default]
    Undefined,
    /// linear: plain numbers in 2's complement / IEEE 754 (PCM)
    Linear,
    /// integer in binary offset
    BinaryOffset,
    /// IEEE float normalized to [-1, 1]
    FloatNorm,
    /// CCITT G.711 A-law
    Alaw,
    /// CCITT G.711 mu-law
    Ulaw,
    /// declared only; data cannot be processed
    Adpcm,
    G721,
    G722,
    G723_3,
    G723_5,
    MsAdpcm,
    IdviAdpcm,
    Mpeg3,
    /// IPdS MIX label lines
    Mix,
    /// IPdS SAMPA label lines
    Sampa,
    /// ESPS xlabel lines
    Xlbl,
}

/// Numeric format for one value in ASCII output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AscFormat {
    #[default]
    Undefined,
    /// fixed precision, e.g. `%.2f`
    Fixed { precision: usize },
    /// scientific with explicit sign, e.g. `%+.14e`
    Scientific { accuracy: usize },
}

impl AscFormat {
    pub fn format(&self, val: f64) -> String {
        match *self {
            AscFormat::Undefined => format!("{val}"),
            AscFormat::Fixed { precision } => format!("{val:.precision$}"),
            AscFormat::Scientific { accuracy } => format!("{val:+.accuracy$e}"),
        }
    }
}

/// Describes one logical field (track) within a record.
#[derive(Debug, Clone, Default)]
pub struct DataDescriptor {
    /// track name, e.g. "audio", "rms", "fm"
    pub ident: Option<String>,
    /// unit, e.g. "Hz"
    pub unit: String,
    /// factor/SI prefix, e.g. "k"
    pub factor: String,
    pub dtype: DataType,
    pub format: DataFormat,
    pub coding: DataCoding,
    /// begin/end marks for labels, view/facing for articulatory data
    pub orientation: sona_codec::Orientation,
    /// significant bits per value (at most the storage size)
    pub num_bits: u16,
    /// value representing zero in binary offset codings
    pub zero_value: u32,
    /// byte offset of this field within one binary record
    pub offset: usize,
    /// scalar multiplicity (channels, order + 1, ...)
    pub num_fields: usize,
    /// format of a single value in ASCII output
    pub asc_format: AscFormat,
    /// field separator(s) for ASCII data
    pub sep_chars: String,
}

impl DataDescriptor {
    pub fn new(dtype: DataType, format: DataFormat) -> Self {
        DataDescriptor {
            dtype,
            format,
            coding: DataCoding::Linear,
            num_fields: 1,
            ..Default::default()
        }
    }

    /// Total byte size of this field in a binary record.
    pub fn byte_size(&self) -> usize {
        self.format.size() * self.num_fields
    }
}

/// Analysis-specific parameter block attached to a data object.
pub trait GenericData: Any + fmt::Debug {
    fn ident(&self) -> &str;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A named header variable (richly used by SSFF only). Unknown keys are
/// preserved round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaVar {
    pub ident: String,
    pub value: String,
}

/// Record store of a data object.
#[derive(Debug, Default)]
pub struct DataBuffer {
    /// raw records in host byte order
    pub data: Vec<u8>,
    /// capacity in records
    pub max_buf_recs: i64,
    /// absolute number of the first record held
    pub buf_start_rec: i64,
    /// valid records held
    pub buf_num_recs: i64,
    pub needs_save: bool,
}

/// How the object is (or is not) bound to a file.
#[derive(Debug, Default)]
pub enum Backing {
    /// purely in-memory
    #[default]
    None,
    File {
        handle: File,
        mode: OpenMode,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
    Update,
}

impl OpenMode {
    pub fn readable(self) -> bool {
        matches!(self, OpenMode::Read | OpenMode::Update)
    }

    pub fn writable(self) -> bool {
        matches!(self, OpenMode::Write | OpenMode::Update)
    }
}

/// The signal data object.
///
/// Valid both bound to a file and purely in-memory. It owns its record
/// buffer, knows the record layout through the descriptor list and
/// serves random access reads/writes by absolute record number.
#[derive(Debug, Default)]
pub struct DataObject {
    pub file_path: Option<PathBuf>,
    pub backing: Backing,
    pub file_format: FileFormat,
    pub file_data: FileData,
    /// byte order of the file header and/or data
    pub file_endian: sona_codec::Endian,
    /// version number of the format/header
    pub version: i64,
    /// size of the header in bytes (offset to the data)
    pub header_size: u64,
    /// (reference) sampling frequency in Hz
    pub samp_freq: f64,
    /// actual data rate in Hz
    pub data_rate: f64,
    /// frame duration / window shift in samples (1 for audio, -1 for
    /// variable rate)
    pub frame_dur: i64,
    /// bytes per record (0 = variable)
    pub record_size: usize,
    /// absolute number of the first record in the file
    pub start_record: i64,
    /// records/frames/samples-per-track in the file
    pub num_records: i64,
    /// time in the foreign convention corresponding to 0 in ASSP time
    pub time_zero: f64,
    /// reference time of the first record in the file
    pub start_time: f64,
    /// block separator(s) for ASCII data
    pub sep_chars: String,
    /// end-of-line character(s) in header and/or data
    pub eol: String,
    /// data/parameter descriptor list (the record layout)
    pub descriptors: Vec<DataDescriptor>,
    /// named header variables
    pub meta: Vec<MetaVar>,
    /// analysis-specific parameter block
    pub generic: Option<Box<dyn GenericData>>,
    pub buffer: DataBuffer,
    /// label records (used instead of `buffer` by label formats)
    pub labels: Vec<Label>,
}

impl DataObject {
    pub fn new() -> Self {
        let mut dop = DataObject::default();
        dop.frame_dur = -1;
        dop
    }

    /// Copies the description of another object: format, rates, layout
    /// and metadata. Buffer contents, labels, the generic block and any
    /// file binding are not copied.
    pub fn copy_from(&mut self, src: &DataObject) {
        self.file_path = None;
        self.backing = Backing::None;
        self.file_format = src.file_format;
        self.file_data = src.file_data;
        self.file_endian = src.file_endian;
        self.version = src.version;
        self.header_size = src.header_size;
        self.samp_freq = src.samp_freq;
        self.data_rate = src.data_rate;
        self.frame_dur = src.frame_dur;
        self.record_size = src.record_size;
        self.start_record = src.start_record;
        self.num_records = src.num_records;
        self.time_zero = src.time_zero;
        self.start_time = src.start_time;
        self.sep_chars = src.sep_chars.clone();
        self.eol = src.eol.clone();
        self.descriptors = src.descriptors.clone();
        self.meta = src.meta.clone();
        self.generic = None;
        self.buffer = DataBuffer::default();
        self.labels = Vec::new();
    }

    pub fn is_file_bound(&self) -> bool {
        matches!(self.backing, Backing::File { .. })
    }

    pub fn file_handle(&mut self) -> Option<&mut File> {
        match &mut self.backing {
            Backing::File { handle, .. } => Some(handle),
            Backing::None => None,
        }
    }

    pub fn open_mode(&self) -> Option<OpenMode> {
        match &self.backing {
            Backing::File { mode, .. } => Some(*mode),
            Backing::None => None,
        }
    }

    /// Appends a fresh descriptor and returns it for filling in.
    /// Layout offsets are left to be recomputed by [`set_record_size`].
    ///
    /// [`set_record_size`]: DataObject::set_record_size
    pub fn add_descriptor(&mut self) -> &mut DataDescriptor {
        self.descriptors.push(DataDescriptor::default());
        self.descriptors.last_mut().unwrap()
    }

    /// Finds a descriptor by data type and/or track name.
    pub fn find_descriptor(&self, dtype: DataType, ident: Option<&str>) -> Option<&DataDescriptor> {
        self.descriptors.iter().find(|dd| {
            let type_ok = dtype == DataType::Undefined || dd.dtype == dtype;
            let name_ok = match ident {
                Some(name) => dd.ident.as_deref() == Some(name),
                None => true,
            };
            type_ok && name_ok
        })
    }

    /// Walks the descriptor list, assigns the field offsets left-to-right
    /// packed and sets `record_size`.
    pub fn set_record_size(&mut self) -> Result<()> {
        let mut offset = 0usize;
        let mut variable = false;
        for dd in self.descriptors.iter_mut() {
            if dd.num_fields < 1 {
                return Err(SonaError::Bug(String::from(
                    "set_record_size: descriptor without fields",
                )));
            }
            match dd.format {
                DataFormat::Undefined => {
                    return Err(SonaError::BadDataFormat);
                }
                DataFormat::Str | DataFormat::Bit => {
                    // variable-size records (labels etc.)
                    variable = true;
                }
                _ => {
                    dd.offset = offset;
                    offset += dd.byte_size();
                }
            }
        }
        self.record_size = if variable { 0 } else { offset };
        Ok(())
    }

    /// Enforces consistency between `samp_freq`, `data_rate` and
    /// `frame_dur`.
    pub fn check_rates(&mut self) -> Result<()> {
        if self.frame_dur > 0 {
            if self.samp_freq <= 0.0 {
                return Err(SonaError::WrongDataRate(String::from(
                    "sampling frequency undefined",
                )));
            }
            let rate = self.samp_freq / self.frame_dur as f64;
            if self.data_rate > 0.0 && (self.data_rate - rate).abs() > 1.0e-9 * rate {
                return Err(SonaError::WrongDataRate(format!(
                    "data rate {} clashes with frame duration {}",
                    self.data_rate, self.frame_dur
                )));
            }
            self.data_rate = rate;
        } else if self.frame_dur == 0 {
            if self.data_rate > 0.0 && self.samp_freq > 0.0 {
                let ratio = self.samp_freq / self.data_rate;
                if (ratio - ratio.round()).abs() < 1.0e-9 && ratio >= 1.0 {
                    self.frame_dur = ratio.round() as i64;
                } else {
                    return Err(SonaError::WrongDataRate(format!(
                        "data rate {} is no integral divisor of {}",
                        self.data_rate, self.samp_freq
                    )));
                }
            } else {
                return Err(SonaError::WrongDataRate(String::from(
                    "frame duration and data rate undefined",
                )));
            }
        } else if self.data_rate <= 0.0 {
            // variable frame duration needs an explicit rate
            return Err(SonaError::WrongDataRate(String::from(
                "variable-rate data without data rate",
            )));
        }
        Ok(())
    }

    /// Recomputes `start_time` from the alignment constants:
    /// `Start_Time = Time_Zero + startRecord / dataRate`.
    pub fn set_start_time(&mut self) {
        let rate = if self.data_rate > 0.0 {
            self.data_rate
        } else if self.frame_dur > 0 && self.samp_freq > 0.0 {
            self.samp_freq / self.frame_dur as f64
        } else {
            self.samp_freq
        };
        if rate > 0.0 {
            self.start_time = self.time_zero + self.start_record as f64 / rate;
        }
    }

    /// Converts between the foreign timing convention of the file format
    /// and ASSP time.
    pub fn foreign_time(&self, t: f64, to_assp: bool) -> f64 {
        if to_assp {
            t - self.time_zero
        } else {
            t + self.time_zero
        }
    }

    /// Allocates the record buffer for `num_records` records. Any
    /// previous contents are dropped.
    pub fn alloc_data_buffer(&mut self, num_records: i64) -> Result<()> {
        if self.record_size < 1 || num_records < 1 {
            return Err(SonaError::Bug(String::from(
                "alloc_data_buffer: invalid record size or count",
            )));
        }
        self.buffer.data = vec![0u8; num_records as usize * self.record_size];
        self.buffer.max_buf_recs = num_records;
        self.buffer.buf_start_rec = 0;
        self.buffer.buf_num_recs = 0;
        self.buffer.needs_save = false;
        Ok(())
    }

    /// Declares the buffer contents invalid; capacity is kept.
    pub fn clear_data_buffer(&mut self) {
        self.buffer.buf_num_recs = 0;
        self.buffer.needs_save = false;
    }

    /// Releases the record buffer.
    pub fn free_data_buffer(&mut self) {
        self.buffer = DataBuffer::default();
    }

    /// The bytes of the buffered record with index `ndx` (relative to
    /// `buf_start_rec`).
    pub fn record_bytes(&self, ndx: i64) -> &[u8] {
        let from = ndx as usize * self.record_size;
        &self.buffer.data[from..from + self.record_size]
    }

    pub fn record_bytes_mut(&mut self, ndx: i64) -> &mut [u8] {
        let from = ndx as usize * self.record_size;
        &mut self.buffer.data[from..from + self.record_size]
    }

    /// Swaps the byte order of one record in place, field by field.
    pub fn swap_record(descriptors: &[DataDescriptor], record: &mut [u8]) {
        for dd in descriptors {
            let size = dd.format.size();
            if size < 2 {
                continue;
            }
            for i in 0..dd.num_fields {
                let at = dd.offset + i * size;
                record[at..at + size].reverse();
            }
        }
    }

    /// Swaps the byte order of all valid records in the buffer.
    pub fn swap_data_buffer(&mut self) {
        if self.record_size == 0 {
            return;
        }
        let n = self.buffer.buf_num_recs.max(0) as usize;
        let descriptors = &self.descriptors;
        for rec in self.buffer.data.chunks_exact_mut(self.record_size).take(n) {
            Self::swap_record(descriptors, rec);
        }
    }

    /// Swaps a block of equally sized units in place (e.g. a raw sample
    /// block without record structure).
    pub fn block_swap(block: &mut [u8], unit_size: usize) {
        if unit_size < 2 {
            return;
        }
        for unit in block.chunks_exact_mut(unit_size) {
            unit.reverse();
        }
    }

    /// Whether the audio data needs a byte swap between file and host.
    pub fn needs_swap(&self) -> bool {
        self.file_endian.differs_from(sona_codec::Endian::native())
    }

    /// Decodes the sample of track field `field` (0-based) from a record
    /// held in the buffer, into the processing domain.
    pub fn decode_sample(dd: &DataDescriptor, record: &[u8], field: usize) -> f64 {
        use DataFormat::*;
        let size = dd.format.size();
        let at = dd.offset + field * size;
        let raw = &record[at..at + size.max(1)];
        match dd.format {
            UInt8 => match dd.coding {
                DataCoding::Alaw => sona_codec::alaw_to_i16(raw[0]) as f64,
                DataCoding::Ulaw => sona_codec::ulaw_to_i16(raw[0]) as f64,
                DataCoding::BinaryOffset => sona_codec::binoff8_to_i16(raw[0]) as f64,
                _ => sona_codec::binoff8_to_i16(raw[0]) as f64,
            },
            Int8 => match dd.coding {
                DataCoding::Alaw => sona_codec::alaw_to_i16(raw[0] as u8) as f64,
                DataCoding::Ulaw => sona_codec::ulaw_to_i16(raw[0] as u8) as f64,
                _ => raw[0] as i8 as f64,
            },
            UInt16 => {
                let v = u16::from_ne_bytes([raw[0], raw[1]]);
                sona_codec::binoff16_to_i16(v, dd.num_bits) as f64
            }
            Int16 => i16::from_ne_bytes([raw[0], raw[1]]) as f64,
            UInt24 | Int24 => {
                let bytes = [raw[0], raw[1], raw[2]];
                if dd.coding == DataCoding::BinaryOffset || dd.format == UInt24 {
                    sona_codec::binoff24_to_i32(&bytes, dd.num_bits, sona_codec::Endian::native())
                        as f64
                } else {
                    sona_codec::i24_to_i32(&bytes, sona_codec::Endian::native()) as f64
                }
            }
            UInt32 => {
                let v = u32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]) as i64;
                let offset: i64 = if dd.num_bits >= 1 && dd.num_bits <= 31 {
                    1 << (dd.num_bits - 1)
                } else {
                    1 << 31
                };
                (v - offset) as f64
            }
            Int32 => i32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]) as f64,
            Real32 => f32::from_ne_bytes([raw[0], raw[1], raw[2], raw[3]]) as f64,
            Real64 => f64::from_ne_bytes([
                raw[0], raw[1], raw[2], raw[3], raw[4], raw[5], raw[6], raw[7],
            ]),
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio_object(channels: usize) -> DataObject {
        let mut dop = DataObject::new();
        dop.samp_freq = 16000.0;
        dop.frame_dur = 1;
        let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::Int16);
        dd.num_fields = channels;
        dop.descriptors.push(dd);
        dop.set_record_size().unwrap();
        dop.check_rates().unwrap();
        dop
    }

    #[test]
    fn record_size_covers_all_fields() {
        let mut dop = DataObject::new();
        let mut dd = DataDescriptor::new(DataType::Rms, DataFormat::Real32);
        dd.num_fields = 1;
        dop.descriptors.push(dd);
        let mut dd = DataDescriptor::new(DataType::Gain, DataFormat::Real32);
        dd.num_fields = 1;
        dop.descriptors.push(dd);
        let mut dd = DataDescriptor::new(DataType::Rfc, DataFormat::Real64);
        dd.num_fields = 19;
        dop.descriptors.push(dd);
        dop.set_record_size().unwrap();
        assert_eq!(dop.descriptors[0].offset, 0);
        assert_eq!(dop.descriptors[1].offset, 4);
        assert_eq!(dop.descriptors[2].offset, 8);
        assert_eq!(dop.record_size, 8 + 19 * 8);
    }

    #[test]
    fn record_size_rejects_undefined_format() {
        let mut dop = DataObject::new();
        dop.descriptors.push(DataDescriptor {
            num_fields: 1,
            ..Default::default()
        });
        assert!(dop.set_record_size().is_err());
    }

    #[test]
    fn rates_audio() {
        let dop = audio_object(1);
        assert_eq!(dop.data_rate, 16000.0);
        let mut dop = audio_object(1);
        dop.frame_dur = 80;
        dop.data_rate = 0.0;
        dop.check_rates().unwrap();
        assert_eq!(dop.data_rate, 200.0);
    }

    #[test]
    fn start_time_from_alignment() {
        let mut dop = DataObject::new();
        dop.data_rate = 200.0;
        dop.start_record = 250;
        dop.set_start_time();
        assert_eq!(dop.start_time, 1.25);
        dop.time_zero = 0.5;
        dop.set_start_time();
        assert_eq!(dop.start_time, 1.75);
        assert_eq!(dop.foreign_time(1.75, true), 1.25);
        assert_eq!(dop.foreign_time(1.25, false), 1.75);
    }

    #[test]
    fn buffer_allocation_and_access() {
        let mut dop = audio_object(2);
        dop.alloc_data_buffer(16).unwrap();
        assert_eq!(dop.buffer.data.len(), 16 * 4);
        let mut rec = Vec::new();
        rec.extend_from_slice(&1234i16.to_ne_bytes());
        rec.extend_from_slice(&5678i16.to_ne_bytes());
        dop.record_bytes_mut(3).copy_from_slice(&rec);
        let dd = dop.descriptors[0].clone();
        let rec = dop.record_bytes(3);
        assert_eq!(DataObject::decode_sample(&dd, rec, 0), 1234.0);
        assert_eq!(DataObject::decode_sample(&dd, rec, 1), 5678.0);
    }

    #[test]
    fn swap_record_reverses_fields() {
        let dop = audio_object(2);
        let mut rec = [0x12u8, 0x34, 0x56, 0x78];
        DataObject::swap_record(&dop.descriptors, &mut rec);
        assert_eq!(rec, [0x34, 0x12, 0x78, 0x56]);
    }

    #[test]
    fn decode_coded_samples() {
        let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::UInt8);
        dd.coding = DataCoding::Ulaw;
        let code = sona_codec::i16_to_ulaw(1000);
        assert_eq!(
            DataObject::decode_sample(&dd, &[code], 0),
            sona_codec::ulaw_to_i16(code) as f64
        );
        let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::UInt16);
        dd.coding = DataCoding::BinaryOffset;
        dd.num_bits = 12;
        let raw = 2048u16.to_ne_bytes();
        assert_eq!(DataObject::decode_sample(&dd, &raw, 0), 0.0);
    }

    #[test]
    fn find_descriptor_by_type_and_name() {
        let mut dop = DataObject::new();
        let mut dd = DataDescriptor::new(DataType::Rms, DataFormat::Real32);
        dd.ident = Some(String::from("rms"));
        dop.descriptors.push(dd);
        assert!(dop.find_descriptor(DataType::Rms, None).is_some());
        assert!(dop.find_descriptor(DataType::Rms, Some("rms")).is_some());
        assert!(dop.find_descriptor(DataType::Zcr, None).is_none());
        assert!(dop.find_descriptor(DataType::Undefined, Some("rms")).is_some());
    }
}
