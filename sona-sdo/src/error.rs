//! The library-wide error taxonomy.
//!
//! Every error carries a short integer code compatible with the
//! historical registry: `0xA0xx` for warnings, `0xAExx` for errors, with
//! the second-to-last nibble selecting the class (general, audio, bug,
//! command, data, file).

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SonaError>;

#[derive(Debug, Error)]
pub enum SonaError {
    /// Programming errors; fatal at the operation.
    #[error("programming error: {0}")]
    Bug(String),
    #[error("invalid arguments in call to {0}")]
    BadArgs(&'static str),
    #[error("insufficient space in data buffer ({0})")]
    BufferSpace(&'static str),
    #[error("unknown/invalid window function '{0}'")]
    BadWindow(String),
    #[error("invalid pre-emphasis value {0}")]
    BadEmphasis(f64),
    #[error("no track name available ({0})")]
    NoTrackName(&'static str),

    /// Command line errors; CLI-local.
    #[error("unknown option {0}")]
    BadOption(String),
    #[error("bad option value {0}")]
    BadValue(String),

    /// Semantic data problems; recoverable by choosing other options.
    #[error("no data available {0}")]
    NoData(String),
    #[error("unknown data type")]
    BadDataType,
    #[error("unknown data format")]
    BadDataFormat,
    #[error("can't handle data format {0}")]
    NoHandle(String),
    #[error("incorrect data type {0}")]
    WrongDataType(String),
    #[error("incorrect data format {0}")]
    WrongDataFormat(String),
    #[error("incorrect data rate {0}")]
    WrongDataRate(String),
    #[error("empty/invalid data range ({0})")]
    BadRange(&'static str),
    #[error("window size undefined or too small ({0})")]
    BadSize(&'static str),
    #[error("incompatible with existing data: {0}")]
    Incompatible(String),
    #[error("no audio signal {0}")]
    NoAudio(String),

    /// File problems.
    #[error("file {0} does not exist")]
    FileMissing(String),
    #[error("file {0} is empty")]
    FileEmpty(String),
    #[error("can't open file {path}: {source}")]
    FileOpen { path: String, source: io::Error },
    #[error("can't seek in file {0}")]
    FileSeek(String),
    #[error("can't read file {0}")]
    FileRead(String),
    #[error("can't write file {0}")]
    FileWrite(String),
    #[error("seek past end of file {0}")]
    FileEof(String),
    #[error("unknown file format {0}")]
    UnknownFormat(String),
    #[error("corrupted file header in {path}: {detail}")]
    BadHeader { path: String, detail: String },
    #[error("incorrect file format {0}")]
    WrongFormat(String),
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("out of memory in {0}")]
    Memory(&'static str),
    #[error("not yet implemented: {0}")]
    NotYet(&'static str),
}

impl SonaError {
    /// The short integer code of the historical registry.
    pub fn code(&self) -> u16 {
        use SonaError::*;
        match self {
            Bug(_) => 0xAE00,
            Memory(_) => 0xAE03,
            NotYet(_) => 0xAE0E,
            BadArgs(_) => 0xAEB0,
            BufferSpace(_) => 0xAEB5,
            BadWindow(_) => 0xAEB6,
            BadEmphasis(_) => 0xAEB7,
            NoTrackName(_) => 0xAEB9,
            BadOption(_) => 0xAEC0,
            BadValue(_) => 0xAEC1,
            NoData(_) => 0xAED0,
            BadDataType => 0xAED1,
            BadDataFormat => 0xAED2,
            NoHandle(_) => 0xAED3,
            WrongDataType(_) => 0xAED4,
            WrongDataFormat(_) => 0xAED5,
            WrongDataRate(_) => 0xAED6,
            BadRange(_) => 0xAED7,
            BadSize(_) => 0xAED8,
            Incompatible(_) => 0xAED9,
            NoAudio(_) => 0xAEDA,
            FileMissing(_) => 0xAEF1,
            FileEmpty(_) => 0xAEF3,
            FileOpen { .. } => 0xAEF4,
            FileSeek(_) => 0xAEF5,
            FileRead(_) => 0xAEF6,
            FileWrite(_) => 0xAEF7,
            FileEof(_) => 0xAEFA,
            UnknownFormat(_) => 0xAEFB,
            BadHeader { .. } => 0xAEFC,
            WrongFormat(_) => 0xAEFD,
            Io(_) => 0xAE01,
        }
    }

    /// True for the bug class (`0xAEBx` plus the generic bug code).
    pub fn is_bug(&self) -> bool {
        let code = self.code();
        code == 0xAE00 || (code & 0xFFF0) == 0xAEB0
    }
}

/// Warning codes of the registry.
pub const AWG_WARN_BUG: u16 = 0xA000;
pub const AWG_ERR_ROUND: u16 = 0xA004;
pub const AWD_NO_DATA: u16 = 0xA0D0;
pub const AWF_RAW_FORM: u16 = 0xA0F1;
pub const AWF_EMPTY: u16 = 0xA0F3;

const MESSAGES: &[(u16, &str)] = &[
    (0xA000, "WARNING: programming error"),
    (0xA001, "WARNING"),
    (0xA002, "WARNING"),
    (0xA003, "WARNING: not enough memory"),
    (0xA004, "WARNING: rounding error"),
    (0xA0D0, "WARNING: no data available"),
    (0xA0DA, "WARNING: no audio signal"),
    (0xA0F0, "WARNING: bad header item"),
    (0xA0F1, "WARNING: unknown file format; using RAW settings"),
    (0xA0F3, "WARNING: empty file"),
    (0xAE00, "ERROR: programming error"),
    (0xAE01, "ERROR"),
    (0xAE02, "ERROR"),
    (0xAE03, "ERROR: out of memory"),
    (0xAE04, "ERROR: rounding error"),
    (0xAE0E, "ERROR: not yet implemented"),
    (0xAE0F, "FATAL ERROR"),
    (0xAEB0, "ERROR: invalid arguments in function call"),
    (0xAEB1, "ERROR: invalid function call"),
    (0xAEB2, "ERROR: attempt to access data before begin of file"),
    (0xAEB3, "ERROR: attempt to access data behind end of file"),
    (0xAEB4, "ERROR: attempt to access data not in buffer"),
    (0xAEB5, "ERROR: insufficient space in data buffer"),
    (0xAEB6, "ERROR: unknown/invalid window function"),
    (0xAEB7, "ERROR: invalid preemphasis value"),
    (0xAEB9, "ERROR: no track name available"),
    (0xAEC0, "ERROR: unknown option"),
    (0xAEC1, "ERROR: bad option value"),
    (0xAEC2, "ERROR: argument missing"),
    (0xAEC3, "ERROR: too many arguments"),
    (0xAEC4, "ERROR: output would overwrite input file"),
    (0xAED0, "ERROR: no data available"),
    (0xAED1, "ERROR: unknown data type"),
    (0xAED2, "ERROR: unknown data format"),
    (0xAED3, "ERROR: can't handle data format"),
    (0xAED4, "ERROR: incorrect data type"),
    (0xAED5, "ERROR: incorrect data format"),
    (0xAED6, "ERROR: incorrect data rate"),
    (0xAED7, "ERROR: empty/invalid data range"),
    (0xAED8, "ERROR: window size undefined or too small"),
    (0xAED9, "ERROR: incompatible with existing data"),
    (0xAEDA, "ERROR: no audio signal"),
    (0xAEF0, "ERROR: file not open"),
    (0xAEF1, "ERROR: file does not exist"),
    (0xAEF2, "ERROR: file already exists"),
    (0xAEF3, "ERROR: empty file"),
    (0xAEF4, "ERROR: can't open file"),
    (0xAEF5, "ERROR: can't seek in file"),
    (0xAEF6, "ERROR: can't read file"),
    (0xAEF7, "ERROR: can't write file"),
    (0xAEFA, "ERROR: attempt to seek past end of file"),
    (0xAEFB, "ERROR: unknown file format"),
    (0xAEFC, "ERROR: corrupted file header"),
    (0xAEFD, "ERROR: incorrect file format"),
];

/// Resolves a registry code to its message text.
///
/// An unknown code yields the generic programming-error message with a
/// human-readable `code=0xNNNN` appendix.
pub fn message_for(code: u16) -> String {
    match MESSAGES.iter().find(|(num, _)| *num == code) {
        Some((_, text)) => (*text).to_string(),
        None => format!("ERROR: programming error\ncode=0x{code:04X}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_registry() {
        assert_eq!(SonaError::BadArgs("x").code(), 0xAEB0);
        assert_eq!(SonaError::NoAudio(String::new()).code(), 0xAEDA);
        assert_eq!(SonaError::UnknownFormat(String::new()).code(), 0xAEFB);
        assert!(SonaError::BadArgs("x").is_bug());
        assert!(!SonaError::NoData(String::new()).is_bug());
    }

    #[test]
    fn unknown_code_appends_hex() {
        let msg = message_for(0x1234);
        assert!(msg.starts_with("ERROR: programming error"));
        assert!(msg.ends_with("code=0x1234"));
        assert_eq!(message_for(0xAED6), "ERROR: incorrect data rate");
    }
}
