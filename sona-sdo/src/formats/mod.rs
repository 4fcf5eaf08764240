//! Format drivers: magic probing, header parsing and header emission.
//!
//! Every recognized format has one driver module with a `read_header`
//! and (where writing is supported) a `write_header` function. The
//! probing order follows the reliability of the magic patterns.

pub mod aiff;
pub mod csl;
pub mod kth;
pub mod mix;
pub mod nist;
pub mod raw;
pub mod sampa;
pub mod snd;
pub mod ssff;
pub mod wave;
pub mod xassp;
pub mod xlabel;

use crate::dataobj::{DataObject, FileData, FileFormat};
use crate::error::{Result, SonaError};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Bytes inspected for magic detection.
const PROBE_SIZE: usize = 1024;

/// Determines the file format from the first bytes of the file.
/// Unrecognized contents fall back to headerless RAW with a warning.
pub fn guess_format(head: &[u8], path: &Path) -> (FileFormat, FileData) {
    if head.len() >= 12 && &head[0..4] == b"FORM" {
        if &head[8..12] == b"AIFF" {
            return (FileFormat::Aiff, FileData::Binary);
        }
        if &head[8..12] == b"AIFC" {
            return (FileFormat::Aifc, FileData::Binary);
        }
        if &head[4..8] == b"DS16" {
            return (FileFormat::Csl, FileData::Binary);
        }
    }
    if head.len() >= 12 && &head[0..4] == b"RIFF" && &head[8..12] == b"WAVE" {
        return (FileFormat::Wave, FileData::Binary);
    }
    if head.len() >= 4 && &head[0..4] == b".snd" {
        return (FileFormat::Snd, FileData::Binary);
    }
    if head.starts_with(b"NIST_1A\x0A   1024\x0A") {
        return (FileFormat::Nist, FileData::Binary);
    }
    if head.starts_with(b"SSFF -- (c) SHLRC") {
        return (FileFormat::Ssff, FileData::Binary);
    }
    if head.starts_with(b"XASSP") {
        return (FileFormat::Xassp, FileData::Ascii);
    }
    if head.starts_with(b"head=") || head.starts_with(b"header=") {
        return (FileFormat::Kth, FileData::Binary);
    }
    if find_subslice(head, b"file=samp").is_some() {
        return (FileFormat::Kth, FileData::Binary);
    }
    if head.starts_with(b"FR ") || head.starts_with(b"TEXT:") {
        return (FileFormat::IpdsMix, FileData::Ascii);
    }
    if find_subslice(head, b"\nhend").is_some() {
        return (FileFormat::IpdsSampa, FileData::Ascii);
    }
    if looks_like_xlabel(head) {
        return (FileFormat::Xlabel, FileData::Ascii);
    }
    // extension-based last resorts for the label formats
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mix") => (FileFormat::IpdsMix, FileData::Ascii),
        Some("sam" | "spa") => (FileFormat::IpdsSampa, FileData::Ascii),
        Some("lab" | "xlab") => (FileFormat::Xlabel, FileData::Ascii),
        _ => {
            log::warn!(
                "unknown file format in {}; using RAW settings",
                path.display()
            );
            (FileFormat::Raw, FileData::Binary)
        }
    }
}

fn looks_like_xlabel(head: &[u8]) -> bool {
    // an xlabel header is 'key value' lines closed by a line holding
    // only '#'
    let mut end_of_header = false;
    for line in head.split(|&b| b == b'\n').take(32) {
        let line = trim_ascii(line);
        if line == b"#" {
            end_of_header = true;
            break;
        }
    }
    if !end_of_header {
        return false;
    }
    [
        &b"signal "[..],
        &b"font "[..],
        &b"color "[..],
        &b"separator "[..],
        &b"nfields "[..],
        &b"type "[..],
    ]
    .iter()
    .any(|k| head.starts_with(k) || find_subslice(head, k).is_some())
}

fn trim_ascii(b: &[u8]) -> &[u8] {
    let from = b.iter().position(|c| !c.is_ascii_whitespace()).unwrap_or(b.len());
    let to = b.iter().rposition(|c| !c.is_ascii_whitespace()).map_or(from, |p| p + 1);
    &b[from..to]
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Reads and parses the header of the open file bound to `dop`:
/// descriptors, rates, byte order, record layout and any
/// format-specific generic variables are populated.
pub(crate) fn get_header(dop: &mut DataObject) -> Result<()> {
    let path = dop
        .file_path
        .clone()
        .ok_or(SonaError::BadArgs("get_header"))?;
    let mut head = vec![0u8; PROBE_SIZE];
    let n = {
        let fp = dop.file_handle().ok_or(SonaError::BadArgs("get_header"))?;
        let n = fp.read(&mut head)?;
        fp.seek(SeekFrom::Start(0))?;
        n
    };
    if n == 0 {
        return Err(SonaError::FileEmpty(path.display().to_string()));
    }
    head.truncate(n);
    let (format, data) = guess_format(&head, &path);
    dop.file_format = format;
    dop.file_data = data;
    match format {
        FileFormat::Raw => raw::read_header(dop),
        FileFormat::Wave | FileFormat::WaveX => wave::read_header(dop),
        FileFormat::Aiff | FileFormat::Aifc => aiff::read_header(dop),
        FileFormat::Snd => snd::read_header(dop),
        FileFormat::Nist => nist::read_header(dop),
        FileFormat::Csl => csl::read_header(dop),
        FileFormat::Kth => kth::read_header(dop),
        FileFormat::Ssff => ssff::read_header(dop),
        FileFormat::Xassp => xassp::read_header(dop),
        FileFormat::IpdsMix => mix::read_header(dop),
        FileFormat::IpdsSampa => sampa::read_header(dop),
        FileFormat::Xlabel => xlabel::read_header(dop),
        FileFormat::Undefined => Err(SonaError::UnknownFormat(path.display().to_string())),
    }
}

/// Emits the header matching the object's format and layout at the
/// start of the bound file.
pub(crate) fn put_header(dop: &mut DataObject) -> Result<()> {
    if dop.file_handle().is_none() {
        return Err(SonaError::BadArgs("put_header"));
    }
    match dop.file_format {
        FileFormat::Raw => raw::write_header(dop),
        FileFormat::Wave | FileFormat::WaveX => wave::write_header(dop),
        FileFormat::Aiff | FileFormat::Aifc => aiff::write_header(dop),
        FileFormat::Snd => snd::write_header(dop),
        FileFormat::Nist => nist::write_header(dop),
        FileFormat::Csl => csl::write_header(dop),
        FileFormat::Kth => kth::write_header(dop),
        FileFormat::Ssff => ssff::write_header(dop),
        FileFormat::Xassp => xassp::write_header(dop),
        FileFormat::IpdsMix => mix::write_header(dop),
        FileFormat::IpdsSampa => sampa::write_header(dop),
        FileFormat::Xlabel => xlabel::write_header(dop),
        FileFormat::Undefined => Err(SonaError::UnknownFormat(dop.path_string())),
    }
}

/// Remaining bytes in the file behind the header, for formats that
/// derive the record count from the file size.
pub(crate) fn data_bytes_in_file(dop: &mut DataObject) -> Result<u64> {
    let header_size = dop.header_size;
    let fp = dop
        .file_handle()
        .ok_or(SonaError::BadArgs("data_bytes_in_file"))?;
    let len = fp.metadata()?.len();
    Ok(len.saturating_sub(header_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_detection() {
        let p = Path::new("x");
        assert_eq!(
            guess_format(b"RIFF\x00\x00\x00\x00WAVEfmt ", p).0,
            FileFormat::Wave
        );
        assert_eq!(
            guess_format(b"FORM\x00\x00\x00\x00AIFFCOMM", p).0,
            FileFormat::Aiff
        );
        assert_eq!(
            guess_format(b"FORM\x00\x00\x00\x00AIFCFVER", p).0,
            FileFormat::Aifc
        );
        assert_eq!(guess_format(b"FORMDS16\x3C\x00\x00\x00HEDR", p).0, FileFormat::Csl);
        assert_eq!(guess_format(b".snd\x00\x00\x00\x1C", p).0, FileFormat::Snd);
        assert_eq!(
            guess_format(b"NIST_1A\x0A   1024\x0Asample_rate -i 16000\x0A", p).0,
            FileFormat::Nist
        );
        assert_eq!(
            guess_format(b"SSFF -- (c) SHLRC\x0AMachine IBM-PC\x0A", p).0,
            FileFormat::Ssff
        );
        assert_eq!(guess_format(b"head=DAT\r\nfile=samp\r\n", p).0, FileFormat::Kth);
        assert_eq!(guess_format(b"XASSP RMS 200.0\x0A", p).0, FileFormat::Xassp);
        assert_eq!(
            guess_format(b"TEXT: hello\x0APHONET:\x0ACT 1\x0A", p).0,
            FileFormat::IpdsMix
        );
        assert_eq!(
            guess_format(b"signal eddy\x0Acolor 121\x0A#\x0A  0.5 121 a\x0A", p).0,
            FileFormat::Xlabel
        );
    }

    #[test]
    fn unknown_contents_fall_back_to_raw() {
        let (f, d) = guess_format(b"\x01\x02\x03\x04garbage", Path::new("noise.bin"));
        assert_eq!(f, FileFormat::Raw);
        assert_eq!(d, FileData::Binary);
    }

    #[test]
    fn label_extension_fallback() {
        assert_eq!(
            guess_format(b"someline\x0Ahend\x0A1 x 0.5\x0A", Path::new("a.sam")).0,
            FileFormat::IpdsSampa
        );
    }
}
