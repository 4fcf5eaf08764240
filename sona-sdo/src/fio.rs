//! File and data handling: opening (with format probing), record-level
//! random access, buffer fill/flush and text emission.

use crate::dataobj::{Backing, DataObject, FileData, OpenMode};
use crate::error::{Result, SonaError};
use crate::formats;
use std::fs::OpenOptions;
use std::io::{BufRead, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// What to do with the in-memory state on close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    /// keep buffer contents and descriptors
    Keep,
    /// declare the buffer contents invalid
    Clear,
    /// release buffer and descriptors
    Free,
}

/// Options for [`DataObject::flush_buffer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FlushOpts {
    /// keep the buffer contents valid after writing
    pub keep: bool,
    /// prepend a record time column in text output
    pub add_time: bool,
}

impl DataObject {
    /// Opens a file for reading or updating: probes the format, parses
    /// the header and returns the prepared object. The data buffer is
    /// left unallocated; label and other text-data formats are loaded
    /// completely.
    pub fn open(path: impl AsRef<Path>, mode: OpenMode) -> Result<DataObject> {
        let path = path.as_ref();
        if mode == OpenMode::Write {
            return Err(SonaError::BadArgs("DataObject::open"));
        }
        let handle = OpenOptions::new()
            .read(true)
            .write(mode.writable())
            .open(path)
            .map_err(|source| SonaError::FileOpen {
                path: path.display().to_string(),
                source,
            })?;
        let mut dop = DataObject::new();
        dop.file_path = Some(path.to_path_buf());
        dop.backing = Backing::File { handle, mode };
        formats::get_header(&mut dop)?;
        Ok(dop)
    }

    /// Creates a file for writing: the caller has set up the format,
    /// rates and descriptors; the header is emitted immediately.
    pub fn create(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let handle = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|source| SonaError::FileOpen {
                path: path.display().to_string(),
                source,
            })?;
        self.file_path = Some(path.to_path_buf());
        self.backing = Backing::File {
            handle,
            mode: OpenMode::Write,
        };
        formats::put_header(self)?;
        Ok(())
    }

    /// Closes the file binding. A writable object is flushed and its
    /// header rewritten with the final record count.
    pub fn close(&mut self, action: CloseAction) -> Result<()> {
        if let Some(mode) = self.open_mode() {
            if mode.writable() {
                if self.buffer.needs_save {
                    self.flush_buffer(FlushOpts::default())?;
                }
                if self.file_data == FileData::Binary {
                    // record count and data sizes are only known now
                    formats::put_header(self)?;
                }
            }
        }
        self.backing = Backing::None;
        match action {
            CloseAction::Keep => {}
            CloseAction::Clear => self.clear_data_buffer(),
            CloseAction::Free => {
                self.free_data_buffer();
                self.descriptors.clear();
                self.generic = None;
            }
        }
        Ok(())
    }

    fn data_pos(&self, record_nr: i64) -> Result<u64> {
        if record_nr < self.start_record {
            return Err(SonaError::BadRange("seek before first record"));
        }
        if self.record_size == 0 {
            return Err(SonaError::Bug(String::from("seek in variable-size records")));
        }
        Ok(self.header_size + (record_nr - self.start_record) as u64 * self.record_size as u64)
    }

    /// Positions the file at an absolute record number.
    pub fn seek_record(&mut self, record_nr: i64) -> Result<()> {
        let pos = self.data_pos(record_nr)?;
        let path = self.path_string();
        let fp = self
            .file_handle()
            .ok_or(SonaError::BadArgs("seek_record"))?;
        fp.seek(SeekFrom::Start(pos))
            .map_err(|_| SonaError::FileSeek(path))?;
        Ok(())
    }

    /// The absolute record number at the current file position.
    pub fn tell_record(&mut self) -> Result<i64> {
        let header_size = self.header_size;
        let record_size = self.record_size as u64;
        let start_record = self.start_record;
        let path = self.path_string();
        let fp = self
            .file_handle()
            .ok_or(SonaError::BadArgs("tell_record"))?;
        let pos = fp
            .stream_position()
            .map_err(|_| SonaError::FileSeek(path))?;
        if record_size == 0 || pos < header_size {
            return Err(SonaError::Bug(String::from("tell_record: no record layout")));
        }
        Ok(start_record + ((pos - header_size) / record_size) as i64)
    }

    pub fn path_string(&self) -> String {
        self.file_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default()
    }

    /// Reads `num_records` records starting at the absolute record
    /// `from` into `dst` (host byte order). Returns the number of
    /// records actually read.
    pub fn read_records(&mut self, from: i64, num_records: i64, dst: &mut [u8]) -> Result<i64> {
        if self.record_size == 0 {
            return Err(SonaError::Bug(String::from("read_records: no record layout")));
        }
        let avail = (self.start_record + self.num_records - from).max(0);
        let todo = num_records.min(avail);
        if todo <= 0 {
            return Ok(0);
        }
        self.seek_record(from)?;
        let bytes = todo as usize * self.record_size;
        let path = self.path_string();
        let fp = self
            .file_handle()
            .ok_or(SonaError::BadArgs("read_records"))?;
        fp.read_exact(&mut dst[..bytes])
            .map_err(|_| SonaError::FileRead(path))?;
        if self.needs_swap() {
            let descriptors = self.descriptors.clone();
            for rec in dst[..bytes].chunks_exact_mut(self.record_size) {
                DataObject::swap_record(&descriptors, rec);
            }
        }
        Ok(todo)
    }

    /// Writes `num_records` records (host byte order) at the absolute
    /// record `at`; applies the endian swap on the way out when file
    /// and host disagree.
    pub fn write_records(&mut self, at: i64, num_records: i64, src: &[u8]) -> Result<i64> {
        if self.record_size == 0 {
            return Err(SonaError::Bug(String::from("write_records: no record layout")));
        }
        if num_records <= 0 {
            return Ok(0);
        }
        self.seek_record(at)?;
        let bytes = num_records as usize * self.record_size;
        let path = self.path_string();
        let swap = self.needs_swap();
        let mut owned;
        let out: &[u8] = if swap {
            owned = src[..bytes].to_vec();
            let descriptors = self.descriptors.clone();
            for rec in owned.chunks_exact_mut(self.record_size) {
                DataObject::swap_record(&descriptors, rec);
            }
            &owned
        } else {
            &src[..bytes]
        };
        let fp = self
            .file_handle()
            .ok_or(SonaError::BadArgs("write_records"))?;
        fp.write_all(out).map_err(|_| SonaError::FileWrite(path))?;
        let end = at + num_records;
        if end - self.start_record > self.num_records {
            self.num_records = end - self.start_record;
        }
        Ok(num_records)
    }

    /// Loads one buffer's worth of records starting at the absolute
    /// record `from`. Returns the number of records now valid.
    pub fn fill_buffer_at(&mut self, from: i64) -> Result<i64> {
        if self.buffer.max_buf_recs < 1 {
            return Err(SonaError::BufferSpace("fill_buffer_at"));
        }
        let from = from.max(self.start_record);
        let want = self.buffer.max_buf_recs;
        let mut data = std::mem::take(&mut self.buffer.data);
        let got = self.read_records(from, want, &mut data)?;
        self.buffer.data = data;
        self.buffer.buf_start_rec = from;
        self.buffer.buf_num_recs = got;
        self.buffer.needs_save = false;
        Ok(got)
    }

    /// Extends the valid buffer contents by one buffer's worth from the
    /// file, continuing behind the records already held.
    pub fn fill_buffer(&mut self) -> Result<i64> {
        let next = if self.buffer.buf_num_recs > 0 {
            self.buffer.buf_start_rec + self.buffer.buf_num_recs
        } else {
            self.start_record
        };
        self.fill_buffer_at(next)
    }

    /// Writes the valid buffer records to the file. Binary data goes
    /// through [`write_records`]; text data through [`print_records`].
    ///
    /// [`write_records`]: DataObject::write_records
    /// [`print_records`]: DataObject::print_records
    pub fn flush_buffer(&mut self, opts: FlushOpts) -> Result<()> {
        let n = self.buffer.buf_num_recs;
        if n > 0 {
            if self.file_data == FileData::Ascii {
                self.print_records(self.buffer.buf_start_rec, n, opts.add_time)?;
            } else {
                let src = std::mem::take(&mut self.buffer.data);
                let res = self.write_records(self.buffer.buf_start_rec, n, &src);
                self.buffer.data = src;
                res?;
            }
        }
        if opts.keep {
            self.buffer.needs_save = false;
        } else {
            let next = self.buffer.buf_start_rec + n;
            self.clear_data_buffer();
            self.buffer.buf_start_rec = next;
        }
        Ok(())
    }

    /// Emits buffered records as text lines using the descriptors'
    /// ASCII formats. `start` is an absolute record number.
    pub fn print_records(&mut self, start: i64, num: i64, add_time: bool) -> Result<()> {
        let mut lines = String::new();
        let eol = if self.eol.is_empty() { "\n" } else { &self.eol };
        let between = if self.sep_chars.is_empty() {
            "\t"
        } else {
            &self.sep_chars
        };
        for i in 0..num {
            let rec_nr = start + i;
            let ndx = rec_nr - self.buffer.buf_start_rec;
            if ndx < 0 || ndx >= self.buffer.buf_num_recs {
                return Err(SonaError::Bug(String::from("print_records: not in buffer")));
            }
            let mut fields = Vec::new();
            if add_time {
                let time = if self.data_rate > 0.0 {
                    self.start_time + (rec_nr - self.start_record) as f64 / self.data_rate
                } else {
                    0.0
                };
                fields.push(format!("{time:.4}"));
            }
            let rec = self.record_bytes(ndx);
            for dd in &self.descriptors {
                let within = if dd.sep_chars.is_empty() {
                    " "
                } else {
                    &dd.sep_chars
                };
                let mut vals = Vec::with_capacity(dd.num_fields);
                for f in 0..dd.num_fields {
                    let v = DataObject::decode_sample(dd, rec, f);
                    if dd.format.is_integer() {
                        vals.push(format!("{}", v as i64));
                    } else {
                        vals.push(dd.asc_format.format(v));
                    }
                }
                fields.push(vals.join(within));
            }
            lines.push_str(&fields.join(between));
            lines.push_str(eol);
        }
        let path = self.path_string();
        let fp = self
            .file_handle()
            .ok_or(SonaError::BadArgs("print_records"))?;
        fp.write_all(lines.as_bytes())
            .map_err(|_| SonaError::FileWrite(path))?;
        self.num_records = self.num_records.max(start + num - self.start_record);
        Ok(())
    }
}

/// Reads one line from the stream, accepting LF, CR and CR/LF line
/// ends. Returns `None` at end of file without any characters read.
pub fn read_line_any<R: BufRead>(reader: &mut R) -> std::io::Result<Option<String>> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    let mut got_any = false;
    loop {
        match reader.read(&mut byte)? {
            0 => {
                if got_any {
                    break;
                }
                return Ok(None);
            }
            _ => got_any = true,
        }
        match byte[0] {
            b'\n' => break,
            b'\r' => {
                // DOS, Mac or OS-9: swallow a following LF
                let peek = reader.fill_buf()?;
                if peek.first() == Some(&b'\n') {
                    reader.consume(1);
                }
                break;
            }
            c => line.push(c),
        }
    }
    Ok(Some(String::from_utf8_lossy(&line).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn line_reader_accepts_all_eols() {
        let mut data = Cursor::new(b"unix\nmac\rdos\r\nlast".to_vec());
        assert_eq!(read_line_any(&mut data).unwrap().as_deref(), Some("unix"));
        assert_eq!(read_line_any(&mut data).unwrap().as_deref(), Some("mac"));
        assert_eq!(read_line_any(&mut data).unwrap().as_deref(), Some("dos"));
        assert_eq!(read_line_any(&mut data).unwrap().as_deref(), Some("last"));
        assert!(read_line_any(&mut data).unwrap().is_none());
    }

    #[test]
    fn line_reader_reports_empty_lines() {
        let mut data = Cursor::new(b"\n\nx\n".to_vec());
        assert_eq!(read_line_any(&mut data).unwrap().as_deref(), Some(""));
        assert_eq!(read_line_any(&mut data).unwrap().as_deref(), Some(""));
        assert_eq!(read_line_any(&mut data).unwrap().as_deref(), Some("x"));
        assert!(read_line_any(&mut data).unwrap().is_none());
    }
}
