//! Frame-synchronous sample access for the analysis pipelines.

use crate::dataobj::{DataFormat, DataObject, DataType};
use crate::error::{Result, SonaError};

/// Default size of an automatically allocated audio buffer in bytes.
pub const ANA_BUF_BYTES: usize = 65536;

impl DataObject {
    /// The range of absolute record numbers with data behind them: the
    /// file range when file-bound, the buffer range otherwise.
    pub fn data_range(&self) -> (i64, i64) {
        if self.is_file_bound() {
            (self.start_record, self.start_record + self.num_records)
        } else {
            (
                self.buffer.buf_start_rec,
                self.buffer.buf_start_rec + self.buffer.buf_num_recs,
            )
        }
    }

    /// Fetches one audio sample (channel counting starts at 1) in the
    /// processing domain. Samples outside the data range read as zero.
    pub fn fetch_sample(&mut self, smp_nr: i64, channel: usize) -> Result<f64> {
        let (beg, end) = self.data_range();
        if smp_nr < beg || smp_nr >= end {
            return Ok(0.0);
        }
        if self.is_file_bound() {
            let in_buffer = smp_nr >= self.buffer.buf_start_rec
                && smp_nr < self.buffer.buf_start_rec + self.buffer.buf_num_recs;
            if !in_buffer {
                if self.buffer.max_buf_recs < 1 {
                    let recs = (ANA_BUF_BYTES / self.record_size.max(1)).max(1) as i64;
                    self.alloc_data_buffer(recs.min(self.num_records.max(1)))?;
                }
                self.fill_buffer_at(smp_nr)?;
                if self.buffer.buf_num_recs < 1 {
                    return Err(SonaError::BadRange("fetch_sample"));
                }
            }
        }
        let ndx = smp_nr - self.buffer.buf_start_rec;
        let dd = &self.descriptors[0];
        let rec = {
            let from = ndx as usize * self.record_size;
            &self.buffer.data[from..from + self.record_size]
        };
        Ok(DataObject::decode_sample(dd, rec, channel - 1))
    }

    /// Produces `head + size + tail` converted samples of frame
    /// `frame_nr` into `dst`: the frame window plus leading/trailing
    /// context, zero-padded at the signal edges. `channel` counting
    /// starts at 1. Transparently re-fills the backing buffer when the
    /// request is outside its current range.
    pub fn get_sample_frame(
        &mut self,
        frame_nr: i64,
        size: i64,
        shift: i64,
        head: i64,
        tail: i64,
        channel: usize,
        dst: &mut [f64],
    ) -> Result<()> {
        if size < 1 || shift < 1 || head < 0 || tail < 0 || channel < 1 {
            return Err(SonaError::BadArgs("get_sample_frame"));
        }
        let dd = self
            .descriptors
            .first()
            .ok_or(SonaError::NoData(String::from("(get_sample_frame)")))?;
        if dd.dtype != DataType::Sample || self.frame_dur != 1 {
            return Err(SonaError::NoAudio(self.path_string()));
        }
        if channel > dd.num_fields {
            return Err(SonaError::BadValue(format!("channel {channel}")));
        }
        let total = (head + size + tail) as usize;
        if dst.len() < total {
            return Err(SonaError::BufferSpace("get_sample_frame"));
        }
        // the frame window starts head samples before the frame
        let beg_smp = frame_nr * shift - head;
        let end_smp = beg_smp + total as i64;
        let (data_beg, data_end) = self.data_range();
        if end_smp <= data_beg || beg_smp >= data_end {
            return Err(SonaError::BadRange("get_sample_frame"));
        }
        for (i, smp_nr) in (beg_smp..end_smp).enumerate() {
            dst[i] = self.fetch_sample(smp_nr, channel)?;
        }
        Ok(())
    }
}

/// Keeps the workspace object's buffer loaded with converted samples
/// around `smp_nr` and returns the buffer index of that sample.
///
/// The workspace holds a single `REAL64` track; at least
/// `head + 1 + tail` samples around `smp_nr` are guaranteed valid at
/// the returned index. This is the index-based re-expression of the
/// zero-copy sample pointer.
pub fn get_sample_slice(
    src: &mut DataObject,
    smp_nr: i64,
    head: i64,
    tail: i64,
    channel: usize,
    work: &mut DataObject,
) -> Result<usize> {
    if head < 0 || tail < 0 || channel < 1 {
        return Err(SonaError::BadArgs("get_sample_slice"));
    }
    if work.descriptors.len() != 1 || work.descriptors[0].format != DataFormat::Real64 {
        return Err(SonaError::Bug(String::from(
            "get_sample_slice: workspace is not a REAL64 track",
        )));
    }
    let span = head + 1 + tail;
    if work.buffer.max_buf_recs < span {
        return Err(SonaError::BufferSpace("get_sample_slice"));
    }
    let have = work.buffer.buf_num_recs > 0
        && smp_nr - head >= work.buffer.buf_start_rec
        && smp_nr + tail < work.buffer.buf_start_rec + work.buffer.buf_num_recs;
    if !have {
        let new_start = smp_nr - head;
        let fields = work.descriptors[0].num_fields;
        let n = work.buffer.max_buf_recs;
        for i in 0..n {
            let v = src.fetch_sample(new_start + i, channel)?;
            let from = i as usize * work.record_size;
            let field_bytes = v.to_ne_bytes();
            // single-channel workspace: replicate into every field
            for f in 0..fields {
                let at = from + f * 8;
                work.buffer.data[at..at + 8].copy_from_slice(&field_bytes);
            }
        }
        work.buffer.buf_start_rec = new_start;
        work.buffer.buf_num_recs = n;
    }
    Ok((smp_nr - work.buffer.buf_start_rec) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataobj::{DataCoding, DataDescriptor};

    fn memory_audio(samples: &[i16]) -> DataObject {
        let mut dop = DataObject::new();
        dop.samp_freq = 16000.0;
        dop.frame_dur = 1;
        let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::Int16);
        dd.coding = DataCoding::Linear;
        dd.num_fields = 1;
        dop.descriptors.push(dd);
        dop.set_record_size().unwrap();
        dop.check_rates().unwrap();
        dop.alloc_data_buffer(samples.len() as i64).unwrap();
        for (i, s) in samples.iter().enumerate() {
            dop.record_bytes_mut(i as i64).copy_from_slice(&s.to_ne_bytes());
        }
        dop.buffer.buf_num_recs = samples.len() as i64;
        dop
    }

    #[test]
    fn zero_padding_at_begin() {
        let mut dop = memory_audio(&[10, 20, 30, 40, 50, 60, 70, 80]);
        let mut frame = vec![99.0; 2 + 4];
        // frame 0, size 4, shift 4, head 2
        dop.get_sample_frame(0, 4, 4, 2, 0, 1, &mut frame).unwrap();
        assert_eq!(frame, vec![0.0, 0.0, 10.0, 20.0, 30.0, 40.0]);
    }

    #[test]
    fn zero_padding_at_end() {
        let mut dop = memory_audio(&[10, 20, 30, 40, 50, 60]);
        let mut frame = vec![0.0; 4];
        dop.get_sample_frame(1, 4, 4, 0, 0, 1, &mut frame).unwrap();
        assert_eq!(frame, vec![50.0, 60.0, 0.0, 0.0]);
    }

    #[test]
    fn fully_outside_range_is_an_error() {
        let mut dop = memory_audio(&[1, 2, 3, 4]);
        let mut frame = vec![0.0; 4];
        assert!(dop.get_sample_frame(5, 4, 4, 0, 0, 1, &mut frame).is_err());
    }

    #[test]
    fn channel_out_of_range() {
        let mut dop = memory_audio(&[1, 2, 3, 4]);
        let mut frame = vec![0.0; 2];
        assert!(dop.get_sample_frame(0, 2, 2, 0, 0, 2, &mut frame).is_err());
    }

    #[test]
    fn sample_slice_provides_context() {
        let mut src = memory_audio(&[1, 2, 3, 4, 5, 6, 7, 8]);
        let mut work = DataObject::new();
        work.samp_freq = src.samp_freq;
        work.frame_dur = 1;
        work
            .descriptors
            .push(DataDescriptor::new(DataType::Sample, DataFormat::Real64));
        work.set_record_size().unwrap();
        work.alloc_data_buffer(6).unwrap();

        let ndx = get_sample_slice(&mut src, 3, 1, 1, 1, &mut work).unwrap();
        let at = ndx * 8;
        let val = f64::from_ne_bytes(work.buffer.data[at..at + 8].try_into().unwrap());
        assert_eq!(val, 4.0);
        let before = f64::from_ne_bytes(work.buffer.data[at - 8..at].try_into().unwrap());
        assert_eq!(before, 3.0);

        // walking forward reuses the loaded span until it runs out
        let first_start = work.buffer.buf_start_rec;
        let _ = get_sample_slice(&mut src, 4, 1, 1, 1, &mut work).unwrap();
        assert_eq!(work.buffer.buf_start_rec, first_start);
        let _ = get_sample_slice(&mut src, 7, 1, 1, 1, &mut work).unwrap();
        assert_ne!(work.buffer.buf_start_rec, first_start);
    }
}
