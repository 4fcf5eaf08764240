//! Conversion of the millisecond/seconds timing options to absolute
//! sample and frame counts, clipped to the available data range.

use crate::options::AnaOptions;
use sona_dsp::{window_by_name, window_specs, WindowFunction, WF_MIN_SIZE};
use sona_sdo::time::{frm_nr_to_smp_nr, smp_nr_to_frm_nr, time_to_frm_nr, time_to_smp_nr};
use sona_sdo::{DataObject, Result, SonaError, ANA_BUF_BYTES};

/// Analysis timing parameters converted to sample/frame numbers.
#[derive(Debug, Clone, Default)]
pub struct AnaTiming {
    pub samp_freq: f64,
    pub frame_size: i64,
    pub frame_shift: i64,
    pub smooth_size: i64,
    pub beg_frame_nr: i64,
    pub end_frame_nr: i64,
}

impl AnaTiming {
    pub fn num_frames(&self) -> i64 {
        self.end_frame_nr - self.beg_frame_nr
    }
}

fn checked_window(name: &str) -> Result<WindowFunction> {
    window_by_name(name).ok_or_else(|| SonaError::BadWindow(name.to_string()))
}

/// Converts the timing options to frame numbers. The data provided are
/// assumed to have been verified. Returns the timing and a flag that is
/// true when the analysis interval came out empty (a warning, not an
/// error: the interval is clamped to zero frames).
pub fn ana_timing(smp_dop: &DataObject, opts: &AnaOptions) -> Result<(AnaTiming, bool)> {
    let mut t = AnaTiming {
        samp_freq: smp_dop.samp_freq,
        ..Default::default()
    };
    // frame shift; an event analysis uses a 1-sample shift
    if opts.use_ctime {
        t.frame_shift = 1;
    } else {
        t.frame_shift = time_to_smp_nr(opts.ms_shift / 1000.0, t.samp_freq);
        if t.frame_shift < 1 {
            // zero selects the smallest shift
            t.frame_shift = 1;
        }
    }
    // frame size
    if opts.use_enbw {
        // derive the window size from the effective bandwidth
        if opts.bandwidth <= 0.0 {
            if opts.fft_len == 0 {
                return Err(SonaError::Bug(String::from("ana_timing: bandwidth undefined")));
            }
            t.frame_size = opts.fft_len as i64; // smallest possible bandwidth
        } else {
            let mut win_size = 1.0 / opts.bandwidth;
            if !opts.win_func.is_empty() {
                let wf = checked_window(&opts.win_func)?;
                if wf != WindowFunction::None && wf != WindowFunction::Rectangle {
                    win_size *= window_specs(wf).enbw;
                }
            }
            t.frame_size = time_to_smp_nr(win_size, t.samp_freq);
        }
        if t.frame_size < WF_MIN_SIZE as i64 {
            return Err(SonaError::BadSize("ana_timing"));
        }
    } else if opts.ms_size <= 0.0 {
        // acceptable for analyses that derive their own size, but not
        // in event mode
        if opts.use_ctime {
            return Err(SonaError::BadSize("ana_timing"));
        }
        t.frame_size = 0;
    } else {
        let mut win_size = opts.ms_size / 1000.0;
        if opts.effective && !opts.win_func.is_empty() {
            let wf = checked_window(&opts.win_func)?;
            if wf != WindowFunction::None && wf != WindowFunction::Rectangle {
                win_size *= window_specs(wf).enbw;
            }
        }
        t.frame_size = time_to_smp_nr(win_size, t.samp_freq);
        if t.frame_size < WF_MIN_SIZE as i64 {
            return Err(SonaError::BadSize("ana_timing"));
        }
    }
    t.smooth_size = if opts.ms_smooth > 0.0 {
        time_to_smp_nr(opts.ms_smooth / 1000.0, t.samp_freq)
    } else {
        0
    };

    // round the analysis interval to frame boundaries within the
    // available data range
    let (beg_sn, end_sn) = smp_dop.data_range();
    let mut empty = false;
    if opts.use_ctime {
        // frame shift is 1 here, so frame numbers equal sample numbers
        let beg_smp = time_to_smp_nr(opts.centre_time, t.samp_freq);
        if beg_smp < beg_sn || beg_smp >= end_sn {
            return Err(SonaError::BadRange("ana_timing"));
        }
        t.beg_frame_nr = beg_smp;
        t.end_frame_nr = beg_smp + 1;
    } else {
        let mut beg_frm = if opts.begin_time <= 0.0 {
            0
        } else {
            time_to_frm_nr(opts.begin_time, t.samp_freq, t.frame_shift)
        };
        let mut beg_smp = frm_nr_to_smp_nr(beg_frm, t.frame_shift);
        if beg_smp < beg_sn {
            beg_frm = smp_nr_to_frm_nr(beg_sn, t.frame_shift);
            beg_smp = frm_nr_to_smp_nr(beg_frm, t.frame_shift);
        }
        let mut end_frm = if opts.end_time <= 0.0 {
            smp_nr_to_frm_nr(end_sn, t.frame_shift)
        } else {
            time_to_frm_nr(opts.end_time, t.samp_freq, t.frame_shift)
        };
        // only frames whose analysis window lies completely within the
        // data range are produced
        let max_end = if t.frame_size > 0 {
            (end_sn - t.frame_size).div_euclid(t.frame_shift) + 1
        } else {
            smp_nr_to_frm_nr(end_sn, t.frame_shift)
        };
        if end_frm > max_end {
            end_frm = max_end;
        }
        if beg_frm >= end_frm || beg_smp >= end_sn {
            log::warn!("no data in the analysis interval");
            end_frm = beg_frm; // empty interval
            empty = true;
        }
        t.beg_frame_nr = beg_frm;
        t.end_frame_nr = end_frm;
    }
    Ok((t, empty))
}

/// Verifies that the audio and analysis objects have usable data
/// buffers of appropriate size and (re-)allocates them when needed.
/// Valid analysis data in a memory-bound output buffer are preserved.
pub fn check_data_bufs(
    smp_dop: &mut DataObject,
    ana_dop: &mut DataObject,
    frame_samples: i64,
    beg_frame_nr: i64,
    end_frame_nr: i64,
) -> Result<()> {
    let frame_shift = ana_dop.frame_dur;
    let num_frames = end_frame_nr - beg_frame_nr;
    if frame_shift < 1 || num_frames < 1 {
        return Err(SonaError::BadArgs("check_data_bufs"));
    }
    // audio buffer
    if smp_dop.is_file_bound() {
        if smp_dop.buffer.max_buf_recs < frame_samples {
            if smp_dop.record_size < 1 {
                return Err(SonaError::Bug(String::from(
                    "check_data_bufs: invalid record size",
                )));
            }
            let mut num_records = (ANA_BUF_BYTES / smp_dop.record_size) as i64;
            if num_records < frame_samples {
                num_records = frame_samples;
                if frame_samples / frame_shift >= 4 {
                    if num_frames > 4 {
                        num_records += 4 * frame_shift;
                    } else {
                        num_records += (num_frames - 1) * frame_shift;
                    }
                }
            }
            // zero padding is done in the frame buffer, no need to
            // buffer more than the file holds
            if num_records > smp_dop.num_records {
                num_records = smp_dop.num_records;
            }
            smp_dop.alloc_data_buffer(num_records.max(1))?;
        }
        smp_dop.clear_data_buffer(); // discard contents
        smp_dop.buffer.buf_start_rec = 0;
    } // else the caller has the samples in memory already
    // analysis buffer
    if ana_dop.is_file_bound() {
        if ana_dop.buffer.max_buf_recs < 1 {
            if ana_dop.record_size < 1 {
                return Err(SonaError::Bug(String::from(
                    "check_data_bufs: invalid record size",
                )));
            }
            let mut num_records = (ANA_BUF_BYTES / ana_dop.record_size) as i64;
            if num_records < 64 {
                // minimum for large records
                num_records = 64;
            }
            if num_records > num_frames {
                num_records = num_frames;
            }
            ana_dop.alloc_data_buffer(num_records)?;
        }
        ana_dop.clear_data_buffer();
    } else {
        // results are to be kept in memory
        if ana_dop.buffer.max_buf_recs > 0 && ana_dop.buffer.buf_num_recs <= 0 {
            if ana_dop.buffer.max_buf_recs < num_frames {
                ana_dop.free_data_buffer(); // re-allocated below
            } else {
                ana_dop.clear_data_buffer();
                ana_dop.buffer.buf_start_rec = beg_frame_nr;
            }
        } else if ana_dop.buffer.buf_num_recs > 0 {
            // valid data outside the new range are kept
            let buf_beg = ana_dop.buffer.buf_start_rec;
            let buf_end = buf_beg + ana_dop.buffer.buf_num_recs;
            if buf_beg > beg_frame_nr || buf_beg + ana_dop.buffer.max_buf_recs < end_frame_nr {
                let start_record = buf_beg.min(beg_frame_nr);
                let num_records = (buf_beg + ana_dop.buffer.max_buf_recs).max(end_frame_nr)
                    - start_record;
                if ana_dop.record_size < 1 {
                    return Err(SonaError::Bug(String::from(
                        "check_data_bufs: invalid record size",
                    )));
                }
                let mut grown = vec![0u8; num_records as usize * ana_dop.record_size];
                let at = (buf_beg - start_record) as usize * ana_dop.record_size;
                let valid = ana_dop.buffer.buf_num_recs as usize * ana_dop.record_size;
                grown[at..at + valid].copy_from_slice(&ana_dop.buffer.data[..valid]);
                ana_dop.buffer.data = grown;
                ana_dop.buffer.max_buf_recs = num_records;
                ana_dop.buffer.buf_start_rec = start_record;
                ana_dop.buffer.buf_num_recs = buf_end - start_record;
                ana_dop.buffer.needs_save = true;
            } // else the analysis range fits the buffer
        }
        if ana_dop.buffer.max_buf_recs < 1 {
            ana_dop.alloc_data_buffer(num_frames)?;
            ana_dop.buffer.buf_start_rec = beg_frame_nr;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sona_sdo::{DataCoding, DataDescriptor, DataFormat, DataType};

    fn memory_audio(num: usize, rate: f64) -> DataObject {
        let mut dop = DataObject::new();
        dop.samp_freq = rate;
        dop.frame_dur = 1;
        let mut dd = DataDescriptor::new(DataType::Sample, DataFormat::Int16);
        dd.coding = DataCoding::Linear;
        dd.num_fields = 1;
        dop.descriptors.push(dd);
        dop.set_record_size().unwrap();
        dop.check_rates().unwrap();
        dop.alloc_data_buffer(num as i64).unwrap();
        dop.buffer.buf_num_recs = num as i64;
        dop
    }

    #[test]
    fn frame_counts_for_rms_scenario() {
        // 1 s at 16 kHz, 20 ms window, 5 ms shift:
        // floor(16000 * (1 - 0.02) / 80) + 1 = 197 frames
        let dop = memory_audio(16000, 16000.0);
        let mut opts = AnaOptions::default();
        opts.ms_size = 20.0;
        opts.ms_shift = 5.0;
        opts.win_func = String::from("RECTANGLE");
        let (t, empty) = ana_timing(&dop, &opts).unwrap();
        assert!(!empty);
        assert_eq!(t.frame_shift, 80);
        assert_eq!(t.frame_size, 320);
        assert_eq!(t.beg_frame_nr, 0);
        assert_eq!(t.end_frame_nr, 197);
    }

    #[test]
    fn effective_size_scales_by_enbw() {
        let dop = memory_audio(16000, 16000.0);
        let mut opts = AnaOptions::default();
        opts.ms_size = 20.0;
        opts.ms_shift = 5.0;
        opts.effective = true;
        opts.win_func = String::from("HAMMING");
        let (t, _) = ana_timing(&dop, &opts).unwrap();
        // 20 ms * 1.36 = 27.2 ms -> 435 samples
        assert_eq!(t.frame_size, 435);
    }

    #[test]
    fn event_analysis_has_one_frame() {
        let dop = memory_audio(16000, 16000.0);
        let mut opts = AnaOptions::default();
        opts.ms_size = 20.0;
        opts.use_ctime = true;
        opts.centre_time = 0.5;
        let (t, _) = ana_timing(&dop, &opts).unwrap();
        assert_eq!(t.frame_shift, 1);
        assert_eq!(t.beg_frame_nr, 8000);
        assert_eq!(t.end_frame_nr, 8001);
    }

    #[test]
    fn event_time_outside_range_fails() {
        let dop = memory_audio(1000, 16000.0);
        let mut opts = AnaOptions::default();
        opts.ms_size = 20.0;
        opts.use_ctime = true;
        opts.centre_time = 2.0;
        assert!(ana_timing(&dop, &opts).is_err());
    }

    #[test]
    fn empty_interval_flagged_not_fatal() {
        let dop = memory_audio(1000, 16000.0);
        let mut opts = AnaOptions::default();
        opts.ms_size = 20.0;
        opts.ms_shift = 5.0;
        opts.begin_time = 0.9;
        opts.end_time = 0.95;
        let (t, empty) = ana_timing(&dop, &opts).unwrap();
        assert!(empty);
        assert_eq!(t.num_frames(), 0);
    }

    #[test]
    fn range_clipped_to_data() {
        let dop = memory_audio(8000, 16000.0);
        let mut opts = AnaOptions::default();
        opts.ms_size = 20.0;
        opts.ms_shift = 5.0;
        opts.end_time = 10.0;
        let (t, empty) = ana_timing(&dop, &opts).unwrap();
        assert!(!empty);
        // last frame with a complete 320-sample window
        assert_eq!(t.end_frame_nr, (8000 - 320) / 80 + 1);
    }

    #[test]
    fn unknown_window_rejected() {
        let dop = memory_audio(8000, 16000.0);
        let mut opts = AnaOptions::default();
        opts.ms_size = 20.0;
        opts.effective = true;
        opts.win_func = String::from("WOBBLE");
        assert!(ana_timing(&dop, &opts).is_err());
    }
}
