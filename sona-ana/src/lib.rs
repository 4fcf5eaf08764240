//! Frame-synchronous analyses of audio signals. Every analysis has a
//! `set_*_defaults` for the options structure, a `create_*` that
//! validates the audio and builds the output data object, a
//! `compute_*` performing the frame loop and a `verify_*` that checks
//! an existing output object against changed options.

pub mod acf;
pub mod diff;
pub mod lp;
pub mod options;
pub mod rms;
pub mod spectrum;
pub mod timing;
pub mod zcr;

pub use acf::{compute_acf, compute_acf_into, create_acf, set_acf_defaults, verify_acf, AcfParams};
pub use diff::{compute_diff, compute_diff_into, create_diff, set_diff_defaults, DIFF_OPT_BACKWARD,
    DIFF_OPT_CENTRAL};
pub use lp::{compute_lp, compute_lp_into, create_lp, set_lp_defaults, verify_lp, LpParams, LpType};
pub use options::{default_order, AnaOptions};
pub use rms::{compute_rms, compute_rms_into, create_rms, set_rms_defaults, verify_rms, RmsParams,
    RMS_OPT_LINEAR};
pub use spectrum::{
    compute_spectrum, compute_spectrum_into, create_spectrum, set_css_defaults, set_dft_defaults,
    set_lps_defaults, set_spectrum_defaults, verify_spectrum, SpectrumParams, SpectrumType,
};
pub use timing::{ana_timing, check_data_bufs, AnaTiming};
pub use zcr::{compute_zcr, compute_zcr_into, create_zcr, set_zcr_defaults, verify_zcr, ZcrParams};

use sona_sdo::{DataObject, FileData, FileFormat, FlushOpts, Result, SonaError};

/// Maximum number of input channels an analysis accepts.
pub(crate) const ANA_I_CHANS: u32 = 8;

/// Applies the output format choice ("SSFF", "XASSP" or raw ASCII) to a
/// freshly created analysis object.
pub(crate) fn init_output_format(dop: &mut DataObject, format: &str) {
    match format.to_ascii_uppercase().as_str() {
        "SSFF" => {
            dop.file_format = FileFormat::Ssff;
            dop.file_data = FileData::Binary;
            dop.eol = String::from("\n");
        }
        "XASSP" => {
            dop.file_format = FileFormat::Xassp;
            dop.file_data = FileData::Ascii;
            dop.eol = String::from("\n");
            dop.sep_chars = String::from("\t");
        }
        _ => {
            // fall through to raw ASCII
            dop.file_format = FileFormat::Raw;
            dop.file_data = FileData::Ascii;
            dop.eol = String::from("\n");
            dop.sep_chars = String::from("\t");
        }
    }
    dop.file_endian = sona_codec::Endian::native();
}

/// Write options for the frame loop: file-bound output discards the
/// buffer after writing and gets a time column in text mode.
pub(crate) fn write_opts_for(dop: &DataObject) -> FlushOpts {
    if dop.is_file_bound() {
        FlushOpts {
            keep: false,
            add_time: dop.file_data == FileData::Ascii,
        }
    } else {
        FlushOpts {
            keep: true,
            add_time: false,
        }
    }
}

/// Copies one finished record into the output buffer, flushing to file
/// on buffer overflow. Overflow of a memory-bound buffer is an error.
pub(crate) fn store_record(dop: &mut DataObject, frame_nr: i64, rec: &[u8]) -> Result<()> {
    let file_out = dop.is_file_bound();
    if dop.buffer.buf_num_recs <= 0 {
        dop.buffer.buf_num_recs = 0;
        dop.buffer.buf_start_rec = frame_nr;
    } else if frame_nr >= dop.buffer.buf_start_rec + dop.buffer.max_buf_recs {
        if file_out {
            let opts = write_opts_for(dop);
            dop.flush_buffer(opts)?;
            dop.buffer.buf_start_rec = frame_nr;
        } else {
            return Err(SonaError::Bug(String::from("store_record: buffer overflow")));
        }
    }
    let ndx = frame_nr - dop.buffer.buf_start_rec;
    if ndx < 0 || ndx >= dop.buffer.max_buf_recs {
        return Err(SonaError::Bug(String::from("store_record: buffer overflow")));
    }
    dop.record_bytes_mut(ndx).copy_from_slice(rec);
    if ndx >= dop.buffer.buf_num_recs {
        dop.buffer.buf_num_recs = ndx + 1;
    }
    dop.buffer.needs_save = true;
    Ok(())
}

/// Window generation flags aligning the window centre with the frame
/// centre: periodic, or shifted by half a sample when frame size and
/// shift have opposite parity.
pub(crate) fn window_flags(frame_size: i64, frame_shift: i64) -> sona_dsp::WindowFlags {
    if (frame_size % 2 == 1 && frame_shift % 2 == 0)
        || (frame_size % 2 == 0 && frame_shift % 2 == 1)
    {
        sona_dsp::WindowFlags::Asymmetric
    } else {
        sona_dsp::WindowFlags::Periodic
    }
}

/// True when the output object already carries data that a parameter
/// change would clash with.
pub(crate) fn has_committed_data(dop: &DataObject) -> bool {
    dop.is_file_bound() && dop.num_records > 0
}
