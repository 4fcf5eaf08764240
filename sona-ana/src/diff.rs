//! Differentiation of audio signals: forward, backward or central
//! difference, with a second pass to rescale when the first one would
//! overflow the output integer range.

use crate::options::AnaOptions;
use crate::write_opts_for;
use sona_sdo::aucheck::{au_caps_for_processing, au_caps_of_format, check_sound, AUC_CHAN_MASK};
use sona_sdo::frame::ANA_BUF_BYTES;
use sona_sdo::{get_sample_slice, DataFormat, DataObject, FileFormat, Result, SonaError};
use sona_codec::i32_to_i24;
use sona_dsp::DEF_GAIN_PERCENT;

/// option bits; forward difference when neither is set
pub const DIFF_OPT_BACKWARD: u32 = 0x0001;
pub const DIFF_OPT_CENTRAL: u32 = 0x0002;

pub const DIFF_DEF_CHANNEL: usize = 1;
pub const DIFF_DEF_SUFFIX: &str = ".dff";
/// only single-channel output
const DIFF_O_CHANS: usize = 1;

const DIFF_PFORMAT: DataFormat = DataFormat::Real64;

/// Fills the options with the differentiation defaults.
pub fn set_diff_defaults(opts: &mut AnaOptions) {
    *opts = AnaOptions::default();
    opts.begin_time = -1.0; // always the full range
    opts.end_time = -1.0;
    opts.centre_time = -1.0;
    opts.channel = DIFF_DEF_CHANNEL;
}

/// Initializes a data object for a differentiated signal by copying the
/// description of the input, reduced to one channel.
pub fn create_diff(inp_dop: &DataObject, opts: &mut AnaOptions) -> Result<DataObject> {
    let au_caps = au_caps_for_processing(DIFF_PFORMAT)? | crate::ANA_I_CHANS;
    if opts.channel < 1 {
        opts.channel = DIFF_DEF_CHANNEL;
    }
    check_sound(inp_dop, au_caps, opts.channel)?;
    let mut dop = DataObject::new();
    dop.copy_from(inp_dop);
    if dop.descriptors[0].num_fields > DIFF_O_CHANS {
        dop.descriptors[0].num_fields = DIFF_O_CHANS;
        dop.set_record_size()?;
    }
    if !inp_dop.is_file_bound() {
        // memory input: describe the buffer contents
        if dop.file_format == FileFormat::Ssff {
            dop.start_record = inp_dop.buffer.buf_start_rec;
            dop.set_start_time();
        } else {
            dop.start_record = 0;
            dop.start_time = 0.0;
            dop.time_zero = 0.0;
        }
        dop.num_records = inp_dop.buffer.buf_num_recs;
    }
    Ok(dop)
}

/// Differentiates the signal, creating the output object.
pub fn compute_diff(inp_dop: &mut DataObject, opts: &mut AnaOptions) -> Result<DataObject> {
    let mut out_dop = create_diff(inp_dop, opts)?;
    compute_diff_into(inp_dop, opts, &mut out_dop)?;
    Ok(out_dop)
}

/// Differentiates the signal into an existing output object. Up to two
/// passes are made: when the first pass would overflow the output
/// integer range, the whole signal is scaled down to ~95% of full scale
/// and written in a second pass.
pub fn compute_diff_into(
    inp_dop: &mut DataObject,
    opts: &AnaOptions,
    out_dop: &mut DataObject,
) -> Result<()> {
    if inp_dop.is_file_bound() {
        if inp_dop.num_records <= 0 {
            return Err(SonaError::FileEmpty(inp_dop.path_string()));
        }
    } else if inp_dop.buffer.buf_num_recs <= 0 {
        return Err(SonaError::NoData(String::from("(compute_diff)")));
    }
    if out_dop.is_file_bound() {
        let au_caps = au_caps_of_format(out_dop.file_format);
        let au_caps = (au_caps & !AUC_CHAN_MASK) | DIFF_O_CHANS as u32;
        check_sound(out_dop, au_caps, 0)?;
    }
    verify_diff_bufs(inp_dop, out_dop, opts.bits)?;
    let write_opts = write_opts_for(out_dop);

    let (beg_smp, end_smp) = inp_dop.data_range();
    let (head, tail) = if opts.bits & DIFF_OPT_BACKWARD != 0 {
        (1i64, 0i64)
    } else if opts.bits & DIFF_OPT_CENTRAL != 0 {
        (1, 1)
    } else {
        (0, 1)
    };
    let abs_max: f64 = match out_dop.descriptors[0].format {
        DataFormat::Int16 => i16::MAX as f64,
        DataFormat::Int24 => 0x7F_FFFF as f64,
        DataFormat::Int32 => i32::MAX as f64,
        _ => i16::MAX as f64,
    };

    // workspace with converted samples around the current one
    let mut work = DataObject::new();
    work.copy_from(out_dop);
    work.descriptors[0].format = DIFF_PFORMAT;
    work.descriptors[0].coding = sona_sdo::DataCoding::Linear;
    work.set_record_size()?;
    let mut span = (ANA_BUF_BYTES / work.record_size) as i64;
    span = span.min((end_smp - beg_smp).max(2)) + 1 + if head + tail > 1 { 1 } else { 0 };
    work.alloc_data_buffer(span)?;

    let mut max_mag = 0.0f64;
    let mut scale = 1.0f64;
    for pass in 1..=2 {
        let mut store = true;
        let mut osn = out_dop.start_record;
        for sn in beg_smp..end_smp {
            let ndx = get_sample_slice(inp_dop, sn, head, tail, opts.channel, &mut work)?;
            let at = |i: usize| {
                f64::from_ne_bytes(
                    work.buffer.data[i * 8..i * 8 + 8].try_into().unwrap(),
                )
            };
            let mut diff = if opts.bits & DIFF_OPT_BACKWARD != 0 {
                at(ndx) - at(ndx - 1)
            } else if opts.bits & DIFF_OPT_CENTRAL != 0 {
                (at(ndx + 1) - at(ndx - 1)) / 2.0
            } else {
                at(ndx + 1) - at(ndx)
            };
            diff = diff.round();
            if pass == 1 {
                if diff.abs() > max_mag {
                    max_mag = diff.abs();
                    if max_mag > abs_max {
                        store = false;
                    }
                }
            } else {
                diff *= scale;
            }
            if store {
                store_diff(diff as i64, osn, out_dop)?;
            }
            osn += 1;
        }
        if pass == 1 {
            if store {
                break; // no overflow
            }
            scale = abs_max * (DEF_GAIN_PERCENT / 100.0) / max_mag;
            log::warn!("difference overflows the output range; rescaling by {scale:.6}");
            // partial first-pass output is rewritten from the start
            out_dop.clear_data_buffer();
        }
    }
    if out_dop.is_file_bound() {
        out_dop.flush_buffer(write_opts)?;
    }
    Ok(())
}

fn verify_diff_bufs(inp_dop: &mut DataObject, out_dop: &mut DataObject, _bits: u32) -> Result<()> {
    if inp_dop.is_file_bound() && inp_dop.buffer.max_buf_recs < 3 {
        if inp_dop.record_size < 1 {
            return Err(SonaError::Bug(String::from(
                "verify_diff_bufs: invalid record size",
            )));
        }
        let n = ((ANA_BUF_BYTES / inp_dop.record_size) as i64).min(inp_dop.num_records).max(3);
        inp_dop.alloc_data_buffer(n)?;
    }
    let max_samples = if inp_dop.is_file_bound() {
        inp_dop.num_records
    } else {
        inp_dop.buffer.buf_num_recs
    };
    let file_out = out_dop.is_file_bound();
    let needed = if file_out {
        ((ANA_BUF_BYTES / out_dop.record_size.max(1)) as i64).min(max_samples).max(1)
    } else {
        max_samples
    };
    if out_dop.buffer.max_buf_recs < needed {
        out_dop.alloc_data_buffer(needed)?;
    }
    Ok(())
}

fn store_diff(value: i64, sample_nr: i64, dop: &mut DataObject) -> Result<()> {
    let format = dop.descriptors[0].format;
    let mut rec = [0u8; 8];
    let size = dop.record_size;
    match format {
        DataFormat::Int16 => {
            rec[..2].copy_from_slice(&(value as i16).to_ne_bytes());
        }
        DataFormat::Int24 => {
            let packed = i32_to_i24(value as i32, sona_codec::Endian::native());
            rec[..3].copy_from_slice(&packed);
        }
        DataFormat::Int32 => {
            rec[..4].copy_from_slice(&(value as i32).to_ne_bytes());
        }
        other => {
            return Err(SonaError::NoHandle(format!("{other:?} in difference output")));
        }
    }
    crate::store_record(dop, sample_nr, &rec[..size])
}
