//! The analysis subcommands: open the input, prepare the options,
//! create the output file and run the frame loop.

use crate::args;
use crate::{AnalysisArgs, DiffArgs, LpArgs, SpectrumArgs};
use sona_ana::acf::{ACF_DEF_SUFFIX, ACF_OPT_MEAN, ACF_OPT_NORM};
use sona_ana::rms::RMS_DEF_SUFFIX;
use sona_ana::zcr::ZCR_DEF_SUFFIX;
use sona_ana::AnaOptions;
use sona_sdo::{CloseAction, DataObject, OpenMode, Result};
use std::path::Path;

fn open_audio(path: &Path) -> Result<DataObject> {
    let dop = DataObject::open(path, OpenMode::Read)?;
    log::info!(
        "{}: {} Hz, {} channel(s), {} records ({})",
        path.display(),
        dop.samp_freq,
        dop.descriptors.first().map(|d| d.num_fields).unwrap_or(0),
        dop.num_records,
        sona_sdo::time::smp_nr_to_duration(dop.num_records, dop.data_rate)
    );
    Ok(dop)
}

fn finish(mut out: DataObject) -> Result<()> {
    out.close(CloseAction::Free)
}

pub fn run_acf(args: &AnalysisArgs) -> Result<bool> {
    let mut warnings = false;
    for file in &args.files {
        let mut smp = open_audio(file)?;
        let mut opts = AnaOptions::default();
        sona_ana::set_acf_defaults(&mut opts);
        args::apply(&mut opts, &args.range, &args.framing, &args.numeric, &args.output);
        if args.mean {
            opts.bits |= ACF_OPT_MEAN;
        }
        if args.norm {
            opts.bits |= ACF_OPT_NORM;
        }
        let mut out = sona_ana::create_acf(&smp, &mut opts)?;
        let path = args::output_path(file, ACF_DEF_SUFFIX, &args.output);
        out.create(&path)?;
        sona_ana::compute_acf_into(&mut smp, Some(&opts), &mut out)?;
        finish(out)?;
        warnings |= out_was_empty(&smp, &opts)?;
    }
    Ok(warnings)
}

pub fn run_rms(args: &AnalysisArgs) -> Result<bool> {
    let mut warnings = false;
    for file in &args.files {
        let mut smp = open_audio(file)?;
        let mut opts = AnaOptions::default();
        sona_ana::set_rms_defaults(&mut opts);
        args::apply(&mut opts, &args.range, &args.framing, &args.numeric, &args.output);
        if args.linear {
            opts.bits |= sona_ana::RMS_OPT_LINEAR;
        }
        let mut out = sona_ana::create_rms(&smp, &mut opts)?;
        let path = args::output_path(file, RMS_DEF_SUFFIX, &args.output);
        out.create(&path)?;
        sona_ana::compute_rms_into(&mut smp, Some(&opts), &mut out)?;
        finish(out)?;
        warnings |= out_was_empty(&smp, &opts)?;
    }
    Ok(warnings)
}

pub fn run_zcr(args: &AnalysisArgs) -> Result<bool> {
    let mut warnings = false;
    for file in &args.files {
        let mut smp = open_audio(file)?;
        let mut opts = AnaOptions::default();
        sona_ana::set_zcr_defaults(&mut opts);
        args::apply(&mut opts, &args.range, &args.framing, &args.numeric, &args.output);
        let mut out = sona_ana::create_zcr(&smp, &mut opts)?;
        let path = args::output_path(file, ZCR_DEF_SUFFIX, &args.output);
        out.create(&path)?;
        sona_ana::compute_zcr_into(&mut smp, Some(&opts), &mut out)?;
        finish(out)?;
        warnings |= out_was_empty(&smp, &opts)?;
    }
    Ok(warnings)
}

pub fn run_diff(args: &DiffArgs) -> Result<bool> {
    for file in &args.files {
        let mut smp = open_audio(file)?;
        let mut opts = AnaOptions::default();
        sona_ana::set_diff_defaults(&mut opts);
        let no_framing = args::FramingArgs {
            shift: None,
            size: None,
            effective: false,
            window: None,
        };
        args::apply(&mut opts, &args.range, &no_framing, &args.numeric, &args.output);
        if args.backward {
            opts.bits |= sona_ana::DIFF_OPT_BACKWARD;
        }
        if args.central {
            opts.bits |= sona_ana::DIFF_OPT_CENTRAL;
        }
        let mut out = sona_ana::create_diff(&smp, &mut opts)?;
        let path = args::output_path(file, sona_ana::diff::DIFF_DEF_SUFFIX, &args.output);
        out.create(&path)?;
        sona_ana::compute_diff_into(&mut smp, &opts, &mut out)?;
        finish(out)?;
    }
    Ok(false)
}

pub fn run_lp(args: &LpArgs) -> Result<bool> {
    let mut warnings = false;
    for file in &args.files {
        let mut smp = open_audio(file)?;
        let mut opts = AnaOptions::default();
        sona_ana::set_lp_defaults(&mut opts);
        args::apply(&mut opts, &args.range, &args.framing, &args.numeric, &args.output);
        opts.dtype = args.lp_type.clone();
        let lp_type = sona_ana::LpType::from_name(&opts.dtype)
            .ok_or_else(|| sona_sdo::SonaError::BadValue(opts.dtype.clone()))?;
        let mut out = sona_ana::create_lp(&smp, &mut opts)?;
        let path = args::output_path(file, lp_type.suffix(), &args.output);
        out.create(&path)?;
        sona_ana::compute_lp_into(&mut smp, Some(&opts), &mut out)?;
        finish(out)?;
        warnings |= out_was_empty(&smp, &opts)?;
    }
    Ok(warnings)
}

pub fn run_spectrum(args: &SpectrumArgs) -> Result<bool> {
    let mut warnings = false;
    for file in &args.files {
        let mut smp = open_audio(file)?;
        let mut opts = AnaOptions::default();
        match args.sp_type.as_str() {
            "LPS" => sona_ana::set_lps_defaults(&mut opts),
            "CSS" => sona_ana::set_css_defaults(&mut opts),
            _ => sona_ana::set_dft_defaults(&mut opts),
        }
        args::apply(&mut opts, &args.range, &args.framing, &args.numeric, &args.output);
        opts.dtype = args.sp_type.clone();
        if let Some(resolution) = args.resolution {
            opts.resolution = resolution;
        }
        if args.linear {
            opts.bits |= sona_ana::spectrum::SPECT_OPT_LIN_AMP;
        }
        let sp_type = sona_ana::SpectrumType::from_name(&opts.dtype)
            .ok_or_else(|| sona_sdo::SonaError::BadValue(opts.dtype.clone()))?;
        let mut out = sona_ana::create_spectrum(&smp, &mut opts)?;
        let path = args::output_path(file, sp_type.suffix(), &args.output);
        out.create(&path)?;
        sona_ana::compute_spectrum_into(&mut smp, Some(&opts), &mut out)?;
        finish(out)?;
        warnings |= out_was_empty(&smp, &opts)?;
    }
    Ok(warnings)
}

/// Re-derives the interval check to surface the warning-only exit code
/// when an analysis produced an empty interval.
fn out_was_empty(smp: &DataObject, opts: &AnaOptions) -> Result<bool> {
    let (timing, empty) = sona_ana::ana_timing(smp, opts)?;
    Ok(empty || timing.num_frames() == 0)
}
