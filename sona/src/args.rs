//! The option vocabulary shared by all analysis subcommands.

use clap::Args;
use sona_ana::AnaOptions;
use std::path::{Path, PathBuf};

#[derive(Args, Debug, Clone)]
pub struct RangeArgs {
    /// begin of the analysis interval in seconds
    #[arg(long, short = 'b')]
    pub begin: Option<f64>,
    /// end of the analysis interval in seconds
    #[arg(long, short = 'e')]
    pub end: Option<f64>,
    /// single-frame analysis at this time (excludes --begin/--end)
    #[arg(long, short = 'c', conflicts_with_all = ["begin", "end"])]
    pub centre: Option<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct FramingArgs {
    /// window shift in ms
    #[arg(long, short = 's')]
    pub shift: Option<f64>,
    /// window size in ms
    #[arg(long, short = 'S')]
    pub size: Option<f64>,
    /// interpret the window size as effective length
    #[arg(long, short = 'E')]
    pub effective: bool,
    /// window function
    #[arg(long, short = 'w')]
    pub window: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct NumericArgs {
    /// analysis/prediction order
    #[arg(long, short = 'o')]
    pub order: Option<usize>,
    /// pre-emphasis coefficient (-1 < u < 1)
    #[arg(long)]
    pub preemph: Option<f64>,
    /// selected channel (counting starts at 1)
    #[arg(long, short = 'C')]
    pub channel: Option<usize>,
    /// digits accuracy of ASCII output
    #[arg(long)]
    pub accuracy: Option<usize>,
    /// digits precision of ASCII output
    #[arg(long)]
    pub precision: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// output file format
    #[arg(long, short = 'f', value_parser = ["SSFF", "RAW", "XASSP"])]
    pub format: Option<String>,
    /// output file name extension
    #[arg(long, short = 'x')]
    pub suffix: Option<String>,
    /// store the output file in this directory
    #[arg(long, value_name = "PATH", conflicts_with = "in_place")]
    pub out_dir: Option<PathBuf>,
    /// store the output file next to the input file
    #[arg(long)]
    pub in_place: bool,
}

/// Merges the command line values into prepared analysis options.
pub fn apply(
    opts: &mut AnaOptions,
    range: &RangeArgs,
    framing: &FramingArgs,
    numeric: &NumericArgs,
    output: &OutputArgs,
) {
    if let Some(begin) = range.begin {
        opts.begin_time = begin;
    }
    if let Some(end) = range.end {
        opts.end_time = end;
    }
    if let Some(centre) = range.centre {
        opts.centre_time = centre;
        opts.use_ctime = true;
    }
    if let Some(shift) = framing.shift {
        opts.ms_shift = shift;
    }
    if let Some(size) = framing.size {
        opts.ms_size = size;
        // an explicit size is taken literally unless --effective is given
        opts.effective = false;
    }
    if framing.effective {
        opts.effective = true;
    }
    if let Some(window) = &framing.window {
        opts.win_func = window.clone();
    }
    if let Some(order) = numeric.order {
        opts.order = order;
    }
    if let Some(preemph) = numeric.preemph {
        opts.pre_emph = preemph;
    }
    if let Some(channel) = numeric.channel {
        opts.channel = channel;
    }
    if let Some(accuracy) = numeric.accuracy {
        opts.accuracy = accuracy;
    }
    if let Some(precision) = numeric.precision {
        opts.precision = precision;
    }
    if let Some(format) = &output.format {
        opts.format = format.clone();
    }
}

/// Derives the output path: the input base name with the analysis
/// suffix, placed in the output directory, next to the input, or in
/// the working directory.
pub fn output_path(input: &Path, default_suffix: &str, output: &OutputArgs) -> PathBuf {
    let suffix = output.suffix.as_deref().unwrap_or(default_suffix);
    let stem = input.file_stem().unwrap_or_default();
    let mut name = stem.to_os_string();
    name.push(suffix);
    if let Some(dir) = &output.out_dir {
        dir.join(name)
    } else if output.in_place {
        input.with_file_name(name)
    } else {
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_placement() {
        let out = OutputArgs {
            format: None,
            suffix: None,
            out_dir: None,
            in_place: false,
        };
        assert_eq!(
            output_path(Path::new("/data/a.wav"), ".rms", &out),
            PathBuf::from("a.rms")
        );
        let out = OutputArgs {
            in_place: true,
            ..out.clone()
        };
        assert_eq!(
            output_path(Path::new("/data/a.wav"), ".rms", &out),
            PathBuf::from("/data/a.rms")
        );
        let out = OutputArgs {
            out_dir: Some(PathBuf::from("/tmp/out")),
            in_place: false,
            suffix: Some(String::from(".x")),
            format: None,
        };
        assert_eq!(
            output_path(Path::new("/data/a.wav"), ".rms", &out),
            PathBuf::from("/tmp/out/a.x")
        );
    }
}
