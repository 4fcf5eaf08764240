//! Speech signal analysis command line tools: one thin subcommand per
//! analysis, sharing a common option vocabulary.

mod args;
mod commands;

use clap::{Parser, Subcommand};
use sona_sdo::SonaError;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sona", version, about = "speech signal file analysis")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// short-term autocorrelation analysis
    Acf(AnalysisArgs),
    /// RMS amplitude analysis
    Rms(AnalysisArgs),
    /// zero-crossing rate analysis
    Zcr(AnalysisArgs),
    /// signal differentiation
    Diff(DiffArgs),
    /// linear prediction analysis (LPC/RFC/ARF/LAR)
    Lp(LpArgs),
    /// short-term spectral analysis
    Spectrum(SpectrumArgs),
}

#[derive(clap::Args)]
struct AnalysisArgs {
    /// input audio file(s)
    #[arg(required = true)]
    files: Vec<PathBuf>,
    #[command(flatten)]
    range: args::RangeArgs,
    #[command(flatten)]
    framing: args::FramingArgs,
    #[command(flatten)]
    numeric: args::NumericArgs,
    #[command(flatten)]
    output: args::OutputArgs,
    /// length-normalized coefficients (ACF)
    #[arg(long)]
    mean: bool,
    /// energy-normalized coefficients (ACF)
    #[arg(long)]
    norm: bool,
    /// linear amplitude instead of dB (RMS)
    #[arg(long)]
    linear: bool,
}

#[derive(clap::Args)]
struct DiffArgs {
    /// input audio file(s)
    #[arg(required = true)]
    files: Vec<PathBuf>,
    #[command(flatten)]
    range: args::RangeArgs,
    #[command(flatten)]
    numeric: args::NumericArgs,
    #[command(flatten)]
    output: args::OutputArgs,
    /// backward difference x[n] - x[n-1]
    #[arg(long, conflicts_with = "central")]
    backward: bool,
    /// central difference (x[n+1] - x[n-1]) / 2
    #[arg(long)]
    central: bool,
}

#[derive(clap::Args)]
struct LpArgs {
    /// input audio file(s)
    #[arg(required = true)]
    files: Vec<PathBuf>,
    #[command(flatten)]
    range: args::RangeArgs,
    #[command(flatten)]
    framing: args::FramingArgs,
    #[command(flatten)]
    numeric: args::NumericArgs,
    #[command(flatten)]
    output: args::OutputArgs,
    /// parameter coding type
    #[arg(long, short = 't', value_parser = ["LPC", "RFC", "ARF", "LAR"],
          default_value = "RFC")]
    lp_type: String,
}

#[derive(clap::Args)]
struct SpectrumArgs {
    /// input audio file(s)
    #[arg(required = true)]
    files: Vec<PathBuf>,
    #[command(flatten)]
    range: args::RangeArgs,
    #[command(flatten)]
    framing: args::FramingArgs,
    #[command(flatten)]
    numeric: args::NumericArgs,
    #[command(flatten)]
    output: args::OutputArgs,
    /// spectrum type
    #[arg(long, short = 't', value_parser = ["DFT", "PHASE", "LPS", "CSS", "CEP"],
          default_value = "DFT")]
    sp_type: String,
    /// spectral resolution in Hz
    #[arg(long, short = 'r')]
    resolution: Option<f64>,
    /// linear amplitude spectrum instead of dB (DFT)
    #[arg(long)]
    linear: bool,
}

/// exit codes: 0 success, 1 warning only, 2 user error, 3 data error,
/// 4 I/O error, 5 internal error
fn exit_code_for(err: &SonaError) -> u8 {
    let code = err.code();
    match code & 0x00F0 {
        0x00C0 => 2,
        0x00D0 => 3,
        0x00F0 => 4,
        _ => {
            if matches!(err, SonaError::Io(_)) {
                4
            } else {
                5
            }
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Acf(args) => commands::run_acf(&args),
        Command::Rms(args) => commands::run_rms(&args),
        Command::Zcr(args) => commands::run_zcr(&args),
        Command::Diff(args) => commands::run_diff(&args),
        Command::Lp(args) => commands::run_lp(&args),
        Command::Spectrum(args) => commands::run_spectrum(&args),
    };
    match result {
        Ok(warnings) => {
            if warnings {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            eprintln!("{}", sona_sdo::message_for(err.code()));
            eprintln!("{err}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}
