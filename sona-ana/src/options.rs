//! The hold-all options structure shared by all analyses.

/// Default prediction order for a sampling rate: rate in kHz + 3,
/// rounded.
pub fn default_order(samp_freq: f64) -> usize {
    (samp_freq / 1000.0 + 3.5).floor() as usize
}

/// Optional parameter values for the analysis functions. Every analysis
/// has a `set_defaults` that clears this structure and fills in its own
/// values.
#[derive(Debug, Clone)]
pub struct AnaOptions {
    /// analysis range in seconds; non-positive means full range
    pub begin_time: f64,
    pub end_time: f64,
    /// single-frame/event analysis time; active when `use_ctime`
    pub centre_time: f64,
    /// (effective) window size in ms
    pub ms_size: f64,
    /// window shift in ms
    pub ms_shift: f64,
    /// size of smoothing window in ms
    pub ms_smooth: f64,
    /// (effective) bandwidth in Hz
    pub bandwidth: f64,
    /// spectral resolution in Hz
    pub resolution: f64,
    /// pre-emphasis coefficient
    pub pre_emph: f64,
    pub fft_len: usize,
    /// selected channel (> 0) or 0 for all channels
    pub channel: usize,
    /// analysis/prediction order; 0 = automatic
    pub order: usize,
    /// digits precision of ASCII output (F format)
    pub precision: usize,
    /// digits accuracy of ASCII output (E format)
    pub accuracy: usize,
    /// parameter coding type (e.g. "RFC", "LPS")
    pub dtype: String,
    /// output file format name ("SSFF", "XASSP", "RAW")
    pub format: String,
    /// window function name
    pub win_func: String,
    /// window size is an effective length (scaled by the window's ENBW)
    pub effective: bool,
    /// derive the window size from `bandwidth`
    pub use_enbw: bool,
    /// event analysis at `centre_time` (overrules range and shift)
    pub use_ctime: bool,
    /// analysis-specific option bits
    pub bits: u32,
}

impl Default for AnaOptions {
    fn default() -> Self {
        AnaOptions {
            begin_time: -1.0,
            end_time: -1.0,
            centre_time: -1.0,
            ms_size: 0.0,
            ms_shift: 0.0,
            ms_smooth: 0.0,
            bandwidth: 0.0,
            resolution: 0.0,
            pre_emph: 0.0,
            fft_len: 0,
            channel: 0,
            order: 0,
            precision: 0,
            accuracy: 0,
            dtype: String::new(),
            format: String::new(),
            win_func: String::new(),
            effective: false,
            use_enbw: false,
            use_ctime: false,
            bits: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn automatic_order() {
        assert_eq!(default_order(16000.0), 19);
        assert_eq!(default_order(8000.0), 11);
        assert_eq!(default_order(10000.0), 13);
    }

    #[test]
    fn defaults_deactivate_ranges() {
        let opts = AnaOptions::default();
        assert!(opts.begin_time < 0.0);
        assert!(opts.centre_time < 0.0);
        assert!(!opts.use_ctime);
    }
}
