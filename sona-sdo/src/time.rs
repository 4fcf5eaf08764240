//! Conversion standards between time in seconds, sample numbers and
//! frame numbers. The library convention ("ASSP time") puts t = 0 at
//! the centre of sample 0, so the centre time of sample N is
//! `(N + 0.5) / sampFreq`.

/// Time in seconds to the nearest sample number.
#[inline]
pub fn time_to_smp_nr(time: f64, sfr: f64) -> i64 {
    (time * sfr + 0.5).floor() as i64
}

/// Begin time of a sample.
#[inline]
pub fn smp_nr_to_time(smp_nr: i64, sfr: f64) -> f64 {
    smp_nr as f64 / sfr
}

/// Time in seconds to the nearest frame number.
#[inline]
pub fn time_to_frm_nr(time: f64, sfr: f64, shift: i64) -> i64 {
    (time * sfr / shift as f64 + 0.5).floor() as i64
}

/// Begin time of a frame.
#[inline]
pub fn frm_nr_to_time(frm_nr: i64, sfr: f64, shift: i64) -> f64 {
    (frm_nr * shift) as f64 / sfr
}

/// Sample number to the nearest frame number.
#[inline]
pub fn smp_nr_to_frm_nr(smp_nr: i64, shift: i64) -> i64 {
    (smp_nr as f64 / shift as f64 + 0.5).floor() as i64
}

/// First sample of a frame.
#[inline]
pub fn frm_nr_to_smp_nr(frm_nr: i64, shift: i64) -> i64 {
    frm_nr * shift
}

/// Centre time of a sample.
#[inline]
pub fn smp_nr_to_ctime(smp_nr: i64, sfr: f64) -> f64 {
    (smp_nr as f64 + 0.5) / sfr
}

/// Centre time of a frame.
#[inline]
pub fn frm_nr_to_ctime(frm_nr: i64, sfr: f64, shift: i64) -> f64 {
    (frm_nr as f64 + 0.5) * shift as f64 / sfr
}

/// Frequency in Hz to the nearest period duration in samples.
#[inline]
pub fn freq_to_period(freq: f64, sfr: f64) -> i64 {
    (sfr / freq + 0.5).floor() as i64
}

/// Period duration in samples to frequency in Hz.
#[inline]
pub fn period_to_freq(period: i64, sfr: f64) -> f64 {
    sfr / period as f64
}

/// Floor/ceiling variants, only for special cases like range display.
#[inline]
pub fn time_floor_smp_nr(time: f64, sfr: f64) -> i64 {
    (time * sfr).floor() as i64
}

#[inline]
pub fn time_ceil_smp_nr(time: f64, sfr: f64) -> i64 {
    (time * sfr).ceil() as i64
}

#[inline]
pub fn smp_nr_floor_frm_nr(smp_nr: i64, shift: i64) -> i64 {
    (smp_nr as f64 / shift as f64).floor() as i64
}

#[inline]
pub fn smp_nr_ceil_frm_nr(smp_nr: i64, shift: i64) -> i64 {
    (smp_nr as f64 / shift as f64).ceil() as i64
}

/// Standard sub-division of a frame: number of leading samples before
/// the analysis shift window.
#[inline]
pub fn frame_head(size: i64, shift: i64) -> i64 {
    (size - shift + 1) / 2
}

/// Number of trailing samples behind the analysis shift window.
#[inline]
pub fn frame_tail(size: i64, shift: i64) -> i64 {
    (size - shift) / 2
}

/// Formats a sample count at a given rate as `HH:MM:SS.mmm`.
pub fn smp_nr_to_duration(smp_nr: i64, smp_rate: f64) -> String {
    if smp_rate <= 0.0 || smp_nr < 0 {
        return String::from("??:??:??.???");
    }
    let total_ms = (smp_nr as f64 * 1000.0 / smp_rate).round() as i64;
    let ms = total_ms % 1000;
    let s = (total_ms / 1000) % 60;
    let m = (total_ms / 60_000) % 60;
    let h = total_ms / 3_600_000;
    format!("{h:02}:{m:02}:{s:02}.{ms:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_conversions() {
        assert_eq!(time_to_smp_nr(1.0, 16000.0), 16000);
        assert_eq!(time_to_smp_nr(0.999_999, 16000.0), 16000);
        assert_eq!(time_to_frm_nr(1.25, 200.0, 1), 250);
        assert_eq!(smp_nr_to_frm_nr(250, 80), 3);
        assert_eq!(frm_nr_to_smp_nr(3, 80), 240);
    }

    #[test]
    fn centre_times() {
        assert_eq!(smp_nr_to_ctime(0, 16000.0), 0.5 / 16000.0);
        assert_eq!(frm_nr_to_ctime(0, 100.0, 10), 0.05);
    }

    #[test]
    fn frame_division() {
        assert_eq!(frame_head(320, 80), 120);
        assert_eq!(frame_tail(320, 80), 120);
        assert_eq!(frame_head(321, 80), 121);
        assert_eq!(frame_tail(321, 80), 120);
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(smp_nr_to_duration(16000, 16000.0), "00:00:01.000");
        assert_eq!(smp_nr_to_duration(8000, 16000.0), "00:00:00.500");
        assert_eq!(smp_nr_to_duration(-1, 16000.0), "??:??:??.???");
    }
}
