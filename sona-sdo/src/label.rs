//! Label records and their ordered store.
//!
//! A label carries a name and a position given as a sample number, a
//! time in seconds, or both; at least one of the two is defined.

use crate::error::{Result, SonaError};
use std::any::Any;

pub const LBL_TIME_UNDEF: f64 = -1.0;
pub const LBL_SMP_UNDEF: i64 = -1;

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub name: String,
    /// sample number (count starts at 0); negative when undefined
    pub smp_nr: i64,
    /// time in seconds; negative when undefined
    pub time: f64,
}

impl Label {
    pub fn new(name: impl Into<String>, smp_nr: i64, time: f64) -> Self {
        Label {
            name: name.into(),
            smp_nr,
            time,
        }
    }

    pub fn has_time(&self) -> bool {
        self.time >= 0.0
    }

    pub fn has_smp_nr(&self) -> bool {
        self.smp_nr >= 0
    }
}

/// Insertion position for [`add_label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelPosition {
    AsFirst,
    AsLast,
    /// Insert behind the last label earlier than the new one.
    AtTime,
    /// As [`AtTime`], but when several labels share the position the
    /// new one goes behind them: the list is walked to the first label
    /// strictly later and the new label is inserted before that one.
    ///
    /// [`AtTime`]: LabelPosition::AtTime
    AtTimeAsLast,
    /// Insert before the label at the given index.
    Before(usize),
    /// Insert behind the label at the given index.
    Behind(usize),
}

/// Adds a label to the store at the requested position. Returns the
/// index the label ended up at.
///
/// Position comparison uses the sample number when the new label has
/// one, the time otherwise; mixing labels where the chosen key is
/// undefined is an error.
pub fn add_label(labels: &mut Vec<Label>, new: Label, pos: LabelPosition) -> Result<usize> {
    let use_time = !new.has_smp_nr();
    if use_time && !new.has_time() {
        return Err(SonaError::BadArgs("add_label"));
    }
    let key_defined = |l: &Label| if use_time { l.has_time() } else { l.has_smp_nr() };
    let earlier = |l: &Label, r: &Label| {
        if use_time {
            l.time < r.time
        } else {
            l.smp_nr < r.smp_nr
        }
    };

    let at = match pos {
        LabelPosition::AsFirst => 0,
        LabelPosition::AsLast => labels.len(),
        LabelPosition::Before(i) => {
            let ref_lbl = labels.get(i).ok_or(SonaError::BadArgs("add_label"))?;
            if !key_defined(ref_lbl) {
                return Err(SonaError::Bug(String::from("add_label: time/smpNr mismatch")));
            }
            if earlier(ref_lbl, &new) {
                return Err(SonaError::Bug(String::from(
                    "add_label: incorrect insertion point",
                )));
            }
            i
        }
        LabelPosition::Behind(i) => {
            let ref_lbl = labels.get(i).ok_or(SonaError::BadArgs("add_label"))?;
            if !key_defined(ref_lbl) {
                return Err(SonaError::Bug(String::from("add_label: time/smpNr mismatch")));
            }
            if earlier(&new, ref_lbl) {
                return Err(SonaError::Bug(String::from(
                    "add_label: incorrect insertion point",
                )));
            }
            i + 1
        }
        LabelPosition::AtTime | LabelPosition::AtTimeAsLast => {
            let mut i = 0usize;
            while i < labels.len() {
                if !key_defined(&labels[i]) {
                    return Err(SonaError::Bug(String::from("add_label: time/smpNr mismatch")));
                }
                if !earlier(&labels[i], &new) {
                    break;
                }
                i += 1;
            }
            if pos == LabelPosition::AtTimeAsLast && i < labels.len() {
                // walk to the first label strictly later than the new one
                while i < labels.len() {
                    if !key_defined(&labels[i]) {
                        return Err(SonaError::Bug(String::from(
                            "add_label: time/smpNr mismatch",
                        )));
                    }
                    if earlier(&new, &labels[i]) {
                        break;
                    }
                    i += 1;
                }
            }
            i
        }
    };
    labels.insert(at, new);
    Ok(at)
}

/// Estimates the sampling rate from a sample-number/time pair, rounded
/// to a whole number of Hz when requested.
pub fn estimate_ref_rate(smp_nr: i64, time: f64, round: bool) -> f64 {
    if smp_nr < 0 || time <= 0.0 {
        return 0.0;
    }
    let rate = smp_nr as f64 / time;
    if round {
        rate.round()
    } else {
        rate
    }
}

/// Generic block holding a verbatim copy of the fixed header part of an
/// IPdS MIX or SAMPA label file, so a rewrite can reproduce it.
#[derive(Debug, Default)]
pub struct LabelHeader {
    pub head_copy: Vec<String>,
}

impl crate::dataobj::GenericData for LabelHeader {
    fn ident(&self) -> &str {
        "IPdS_label_header"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

pub const XLBL_DEF_COLOR: i32 = 121;

/// Generic block with the `signal`, `font` and `color` header items of
/// an ESPS xlabel file.
#[derive(Debug)]
pub struct XlabelHeader {
    pub signal: Option<String>,
    pub font: Option<String>,
    pub color: i32,
    pub separator: Option<String>,
    pub tiers: i32,
}

impl Default for XlabelHeader {
    fn default() -> Self {
        XlabelHeader {
            signal: None,
            font: None,
            color: XLBL_DEF_COLOR,
            separator: None,
            tiers: 1,
        }
    }
}

impl crate::dataobj::GenericData for XlabelHeader {
    fn ident(&self) -> &str {
        "xlabel_header_data"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(name: &str, time: f64) -> Label {
        Label::new(name, LBL_SMP_UNDEF, time)
    }

    #[test]
    fn time_ordered_insertion() {
        let mut labels = Vec::new();
        add_label(&mut labels, label("c", 3.0), LabelPosition::AtTime).unwrap();
        add_label(&mut labels, label("a", 1.0), LabelPosition::AtTime).unwrap();
        add_label(&mut labels, label("b", 2.0), LabelPosition::AtTime).unwrap();
        let names: Vec<&str> = labels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn equal_times_insert_before_by_default() {
        let mut labels = Vec::new();
        add_label(&mut labels, label("x", 2.0), LabelPosition::AsLast).unwrap();
        add_label(&mut labels, label("y", 2.0), LabelPosition::AtTime).unwrap();
        let names: Vec<&str> = labels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["y", "x"]);
    }

    #[test]
    fn equal_times_as_last_goes_behind() {
        let mut labels = Vec::new();
        add_label(&mut labels, label("x", 2.0), LabelPosition::AsLast).unwrap();
        add_label(&mut labels, label("z", 3.0), LabelPosition::AsLast).unwrap();
        add_label(&mut labels, label("y", 2.0), LabelPosition::AtTimeAsLast).unwrap();
        let names: Vec<&str> = labels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["x", "y", "z"]);
    }

    #[test]
    fn relative_insertion_validates_order() {
        let mut labels = Vec::new();
        add_label(&mut labels, label("a", 1.0), LabelPosition::AsLast).unwrap();
        add_label(&mut labels, label("c", 3.0), LabelPosition::AsLast).unwrap();
        add_label(&mut labels, label("b", 2.0), LabelPosition::Before(1)).unwrap();
        assert_eq!(labels[1].name, "b");
        let err = add_label(&mut labels, label("late", 9.0), LabelPosition::Before(0));
        assert!(err.is_err());
        let err = add_label(&mut labels, label("early", 0.5), LabelPosition::Behind(2));
        assert!(err.is_err());
    }

    #[test]
    fn sample_numbers_preferred_over_time() {
        let mut labels = Vec::new();
        add_label(&mut labels, Label::new("a", 100, 99.0), LabelPosition::AtTime).unwrap();
        add_label(&mut labels, Label::new("b", 50, 999.0), LabelPosition::AtTime).unwrap();
        assert_eq!(labels[0].name, "b");
    }

    #[test]
    fn rate_estimate() {
        assert_eq!(estimate_ref_rate(16000, 1.0, true), 16000.0);
        assert_eq!(estimate_ref_rate(-1, 1.0, true), 0.0);
        assert!((estimate_ref_rate(22050, 2.0, false) - 11025.0).abs() < 1e-9);
    }
}
