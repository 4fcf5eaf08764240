/// Byte order of a file header and/or its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    /// Byte order not (yet) known.
    #[default]
    Undefined,
    /// Most significant byte first (network/Motorola order).
    Big,
    /// Most significant byte last (Intel order).
    Little,
}

impl Endian {
    /// The byte order of the machine we are running on.
    pub fn native() -> Endian {
        if cfg!(target_endian = "big") {
            Endian::Big
        } else {
            Endian::Little
        }
    }

    pub fn is_msb_first(self) -> bool {
        self == Endian::Big
    }

    pub fn is_msb_last(self) -> bool {
        self == Endian::Little
    }

    /// True when both orders are defined and disagree.
    pub fn differs_from(self, other: Endian) -> bool {
        (self.is_msb_first() && other.is_msb_last())
            || (self.is_msb_last() && other.is_msb_first())
    }
}

/// Two-flag orientation code, reused for several 2-state properties:
/// label begin/end marks, palatogram top/bottom view and articulogram
/// left/right facing. The same bit pattern concept as [`Endian`] but
/// with both-set and both-clear as meaningful states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Undefined,
    /// Label: marks the begin of a stretch. View: bottom. Facing: right.
    First,
    /// Label: marks the end of a stretch. View: top. Facing: left.
    Last,
    /// Label: marks both begin and end (a range).
    Range,
    /// Label: marks a point event.
    Event,
}

impl Orientation {
    pub fn marks_begin(self) -> bool {
        matches!(self, Orientation::First | Orientation::Range)
    }

    pub fn marks_end(self) -> bool {
        matches!(self, Orientation::Last | Orientation::Range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn differs() {
        assert!(Endian::Big.differs_from(Endian::Little));
        assert!(!Endian::Big.differs_from(Endian::Big));
        assert!(!Endian::Undefined.differs_from(Endian::Little));
        assert!(!Endian::Little.differs_from(Endian::Undefined));
    }

    #[test]
    fn orientation_marks() {
        assert!(Orientation::First.marks_begin());
        assert!(!Orientation::First.marks_end());
        assert!(Orientation::Range.marks_begin() && Orientation::Range.marks_end());
    }
}
