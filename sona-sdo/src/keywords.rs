//! Keyword tables relating track names in file headers to data types.
//!
//! Different keywords may map to the same data type but not the other
//! way around; the first entry for a type is the default track name.

use crate::dataobj::DataType;

pub struct KeywordEntry {
    pub keyword: &'static str,
    pub factor: &'static str,
    pub unit: &'static str,
    pub dtype: DataType,
}

macro_rules! kw {
    ($k:literal, $f:literal, $u:literal, $t:expr) => {
        KeywordEntry {
            keyword: $k,
            factor: $f,
            unit: $u,
            dtype: $t,
        }
    };
}

/// Track keywords for the SSFF format.
pub static KDT_SSFF: &[KeywordEntry] = &[
    kw!("audio", "", "", DataType::Sample),
    kw!("samples", "", "", DataType::Sample),
    kw!("rms", "", "dB", DataType::Rms),
    kw!("zcr", "", "Hz", DataType::Zcr),
    kw!("acf", "", "", DataType::Acf),
    kw!("lpc", "", "", DataType::Lpc),
    kw!("rfc", "", "", DataType::Rfc),
    kw!("arf", "", "", DataType::Arf),
    kw!("lar", "", "", DataType::Lar),
    kw!("gain", "", "dB", DataType::Gain),
    kw!("lpcep", "", "", DataType::LpCepstrum),
    kw!("F0", "", "Hz", DataType::Pitch),
    kw!("fm", "", "Hz", DataType::Ffr),
    kw!("bw", "", "Hz", DataType::Fbw),
    kw!("dft", "", "dB", DataType::FtPower),
    kw!("lps", "", "dB", DataType::FtLpSmoothed),
    kw!("css", "", "dB", DataType::FtCepSmoothed),
    kw!("cep", "", "", DataType::FtCepstrum),
    kw!("prob", "", "", DataType::Probability),
    kw!("epg", "", "", DataType::Epg),
];

/// Track keywords for the XASSP ASCII format.
pub static KDT_XASSP: &[KeywordEntry] = &[
    kw!("AUDIO", "", "", DataType::Sample),
    kw!("RMS", "", "dB", DataType::Rms),
    kw!("ZCR", "", "Hz", DataType::Zcr),
    kw!("ACF", "", "", DataType::Acf),
    kw!("LPC", "", "", DataType::Lpc),
    kw!("RFC", "", "", DataType::Rfc),
    kw!("ARF", "", "", DataType::Arf),
    kw!("LAR", "", "", DataType::Lar),
    kw!("GAIN", "", "dB", DataType::Gain),
    kw!("F0", "", "Hz", DataType::Pitch),
    kw!("DFT", "", "dB", DataType::FtPower),
];

/// Finds the table entry for a keyword.
pub fn keyword_to_entry(keyword: &str, table: &'static [KeywordEntry]) -> Option<&'static KeywordEntry> {
    table.iter().find(|e| e.keyword == keyword)
}

/// Finds the default entry for a data type.
pub fn dtype_to_entry(dtype: DataType, table: &'static [KeywordEntry]) -> Option<&'static KeywordEntry> {
    table.iter().find(|e| e.dtype == dtype)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_entry_is_first_match() {
        let e = dtype_to_entry(DataType::Sample, KDT_SSFF).unwrap();
        assert_eq!(e.keyword, "audio");
        assert_eq!(keyword_to_entry("samples", KDT_SSFF).unwrap().dtype, DataType::Sample);
        assert!(keyword_to_entry("nosuch", KDT_SSFF).is_none());
        assert_eq!(dtype_to_entry(DataType::Rms, KDT_XASSP).unwrap().unit, "dB");
    }
}
