//! CCITT G.711 A-law and mu-law codecs.
//!
//! Table-driven segment coding with a 13-bit (A-law) / 14-bit (mu-law)
//! dynamic range mapped onto the signed 16-bit domain. Encoders saturate
//! to the largest-segment quantum; the conversions are lossy.

const QUANT_MASK: u8 = 0x0F;
const SEG_SHIFT: u8 = 4;
const SEG_MASK: u8 = 0x70;
const SIGN_BIT: u8 = 0x80;

const SEG_AEND: [i16; 8] = [0x1F, 0x3F, 0x7F, 0xFF, 0x1FF, 0x3FF, 0x7FF, 0xFFF];
const SEG_UEND: [i16; 8] = [0x3F, 0x7F, 0xFF, 0x1FF, 0x3FF, 0x7FF, 0xFFF, 0x1FFF];

// Direct conversion tables from the G.711 specification, with the
// transcription errors of older implementations corrected.
#[rustfmt::skip]
const U2A: [u8; 128] = [
      1,   1,   2,   2,   3,   3,   4,   4,
      5,   5,   6,   6,   7,   7,   8,   8,
      9,  10,  11,  12,  13,  14,  15,  16,
     17,  18,  19,  20,  21,  22,  23,  24,
     25,  27,  29,  31,  33,  34,  35,  36,
     37,  38,  39,  40,  41,  42,  43,  44,
     46,  48,  49,  50,  51,  52,  53,  54,
     55,  56,  57,  58,  59,  60,  61,  62,
     64,  65,  66,  67,  68,  69,  70,  71,
     72,  73,  74,  75,  76,  77,  78,  79,
     80,  82,  83,  84,  85,  86,  87,  88,
     89,  90,  91,  92,  93,  94,  95,  96,
     97,  98,  99, 100, 101, 102, 103, 104,
    105, 106, 107, 108, 109, 110, 111, 112,
    113, 114, 115, 116, 117, 118, 119, 120,
    121, 122, 123, 124, 125, 126, 127, 128,
];

#[rustfmt::skip]
const A2U: [u8; 128] = [
      1,   3,   5,   7,   9,  11,  13,  15,
     16,  17,  18,  19,  20,  21,  22,  23,
     24,  25,  26,  27,  28,  29,  30,  31,
     32,  32,  33,  33,  34,  34,  35,  35,
     36,  37,  38,  39,  40,  41,  42,  43,
     44,  45,  46,  47,  48,  48,  49,  49,
     50,  51,  52,  53,  54,  55,  56,  57,
     58,  59,  60,  61,  62,  63,  64,  64,
     65,  66,  67,  68,  69,  70,  71,  72,
     73,  74,  75,  76,  77,  78,  79,  80,
     80,  81,  82,  83,  84,  85,  86,  87,
     88,  89,  90,  91,  92,  93,  94,  95,
     96,  97,  98,  99, 100, 101, 102, 103,
    104, 105, 106, 107, 108, 109, 110, 111,
    112, 113, 114, 115, 116, 117, 118, 119,
    120, 121, 122, 123, 124, 125, 126, 127,
];

fn law_segment(val: i16, table: &[i16; 8]) -> u8 {
    for (i, end) in table.iter().enumerate() {
        if val <= *end {
            return i as u8;
        }
    }
    8
}

/// Converts a 16-bit linear PCM value (2's complement) to 8-bit A-law.
pub fn i16_to_alaw(pcm_val: i16) -> u8 {
    let mut pcm_val = pcm_val / 8; // shift to 13-bit range
    let mask: u8 = if pcm_val >= 0 {
        0xD5 // sign (7th) bit = 1
    } else {
        pcm_val = -pcm_val - 1;
        0x55 // sign bit = 0
    };
    let seg = law_segment(pcm_val, &SEG_AEND);
    let a_val = if seg >= 8 {
        0x7F // out of range, take maximum value
    } else {
        let quant = if seg < 2 {
            ((pcm_val >> 1) as u8) & QUANT_MASK
        } else {
            ((pcm_val >> seg) as u8) & QUANT_MASK
        };
        (seg << SEG_SHIFT) | quant
    };
    a_val ^ mask
}

/// Converts an 8-bit A-law value to 16-bit linear PCM.
pub fn alaw_to_i16(a_val: u8) -> i16 {
    let a_val = a_val ^ 0x55;
    let mut pcm_val = ((a_val & QUANT_MASK) as i16) << SEG_SHIFT;
    let seg = (a_val & SEG_MASK) >> SEG_SHIFT;
    match seg {
        0 => pcm_val += 8,
        1 => pcm_val += 0x108,
        _ => {
            pcm_val += 0x108;
            pcm_val <<= seg - 1;
        }
    }
    if a_val & SIGN_BIT != 0 {
        pcm_val
    } else {
        -pcm_val
    }
}

const ULAW_BIAS: i16 = 0x84;
const ULAW_CLIP: i16 = 8159;

/// Converts a 16-bit linear PCM value (2's complement) to 8-bit mu-law.
pub fn i16_to_ulaw(pcm_val: i16) -> u8 {
    let mut pcm_val = pcm_val / 4; // clip to range -8192 ... +8191
    let mask: u8 = if pcm_val < 0 {
        pcm_val = -pcm_val;
        0x7F
    } else {
        0xFF
    };
    if pcm_val > ULAW_CLIP {
        pcm_val = ULAW_CLIP;
    }
    pcm_val += ULAW_BIAS >> 2;
    let seg = law_segment(pcm_val, &SEG_UEND);
    let u_val = if seg >= 8 {
        0x7F // out of range, take maximum value
    } else {
        (seg << SEG_SHIFT) | (((pcm_val >> (seg + 1)) as u8) & QUANT_MASK)
    };
    u_val ^ mask
}

/// Converts an 8-bit mu-law value to 16-bit linear PCM.
pub fn ulaw_to_i16(u_val: u8) -> i16 {
    let u_val = !u_val;
    let mut pcm_val = (((u_val & QUANT_MASK) as i16) << 3) + ULAW_BIAS;
    pcm_val <<= (u_val & SEG_MASK) >> SEG_SHIFT;
    if u_val & SIGN_BIT != 0 {
        ULAW_BIAS - pcm_val
    } else {
        pcm_val - ULAW_BIAS
    }
}

/// Direct A-law to mu-law conversion.
pub fn alaw_to_ulaw(a_val: u8) -> u8 {
    if a_val & SIGN_BIT != 0 {
        0xFF ^ A2U[(a_val ^ 0xD5) as usize]
    } else {
        0x7F ^ A2U[(a_val ^ 0x55) as usize]
    }
}

/// Direct mu-law to A-law conversion.
pub fn ulaw_to_alaw(u_val: u8) -> u8 {
    if u_val & SIGN_BIT != 0 {
        0xD5 ^ (U2A[(0xFF ^ u_val) as usize] - 1)
    } else {
        0x55 ^ (U2A[(0x7F ^ u_val) as usize] - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alaw_idempotent_on_decoded_values() {
        for code in 0u8..=255 {
            let pcm = alaw_to_i16(code);
            assert_eq!(alaw_to_i16(i16_to_alaw(pcm)), pcm, "code {code:#04x}");
        }
    }

    #[test]
    fn ulaw_idempotent_on_decoded_values() {
        for code in 0u8..=255 {
            let pcm = ulaw_to_i16(code);
            assert_eq!(ulaw_to_i16(i16_to_ulaw(pcm)), pcm, "code {code:#04x}");
        }
    }

    #[test]
    fn alaw_quantization_error_bounded() {
        // one quantum in the largest A-law segment is 2^5 in the 13-bit
        // domain, i.e. 256 in the 16-bit domain
        for x in (-32768i32..=32767).step_by(17) {
            let x = x as i16;
            let y = alaw_to_i16(i16_to_alaw(x));
            assert!((y as i32 - x as i32).abs() <= 256, "x = {x}, y = {y}");
        }
    }

    #[test]
    fn ulaw_quantization_error_bounded() {
        // one quantum in the largest mu-law segment is 2^7 in the 14-bit
        // domain, i.e. 512 in the 16-bit domain
        for x in (-32768i32..=32767).step_by(17) {
            let x = x as i16;
            let y = ulaw_to_i16(i16_to_ulaw(x));
            assert!((y as i32 - x as i32).abs() <= 512, "x = {x}, y = {y}");
        }
    }

    #[test]
    fn law_to_law_matches_transcoding() {
        for code in 0u8..=255 {
            // direct conversion stays within one segment quantum of the
            // PCM value the source code represents
            let a2u = ulaw_to_i16(alaw_to_ulaw(code));
            assert!((a2u as i32 - alaw_to_i16(code) as i32).abs() <= 512);
            let u2a = alaw_to_i16(ulaw_to_alaw(code));
            assert!((u2a as i32 - ulaw_to_i16(code) as i32).abs() <= 512);
        }
    }
}
