//! GLONASS navigation string decoder.
//!
//! Input is one string re-packed as four 32-bit words (the 85 broadcast
//! bits left-aligned in 128). The string number rides in bits 2-5; the
//! frame number comes from the superframe context and is supplied by the
//! driver. Strings classify as Ephemeris (1-4), Time (5) or
//! Almanac/Extra (6-15); only the time string is unpacked further, the
//! ephemeris state vector being Cartesian and outside the orbit record's
//! Keplerian vocabulary.

use gnss::prelude::Constellation;
use log::{debug, trace};

use crate::bits::BitReader;
use crate::navigation::OrbitKind;
use crate::subframe::{GloTime, SubframeAux, SubframeData, SubframeError};

/// What a string number classifies as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringClass {
    /// Strings 1-4: immediate (ephemeris) data for the transmitter.
    Ephemeris,
    /// String 5: time scale parameters.
    Time,
    /// Strings 6-15: almanac and extra data.
    Almanac,
}

/// Classify a string number 1-15.
pub fn classify(string: u8) -> Option<StringClass> {
    match string {
        1..=4 => Some(StringClass::Ephemeris),
        5 => Some(StringClass::Time),
        6..=15 => Some(StringClass::Almanac),
        _ => None,
    }
}

fn pack_words(words: &[u32; 4]) -> [u8; 16] {
    let mut bytes = [0u8; 16];
    for (index, word) in words.iter().enumerate() {
        bytes[index * 4..index * 4 + 4].copy_from_slice(&word.to_be_bytes());
    }
    bytes
}

/// Decode one string from transmitter `tsv` (orbital slot 1-24).
pub fn decode(tsv: u8, frame: u8, words: &[u32; 4]) -> Result<SubframeData, SubframeError> {
    if tsv == 0 || tsv > 24 {
        return Err(SubframeError::DummySv(tsv));
    }
    if !(1..=5).contains(&frame) {
        return Err(SubframeError::ReservedPage(frame));
    }

    let bytes = pack_words(words);
    let mut reader = BitReader::new(&bytes, 0);
    reader.skip(1); // idle chip
    let string = reader.read(4) as u8;

    let class = classify(string).ok_or(SubframeError::ReservedPage(string))?;

    let mut data = SubframeData::new(Constellation::Glonass, tsv);
    data.subframe = string;
    data.frame = frame;

    trace!("glo: sv {} frame {} string {} ({:?})", tsv, frame, string, class);

    match class {
        StringClass::Ephemeris => {
            // Cartesian state vector; classified but not unpacked
            data.kind = OrbitKind::Ephemeris;
        },
        StringClass::Time => {
            let na = reader.read(11) as u16;
            let tau_c = reader.read_signed(32) as f64 * 2f64.powi(-31);
            reader.skip(1);
            let n4 = reader.read(5) as u8;

            debug!("glo: sv {} time string, NA {} N4 {}", tsv, na, n4);
            data.aux = Some(SubframeAux::GloTime(GloTime { na, tau_c, n4 }));
        },
        StringClass::Almanac => {
            data.kind = OrbitKind::Almanac;
        },
    }

    Ok(data)
}

#[cfg(test)]
mod test {
    use super::*;

    fn string_words(string: u8, tail: impl FnOnce(&mut Vec<bool>)) -> [u32; 4] {
        let mut bits = vec![false]; // idle chip
        for bit in (0..4).rev() {
            bits.push((string >> bit) & 1 == 1);
        }
        tail(&mut bits);
        bits.resize(128, false);

        let mut words = [0u32; 4];
        for (index, chunk) in bits.chunks(32).enumerate() {
            let mut value = 0u32;
            for bit in chunk {
                value = (value << 1) | (*bit as u32);
            }
            words[index] = value;
        }
        words
    }

    #[test]
    fn classification() {
        assert_eq!(classify(1), Some(StringClass::Ephemeris));
        assert_eq!(classify(4), Some(StringClass::Ephemeris));
        assert_eq!(classify(5), Some(StringClass::Time));
        assert_eq!(classify(6), Some(StringClass::Almanac));
        assert_eq!(classify(15), Some(StringClass::Almanac));
        assert_eq!(classify(0), None);
    }

    #[test]
    fn ephemeris_string_classified() {
        let words = string_words(2, |_| {});
        let data = decode(7, 3, &words).unwrap();
        assert_eq!(data.subframe, 2);
        assert_eq!(data.frame, 3);
        assert_eq!(data.kind, OrbitKind::Ephemeris);
        assert!(data.orbit.is_none());
    }

    #[test]
    fn time_string_unpacks_tau_c() {
        let words = string_words(5, |bits| {
            // NA = 731
            for bit in (0..11).rev() {
                bits.push((731u16 >> bit) & 1 == 1);
            }
            // tau_c raw = -100
            let raw = (-100i64 as u64) & 0xFFFF_FFFF;
            for bit in (0..32).rev() {
                bits.push((raw >> bit) & 1 == 1);
            }
            bits.push(false);
            // N4 = 7
            for bit in (0..5).rev() {
                bits.push((7u8 >> bit) & 1 == 1);
            }
        });

        let data = decode(1, 1, &words).unwrap();
        match data.aux {
            Some(SubframeAux::GloTime(time)) => {
                assert_eq!(time.na, 731);
                assert_eq!(time.tau_c, -100.0 * 2f64.powi(-31));
                assert_eq!(time.n4, 7);
            },
            aux => panic!("expected time string, got {:?}", aux),
        }
    }

    #[test]
    fn dummy_slot_rejected() {
        let words = string_words(1, |_| {});
        assert!(matches!(decode(0, 1, &words), Err(SubframeError::DummySv(0))));
        assert!(matches!(decode(25, 1, &words), Err(SubframeError::DummySv(25))));
    }
}
