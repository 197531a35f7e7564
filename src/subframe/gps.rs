//! GPS / QZSS LNAV subframe decoder.
//!
//! Input is ten 30-bit words as they came off the air: 24 data bits plus
//! 6 parity bits each, possibly polarity-inverted, with the D30★
//! complement rule still applied. Preamble detection, inversion repair
//! and parity validation happen here; field extraction then works on the
//! stripped 24-bit words.
//!
//! Bit offsets and scale factors follow IS-GPS-200 LNAV. Semicircle
//! valued angles stay in semicircles.

use gnss::prelude::{Constellation, SV};
use log::{debug, trace};

use crate::bits::sign_extend;
use crate::navigation::{Orbit, OrbitKind};
use crate::session::{GnssContext, LeapNotify};
use crate::subframe::{
    HealthTable, IonoUtc, NmctErds, SubframeAux, SubframeData, SubframeError,
};

/// TLM preamble, upright polarity.
pub const PREAMBLE: u8 = 0x8B;
/// TLM preamble as seen on an inverted stream.
pub const PREAMBLE_INVERTED: u8 = 0x74;

/// Parity masks, MSB layout: bit 31 = D29★, bit 30 = D30★,
/// bits 29..6 = d1..d24, bits 5..0 = received D25..D30.
/// One mask per computed parity bit (IS-GPS-200 table 20-XIV).
const PARITY_MASKS: [u32; 6] = [
    0xBB1F_3480, // D25
    0x5D8F_9A40, // D26
    0xAEC7_CD00, // D27
    0x5763_E680, // D28
    0x6BB1_F340, // D29
    0x8B7A_89C0, // D30
];

/// Classical GPS parity over one 30-bit word with the previous word's
/// two trailing bits attached. The parity equations are stated over the
/// source data bits, so a D30★ complement is undone first. On success
/// the restored 24 data bits are returned.
fn check_parity(d29star: bool, d30star: bool, word: u32) -> Option<u32> {
    let mut attached = word & 0x3FFF_FFFF;
    if d30star {
        // source data bits were complemented before transmission;
        // the parity bits were not
        attached ^= 0x3FFF_FFC0;
        attached |= 1 << 30;
    }
    if d29star {
        attached |= 1 << 31;
    }

    let mut computed = 0u32;
    for mask in PARITY_MASKS {
        computed = (computed << 1) | ((attached & mask).count_ones() & 1);
    }

    if computed == (word & 0x3F) {
        Some((attached >> 6) & 0xFF_FFFF)
    } else {
        None
    }
}

/// Validate parity over all ten words and strip each to its 24 restored
/// data bits.
fn strip_parity(words: &[u32; 10]) -> Result<[u32; 10], SubframeError> {
    let mut stripped = [0u32; 10];
    let mut d29star = false;
    let mut d30star = false;

    for (index, raw) in words.iter().enumerate() {
        let word = raw & 0x3FFF_FFFF;

        stripped[index] = check_parity(d29star, d30star, word)
            .ok_or(SubframeError::ParityFailure(index + 1))?;

        d29star = (word >> 1) & 1 == 1;
        d30star = word & 1 == 1;
    }

    Ok(stripped)
}

/// Decode one LNAV subframe for transmitter `tsv`.
///
/// Updates the context's GPS week/TOW on subframe 1, and the leap-second
/// state on subframe 4 page 18. Context updates happen only after the
/// whole page has validated, so a rejected page leaves it untouched.
pub fn decode(
    context: &mut GnssContext,
    constellation: Constellation,
    tsv: u8,
    words: &[u32; 10],
) -> Result<SubframeData, SubframeError> {
    if tsv == 0 {
        return Err(SubframeError::DummySv(tsv));
    }

    let mut words = *words;

    // a receiver tracking the inverted carrier hands us the complement
    let preamble = ((words[0] >> 22) & 0xFF) as u8;
    if preamble == PREAMBLE_INVERTED {
        for word in words.iter_mut() {
            *word = !*word & 0x3FFF_FFFF;
        }
    } else if preamble != PREAMBLE {
        return Err(SubframeError::BadPreamble(preamble));
    }

    let w = strip_parity(&words)?;

    let subframe = ((w[1] >> 2) & 0x7) as u8;
    let tow17 = w[1] >> 7;
    let alert = (w[1] >> 6) & 1 == 1;

    if !(1..=5).contains(&subframe) {
        return Err(SubframeError::ReservedPage(subframe));
    }

    trace!(
        "lnav: sv {} subframe {} tow17 {} alert {}",
        tsv,
        subframe,
        tow17,
        alert,
    );

    let sv = SV::new(constellation, tsv);
    let mut data = SubframeData::new(constellation, tsv);
    data.subframe = subframe;
    data.tow = tow17;

    match subframe {
        1 => decode_subframe1(context, sv, &w, &mut data)?,
        2 => decode_subframe2(sv, &w, &mut data)?,
        3 => decode_subframe3(sv, &w, &mut data)?,
        4 | 5 => decode_almanac_pages(context, sv, subframe, &w, &mut data)?,
        _ => unreachable!(),
    }

    Ok(data)
}

/// Subframe 1: clock polynomial, week, health, group delay.
fn decode_subframe1(
    context: &mut GnssContext,
    sv: SV,
    w: &[u32; 10],
    data: &mut SubframeData,
) -> Result<(), SubframeError> {
    let week10 = (w[2] >> 14) as i32;
    let ura = ((w[2] >> 8) & 0xF) as i32;
    let health = ((w[2] >> 2) & 0x3F) as i32;
    let iodc_msb = w[2] & 0x3;

    let tgd = sign_extend((w[6] & 0xFF) as u64, 8) as f64 * 2f64.powi(-31);
    let iodc = ((iodc_msb << 8) | (w[7] >> 16)) as i32;
    let toc = ((w[7] & 0xFFFF) as i64) << 4;

    let af2 = sign_extend(((w[8] >> 16) & 0xFF) as u64, 8) as f64 * 2f64.powi(-55);
    let af1 = sign_extend((w[8] & 0xFFFF) as u64, 16) as f64 * 2f64.powi(-43);
    let af0 = sign_extend((w[9] >> 2) as u64, 22) as f64 * 2f64.powi(-31);

    // the broadcast week is modulo 1024; resolve against the era count
    let week = week10 + 1024 * context.week_rollovers;
    context.note_gps_time(week, data.tow as u64 * 6);

    let mut orbit = Orbit::new(sv, OrbitKind::Ephemeris);
    orbit.week = week;
    orbit.toc_s = toc;
    orbit.af0 = af0;
    orbit.af1 = af1;
    orbit.af2 = af2;
    orbit.tgd = tgd;
    orbit.iodc = iodc;
    orbit.health = health;
    orbit.accuracy = ura;

    debug!(
        "lnav: {} subframe 1, week {} iodc {} toc {} health 0x{:02x}",
        sv, week, iodc, toc, health,
    );

    data.week = week;
    data.kind = OrbitKind::Ephemeris;
    data.orbit = Some(orbit);
    Ok(())
}

/// Subframe 2: first half of the Keplerian elements.
fn decode_subframe2(sv: SV, w: &[u32; 10], data: &mut SubframeData) -> Result<(), SubframeError> {
    let iode = (w[2] >> 16) as i32;
    let crs = sign_extend((w[2] & 0xFFFF) as u64, 16) as f64 * 2f64.powi(-5);
    let delta_n = sign_extend((w[3] >> 8) as u64, 16) as f64 * 2f64.powi(-43);
    let m0 =
        sign_extend((((w[3] & 0xFF) << 24) | w[4]) as u64, 32) as f64 * 2f64.powi(-31);
    let cuc = sign_extend((w[5] >> 8) as u64, 16) as f64 * 2f64.powi(-29);
    let eccentricity = ((((w[5] & 0xFF) as u64) << 24) | w[6] as u64) as f64 * 2f64.powi(-33);
    let cus = sign_extend((w[7] >> 8) as u64, 16) as f64 * 2f64.powi(-29);
    let sqrt_a = ((((w[7] & 0xFF) as u64) << 24) | w[8] as u64) as f64 * 2f64.powi(-19);
    let toe = ((w[9] >> 8) as i64) << 4;

    let mut orbit = Orbit::new(sv, OrbitKind::Ephemeris);
    orbit.iode = iode;
    orbit.crs = crs;
    orbit.delta_n = delta_n;
    orbit.m0 = m0;
    orbit.cuc = cuc;
    orbit.eccentricity = eccentricity;
    orbit.cus = cus;
    orbit.sqrt_a = sqrt_a;
    orbit.toe_s = toe;
    orbit.sanity_check()?;

    debug!("lnav: {} subframe 2, iode {} toe {}", sv, iode, toe);

    data.kind = OrbitKind::Ephemeris;
    data.orbit = Some(orbit);
    Ok(())
}

/// Subframe 3: second half of the Keplerian elements.
fn decode_subframe3(sv: SV, w: &[u32; 10], data: &mut SubframeData) -> Result<(), SubframeError> {
    let cic = sign_extend((w[2] >> 8) as u64, 16) as f64 * 2f64.powi(-29);
    let omega0 =
        sign_extend((((w[2] & 0xFF) << 24) | w[3]) as u64, 32) as f64 * 2f64.powi(-31);
    let cis = sign_extend((w[4] >> 8) as u64, 16) as f64 * 2f64.powi(-29);
    let i0 =
        sign_extend((((w[4] & 0xFF) << 24) | w[5]) as u64, 32) as f64 * 2f64.powi(-31);
    let crc = sign_extend((w[6] >> 8) as u64, 16) as f64 * 2f64.powi(-5);
    let omega =
        sign_extend((((w[6] & 0xFF) << 24) | w[7]) as u64, 32) as f64 * 2f64.powi(-31);
    let omega_dot = sign_extend(w[8] as u64, 24) as f64 * 2f64.powi(-43);
    let iode = (w[9] >> 16) as i32;
    let idot = sign_extend(((w[9] >> 2) & 0x3FFF) as u64, 14) as f64 * 2f64.powi(-43);

    let mut orbit = Orbit::new(sv, OrbitKind::Ephemeris);
    orbit.cic = cic;
    orbit.omega0 = omega0;
    orbit.cis = cis;
    orbit.i0 = i0;
    orbit.crc = crc;
    orbit.omega = omega;
    orbit.omega_dot = omega_dot;
    orbit.iode = iode;
    orbit.idot = idot;

    debug!("lnav: {} subframe 3, iode {}", sv, iode);

    data.kind = OrbitKind::Ephemeris;
    data.orbit = Some(orbit);
    Ok(())
}

/// Subframes 4 and 5 are paged; the page id rides in the SV-id field.
fn decode_almanac_pages(
    context: &mut GnssContext,
    sv: SV,
    subframe: u8,
    w: &[u32; 10],
    data: &mut SubframeData,
) -> Result<(), SubframeError> {
    let svid = ((w[2] >> 16) & 0x3F) as u8;
    data.page = svid;

    match (subframe, svid) {
        // dummy / spare pages
        (_, 0) => Err(SubframeError::DummySv(0)),

        // subframe 5, pages 1-24: almanac for SV 1-24
        (5, 1..=24) => decode_almanac(sv, svid, w, data),

        // subframe 5, page 25: toa/WNa and health of SV 1-24
        (5, 51) => {
            let toa = ((w[2] >> 8) & 0xFF) as i64 * 4096;
            let wna = (w[2] & 0xFF) as u16;
            let mut entries = Vec::with_capacity(24);
            for word in &w[3..9] {
                // four 6-bit health words per 24-bit word
                for slot in 0..4 {
                    entries.push(((word >> (18 - 6 * slot)) & 0x3F) as u16);
                }
            }
            debug!("lnav: {} subframe 5 page 25, toa {} wna {}", sv, toa, wna);
            data.aux = Some(SubframeAux::Health(HealthTable {
                first_sv: 1,
                entries,
            }));
            Ok(())
        },

        // subframe 4, pages carrying almanac for SV 25-32
        (4, 25..=32) => decode_almanac(sv, svid, w, data),

        // subframe 4, page 13: navigation message correction table
        (4, 52) => {
            let ai = (w[2] >> 14 & 0x3) as u8;
            let mut erds = [0i8; 30];
            let packed = pack_words(w);
            let mut cursor = crate::bits::BitReader::new(&packed, 0);
            // ERDs start after the 8-bit page header of word 3
            cursor.skip(2 * 24 + 8 + 2);
            for erd in erds.iter_mut() {
                *erd = cursor.read_signed(6) as i8;
            }
            data.aux = Some(SubframeAux::Erds(NmctErds { ai, erds }));
            Ok(())
        },

        // subframe 4, page 17: plain-text system message
        (4, 55) => {
            let mut message = String::with_capacity(22);
            push_ascii(&mut message, (w[2] & 0xFFFF).to_be_bytes(), 2);
            for word in &w[3..9] {
                push_ascii(&mut message, word.to_be_bytes(), 3);
            }
            push_ascii(&mut message, (w[9] >> 8).to_be_bytes(), 2);
            debug!("lnav: {} system message {:?}", sv, message.trim_end());
            data.aux = Some(SubframeAux::SystemMessage(message));
            Ok(())
        },

        // subframe 4, page 18: ionosphere, UTC, leap seconds
        (4, 56) => {
            let iono = decode_iono_utc(w);
            apply_leap(context, &iono);
            data.aux = Some(SubframeAux::Ionosphere(iono));
            Ok(())
        },

        // subframe 4, page 25: anti-spoof flags + health of SV 25-32
        (4, 63) => {
            let mut entries = Vec::with_capacity(8);
            // six-bit health words for SV 25-32 trail the A/S table
            entries.push(((w[7] >> 12) & 0x3F) as u16);
            entries.push(((w[7] >> 6) & 0x3F) as u16);
            entries.push((w[7] & 0x3F) as u16);
            for slot in 0..4 {
                entries.push(((w[8] >> (18 - 6 * slot)) & 0x3F) as u16);
            }
            entries.push(((w[9] >> 18) & 0x3F) as u16);
            data.aux = Some(SubframeAux::Health(HealthTable {
                first_sv: 25,
                entries,
            }));
            Ok(())
        },

        // remaining pages are reserved; nothing to extract
        (_, page) => {
            trace!("lnav: {} subframe {} reserved page {}", sv, subframe, page);
            Err(SubframeError::ReservedPage(page))
        },
    }
}

/// Mid-precision almanac, common to subframe 5 pages 1-24 and the
/// subframe 4 pages covering SV 25-32.
fn decode_almanac(
    transmitter: SV,
    prn: u8,
    w: &[u32; 10],
    data: &mut SubframeData,
) -> Result<(), SubframeError> {
    let eccentricity = (w[2] & 0xFFFF) as f64 * 2f64.powi(-21);
    let toa = ((w[3] >> 16) as i64) << 12;
    let delta_i = sign_extend((w[3] & 0xFFFF) as u64, 16) as f64 * 2f64.powi(-19);
    let omega_dot = sign_extend((w[4] >> 8) as u64, 16) as f64 * 2f64.powi(-38);
    let health = (w[4] & 0xFF) as i32;
    let sqrt_a = w[5] as f64 * 2f64.powi(-11);
    let omega0 = sign_extend(w[6] as u64, 24) as f64 * 2f64.powi(-23);
    let omega = sign_extend(w[7] as u64, 24) as f64 * 2f64.powi(-23);
    let m0 = sign_extend(w[8] as u64, 24) as f64 * 2f64.powi(-23);
    let af0 = sign_extend(
        ((((w[9] >> 16) & 0xFF) << 3) | ((w[9] >> 2) & 0x7)) as u64,
        11,
    ) as f64
        * 2f64.powi(-20);
    let af1 = sign_extend(((w[9] >> 5) & 0x7FF) as u64, 11) as f64 * 2f64.powi(-38);

    let mut orbit = Orbit::new(
        SV::new(transmitter.constellation, prn),
        OrbitKind::Almanac,
    );
    orbit.eccentricity = eccentricity;
    orbit.toa_s = toa;
    // broadcast inclination is an offset from the 0.30 semicircle nominal
    orbit.i0 = 0.30 + delta_i;
    orbit.omega_dot = omega_dot;
    orbit.health = health;
    orbit.sqrt_a = sqrt_a;
    orbit.omega0 = omega0;
    orbit.omega = omega;
    orbit.m0 = m0;
    orbit.af0 = af0;
    orbit.af1 = af1;
    orbit.sanity_check()?;

    debug!("lnav: {} almanac for sv {}, toa {}", transmitter, prn, toa);

    data.kind = OrbitKind::Almanac;
    data.orbit = Some(orbit);
    Ok(())
}

fn decode_iono_utc(w: &[u32; 10]) -> IonoUtc {
    IonoUtc {
        alpha: [
            sign_extend(((w[2] >> 8) & 0xFF) as u64, 8) as f64 * 2f64.powi(-30),
            sign_extend((w[2] & 0xFF) as u64, 8) as f64 * 2f64.powi(-27),
            sign_extend((w[3] >> 16) as u64, 8) as f64 * 2f64.powi(-24),
            sign_extend(((w[3] >> 8) & 0xFF) as u64, 8) as f64 * 2f64.powi(-24),
        ],
        beta: [
            sign_extend((w[3] & 0xFF) as u64, 8) as f64 * 2f64.powi(11),
            sign_extend((w[4] >> 16) as u64, 8) as f64 * 2f64.powi(14),
            sign_extend(((w[4] >> 8) & 0xFF) as u64, 8) as f64 * 2f64.powi(16),
            sign_extend((w[4] & 0xFF) as u64, 8) as f64 * 2f64.powi(16),
        ],
        a1: sign_extend(w[5] as u64, 24) as f64 * 2f64.powi(-50),
        a0: sign_extend(((w[6] << 8) | (w[7] >> 16)) as u64, 32) as f64 * 2f64.powi(-30),
        tot: ((w[7] >> 8) & 0xFF) << 12,
        wnt: (w[7] & 0xFF) as u16,
        leap: sign_extend((w[8] >> 16) as u64, 8) as i8,
        wn_lsf: ((w[8] >> 8) & 0xFF) as u16,
        dn: (w[8] & 0xFF) as u8,
        lsf: sign_extend((w[9] >> 16) as u64, 8) as i8,
    }
}

/// Leap-second bookkeeping from a validated page 18.
///
/// The cached leap value is always refreshed. The notify flag is armed
/// only inside the announcement window: the event week matches the
/// current week modulo 256 and "now" sits in the day preceding the
/// event day. Anywhere else the flag is cleared.
pub(crate) fn apply_leap(context: &mut GnssContext, iono: &IonoUtc) {
    context.set_leap_seconds(iono.leap as i32);

    let in_window = context.gps_week >= 0
        && (iono.wn_lsf as i32) % 256 == context.gps_week % 256
        && iono.dn >= 1
        && iono.dn <= 7
        && {
            let day = (context.gps_tow_s() / 86_400) as u8; // 0-based
            (day + 1) % 7 == (iono.dn - 1) % 7
        };

    let notify = if !in_window {
        LeapNotify::NoWarning
    } else if iono.lsf > iono.leap {
        LeapNotify::AddSecond
    } else if iono.lsf < iono.leap {
        LeapNotify::DeleteSecond
    } else {
        LeapNotify::NoWarning
    };

    context.set_leap_notify(notify);
}

/// Big-endian packing of the stripped 24-bit words, for bit-cursor reads
/// that cross word boundaries.
fn pack_words(w: &[u32; 10]) -> [u8; 30] {
    let mut bytes = [0u8; 30];
    for (index, word) in w.iter().enumerate() {
        bytes[index * 3] = (word >> 16) as u8;
        bytes[index * 3 + 1] = (word >> 8) as u8;
        bytes[index * 3 + 2] = *word as u8;
    }
    bytes
}

fn push_ascii(message: &mut String, bytes: impl AsRef<[u8]>, count: usize) {
    let bytes = bytes.as_ref();
    for byte in &bytes[bytes.len() - count..] {
        if byte.is_ascii_graphic() || *byte == b' ' {
            message.push(*byte as char);
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::session::GnssContext;

    /// Inverse of [check_parity]: compute the 6 parity bits from the
    /// source data bits, then complement the data for transmission when
    /// D30★ demands it.
    pub fn encode_word(data24: u32, d29star: bool, d30star: bool) -> u32 {
        let mut attached = (data24 & 0xFF_FFFF) << 6;
        if d29star {
            attached |= 1 << 31;
        }
        if d30star {
            attached |= 1 << 30;
        }

        let mut parity = 0u32;
        for mask in PARITY_MASKS {
            parity = (parity << 1) | ((attached & mask).count_ones() & 1);
        }

        let transmitted = if d30star {
            (data24 ^ 0xFF_FFFF) & 0xFF_FFFF
        } else {
            data24 & 0xFF_FFFF
        };

        (transmitted << 6) | parity
    }

    /// Build a parity-valid ten-word subframe from stripped data words.
    pub fn encode_subframe(data: &[u32; 10]) -> [u32; 10] {
        let mut words = [0u32; 10];
        let mut d29star = false;
        let mut d30star = false;
        for (index, word) in data.iter().enumerate() {
            let encoded = encode_word(*word, d29star, d30star);
            words[index] = encoded;
            d29star = (encoded >> 1) & 1 == 1;
            d30star = encoded & 1 == 1;
        }
        words
    }

    /// Stripped TLM + HOW for a given subframe id.
    pub fn tlm_how(subframe: u8) -> (u32, u32) {
        let tlm = (PREAMBLE as u32) << 16;
        let how = (1000u32 << 7) | ((subframe as u32) << 2);
        (tlm, how)
    }

    #[test]
    fn parity_roundtrip() {
        for data in [0u32, 0xFF_FFFF, 0x8B5544, 0x000001] {
            for d29 in [false, true] {
                for d30 in [false, true] {
                    let word = encode_word(data, d29, d30);
                    assert_eq!(check_parity(d29, d30, word), Some(data));
                    // any flipped data bit must fail
                    assert_eq!(check_parity(d29, d30, word ^ (1 << 13)), None);
                }
            }
        }
    }

    #[test]
    fn subframe1_fields() {
        let (tlm, how) = tlm_how(1);
        let mut data = [0u32; 10];
        data[0] = tlm;
        data[1] = how;
        // week10=148 (era 2 => 2196), ura=1, health=0, iodc_msb=0
        data[2] = (148 << 14) | (1 << 8);
        data[6] = 0x13; // tgd raw
        data[7] = (0x0A << 16) | 0x4E20; // iodc lsb=10, toc=0x4E20*16
        data[8] = (0x02 << 16) | 0x0123; // af2, af1
        data[9] = 0x0001F4 << 2; // af0 raw = 500

        let words = encode_subframe(&data);
        let mut context = GnssContext::default();
        let decoded = decode(&mut context, Constellation::GPS, 7, &words).unwrap();

        assert_eq!(decoded.subframe, 1);
        assert_eq!(decoded.week, 2196);
        let orbit = decoded.orbit.unwrap();
        assert_eq!(orbit.week, 2196);
        assert_eq!(orbit.iodc, 10);
        assert_eq!(orbit.toc_s, 0x4E20 * 16);
        assert_eq!(orbit.af0, 500.0 * 2f64.powi(-31));
        assert_eq!(orbit.af1, 0x123 as f64 * 2f64.powi(-43));
        assert_eq!(context.gps_week, 2196);
    }

    #[test]
    fn inverted_stream_accepted() {
        let (tlm, how) = tlm_how(1);
        let mut data = [0u32; 10];
        data[0] = tlm;
        data[1] = how;
        data[2] = 148 << 14;
        let mut words = encode_subframe(&data);
        for word in words.iter_mut() {
            *word = !*word & 0x3FFF_FFFF;
        }
        // inverted preamble reads back 0x74
        assert_eq!((words[0] >> 22) & 0xFF, PREAMBLE_INVERTED as u32);

        let mut context = GnssContext::default();
        let decoded = decode(&mut context, Constellation::GPS, 3, &words).unwrap();
        assert_eq!(decoded.subframe, 1);
        assert_eq!(decoded.week, 2196);
    }

    #[test]
    fn bad_preamble_rejected_without_context_mutation() {
        let mut data = [0u32; 10];
        data[0] = 0x12 << 16;
        data[1] = tlm_how(1).1;
        let words = encode_subframe(&data);

        let mut context = GnssContext::default();
        assert!(matches!(
            decode(&mut context, Constellation::GPS, 5, &words),
            Err(SubframeError::BadPreamble(0x12))
        ));
        assert_eq!(context.gps_week, -1);
        assert_eq!(context.leap_seconds, -1);
        assert_eq!(context.leap_notify, LeapNotify::NoWarning);
    }

    #[test]
    fn parity_failure_rejected_without_context_mutation() {
        let (tlm, how) = tlm_how(2);
        let mut data = [0u32; 10];
        data[0] = tlm;
        data[1] = how;
        let mut words = encode_subframe(&data);
        words[4] ^= 1 << 9;

        let mut context = GnssContext::default();
        assert!(matches!(
            decode(&mut context, Constellation::GPS, 5, &words),
            Err(SubframeError::ParityFailure(5))
        ));
        assert_eq!(context.gps_week, -1);
        assert_eq!(context.leap_seconds, -1);
    }

    #[test]
    fn subframe2_keplerian_half() {
        let (tlm, how) = tlm_how(2);
        let mut data = [0u32; 10];
        data[0] = tlm;
        data[1] = how;
        data[2] = (0x5A << 16) | 0x0100; // iode, crs
        data[3] = 0x0123 << 8;
        data[4] = 0x00_4567;
        data[5] = 0x0042 << 8;
        data[6] = 0x10_0000; // e
        data[7] = (0x0055 << 8) | 0x28; // cus, sqrtA msb
        data[8] = 0x44_5566; // sqrtA lsb
        data[9] = 0x249F << 8; // toe

        let words = encode_subframe(&data);
        let mut context = GnssContext::default();
        let decoded = decode(&mut context, Constellation::GPS, 11, &words).unwrap();

        let orbit = decoded.orbit.unwrap();
        assert_eq!(orbit.iode, 0x5A);
        assert_eq!(orbit.crs, 0x100 as f64 * 2f64.powi(-5));
        assert_eq!(
            orbit.m0,
            ((0x23u64 << 24) | 0x004567) as f64 * 2f64.powi(-31)
        );
        assert_eq!(
            orbit.sqrt_a,
            ((0x28u64 << 24) | 0x445566) as f64 * 2f64.powi(-19)
        );
        assert_eq!(orbit.toe_s, 0x249F << 4);
        assert!(orbit.sanity_check().is_ok());
    }

    #[test]
    fn leap_window_gates_notify() {
        let mut context = GnssContext::default();
        context.note_gps_time(2196, 86_400 * 2); // day index 2

        let mut iono = IonoUtc {
            alpha: [0.0; 4],
            beta: [0.0; 4],
            a0: 0.0,
            a1: 0.0,
            tot: 0,
            wnt: 0,
            leap: 18,
            wn_lsf: (2196 % 256) as u16,
            dn: 4, // event day index 3: we are in the preceding day
            lsf: 19,
        };
        apply_leap(&mut context, &iono);
        assert_eq!(context.leap_seconds, 18);
        assert_eq!(context.leap_notify, LeapNotify::AddSecond);

        // outside the day window: cleared immediately
        iono.dn = 6;
        apply_leap(&mut context, &iono);
        assert_eq!(context.leap_notify, LeapNotify::NoWarning);

        // wrong week: cleared
        iono.dn = 4;
        iono.wn_lsf = ((2196 + 1) % 256) as u16;
        apply_leap(&mut context, &iono);
        assert_eq!(context.leap_notify, LeapNotify::NoWarning);

        // deletion announcement
        iono.wn_lsf = (2196 % 256) as u16;
        iono.lsf = 17;
        apply_leap(&mut context, &iono);
        assert_eq!(context.leap_notify, LeapNotify::DeleteSecond);
    }
}
