//! Galileo I/NAV word decoder.
//!
//! Input is one nominal page re-packed as eight 32-bit words (256 bits);
//! the word type rides in the six most significant bits. Words 1-4 carry
//! the ephemeris, word 5 ionosphere and signal health, word 6 the
//! GST-UTC conversion (which drives the leap-second state exactly like
//! the GPS page-18 path), and words 7-10 the almanac.
//!
//! Almanac words interleave satellites: a word completes one SV while
//! opening a fragment of the next, and the fragment's SV id is not
//! repeated. A word-8 fragment belongs to the SV one below the id
//! announced by the following word 9. The open fragment is the carry
//! state threaded through consecutive calls.
//!
//! Angles stay in semicircles; almanac √A is broadcast as an offset
//! from the nominal 5440.588 √m.

use gnss::prelude::{Constellation, SV};
use log::{debug, trace};

use crate::bits::BitReader;
use crate::navigation::{Orbit, OrbitKind};
use crate::session::GnssContext;
use crate::subframe::{gps::apply_leap, IonoUtc, SubframeAux, SubframeData, SubframeError};

/// Nominal almanac square-root semi-major axis (√m); the broadcast
/// carries a 13-bit signed offset from this.
pub const ALMANAC_SQRT_A_NOMINAL: f64 = 5440.588203;

/// Open fragment of an interleaved almanac satellite.
#[derive(Debug, Clone, PartialEq)]
pub struct GalileoAlmanacCarry {
    /// Word type that opened the fragment (7, 8 or 9)
    pub opened_by: u8,
    /// Issue of data almanac
    pub ioda: i32,
    /// SV id when the opening word announced one; otherwise resolved
    /// retroactively from the next word's id
    pub svid: Option<u8>,
    pub orbit: Orbit,
}

fn pack_words(words: &[u32; 8]) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    for (index, word) in words.iter().enumerate() {
        bytes[index * 4..index * 4 + 4].copy_from_slice(&word.to_be_bytes());
    }
    bytes
}

/// Decode one I/NAV word from transmitter `tsv`.
pub fn decode(
    context: &mut GnssContext,
    tsv: u8,
    words: &[u32; 8],
    carry: &mut Option<GalileoAlmanacCarry>,
) -> Result<SubframeData, SubframeError> {
    if tsv == 0 {
        return Err(SubframeError::DummySv(tsv));
    }

    let bytes = pack_words(words);
    let mut reader = BitReader::new(&bytes, 0);
    let word_type = reader.read(6) as u8;

    let sv = SV::new(Constellation::Galileo, tsv);
    let mut data = SubframeData::new(Constellation::Galileo, tsv);
    data.subframe = word_type;

    trace!("inav: {} word type {}", sv, word_type);

    match word_type {
        // spare word: classified, nothing to extract
        0 => {
            *carry = None;
            Ok(data)
        },
        1 => decode_word1(sv, &mut reader, &mut data).map(|_| data),
        2 => decode_word2(sv, &mut reader, &mut data).map(|_| data),
        3 => decode_word3(sv, &mut reader, &mut data).map(|_| data),
        4 => decode_word4(sv, &mut reader, &mut data).map(|_| data),
        5 => decode_word5(sv, &mut reader, &mut data).map(|_| data),
        6 => decode_word6(context, sv, &mut reader, &mut data).map(|_| data),
        7 => decode_word7(sv, &mut reader, &mut data, carry).map(|_| data),
        8 => decode_word8(sv, &mut reader, &mut data, carry).map(|_| data),
        9 => decode_word9(sv, &mut reader, &mut data, carry).map(|_| data),
        10 => decode_word10(sv, &mut reader, &mut data, carry).map(|_| data),
        other => {
            *carry = None;
            Err(SubframeError::ReservedPage(other))
        },
    }
}

/// Word 1: toe, M0, e, √A.
fn decode_word1(
    sv: SV,
    reader: &mut BitReader,
    data: &mut SubframeData,
) -> Result<(), SubframeError> {
    let iod_nav = reader.read(10) as i32;
    let toe = (reader.read(14) as i64) * 60;
    let m0 = reader.read_signed(32) as f64 * 2f64.powi(-31);
    let eccentricity = reader.read(32) as f64 * 2f64.powi(-33);
    let sqrt_a = reader.read(32) as f64 * 2f64.powi(-19);

    let mut orbit = Orbit::new(sv, OrbitKind::Ephemeris);
    orbit.iode = iod_nav;
    orbit.toe_s = toe;
    orbit.m0 = m0;
    orbit.eccentricity = eccentricity;
    orbit.sqrt_a = sqrt_a;
    orbit.sanity_check()?;

    debug!("inav: {} word 1, iodnav {} toe {}", sv, iod_nav, toe);

    data.kind = OrbitKind::Ephemeris;
    data.orbit = Some(orbit);
    Ok(())
}

/// Word 2: Ω₀, i₀, ω, IDOT.
fn decode_word2(
    sv: SV,
    reader: &mut BitReader,
    data: &mut SubframeData,
) -> Result<(), SubframeError> {
    let iod_nav = reader.read(10) as i32;
    let omega0 = reader.read_signed(32) as f64 * 2f64.powi(-31);
    let i0 = reader.read_signed(32) as f64 * 2f64.powi(-31);
    let omega = reader.read_signed(32) as f64 * 2f64.powi(-31);
    let idot = reader.read_signed(14) as f64 * 2f64.powi(-43);

    let mut orbit = Orbit::new(sv, OrbitKind::Ephemeris);
    orbit.iode = iod_nav;
    orbit.omega0 = omega0;
    orbit.i0 = i0;
    orbit.omega = omega;
    orbit.idot = idot;

    debug!("inav: {} word 2, iodnav {}", sv, iod_nav);

    data.kind = OrbitKind::Ephemeris;
    data.orbit = Some(orbit);
    Ok(())
}

/// Word 3: Ω̇, Δn, harmonic corrections, SISA.
fn decode_word3(
    sv: SV,
    reader: &mut BitReader,
    data: &mut SubframeData,
) -> Result<(), SubframeError> {
    let iod_nav = reader.read(10) as i32;
    let omega_dot = reader.read_signed(24) as f64 * 2f64.powi(-43);
    let delta_n = reader.read_signed(16) as f64 * 2f64.powi(-43);
    let cuc = reader.read_signed(16) as f64 * 2f64.powi(-29);
    let cus = reader.read_signed(16) as f64 * 2f64.powi(-29);
    let crc = reader.read_signed(16) as f64 * 2f64.powi(-5);
    let crs = reader.read_signed(16) as f64 * 2f64.powi(-5);
    let sisa = reader.read(8) as i32;

    let mut orbit = Orbit::new(sv, OrbitKind::Ephemeris);
    orbit.iode = iod_nav;
    orbit.omega_dot = omega_dot;
    orbit.delta_n = delta_n;
    orbit.cuc = cuc;
    orbit.cus = cus;
    orbit.crc = crc;
    orbit.crs = crs;
    orbit.accuracy = sisa;

    debug!("inav: {} word 3, iodnav {}", sv, iod_nav);

    data.kind = OrbitKind::Ephemeris;
    data.orbit = Some(orbit);
    Ok(())
}

/// Word 4: SV id, harmonic inclination corrections, clock polynomial.
fn decode_word4(
    sv: SV,
    reader: &mut BitReader,
    data: &mut SubframeData,
) -> Result<(), SubframeError> {
    let iod_nav = reader.read(10) as i32;
    let svid = reader.read(6) as u8;
    let cic = reader.read_signed(16) as f64 * 2f64.powi(-29);
    let cis = reader.read_signed(16) as f64 * 2f64.powi(-29);
    let toc = (reader.read(14) as i64) * 60;
    let af0 = reader.read_signed(31) as f64 * 2f64.powi(-34);
    let af1 = reader.read_signed(21) as f64 * 2f64.powi(-46);
    let af2 = reader.read_signed(6) as f64 * 2f64.powi(-59);

    if svid == 0 {
        return Err(SubframeError::DummySv(svid));
    }

    let mut orbit = Orbit::new(
        SV::new(Constellation::Galileo, svid),
        OrbitKind::Ephemeris,
    );
    orbit.iode = iod_nav;
    orbit.cic = cic;
    orbit.cis = cis;
    orbit.toc_s = toc;
    orbit.af0 = af0;
    orbit.af1 = af1;
    orbit.af2 = af2;

    debug!("inav: {} word 4, iodnav {} svid {}", sv, iod_nav, svid);

    data.kind = OrbitKind::Ephemeris;
    data.orbit = Some(orbit);
    Ok(())
}

/// Word 5: ionosphere, group delays, signal health, GST.
fn decode_word5(
    sv: SV,
    reader: &mut BitReader,
    data: &mut SubframeData,
) -> Result<(), SubframeError> {
    // NeQuick effective ionisation terms
    let ai0 = reader.read(11) as f64 * 2f64.powi(-2);
    let ai1 = reader.read_signed(11) as f64 * 2f64.powi(-8);
    let ai2 = reader.read_signed(14) as f64 * 2f64.powi(-15);
    reader.skip(5); // storm flags
    let bgd_e1e5a = reader.read_signed(10) as f64 * 2f64.powi(-32);
    let bgd_e1e5b = reader.read_signed(10) as f64 * 2f64.powi(-32);
    let e5b_hs = reader.read(2) as i32;
    let e1b_hs = reader.read(2) as i32;
    reader.skip(2); // data validity statuses
    let week = reader.read(12) as i32;
    let tow = reader.read(20) as u32;

    let mut orbit = Orbit::new(sv, OrbitKind::Ephemeris);
    orbit.week = week;
    // NeQuick terms reuse the Klobuchar alpha slots; beta stays unset
    orbit.alpha = [ai0, ai1, ai2, f64::NAN];
    orbit.tgd = bgd_e1e5a;
    orbit.tgd2 = bgd_e1e5b;
    orbit.health = (e5b_hs << 2) | e1b_hs;

    debug!("inav: {} word 5, week {} tow {}", sv, week, tow);

    data.week = week;
    data.tow = tow;
    data.kind = OrbitKind::Ephemeris;
    data.orbit = Some(orbit);
    Ok(())
}

/// Word 6: GST-UTC conversion, leap seconds.
fn decode_word6(
    context: &mut GnssContext,
    sv: SV,
    reader: &mut BitReader,
    data: &mut SubframeData,
) -> Result<(), SubframeError> {
    let a0 = reader.read_signed(32) as f64 * 2f64.powi(-30);
    let a1 = reader.read_signed(24) as f64 * 2f64.powi(-50);
    let leap = reader.read_signed(8) as i8;
    let tot = (reader.read(8) as u32) << 12;
    let wnt = reader.read(8) as u16;
    let wn_lsf = reader.read(8) as u16;
    let dn = reader.read(3) as u8;
    let lsf = reader.read_signed(8) as i8;
    let tow = reader.read(20) as u32;

    let utc = IonoUtc {
        alpha: [f64::NAN; 4],
        beta: [f64::NAN; 4],
        a0,
        a1,
        tot,
        wnt,
        leap,
        wn_lsf,
        dn,
        lsf,
    };
    apply_leap(context, &utc);

    debug!("inav: {} word 6, leap {} tow {}", sv, leap, tow);

    data.tow = tow;
    data.aux = Some(SubframeAux::GstUtc(utc));
    Ok(())
}

/// Words 7-10: interleaved almanac, up to two satellites per word.
///
/// Word 7 opens SV1; word 8 finishes SV1 and opens the id-less SV2
/// fragment; word 9 finishes SV2 (resolving its id as one below the
/// announced SV3) and opens SV3; word 10 finishes SV3.
fn decode_word7(
    sv: SV,
    reader: &mut BitReader,
    data: &mut SubframeData,
    carry: &mut Option<GalileoAlmanacCarry>,
) -> Result<(), SubframeError> {
    let ioda = reader.read(4) as i32;
    let wna = reader.read(2) as i32;
    let toa = (reader.read(10) as i64) * 600;
    let svid = reader.read(6) as u8;

    if svid == 0 {
        *carry = None;
        return Err(SubframeError::DummySv(svid));
    }

    let mut orbit = almanac_head(svid, reader);
    orbit.ioda = ioda;
    orbit.week = wna;
    orbit.toa_s = toa;

    debug!("inav: {} word 7, almanac svid {} toa {}", sv, svid, toa);

    *carry = Some(GalileoAlmanacCarry {
        opened_by: 7,
        ioda,
        svid: Some(svid),
        orbit,
    });
    data.kind = OrbitKind::Almanac;
    Ok(())
}

fn decode_word8(
    sv: SV,
    reader: &mut BitReader,
    data: &mut SubframeData,
    carry: &mut Option<GalileoAlmanacCarry>,
) -> Result<(), SubframeError> {
    let ioda = reader.read(4) as i32;
    let af0 = reader.read_signed(16) as f64 * 2f64.powi(-19);
    let af1 = reader.read_signed(13) as f64 * 2f64.powi(-38);
    let e5b_hs = reader.read(2) as i32;
    let e1b_hs = reader.read(2) as i32;

    // finish the word-7 satellite
    let finished = match carry.take() {
        Some(open) if open.opened_by == 7 && open.ioda == ioda => {
            let mut orbit = open.orbit;
            orbit.af0 = af0;
            orbit.af1 = af1;
            orbit.health = (e5b_hs << 2) | e1b_hs;
            orbit.sanity_check()?;
            Some(orbit)
        },
        _ => None,
    };

    // open the second satellite; its id arrives with word 9
    let mut orbit2 = almanac_head(0, reader);
    orbit2.ioda = ioda;

    debug!(
        "inav: {} word 8, finishes {:?}",
        sv,
        finished.as_ref().map(|orbit| orbit.sv),
    );

    *carry = Some(GalileoAlmanacCarry {
        opened_by: 8,
        ioda,
        svid: None,
        orbit: orbit2,
    });
    data.kind = OrbitKind::Almanac;
    data.orbit = finished;
    Ok(())
}

fn decode_word9(
    sv: SV,
    reader: &mut BitReader,
    data: &mut SubframeData,
    carry: &mut Option<GalileoAlmanacCarry>,
) -> Result<(), SubframeError> {
    let ioda = reader.read(4) as i32;
    let wna = reader.read(2) as i32;
    let toa = (reader.read(10) as i64) * 600;
    let m0_2 = reader.read_signed(16) as f64 * 2f64.powi(-15);
    let af0_2 = reader.read_signed(16) as f64 * 2f64.powi(-19);
    let af1_2 = reader.read_signed(13) as f64 * 2f64.powi(-38);
    let e5b_hs_2 = reader.read(2) as i32;
    let e1b_hs_2 = reader.read(2) as i32;
    let svid3 = reader.read(6) as u8;

    // the id-less word-8 fragment belongs to the SV just below this one
    let finished = match carry.take() {
        Some(open) if open.opened_by == 8 && open.ioda == ioda && svid3 > 1 => {
            let mut orbit = open.orbit;
            orbit.sv = SV::new(Constellation::Galileo, svid3 - 1);
            orbit.m0 = m0_2;
            orbit.af0 = af0_2;
            orbit.af1 = af1_2;
            orbit.health = (e5b_hs_2 << 2) | e1b_hs_2;
            orbit.week = wna;
            orbit.toa_s = toa;
            orbit.sanity_check()?;
            Some(orbit)
        },
        _ => None,
    };

    if svid3 == 0 {
        *carry = None;
        data.kind = OrbitKind::Almanac;
        data.orbit = finished;
        return Ok(());
    }

    // open the third satellite
    let mut orbit3 = Orbit::new(
        SV::new(Constellation::Galileo, svid3),
        OrbitKind::Almanac,
    );
    orbit3.ioda = ioda;
    orbit3.week = wna;
    orbit3.toa_s = toa;
    orbit3.sqrt_a =
        ALMANAC_SQRT_A_NOMINAL + reader.read_signed(13) as f64 * 2f64.powi(-9);
    orbit3.eccentricity = reader.read(11) as f64 * 2f64.powi(-16);
    orbit3.omega = reader.read_signed(16) as f64 * 2f64.powi(-15);
    orbit3.i0 = reader.read_signed(11) as f64 * 2f64.powi(-14);

    debug!(
        "inav: {} word 9, finishes {:?}, opens svid {}",
        sv,
        finished.as_ref().map(|orbit| orbit.sv),
        svid3,
    );

    *carry = Some(GalileoAlmanacCarry {
        opened_by: 9,
        ioda,
        svid: Some(svid3),
        orbit: orbit3,
    });
    data.kind = OrbitKind::Almanac;
    data.orbit = finished;
    Ok(())
}

fn decode_word10(
    sv: SV,
    reader: &mut BitReader,
    data: &mut SubframeData,
    carry: &mut Option<GalileoAlmanacCarry>,
) -> Result<(), SubframeError> {
    let ioda = reader.read(4) as i32;
    let omega0_3 = reader.read_signed(16) as f64 * 2f64.powi(-15);
    let omega_dot_3 = reader.read_signed(11) as f64 * 2f64.powi(-33);
    let m0_3 = reader.read_signed(16) as f64 * 2f64.powi(-15);
    let af0_3 = reader.read_signed(16) as f64 * 2f64.powi(-19);
    let af1_3 = reader.read_signed(13) as f64 * 2f64.powi(-38);
    let e5b_hs_3 = reader.read(2) as i32;
    let e1b_hs_3 = reader.read(2) as i32;
    // GST-GPS conversion terms follow; not interpreted here

    let finished = match carry.take() {
        Some(open) if open.opened_by == 9 && open.ioda == ioda => {
            let mut orbit = open.orbit;
            orbit.omega0 = omega0_3;
            orbit.omega_dot = omega_dot_3;
            orbit.m0 = m0_3;
            orbit.af0 = af0_3;
            orbit.af1 = af1_3;
            orbit.health = (e5b_hs_3 << 2) | e1b_hs_3;
            orbit.sanity_check()?;
            Some(orbit)
        },
        _ => None,
    };

    debug!(
        "inav: {} word 10, finishes {:?}",
        sv,
        finished.as_ref().map(|orbit| orbit.sv),
    );

    *carry = None;
    data.kind = OrbitKind::Almanac;
    data.orbit = finished;
    Ok(())
}

/// First almanac fragment of one SV: ΔA, e, ω, δi, Ω₀, Ω̇, M₀.
fn almanac_head(svid: u8, reader: &mut BitReader) -> Orbit {
    let mut orbit = Orbit::new(
        SV::new(Constellation::Galileo, svid.max(1)),
        OrbitKind::Almanac,
    );
    orbit.sqrt_a = ALMANAC_SQRT_A_NOMINAL + reader.read_signed(13) as f64 * 2f64.powi(-9);
    orbit.eccentricity = reader.read(11) as f64 * 2f64.powi(-16);
    orbit.omega = reader.read_signed(16) as f64 * 2f64.powi(-15);
    orbit.i0 = reader.read_signed(11) as f64 * 2f64.powi(-14);
    orbit.omega0 = reader.read_signed(16) as f64 * 2f64.powi(-15);
    orbit.omega_dot = reader.read_signed(11) as f64 * 2f64.powi(-33);
    orbit.m0 = reader.read_signed(16) as f64 * 2f64.powi(-15);
    orbit
}

#[cfg(test)]
mod test {
    use super::*;

    struct WordBuilder {
        bits: Vec<bool>,
    }

    impl WordBuilder {
        fn new(word_type: u8) -> Self {
            let mut builder = Self { bits: Vec::with_capacity(256) };
            builder.push(word_type as u64, 6);
            builder
        }

        fn push(&mut self, value: u64, nbits: usize) -> &mut Self {
            for bit in (0..nbits).rev() {
                self.bits.push((value >> bit) & 1 == 1);
            }
            self
        }

        fn push_signed(&mut self, value: i64, nbits: usize) -> &mut Self {
            self.push((value as u64) & ((1u64 << nbits) - 1), nbits)
        }

        fn build(&self) -> [u32; 8] {
            let mut bits = self.bits.clone();
            bits.resize(256, false);
            let mut words = [0u32; 8];
            for (index, chunk) in bits.chunks(32).enumerate() {
                let mut value = 0u32;
                for bit in chunk {
                    value = (value << 1) | (*bit as u32);
                }
                words[index] = value;
            }
            words
        }
    }

    #[test]
    fn word1_ephemeris() {
        let mut builder = WordBuilder::new(1);
        builder
            .push(64, 10) // IODnav
            .push(120, 14) // toe / 60
            .push_signed(-(1 << 28), 32) // m0
            .push(1 << 20, 32) // e
            .push((5440.6 / 2f64.powi(-19)) as u64, 32); // sqrtA

        let mut context = GnssContext::default();
        let mut carry = None;
        let decoded = decode(&mut context, 5, &builder.build(), &mut carry).unwrap();

        assert_eq!(decoded.subframe, 1);
        assert_eq!(decoded.kind, OrbitKind::Ephemeris);
        let orbit = decoded.orbit.unwrap();
        assert_eq!(orbit.iode, 64);
        assert_eq!(orbit.toe_s, 120 * 60);
        assert_eq!(orbit.m0, -(1i64 << 28) as f64 * 2f64.powi(-31));
        assert_eq!(orbit.eccentricity, (1u64 << 20) as f64 * 2f64.powi(-33));
        assert!((orbit.sqrt_a - 5440.6).abs() < 1e-3);
    }

    #[test]
    fn word6_updates_leap_state() {
        let mut builder = WordBuilder::new(6);
        builder
            .push_signed(0, 32) // A0
            .push_signed(0, 24) // A1
            .push_signed(18, 8) // dtLS
            .push(0, 8) // t0t
            .push(0, 8) // WN0t
            .push(0, 8) // WNlsf
            .push(0, 3) // DN
            .push_signed(18, 8) // dtLSF
            .push(4500, 20); // TOW

        let mut context = GnssContext::default();
        let mut carry = None;
        let decoded = decode(&mut context, 11, &builder.build(), &mut carry).unwrap();

        assert_eq!(context.leap_seconds, 18);
        assert!(matches!(decoded.aux, Some(SubframeAux::GstUtc(_))));
        assert_eq!(decoded.tow, 4500);
    }

    #[test]
    fn interleaved_almanac_resolves_second_svid() {
        let mut context = GnssContext::default();
        let mut carry = None;

        // word 7 opens SV 12
        let mut builder = WordBuilder::new(7);
        builder
            .push(9, 4) // IODa
            .push(2, 2) // WNa
            .push(50, 10) // t0a / 600
            .push(12, 6) // SVID1
            .push_signed(10, 13) // deltaA
            .push(16, 11) // e
            .push_signed(0, 16)
            .push_signed(0, 11)
            .push_signed(0, 16)
            .push_signed(0, 11)
            .push_signed(0, 16);
        let decoded = decode(&mut context, 2, &builder.build(), &mut carry).unwrap();
        assert_eq!(decoded.orbit, None);
        assert!(carry.as_ref().is_some_and(|open| open.svid == Some(12)));

        // word 8 finishes SV 12 and opens the un-named second SV
        let mut builder = WordBuilder::new(8);
        builder
            .push(9, 4)
            .push_signed(-40, 16) // af0
            .push_signed(3, 13) // af1
            .push(0, 2)
            .push(0, 2)
            .push_signed(-5, 13) // deltaA of SV2
            .push(8, 11)
            .push_signed(0, 16)
            .push_signed(0, 11)
            .push_signed(0, 16)
            .push_signed(0, 11);
        let decoded = decode(&mut context, 2, &builder.build(), &mut carry).unwrap();
        let finished = decoded.orbit.unwrap();
        assert_eq!(finished.sv.prn, 12);
        assert_eq!(finished.af0, -40.0 * 2f64.powi(-19));
        assert!(carry.as_ref().is_some_and(|open| open.svid.is_none()));

        // word 9 names SV 14, so the fragment was SV 13
        let mut builder = WordBuilder::new(9);
        builder
            .push(9, 4)
            .push(2, 2)
            .push(50, 10)
            .push_signed(0, 16) // m0 of SV2
            .push_signed(21, 16) // af0 of SV2
            .push_signed(0, 13)
            .push(0, 2)
            .push(0, 2)
            .push(14, 6) // SVID3
            .push_signed(0, 13)
            .push(0, 11)
            .push_signed(0, 16)
            .push_signed(0, 11);
        let decoded = decode(&mut context, 2, &builder.build(), &mut carry).unwrap();
        let finished = decoded.orbit.unwrap();
        assert_eq!(finished.sv.prn, 13);
        assert_eq!(finished.af0, 21.0 * 2f64.powi(-19));
        assert!(carry.as_ref().is_some_and(|open| open.svid == Some(14)));

        // word 10 finishes SV 14
        let mut builder = WordBuilder::new(10);
        builder
            .push(9, 4)
            .push_signed(0, 16)
            .push_signed(0, 11)
            .push_signed(0, 16)
            .push_signed(77, 16)
            .push_signed(0, 13)
            .push(0, 2)
            .push(0, 2);
        let decoded = decode(&mut context, 2, &builder.build(), &mut carry).unwrap();
        let finished = decoded.orbit.unwrap();
        assert_eq!(finished.sv.prn, 14);
        assert_eq!(finished.af0, 77.0 * 2f64.powi(-19));
        assert!(carry.is_none());
    }

    #[test]
    fn stale_carry_dropped_on_mismatch() {
        let mut context = GnssContext::default();
        let mut carry = None;

        // a lone word 8 with no open fragment completes nothing
        let mut builder = WordBuilder::new(8);
        builder.push(3, 4).push_signed(0, 16).push_signed(0, 13);
        let decoded = decode(&mut context, 2, &builder.build(), &mut carry).unwrap();
        assert_eq!(decoded.orbit, None);

        // a following word with a different IODa drops the fragment
        let mut builder = WordBuilder::new(9);
        builder
            .push(4, 4) // IODa mismatch
            .push(2, 2)
            .push(50, 10)
            .push_signed(0, 16)
            .push_signed(0, 16)
            .push_signed(0, 13)
            .push(0, 2)
            .push(0, 2)
            .push(20, 6);
        let decoded = decode(&mut context, 2, &builder.build(), &mut carry).unwrap();
        assert_eq!(decoded.orbit, None);
        assert!(carry.as_ref().is_some_and(|open| open.svid == Some(20)));
    }
}
