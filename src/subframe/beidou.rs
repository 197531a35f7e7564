//! BeiDou D1/D2 subframe decoder.
//!
//! Input is ten 30-bit words with their BCH parity bits still in place:
//! word 1 carries 26 data + 4 parity bits, words 2-10 carry 22 data + 8
//! parity bits. Parity is stripped positionally (BCH validation belongs
//! to the tracking channel); the surviving 224 data bits form one
//! contiguous bit string in which every field of the BDS ICD is
//! consecutive, so extraction is a straight cursor walk.
//!
//! GEO transmitters (slots 1-5 and 59-63) broadcast D2 framing, the
//! MEO/IGSO slots D1. Angles are kept in semicircles.

use gnss::prelude::{Constellation, SV};
use log::{debug, trace};

use crate::bits::BitReader;
use crate::navigation::{Orbit, OrbitKind};
use crate::session::GnssContext;
use crate::subframe::{HealthTable, SubframeAux, SubframeData, SubframeError};

/// 11-bit frame preamble, "11100010010".
pub const PREAMBLE: u16 = 0x712;

/// GEO orbital slots: these transmit D2 and take the 0.0 inclination
/// base in almanac reconstruction.
pub const BDS_GEO_SLOTS: [u8; 10] = [1, 2, 3, 4, 5, 59, 60, 61, 62, 63];

fn is_geo(sv: u8) -> bool {
    BDS_GEO_SLOTS.contains(&sv)
}

/// MSB half of the ephemeris reference time, waiting for its frame 3.
///
/// The ICD splits `toe` across pages: 2 MSBs at the end of frame 2,
/// 15 LSBs at the start of frame 3. The half is held here until the
/// next page arrives; a complete `toe` is emitted only when frame 3
/// follows its frame 2 from the same SV one subframe (6 s) later.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeidouToeCarry {
    pub sv: SV,
    /// SOW of the frame-2 page that carried the half
    pub sow: u32,
    /// The 2 MSBs, unshifted
    pub toe_msb: i64,
}

/// Map an almanac page to the SV it describes.
///
/// D1: frame 4 pages 1-24 cover SV 1-24, frame 5 pages 1-6 cover
/// SV 25-30, and frame 5 pages 11-23 are multiplexed by AmID
/// (1 → SV 31-43, 2 → SV 44-56, 3 → SV 57-63). D2 frame 5 uses pages
/// 37-49 with AmEpID the same three ways. Everything else is reserved.
pub fn beidou_almanac_sv(d2: bool, frame: u8, pnum: u8, am_id: u8) -> Option<u8> {
    if d2 {
        return match (pnum, am_id) {
            (1..=30, _) => Some(pnum),
            (37..=49, 1) => Some(pnum - 6),
            (37..=49, 2) => Some(pnum + 7),
            (37..=43, 3) => Some(pnum + 20),
            _ => None,
        };
    }
    match (frame, pnum, am_id) {
        (4, 1..=24, _) => Some(pnum),
        (5, 1..=6, _) => Some(pnum + 24),
        (5, 11..=23, 1) => Some(pnum + 20),
        (5, 11..=23, 2) => Some(pnum + 33),
        (5, 11..=17, 3) => Some(pnum + 46),
        _ => None,
    }
}

/// Strip parity positionally: 26 data bits from word 1, 22 from each of
/// words 2-10, packed big-endian into one 28-byte buffer.
fn concat_data_bits(words: &[u32; 10]) -> [u8; 28] {
    let mut bytes = [0u8; 28];
    let mut cursor = 0usize;

    let mut push = |bytes: &mut [u8; 28], value: u32, nbits: usize| {
        for bit in (0..nbits).rev() {
            if (value >> bit) & 1 == 1 {
                bytes[cursor / 8] |= 1 << (7 - cursor % 8);
            }
            cursor += 1;
        }
    };

    push(&mut bytes, (words[0] >> 4) & 0x03FF_FFFF, 26);
    for word in &words[1..] {
        push(&mut bytes, (word >> 8) & 0x003F_FFFF, 22);
    }
    bytes
}

/// Decode one D1/D2 subframe from transmitter `tsv`.
pub fn decode(
    context: &mut GnssContext,
    tsv: u8,
    words: &[u32; 10],
    toe_carry: &mut Option<BeidouToeCarry>,
) -> Result<SubframeData, SubframeError> {
    if tsv == 0 || tsv > 63 {
        return Err(SubframeError::DummySv(tsv));
    }

    let preamble = ((words[0] >> 19) & 0x7FF) as u16;
    if preamble != PREAMBLE {
        return Err(SubframeError::BadPreamble((preamble >> 3) as u8));
    }

    let bits = concat_data_bits(words);
    let mut reader = BitReader::new(&bits, 0);
    reader.skip(11 + 4); // preamble + reserved

    let frame = reader.read(3) as u8;
    let sow = reader.read(20) as u32;
    let d2 = is_geo(tsv);

    if !(1..=5).contains(&frame) {
        return Err(SubframeError::ReservedPage(frame));
    }

    trace!(
        "bds {}: sv {} frame {} sow {}",
        if d2 { "d2" } else { "d1" },
        tsv,
        frame,
        sow,
    );

    let sv = SV::new(Constellation::BeiDou, tsv);
    let mut data = SubframeData::new(Constellation::BeiDou, tsv);
    data.subframe = frame;
    data.tow = sow;

    if d2 && frame != 5 {
        // D2 ephemeris rides subframe-1 pages on a faster cadence; the
        // fragments are reassembled by the receiver and arrive through
        // the D1-style path, so the raw D2 pages are only classified
        debug!("bds d2: sv {} frame {} (classified only)", tsv, frame);
        return Ok(data);
    }

    match frame {
        1 => decode_frame1(context, sv, &mut reader, &mut data),
        2 => decode_frame2(sv, sow, &mut reader, &mut data, toe_carry),
        3 => decode_frame3(sv, sow, &mut reader, &mut data, toe_carry),
        4 | 5 => decode_almanac_frame(d2, sv, frame, &mut reader, &mut data),
        _ => unreachable!(),
    }?;

    Ok(data)
}

/// Frame 1: clock model, health, group delay, ionosphere.
fn decode_frame1(
    context: &mut GnssContext,
    sv: SV,
    reader: &mut BitReader,
    data: &mut SubframeData,
) -> Result<(), SubframeError> {
    let sat_h1 = reader.read(1) as i32;
    let aodc = reader.read(5) as i32;
    let urai = reader.read(4) as i32;
    let week = reader.read(13) as i32;
    let toc = (reader.read(17) as i64) << 3;
    let tgd1 = reader.read_signed(10) as f64 * 1e-10;
    let tgd2 = reader.read_signed(10) as f64 * 1e-10;

    let alpha = [
        reader.read_signed(8) as f64 * 2f64.powi(-30),
        reader.read_signed(8) as f64 * 2f64.powi(-27),
        reader.read_signed(8) as f64 * 2f64.powi(-24),
        reader.read_signed(8) as f64 * 2f64.powi(-24),
    ];
    let beta = [
        reader.read_signed(8) as f64 * 2f64.powi(11),
        reader.read_signed(8) as f64 * 2f64.powi(14),
        reader.read_signed(8) as f64 * 2f64.powi(16),
        reader.read_signed(8) as f64 * 2f64.powi(16),
    ];

    let af2 = reader.read_signed(11) as f64 * 2f64.powi(-66);
    let af0 = reader.read_signed(24) as f64 * 2f64.powi(-33);
    let af1 = reader.read_signed(22) as f64 * 2f64.powi(-50);
    let aode = reader.read(5) as i32;

    let mut orbit = Orbit::new(sv, OrbitKind::Ephemeris);
    orbit.week = week;
    orbit.toc_s = toc;
    orbit.af0 = af0;
    orbit.af1 = af1;
    orbit.af2 = af2;
    orbit.tgd = tgd1;
    orbit.tgd2 = tgd2;
    orbit.alpha = alpha;
    orbit.beta = beta;
    orbit.aodc = aodc;
    orbit.aode = aode;
    orbit.health = sat_h1;
    orbit.accuracy = urai;

    context.note_beidou_week(week);

    debug!(
        "bds: {} frame 1, week {} aodc {} toc {} h1 {}",
        sv, week, aodc, toc, sat_h1,
    );

    data.week = week;
    data.kind = OrbitKind::Ephemeris;
    data.orbit = Some(orbit);
    Ok(())
}

/// Frame 2: first half of the Keplerian elements. The trailing 2 MSBs
/// of `toe` go into the carry; the record's own `toe_s` stays unset
/// until frame 3 completes it.
fn decode_frame2(
    sv: SV,
    sow: u32,
    reader: &mut BitReader,
    data: &mut SubframeData,
    toe_carry: &mut Option<BeidouToeCarry>,
) -> Result<(), SubframeError> {
    let delta_n = reader.read_signed(16) as f64 * 2f64.powi(-43);
    let cuc = reader.read_signed(18) as f64 * 2f64.powi(-31);
    let m0 = reader.read_signed(32) as f64 * 2f64.powi(-31);
    let eccentricity = reader.read(32) as f64 * 2f64.powi(-33);
    let cus = reader.read_signed(18) as f64 * 2f64.powi(-31);
    let crc = reader.read_signed(18) as f64 * 2f64.powi(-6);
    let crs = reader.read_signed(18) as f64 * 2f64.powi(-6);
    let sqrt_a = reader.read(32) as f64 * 2f64.powi(-19);
    let toe_msb = reader.read(2) as i64;

    let mut orbit = Orbit::new(sv, OrbitKind::Ephemeris);
    orbit.delta_n = delta_n;
    orbit.cuc = cuc;
    orbit.m0 = m0;
    orbit.eccentricity = eccentricity;
    orbit.cus = cus;
    orbit.crc = crc;
    orbit.crs = crs;
    orbit.sqrt_a = sqrt_a;
    orbit.sanity_check()?;

    *toe_carry = Some(BeidouToeCarry { sv, sow, toe_msb });

    debug!("bds: {} frame 2", sv);

    data.kind = OrbitKind::Ephemeris;
    data.orbit = Some(orbit);
    Ok(())
}

/// Frame 3: second half of the Keplerian elements, plus the 15 LSBs
/// that complete the frame-2 `toe` half.
fn decode_frame3(
    sv: SV,
    sow: u32,
    reader: &mut BitReader,
    data: &mut SubframeData,
    toe_carry: &mut Option<BeidouToeCarry>,
) -> Result<(), SubframeError> {
    let toe_lsb = reader.read(15) as i64;
    let i0 = reader.read_signed(32) as f64 * 2f64.powi(-31);
    let cic = reader.read_signed(18) as f64 * 2f64.powi(-31);
    let omega_dot = reader.read_signed(24) as f64 * 2f64.powi(-43);
    let cis = reader.read_signed(18) as f64 * 2f64.powi(-31);
    let idot = reader.read_signed(14) as f64 * 2f64.powi(-43);
    let omega0 = reader.read_signed(32) as f64 * 2f64.powi(-31);
    let omega = reader.read_signed(32) as f64 * 2f64.powi(-31);

    let mut orbit = Orbit::new(sv, OrbitKind::Ephemeris);
    // the MSB half must come from this SV's frame 2, one subframe ago;
    // anything else is stale and the reassembled value would be wrong
    match toe_carry.take() {
        Some(carry) if carry.sv == sv && sow.wrapping_sub(carry.sow) == 6 => {
            orbit.toe_s = ((carry.toe_msb << 15) | toe_lsb) << 3;
        },
        _ => {
            trace!("bds: {} frame 3 without matching frame 2, toe dropped", sv);
        },
    }
    orbit.i0 = i0;
    orbit.cic = cic;
    orbit.omega_dot = omega_dot;
    orbit.cis = cis;
    orbit.idot = idot;
    orbit.omega0 = omega0;
    orbit.omega = omega;

    debug!("bds: {} frame 3, toe {}", sv, orbit.toe_s);

    data.kind = OrbitKind::Ephemeris;
    data.orbit = Some(orbit);
    Ok(())
}

/// Frames 4 and 5: almanac and health pages.
fn decode_almanac_frame(
    d2: bool,
    transmitter: SV,
    frame: u8,
    reader: &mut BitReader,
    data: &mut SubframeData,
) -> Result<(), SubframeError> {
    let pnum = reader.read(7) as u8;
    data.page = pnum;

    // D1 frame 5 pages 7 and 8 carry the constellation health table
    if !d2 && frame == 5 && (pnum == 7 || pnum == 8) {
        let count = if pnum == 7 { 19 } else { 11 };
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            entries.push(reader.read(9) as u16);
        }
        let first_sv = if pnum == 7 { 1 } else { 20 };
        data.aux = Some(SubframeAux::Health(HealthTable { first_sv, entries }));
        return Ok(());
    }

    // time-offset pages and other reserved content
    if !d2 && frame == 5 && (pnum == 9 || pnum == 10) {
        trace!("bds: {} frame 5 page {} (time offsets)", transmitter, pnum);
        return Ok(());
    }

    let sqrt_a = reader.read(24) as f64 * 2f64.powi(-11);
    let af1 = reader.read_signed(11) as f64 * 2f64.powi(-38);
    let af0 = reader.read_signed(11) as f64 * 2f64.powi(-20);
    let omega0 = reader.read_signed(24) as f64 * 2f64.powi(-23);
    let eccentricity = reader.read(17) as f64 * 2f64.powi(-21);
    let delta_i = reader.read_signed(16) as f64 * 2f64.powi(-19);
    let toa = (reader.read(8) as i64) << 12;
    let omega_dot = reader.read_signed(17) as f64 * 2f64.powi(-38);
    let omega = reader.read_signed(24) as f64 * 2f64.powi(-23);
    let m0 = reader.read_signed(24) as f64 * 2f64.powi(-23);
    let am_id = reader.read(2) as u8;

    let prn = beidou_almanac_sv(d2, frame, pnum, am_id)
        .ok_or(SubframeError::ReservedPage(pnum))?;

    // an all-zero slot is an unoccupied almanac entry
    if sqrt_a == 0.0 {
        return Err(SubframeError::DummySv(prn));
    }

    let mut orbit = Orbit::new(SV::new(Constellation::BeiDou, prn), OrbitKind::Almanac);
    orbit.sqrt_a = sqrt_a;
    orbit.af0 = af0;
    orbit.af1 = af1;
    orbit.omega0 = omega0;
    orbit.eccentricity = eccentricity;
    // the broadcast encodes an offset from the slot's nominal
    // inclination: 0.0 semicircles for GEO, 0.30 for MEO/IGSO
    orbit.i0 = if is_geo(prn) { delta_i } else { 0.30 + delta_i };
    orbit.toa_s = toa;
    orbit.omega_dot = omega_dot;
    orbit.omega = omega;
    orbit.m0 = m0;
    orbit.sanity_check()?;

    debug!(
        "bds: {} frame {} page {} almanac for sv {} (amid {})",
        transmitter, frame, pnum, prn, am_id,
    );

    data.kind = OrbitKind::Almanac;
    data.orbit = Some(orbit);
    Ok(())
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;

    /// Build the ten 30-bit words of one subframe from a bit-level field
    /// list, inserting zeroed parity positions.
    pub struct FrameBuilder {
        bits: Vec<bool>,
    }

    impl FrameBuilder {
        pub fn new(frame: u8, sow: u32) -> Self {
            let mut builder = Self { bits: Vec::with_capacity(224) };
            builder.push(PREAMBLE as u64, 11);
            builder.push(0, 4); // reserved
            builder.push(frame as u64, 3);
            builder.push(sow as u64, 20);
            builder
        }

        pub fn push(&mut self, value: u64, nbits: usize) -> &mut Self {
            for bit in (0..nbits).rev() {
                self.bits.push((value >> bit) & 1 == 1);
            }
            self
        }

        pub fn push_signed(&mut self, value: i64, nbits: usize) -> &mut Self {
            self.push((value as u64) & ((1u64 << nbits) - 1), nbits)
        }

        pub fn build(&self) -> [u32; 10] {
            let mut bits = self.bits.clone();
            bits.resize(224, false);

            let mut words = [0u32; 10];
            let mut cursor = bits.iter();
            let mut take = |n: usize| {
                let mut value = 0u32;
                for _ in 0..n {
                    value = (value << 1) | (*cursor.next().unwrap() as u32);
                }
                value
            };

            words[0] = take(26) << 4;
            for word in words.iter_mut().skip(1) {
                *word = take(22) << 8;
            }
            words
        }
    }

    #[test]
    fn almanac_page_dispatch() {
        // D1 direct pages
        assert_eq!(beidou_almanac_sv(false, 4, 1, 0), Some(1));
        assert_eq!(beidou_almanac_sv(false, 4, 24, 3), Some(24));
        assert_eq!(beidou_almanac_sv(false, 5, 6, 0), Some(30));
        // D1 AmID expansion
        assert_eq!(beidou_almanac_sv(false, 5, 11, 1), Some(31));
        assert_eq!(beidou_almanac_sv(false, 5, 23, 1), Some(43));
        assert_eq!(beidou_almanac_sv(false, 5, 11, 2), Some(44));
        assert_eq!(beidou_almanac_sv(false, 5, 23, 2), Some(56));
        assert_eq!(beidou_almanac_sv(false, 5, 11, 3), Some(57));
        assert_eq!(beidou_almanac_sv(false, 5, 17, 3), Some(63));
        assert_eq!(beidou_almanac_sv(false, 5, 18, 3), None);
        assert_eq!(beidou_almanac_sv(false, 5, 11, 0), None);
        // D2 expansion
        assert_eq!(beidou_almanac_sv(true, 5, 37, 1), Some(31));
        assert_eq!(beidou_almanac_sv(true, 5, 49, 2), Some(56));
        assert_eq!(beidou_almanac_sv(true, 5, 43, 3), Some(63));
        assert_eq!(beidou_almanac_sv(true, 5, 50, 3), None);
    }

    #[test]
    fn d1_frame1_clock_model() {
        let mut builder = FrameBuilder::new(1, 345_600);
        builder
            .push(0, 1) // SatH1 healthy
            .push(12, 5) // AODC
            .push(2, 4) // URAI
            .push(810, 13) // week
            .push(0x1A2B0 >> 3, 17) // toc raw
            .push_signed(-14, 10) // tgd1, 0.1ns units
            .push_signed(3, 10) // tgd2
            .push_signed(11, 8)
            .push_signed(-22, 8)
            .push_signed(33, 8)
            .push_signed(-44, 8)
            .push_signed(5, 8)
            .push_signed(-6, 8)
            .push_signed(7, 8)
            .push_signed(-8, 8)
            .push_signed(9, 11) // af2
            .push_signed(-123456, 24) // af0
            .push_signed(7890, 22) // af1
            .push(17, 5); // AODE

        let mut context = GnssContext::default();
        let decoded = decode(&mut context, 11, &builder.build(), &mut None).unwrap();

        assert_eq!(decoded.subframe, 1);
        assert_eq!(decoded.tow, 345_600);
        let orbit = decoded.orbit.unwrap();
        assert_eq!(orbit.week, 810);
        assert_eq!(orbit.aodc, 12);
        assert_eq!(orbit.aode, 17);
        assert_eq!(orbit.accuracy, 2);
        assert_eq!(orbit.health, 0);
        assert_eq!(orbit.toc_s, (0x1A2B0 >> 3) << 3);
        assert_eq!(orbit.tgd, -14.0 * 1e-10);
        assert_eq!(orbit.af0, -123456.0 * 2f64.powi(-33));
        assert_eq!(orbit.af1, 7890.0 * 2f64.powi(-50));
        assert_eq!(orbit.af2, 9.0 * 2f64.powi(-66));
        assert_eq!(orbit.alpha[1], -22.0 * 2f64.powi(-27));
        assert_eq!(orbit.beta[3], -8.0 * 2f64.powi(16));
        assert_eq!(context.beidou_week, 810);
    }

    #[test]
    fn d1_almanac_inclination_bases() {
        // MEO slot via frame 4: nominal 0.30 semicircles
        let mut builder = FrameBuilder::new(4, 600);
        builder
            .push(8, 7) // pnum -> SV 8
            .push(0xA5_0000, 24) // sqrtA raw
            .push_signed(0, 11)
            .push_signed(0, 11)
            .push_signed(0, 24)
            .push(100, 17)
            .push_signed(-2048, 16) // delta-i
            .push(100, 8)
            .push_signed(0, 17)
            .push_signed(0, 24)
            .push_signed(0, 24)
            .push(0, 2);

        let mut context = GnssContext::default();
        let decoded = decode(&mut context, 6, &builder.build(), &mut None).unwrap();
        let orbit = decoded.orbit.unwrap();
        assert_eq!(orbit.sv.prn, 8);
        assert_eq!(orbit.kind, OrbitKind::Almanac);
        assert_eq!(orbit.i0, 0.30 + (-2048.0 * 2f64.powi(-19)));
        assert_eq!(orbit.toa_s, 100 << 12);

        // GEO almanac from a D2 transmitter: base 0.0
        let mut builder = FrameBuilder::new(5, 600);
        builder
            .push(2, 7) // pnum -> SV 2, a GEO slot
            .push(0xA5_0000, 24)
            .push_signed(0, 11)
            .push_signed(0, 11)
            .push_signed(0, 24)
            .push(100, 17)
            .push_signed(-2048, 16)
            .push(100, 8)
            .push_signed(0, 17)
            .push_signed(0, 24)
            .push_signed(0, 24)
            .push(0, 2);

        let decoded = decode(&mut context, 1, &builder.build(), &mut None).unwrap();
        let orbit = decoded.orbit.unwrap();
        assert_eq!(orbit.sv.prn, 2);
        assert_eq!(orbit.i0, -2048.0 * 2f64.powi(-19));
    }

    fn frame2_page(sow: u32, toe_msb: u64) -> [u32; 10] {
        let mut builder = FrameBuilder::new(2, sow);
        builder
            .push_signed(250, 16) // deltaN
            .push_signed(-300, 18) // Cuc
            .push_signed(0x1234_5678, 32) // M0
            .push(0x0080_0000, 32) // e
            .push_signed(400, 18) // Cus
            .push_signed(-50, 18) // Crc
            .push_signed(60, 18) // Crs
            .push(0xA520_0000, 32) // sqrtA raw
            .push(toe_msb, 2);
        builder.build()
    }

    fn frame3_page(sow: u32, toe_lsb: u64) -> [u32; 10] {
        let mut builder = FrameBuilder::new(3, sow);
        builder
            .push(toe_lsb, 15)
            .push_signed(0x0ABC_DEF0, 32) // i0
            .push_signed(-70, 18) // Cic
            .push_signed(-900, 24) // OmegaDot
            .push_signed(80, 18) // Cis
            .push_signed(-12, 14) // IDOT
            .push_signed(0x1111_2222, 32) // Omega0
            .push_signed(0x0333_4444, 32); // omega
        builder.build()
    }

    #[test]
    fn toe_reassembled_across_frames_2_and_3() {
        // toe raw 0x155AA: MSBs 2, LSBs 0x55AA
        let toe_msb = 2u64;
        let toe_lsb = 0x55AAu64;

        let mut context = GnssContext::default();
        let mut carry = None;

        let decoded = decode(&mut context, 11, &frame2_page(345_600, toe_msb), &mut carry).unwrap();
        let orbit = decoded.orbit.unwrap();
        // half a toe is no toe
        assert_eq!(orbit.toe_s, -1);
        assert!(carry.is_some());

        let decoded = decode(&mut context, 11, &frame3_page(345_606, toe_lsb), &mut carry).unwrap();
        let orbit = decoded.orbit.unwrap();
        assert_eq!(orbit.toe_s, (((toe_msb as i64) << 15) | toe_lsb as i64) << 3);
        assert_eq!(orbit.toe_s, 0x155AA << 3);
        assert!(carry.is_none());
    }

    #[test]
    fn toe_dropped_without_matching_frame2() {
        let mut context = GnssContext::default();

        // frame 3 with no frame 2 before it
        let decoded =
            decode(&mut context, 11, &frame3_page(345_606, 0x55AA), &mut None).unwrap();
        assert_eq!(decoded.orbit.unwrap().toe_s, -1);

        // frame 2 from a different SV does not pair
        let mut carry = None;
        decode(&mut context, 12, &frame2_page(345_600, 2), &mut carry).unwrap();
        let decoded = decode(&mut context, 11, &frame3_page(345_606, 0x55AA), &mut carry).unwrap();
        assert_eq!(decoded.orbit.unwrap().toe_s, -1);
        assert!(carry.is_none());

        // a stale frame 2 (not one subframe earlier) does not pair
        let mut carry = None;
        decode(&mut context, 11, &frame2_page(345_588, 2), &mut carry).unwrap();
        let decoded = decode(&mut context, 11, &frame3_page(345_606, 0x55AA), &mut carry).unwrap();
        assert_eq!(decoded.orbit.unwrap().toe_s, -1);
    }

    #[test]
    fn bad_preamble_rejected() {
        let words = [0u32; 10];
        let mut context = GnssContext::default();
        assert!(matches!(
            decode(&mut context, 8, &words, &mut None),
            Err(SubframeError::BadPreamble(_))
        ));
    }

    #[test]
    fn d1_health_table_page() {
        let mut builder = FrameBuilder::new(5, 600);
        builder.push(7, 7); // pnum 7: health of SV 1-19
        for sv in 0..19u64 {
            builder.push(sv * 3, 9);
        }

        let mut context = GnssContext::default();
        let decoded = decode(&mut context, 9, &builder.build(), &mut None).unwrap();
        match decoded.aux {
            Some(SubframeAux::Health(table)) => {
                assert_eq!(table.first_sv, 1);
                assert_eq!(table.entries.len(), 19);
                assert_eq!(table.entries[4], 12);
            },
            aux => panic!("expected health table, got {:?}", aux),
        }
    }
}
