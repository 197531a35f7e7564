//! Raw navigation page interpretation.
//!
//! Drivers hand the lexed navigation words here exactly as broadcast:
//! ten 30-bit words for GPS/QZSS LNAV and BeiDou D1/D2, eight 32-bit
//! words for one Galileo I/NAV nominal page, four 32-bit words for one
//! GLONASS string. The decoders validate framing (preamble, parity) and
//! unpack the bit-packed fields into [Orbit] records and auxiliary
//! tables, updating the process-wide leap-second state when a page
//! carries UTC parameters.
//!
//! A rejected page (bad preamble, parity failure, dummy SV, insane
//! orbit) leaves both the session and the context untouched.

use gnss::prelude::Constellation;
use thiserror::Error;

use crate::navigation::{Orbit, OrbitError, OrbitKind};

mod beidou;
mod galileo;
mod glonass;
pub(crate) mod gps;

pub use beidou::{beidou_almanac_sv, BeidouToeCarry, BDS_GEO_SLOTS};
pub use galileo::GalileoAlmanacCarry;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubframeError {
    /// First word does not start with the constellation preamble.
    #[error("invalid preamble 0x{0:02x}")]
    BadPreamble(u8),

    /// Word failed its parity equations.
    #[error("parity failure on word {0}")]
    ParityFailure(usize),

    /// Transmitting or referenced SV id is the dummy/reserved value.
    #[error("dummy SV {0}")]
    DummySv(u8),

    /// Page/string number outside its documented range.
    #[error("reserved page {0}")]
    ReservedPage(u8),

    /// Decoded orbit failed its sanity bounds.
    #[error("orbit rejected: {0}")]
    Orbit(#[from] OrbitError),
}

/// Klobuchar ionosphere and UTC correction parameters
/// (GPS LNAV subframe 4 page 18 and equivalents).
#[derive(Debug, Clone, PartialEq)]
pub struct IonoUtc {
    /// Klobuchar alpha terms
    pub alpha: [f64; 4],
    /// Klobuchar beta terms
    pub beta: [f64; 4],
    /// UTC polynomial: bias (s) and drift (s/s)
    pub a0: f64,
    pub a1: f64,
    /// Reference time of the UTC parameters (s of week)
    pub tot: u32,
    /// UTC reference week, modulo 256
    pub wnt: u16,
    /// Current leap seconds
    pub leap: i8,
    /// Week of the scheduled leap event, modulo 256
    pub wn_lsf: u16,
    /// Day of the scheduled leap event, 1-7
    pub dn: u8,
    /// Leap seconds after the event
    pub lsf: i8,
}

/// Per-constellation SV health table.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthTable {
    /// First SV the table covers
    pub first_sv: u8,
    /// One entry per SV, raw constellation encoding
    /// (6 bits for GPS, 9 for BeiDou)
    pub entries: Vec<u16>,
}

/// Estimated range deviations from the GPS NMCT (subframe 4 page 13).
#[derive(Debug, Clone, PartialEq)]
pub struct NmctErds {
    /// Availability indicator, 2 bits
    pub ai: u8,
    /// 30 ERDs, 6-bit two's complement; 0x20 encodes unavailable
    pub erds: [i8; 30],
}

/// GLONASS time scale parameters (string 5).
#[derive(Debug, Clone, PartialEq)]
pub struct GloTime {
    /// Calendar day within the four-year cycle
    pub na: u16,
    /// GLONASS-to-UTC(SU) scale correction (s)
    pub tau_c: f64,
    /// Four-year cycle counter since 1996
    pub n4: u8,
}

/// Constellation-specific side tables a page may carry
/// besides (or instead of) orbital elements.
#[derive(Debug, Clone, PartialEq)]
pub enum SubframeAux {
    Ionosphere(IonoUtc),
    /// Galileo GST-UTC conversion (I/NAV word 6)
    GstUtc(IonoUtc),
    Health(HealthTable),
    Erds(NmctErds),
    SystemMessage(String),
    GloTime(GloTime),
}

/// One decoded navigation page.
///
/// Carries up to two [Orbit] records: Galileo interleaved almanac pages
/// complete one satellite while opening a fragment of the next.
#[derive(Debug, Clone, PartialEq)]
pub struct SubframeData {
    pub constellation: Constellation,
    /// Transmitting SV id
    pub tsv: u8,
    /// Subframe / word-type / string number
    pub subframe: u8,
    /// Frame number where the constellation has one (GLONASS), else 0
    pub frame: u8,
    /// Page number / Pnum; 0 when the subframe is unpaged
    pub page: u8,
    /// Truncated time of week, in the constellation's native count;
    /// 0 when the page does not carry one
    pub tow: u32,
    /// Week number, rollover-corrected when resolvable; -1 unknown
    pub week: i32,
    /// Whether the page carried ephemeris or almanac elements
    pub kind: OrbitKind,
    pub orbit: Option<Orbit>,
    /// Second fragment of an interleaved almanac page
    pub orbit2: Option<Orbit>,
    pub aux: Option<SubframeAux>,
}

impl SubframeData {
    fn new(constellation: Constellation, tsv: u8) -> Self {
        Self {
            constellation,
            tsv,
            subframe: 0,
            frame: 0,
            page: 0,
            tow: 0,
            week: -1,
            kind: OrbitKind::None,
            orbit: None,
            orbit2: None,
            aux: None,
        }
    }

    /// Wire numbering of the constellation in SUBFRAME reports.
    pub fn gnss_id(&self) -> u8 {
        gnss_id(self.constellation)
    }
}

/// u-blox style constellation numbering, used on the wire.
pub fn gnss_id(constellation: Constellation) -> u8 {
    match constellation {
        Constellation::GPS => 0,
        Constellation::Galileo => 2,
        Constellation::BeiDou => 3,
        Constellation::QZSS => 5,
        Constellation::Glonass => 6,
        c if c.is_sbas() => 1,
        _ => 7,
    }
}

/// Stateful front end over the per-constellation page decoders.
///
/// GPS and GLONASS pages decode independently. BeiDou splits the
/// ephemeris reference time across frames 2 and 3, and Galileo almanac
/// words interleave two satellites; both need carry state across
/// consecutive pages, which lives here. One decoder per session.
#[derive(Debug, Default)]
pub struct Decoder {
    beidou_toe: Option<BeidouToeCarry>,
    galileo_carry: Option<GalileoAlmanacCarry>,
}

impl Decoder {
    /// Decode one GPS/QZSS LNAV subframe: ten 30-bit words, parity
    /// included, possibly inverted.
    pub fn gps(
        &mut self,
        context: &mut crate::session::GnssContext,
        tsv: u8,
        words: &[u32; 10],
    ) -> Result<SubframeData, SubframeError> {
        gps::decode(context, Constellation::GPS, tsv, words)
    }

    /// Decode one BeiDou D1/D2 subframe: ten 30-bit words, parity
    /// stripped trailing each word. GEO transmitters (SV 1-5, 59-63)
    /// are interpreted as D2, the rest as D1.
    pub fn beidou(
        &mut self,
        context: &mut crate::session::GnssContext,
        tsv: u8,
        words: &[u32; 10],
    ) -> Result<SubframeData, SubframeError> {
        beidou::decode(context, tsv, words, &mut self.beidou_toe)
    }

    /// Decode one Galileo I/NAV nominal page: eight 32-bit words.
    pub fn galileo(
        &mut self,
        context: &mut crate::session::GnssContext,
        tsv: u8,
        words: &[u32; 8],
    ) -> Result<SubframeData, SubframeError> {
        galileo::decode(context, tsv, words, &mut self.galileo_carry)
    }

    /// Decode one GLONASS string: four 32-bit words plus the frame
    /// number from the superframe context.
    pub fn glonass(
        &mut self,
        tsv: u8,
        frame: u8,
        words: &[u32; 4],
    ) -> Result<SubframeData, SubframeError> {
        glonass::decode(tsv, frame, words)
    }
}
