//! Orbit records: per-satellite ephemerides and almanacs, as decoded from
//! the broadcast navigation messages.
//!
//! A record starts explicit-unknown (floating fields NaN, integer fields
//! -1) and is filled in by whichever subframe supplied it. Angles are
//! stored in the unit the broadcast uses: semicircles wherever the source
//! specification packs semicircles, radians only where noted on the field.

use gnss::prelude::SV;
use thiserror::Error;

/// Sanity floor for the square root of the semi-major axis (√m).
/// Every real GNSS orbit carries √A well above this; anything below is a
/// decode artifact and the whole subframe is dropped.
pub const SQRT_A_FLOOR: f64 = 2600.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrbitError {
    /// Semi-major axis below the [SQRT_A_FLOOR] sanity bound.
    #[error("{0}: sqrt(A)={1} below sanity floor")]
    BelowSanityFloor(SV, f64),

    /// Field requested from a record that never carried it.
    #[error("missing data")]
    MissingData,
}

/// Ephemeris or almanac discriminator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OrbitKind {
    /// Subframe carried no orbital elements.
    #[default]
    None,
    /// Precise short-validity elements for the transmitting SV.
    Ephemeris,
    /// Coarse long-validity elements, possibly for another SV.
    Almanac,
}

/// Broadcast orbital elements for one satellite.
#[derive(Debug, Clone, PartialEq)]
pub struct Orbit {
    /// Satellite the elements describe (not necessarily the transmitter)
    pub sv: SV,
    pub kind: OrbitKind,

    /// Week number, rollover-corrected when the context allows; -1 unset
    pub week: i32,
    /// Time of almanac applicability (s of week); -1 unset
    pub toa_s: i64,
    /// Time of clock (s of week); -1 unset
    pub toc_s: i64,
    /// Time of ephemeris (s of week); -1 unset
    pub toe_s: i64,

    /// Clock bias polynomial: constant (s)
    pub af0: f64,
    /// Clock drift (s/s)
    pub af1: f64,
    /// Clock drift rate (s/s²)
    pub af2: f64,

    /// Klobuchar ionosphere alpha terms (s, s/sc, s/sc², s/sc³)
    pub alpha: [f64; 4],
    /// Klobuchar ionosphere beta terms (s, s/sc, s/sc², s/sc³)
    pub beta: [f64; 4],

    /// Inclination cosine / sine harmonic corrections (rad)
    pub cic: f64,
    pub cis: f64,
    /// Orbit radius cosine / sine harmonic corrections (m)
    pub crc: f64,
    pub crs: f64,
    /// Argument-of-latitude cosine / sine harmonic corrections (rad)
    pub cuc: f64,
    pub cus: f64,

    /// Eccentricity, dimensionless
    pub eccentricity: f64,
    /// Inclination at reference time (semicircles)
    pub i0: f64,
    /// Inclination rate (semicircles/s)
    pub idot: f64,
    /// Mean anomaly at reference time (semicircles)
    pub m0: f64,
    /// Mean motion difference (semicircles/s)
    pub delta_n: f64,
    /// Argument of perigee (semicircles)
    pub omega: f64,
    /// Longitude of ascending node (semicircles)
    pub omega0: f64,
    /// Rate of right ascension (semicircles/s)
    pub omega_dot: f64,
    /// Square root of the semi-major axis (√m)
    pub sqrt_a: f64,

    /// Group delay terms (s); second term BeiDou B2 / Galileo E5b
    pub tgd: f64,
    pub tgd2: f64,

    /// Issue-of-data counters; -1 unset
    pub aodc: i32,
    pub aode: i32,
    pub ioda: i32,
    pub iodc: i32,
    pub iode: i32,

    /// Constellation-specific health word; -1 unset
    pub health: i32,
    /// Signal accuracy index (URA / URAI / SISA); -1 unset
    pub accuracy: i32,
}

impl Default for Orbit {
    fn default() -> Self {
        Self {
            sv: SV::default(),
            kind: OrbitKind::default(),
            week: -1,
            toa_s: -1,
            toc_s: -1,
            toe_s: -1,
            af0: f64::NAN,
            af1: f64::NAN,
            af2: f64::NAN,
            alpha: [f64::NAN; 4],
            beta: [f64::NAN; 4],
            cic: f64::NAN,
            cis: f64::NAN,
            crc: f64::NAN,
            crs: f64::NAN,
            cuc: f64::NAN,
            cus: f64::NAN,
            eccentricity: f64::NAN,
            i0: f64::NAN,
            idot: f64::NAN,
            m0: f64::NAN,
            delta_n: f64::NAN,
            omega: f64::NAN,
            omega0: f64::NAN,
            omega_dot: f64::NAN,
            sqrt_a: f64::NAN,
            tgd: f64::NAN,
            tgd2: f64::NAN,
            aodc: -1,
            aode: -1,
            ioda: -1,
            iodc: -1,
            iode: -1,
            health: -1,
            accuracy: -1,
        }
    }
}

impl Orbit {
    /// Fresh record for `sv`.
    pub fn new(sv: SV, kind: OrbitKind) -> Self {
        Self {
            sv,
            kind,
            ..Default::default()
        }
    }

    /// Validates the semi-major axis against [SQRT_A_FLOOR].
    /// Records that never carried √A pass (partial pages).
    pub fn sanity_check(&self) -> Result<(), OrbitError> {
        if self.sqrt_a.is_finite() && self.sqrt_a < SQRT_A_FLOOR {
            return Err(OrbitError::BelowSanityFloor(self.sv, self.sqrt_a));
        }
        Ok(())
    }

    /// Semi-major axis in meters.
    pub fn semi_major_axis_m(&self) -> Result<f64, OrbitError> {
        if self.sqrt_a.is_finite() {
            Ok(self.sqrt_a * self.sqrt_a)
        } else {
            Err(OrbitError::MissingData)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use gnss::prelude::Constellation;

    #[test]
    fn explicit_unknown_initialization() {
        let orbit = Orbit::default();
        assert_eq!(orbit.week, -1);
        assert_eq!(orbit.iodc, -1);
        assert!(orbit.af0.is_nan());
        assert!(orbit.sqrt_a.is_nan());
        assert_eq!(orbit.kind, OrbitKind::None);
        // partial records pass the sanity check
        assert!(orbit.sanity_check().is_ok());
    }

    #[test]
    fn sanity_floor() {
        let sv = SV::new(Constellation::GPS, 11);
        let mut orbit = Orbit::new(sv, OrbitKind::Ephemeris);

        orbit.sqrt_a = 5153.62;
        assert!(orbit.sanity_check().is_ok());
        assert!((orbit.semi_major_axis_m().unwrap() - 26559799.1).abs() < 1.0);

        orbit.sqrt_a = 12.0;
        assert!(matches!(
            orbit.sanity_check(),
            Err(OrbitError::BelowSanityFloor(_, _))
        ));
    }
}
