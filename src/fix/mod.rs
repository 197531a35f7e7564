//! Canonical fix, attitude, DOP and sky-view records.
//!
//! Every numeric field is nullable: floats default to NaN, integers to a
//! `-1` sentinel, enumerations to their explicit unknown variant. A driver
//! delta is an ordinary [GnssFix] carrying only the fields it touched,
//! together with a [TransferMask] naming them; the
//! [merge engine](crate::fix::merge) folds deltas into the session's
//! canonical record without downgrading known fields.

use bitflags::bitflags;
use hifitime::Epoch;
use num_derive::{FromPrimitive, ToPrimitive};

pub mod merge;

/// Fix dimensionality, as reported on the wire (`"mode"`).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, FromPrimitive, ToPrimitive)]
pub enum FixMode {
    /// No fix information seen yet.
    #[default]
    NotSeen = 0,
    /// Receiver reports no fix.
    NoFix = 1,
    /// Two dimensional fix.
    Fix2d = 2,
    /// Three dimensional fix.
    Fix3d = 3,
}

/// Fix quality, monotone non-decreasing within one reporting epoch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, FromPrimitive, ToPrimitive)]
pub enum FixStatus {
    /// Quality unknown.
    #[default]
    Unknown = 0,
    /// Plain GNSS solution.
    Gps = 1,
    /// Differentially corrected.
    Dgps = 2,
    /// RTK with fixed integer ambiguities.
    RtkFixed = 3,
    /// RTK with floating ambiguities.
    RtkFloat = 4,
    /// Dead reckoning only.
    DeadReckoning = 5,
    /// Combined GNSS + dead reckoning.
    GnssDeadReckoning = 6,
    /// Time only (surveyed-in position).
    TimeOnly = 7,
    /// Simulated output.
    Simulated = 8,
}

/// Antenna supervision state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, FromPrimitive, ToPrimitive)]
pub enum AntennaStatus {
    /// Not reported.
    #[default]
    Unknown = 0,
    /// Antenna powered and drawing nominal current.
    Ok = 1,
    /// Open circuit.
    Open = 2,
    /// Short circuit.
    Short = 3,
}

bitflags! {
    /// "What this driver asserted it just computed".
    ///
    /// Each decoded message yields a delta plus one of these masks; the
    /// merge writes a field family only when its bit is present. The
    /// merge itself never asserts bits.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct TransferMask: u64 {
        const TIME       = 1 << 0;
        const TIMERR     = 1 << 1;
        const LATLON     = 1 << 2;
        const ALTITUDE   = 1 << 3;
        const SPEED      = 1 << 4;
        const TRACK      = 1 << 5;
        const CLIMB      = 1 << 6;
        const MAGTRACK   = 1 << 7;
        const MODE       = 1 << 8;
        const STATUS     = 1 << 9;
        const HERR       = 1 << 10;
        const VERR       = 1 << 11;
        const SPEEDERR   = 1 << 12;
        const TRACKERR   = 1 << 13;
        const CLIMBERR   = 1 << 14;
        const ECEF       = 1 << 15;
        const VECEF      = 1 << 16;
        const NED        = 1 << 17;
        const VNED       = 1 << 18;
        const DOP        = 1 << 19;
        const SATELLITE  = 1 << 20;
        const SUBFRAME   = 1 << 21;
        const ATTITUDE   = 1 << 22;
        const IMU        = 1 << 23;
        const GST        = 1 << 24;
        const DGPS       = 1 << 25;
        const BASELINE   = 1 << 26;
        const ANTENNA    = 1 << 27;
        const JAM        = 1 << 28;
        const CLOCK      = 1 << 29;
        const DATUM      = 1 << 30;
        const NAVDATA    = 1 << 31;
        const ENVIRONMENT = 1 << 32;
        const DEVICEID   = 1 << 33;
        const LEAP       = 1 << 34;
    }
}

/// Earth-centered-earth-fixed position / velocity block, metres and m/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EcefState {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Position accuracy, one sigma (m)
    pub p_acc: f64,
    pub vx: f64,
    pub vy: f64,
    pub vz: f64,
    /// Velocity accuracy, one sigma (m/s)
    pub v_acc: f64,
}

impl Default for EcefState {
    fn default() -> Self {
        Self {
            x: f64::NAN,
            y: f64::NAN,
            z: f64::NAN,
            p_acc: f64::NAN,
            vx: f64::NAN,
            vy: f64::NAN,
            vz: f64::NAN,
            v_acc: f64::NAN,
        }
    }
}

/// North-east-down relative position / velocity block, metres and m/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NedState {
    pub rel_n: f64,
    pub rel_e: f64,
    pub rel_d: f64,
    pub vel_n: f64,
    pub vel_e: f64,
    pub vel_d: f64,
}

impl Default for NedState {
    fn default() -> Self {
        Self {
            rel_n: f64::NAN,
            rel_e: f64::NAN,
            rel_d: f64::NAN,
            vel_n: f64::NAN,
            vel_e: f64::NAN,
            vel_d: f64::NAN,
        }
    }
}

/// RTK base line, survey-grade receivers only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    /// Solution status, receiver-specific; -1 unset
    pub status: i32,
    /// East component (m)
    pub east: f64,
    /// North component (m)
    pub north: f64,
    /// Up component (m)
    pub up: f64,
    /// Baseline length (m)
    pub length: f64,
    /// Baseline course over ground (deg)
    pub course: f64,
    /// Ambiguity ratio
    pub ratio: f64,
}

impl Default for Baseline {
    fn default() -> Self {
        Self {
            status: -1,
            east: f64::NAN,
            north: f64::NAN,
            up: f64::NAN,
            length: f64::NAN,
            course: f64::NAN,
            ratio: f64::NAN,
        }
    }
}

/// The canonical per-device fix record.
///
/// Latitude / longitude are geodetic decimal degrees; altitudes metres;
/// speeds m/s; angles degrees true unless noted. Error estimates are one
/// sigma in the unit of their field.
#[derive(Debug, Clone, PartialEq)]
pub struct GnssFix {
    /// Wall-clock time of this fix
    pub time: Option<Epoch>,
    pub mode: FixMode,
    pub status: FixStatus,

    /// Latitude, degrees, positive north. [-90, 90]
    pub latitude: f64,
    /// Longitude, degrees, positive east. [-180, 180]
    pub longitude: f64,
    /// Height above ellipsoid (m)
    pub alt_hae: f64,
    /// Orthometric altitude, above geoid (m)
    pub alt_msl: f64,
    /// Geoid separation: geoid above WGS84 ellipsoid (m)
    pub geoid_sep: f64,
    /// Depth below mean sea level (m), marine sounders
    pub depth: f64,

    /// Speed over ground (m/s)
    pub speed: f64,
    /// Course over ground, degrees true
    pub track: f64,
    /// Vertical speed, positive up (m/s)
    pub climb: f64,
    /// Course over ground, degrees magnetic
    pub magnetic_track: f64,
    /// Magnetic variation (deg)
    pub magnetic_var: f64,

    /// Estimated time error (s)
    pub ept: f64,
    /// Estimated longitude error (m)
    pub epx: f64,
    /// Estimated latitude error (m)
    pub epy: f64,
    /// Estimated horizontal position error (m)
    pub eph: f64,
    /// Estimated vertical error (m)
    pub epv: f64,
    /// Estimated track error (deg)
    pub epd: f64,
    /// Estimated speed error (m/s)
    pub eps: f64,
    /// Estimated climb error (m/s)
    pub epc: f64,
    /// Spherical error probability (m)
    pub sep: f64,

    pub ecef: EcefState,
    pub ned: NedState,

    /// Age of differential corrections (s)
    pub dgps_age: f64,
    /// Differential station id; -1 unset
    pub dgps_station: i32,
    pub baseline: Baseline,

    pub antenna: AntennaStatus,
    /// Jamming indicator, 0-255; -1 unset
    pub jam: i32,
    /// Receiver clock bias (ns); sentinel [i64::MIN]
    pub clock_bias_ns: i64,
    /// Receiver clock drift (ns/s); sentinel [i64::MIN]
    pub clock_drift_ns: i64,

    /// Geodetic datum name; empty when unset
    pub datum: String,

    /// Relative wind angle (deg)
    pub wind_angle_r: f64,
    /// True wind angle (deg)
    pub wind_angle_t: f64,
    /// Magnetic wind angle (deg)
    pub wind_angle_m: f64,
    /// Relative wind speed (m/s)
    pub wind_speed_r: f64,
    /// True wind speed (m/s)
    pub wind_speed_t: f64,
    /// Air temperature (Celsius)
    pub temperature: f64,
    /// Water temperature (Celsius)
    pub water_temperature: f64,
}

impl Default for GnssFix {
    fn default() -> Self {
        Self {
            time: None,
            mode: FixMode::default(),
            status: FixStatus::default(),
            latitude: f64::NAN,
            longitude: f64::NAN,
            alt_hae: f64::NAN,
            alt_msl: f64::NAN,
            geoid_sep: f64::NAN,
            depth: f64::NAN,
            speed: f64::NAN,
            track: f64::NAN,
            climb: f64::NAN,
            magnetic_track: f64::NAN,
            magnetic_var: f64::NAN,
            ept: f64::NAN,
            epx: f64::NAN,
            epy: f64::NAN,
            eph: f64::NAN,
            epv: f64::NAN,
            epd: f64::NAN,
            eps: f64::NAN,
            epc: f64::NAN,
            sep: f64::NAN,
            ecef: EcefState::default(),
            ned: NedState::default(),
            dgps_age: f64::NAN,
            dgps_station: -1,
            baseline: Baseline::default(),
            antenna: AntennaStatus::default(),
            jam: -1,
            clock_bias_ns: i64::MIN,
            clock_drift_ns: i64::MIN,
            datum: String::new(),
            wind_angle_r: f64::NAN,
            wind_angle_t: f64::NAN,
            wind_angle_m: f64::NAN,
            wind_speed_r: f64::NAN,
            wind_speed_t: f64::NAN,
            temperature: f64::NAN,
            water_temperature: f64::NAN,
        }
    }
}

impl GnssFix {
    /// True when the record satisfies its own mode invariants:
    /// 2D implies finite lat/lon in range, 3D additionally finite altitude.
    pub fn is_consistent(&self) -> bool {
        if self.mode >= FixMode::Fix2d {
            if !self.latitude.is_finite() || !self.longitude.is_finite() {
                return false;
            }
            if !(-90.0..=90.0).contains(&self.latitude)
                || !(-180.0..=180.0).contains(&self.longitude)
            {
                return false;
            }
        }
        if self.mode == FixMode::Fix3d && !self.alt_hae.is_finite() && !self.alt_msl.is_finite() {
            return false;
        }
        true
    }
}

/// Platform attitude, IMU or dual-antenna derived.
#[derive(Debug, Clone, PartialEq)]
pub struct Attitude {
    pub time: Option<Epoch>,
    /// Roll, degrees, positive right wing down
    pub roll: f64,
    /// Pitch, degrees, positive nose up
    pub pitch: f64,
    /// Yaw, degrees clockwise from north
    pub yaw: f64,
    /// Heading, degrees true
    pub heading: f64,
    /// Magnetic dip (deg)
    pub dip: f64,
    /// Magnetometer field strength
    pub mag_len: f64,
    pub mag_x: f64,
    pub mag_y: f64,
    pub mag_z: f64,
    pub acc_x: f64,
    pub acc_y: f64,
    pub acc_z: f64,
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
    /// Sensor temperature (Celsius)
    pub temperature: f64,
    /// Depth (m)
    pub depth: f64,
    /// Per-channel solution status: 'N' none, 'Y' valid; NUL unset
    pub mag_st: char,
    pub pitch_st: char,
    pub roll_st: char,
    pub yaw_st: char,
}

impl Default for Attitude {
    fn default() -> Self {
        Self {
            time: None,
            roll: f64::NAN,
            pitch: f64::NAN,
            yaw: f64::NAN,
            heading: f64::NAN,
            dip: f64::NAN,
            mag_len: f64::NAN,
            mag_x: f64::NAN,
            mag_y: f64::NAN,
            mag_z: f64::NAN,
            acc_x: f64::NAN,
            acc_y: f64::NAN,
            acc_z: f64::NAN,
            gyro_x: f64::NAN,
            gyro_y: f64::NAN,
            gyro_z: f64::NAN,
            temperature: f64::NAN,
            depth: f64::NAN,
            mag_st: '\0',
            pitch_st: '\0',
            roll_st: '\0',
            yaw_st: '\0',
        }
    }
}

/// Dilution of precision factors, dimensionless.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dop {
    pub xdop: f64,
    pub ydop: f64,
    pub pdop: f64,
    pub hdop: f64,
    pub vdop: f64,
    pub tdop: f64,
    pub gdop: f64,
}

impl Default for Dop {
    fn default() -> Self {
        Self {
            xdop: f64::NAN,
            ydop: f64::NAN,
            pdop: f64::NAN,
            hdop: f64::NAN,
            vdop: f64::NAN,
            tdop: f64::NAN,
            gdop: f64::NAN,
        }
    }
}

/// One visible satellite of the sky view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Satellite {
    /// NMEA-style pseudo-random noise id
    pub prn: i16,
    /// Constellation id, per the SUBFRAME gnssId numbering
    pub gnss_id: u8,
    /// In-constellation satellite id
    pub sv_id: u8,
    /// Elevation above horizon (deg)
    pub elevation: f64,
    /// Azimuth, degrees from true north
    pub azimuth: f64,
    /// Carrier-to-noise density (dB-Hz)
    pub snr: f64,
    /// Used in the current solution
    pub used: bool,
    /// Health flag: 0 unknown, 1 healthy, 2 unhealthy
    pub health: u8,
}

impl Default for Satellite {
    fn default() -> Self {
        Self {
            prn: -1,
            gnss_id: 0,
            sv_id: 0,
            elevation: f64::NAN,
            azimuth: f64::NAN,
            snr: f64::NAN,
            used: false,
            health: 0,
        }
    }
}

/// What one decoded message asserted: partial records plus the mask
/// naming the fields it actually computed.
///
/// Decoders are pure: they fill only the fields their message carried
/// and set the matching mask bits. The session folds the delta into its
/// canonical records and discards it.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FixDelta {
    pub mask: TransferMask,
    pub fix: GnssFix,
    pub dop: Dop,
    pub attitude: Attitude,
    pub satellites: Vec<Satellite>,
    pub gst: GstNoise,
    pub subframe: Option<crate::subframe::SubframeData>,
    /// Receiver identity, routed to the session's narrow
    /// identity-mutation path rather than the fix
    pub subtype: Option<String>,
}

impl FixDelta {
    /// True when the delta asserts nothing at all.
    /// NaN defaults make whole-record comparison useless for this.
    pub fn is_empty(&self) -> bool {
        self.mask.is_empty()
            && self.subframe.is_none()
            && self.subtype.is_none()
            && self.satellites.is_empty()
    }
}

/// Pseudorange noise statistics (GST).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GstNoise {
    pub time: Option<Epoch>,
    /// RMS of the range residuals (m)
    pub rms: f64,
    /// Error ellipse semi-major axis (m)
    pub major: f64,
    /// Error ellipse semi-minor axis (m)
    pub minor: f64,
    /// Error ellipse orientation, degrees true
    pub orient: f64,
    /// Latitude one-sigma (m)
    pub lat_err: f64,
    /// Longitude one-sigma (m)
    pub lon_err: f64,
    /// Altitude one-sigma (m)
    pub alt_err: f64,
}

impl Default for GstNoise {
    fn default() -> Self {
        Self {
            time: None,
            rms: f64::NAN,
            major: f64::NAN,
            minor: f64::NAN,
            orient: f64::NAN,
            lat_err: f64::NAN,
            lon_err: f64::NAN,
            alt_err: f64::NAN,
        }
    }
}
