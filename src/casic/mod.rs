//! CASIC binary protocol decoder.
//!
//! A `(class, id)` pair names a message; dispatch is a table lookup with
//! a log-only default for ids the table knows but carries no decoder
//! for. Each decoder is a pure function of the payload: it fills a
//! [FixDelta] with exactly the fields its message carried and the mask
//! naming them. Runts (payloads below the message's declared minimum)
//! and unknown ids cost nothing but a log line.
//!
//! All multi-byte fields are little-endian; packed floats are IEEE-754
//! bit-for-bit. Payload offsets are declared next to each decoder.

use std::collections::HashMap;

use log::debug;
use num_traits::FromPrimitive;
use thiserror::Error;

use crate::bits::{le_f32, le_f64, le_u16, le_u32};
use crate::fix::{
    AntennaStatus, FixDelta, FixMode, FixStatus, Satellite, TransferMask,
};
use crate::session::GnssContext;
use crate::subframe::Decoder as SubframeDecoder;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CasicError {
    /// Payload shorter than the message's declared minimum.
    #[error("{name}: runt payload ({got} < {want})")]
    Runt {
        name: &'static str,
        want: usize,
        got: usize,
    },

    /// A field decoded outside its documented range.
    #[error("{name}: field out of range")]
    FieldRange { name: &'static str },
}

/// Mutable surroundings a decoder may touch: the process context (leap
/// and week state) and the session's subframe decoder.
pub struct DecodeEnv<'a> {
    pub context: &'a mut GnssContext,
    pub subframes: &'a mut SubframeDecoder,
}

type DecodeFn = fn(&[u8], &mut DecodeEnv) -> Result<FixDelta, CasicError>;

struct MessageSpec {
    name: &'static str,
    min_len: usize,
    /// `None`: the id is known and acknowledged, but intentionally
    /// undecoded; it logs and drops
    decode: Option<DecodeFn>,
}

lazy_static! {
    static ref DISPATCH: HashMap<(u8, u8), MessageSpec> = {
        let mut table = HashMap::new();
        let mut entry = |class: u8, id: u8, spec: MessageSpec| {
            table.insert((class, id), spec);
        };

        entry(0x05, 0x01, MessageSpec { name: "ACK-ACK", min_len: 4, decode: Some(ack_ack) });
        entry(0x05, 0x00, MessageSpec { name: "ACK-NAK", min_len: 4, decode: Some(ack_nak) });
        entry(0x06, 0x00, MessageSpec { name: "CFG-PRT", min_len: 8, decode: Some(cfg_prt) });
        entry(0x0A, 0x04, MessageSpec { name: "MON-VER", min_len: 64, decode: Some(mon_ver) });

        entry(0x01, 0x01, MessageSpec { name: "NAV-STATUS", min_len: 16, decode: Some(nav_status) });
        entry(0x01, 0x03, MessageSpec { name: "NAV-PV", min_len: 72, decode: Some(nav_pv) });
        entry(0x01, 0x04, MessageSpec { name: "NAV-DOP", min_len: 28, decode: Some(nav_dop) });
        entry(0x01, 0x05, MessageSpec { name: "NAV-SOL", min_len: 64, decode: Some(nav_sol) });
        entry(0x01, 0x10, MessageSpec { name: "NAV-TIMEUTC", min_len: 24, decode: Some(nav_timeutc) });
        entry(0x01, 0x20, MessageSpec { name: "NAV-SVINFO", min_len: 8, decode: Some(nav_svinfo) });

        entry(0x08, 0x01, MessageSpec { name: "MSG-GPSFRAME", min_len: 44, decode: Some(msg_gpsframe) });
        entry(0x08, 0x02, MessageSpec { name: "MSG-BDSFRAME", min_len: 44, decode: Some(msg_bdsframe) });
        entry(0x08, 0x04, MessageSpec { name: "MSG-GLOFRAME", min_len: 20, decode: Some(msg_gloframe) });
        entry(0x08, 0x05, MessageSpec { name: "MSG-GALFRAME", min_len: 40, decode: Some(msg_galframe) });

        // acknowledged but undecoded: log then drop
        entry(0x02, 0x00, MessageSpec { name: "TIM-TP", min_len: 0, decode: None });
        entry(0x03, 0x10, MessageSpec { name: "RXM-MEASX", min_len: 0, decode: None });
        entry(0x06, 0x01, MessageSpec { name: "CFG-MSG", min_len: 0, decode: None });
        entry(0x06, 0x02, MessageSpec { name: "CFG-RST", min_len: 0, decode: None });
        entry(0x0A, 0x09, MessageSpec { name: "MON-HW", min_len: 0, decode: None });
        entry(0x0B, 0x01, MessageSpec { name: "AID-INI", min_len: 0, decode: None });

        table
    };
}

/// Human name of a message class, for ACK logging.
pub fn class_name(class: u8) -> &'static str {
    match class {
        0x01 => "NAV",
        0x02 => "TIM",
        0x03 => "RXM",
        0x05 => "ACK",
        0x06 => "CFG",
        0x08 => "MSG",
        0x0A => "MON",
        0x0B => "AID",
        _ => "UNK",
    }
}

/// Decode one framed message. Total: message-level trouble (unknown id,
/// runt, out-of-range field) is logged and yields an empty delta.
pub fn decode(class: u8, id: u8, payload: &[u8], env: &mut DecodeEnv) -> FixDelta {
    let Some(spec) = DISPATCH.get(&(class, id)) else {
        debug!(
            "casic: unknown message class 0x{:02x} id 0x{:02x}, {} bytes",
            class,
            id,
            payload.len(),
        );
        return FixDelta::default();
    };

    let Some(decoder) = spec.decode else {
        debug!("casic: {} ({} bytes), not decoded", spec.name, payload.len());
        return FixDelta::default();
    };

    if payload.len() < spec.min_len {
        debug!(
            "casic: {} runt payload ({} < {})",
            spec.name,
            payload.len(),
            spec.min_len,
        );
        return FixDelta::default();
    }

    match decoder(payload, env) {
        Ok(delta) => delta,
        Err(error) => {
            debug!("casic: {}", error);
            FixDelta::default()
        },
    }
}

/// ACK-ACK: `u16le` acknowledged class, `u16le` acknowledged id.
fn ack_ack(payload: &[u8], _env: &mut DecodeEnv) -> Result<FixDelta, CasicError> {
    let class = le_u16(payload, 0);
    let id = le_u16(payload, 2);
    debug!(
        "ACK-ACK: class: {:02x}({}), id: {:02x}",
        class,
        class_name(class as u8),
        id,
    );
    Ok(FixDelta::default())
}

fn ack_nak(payload: &[u8], _env: &mut DecodeEnv) -> Result<FixDelta, CasicError> {
    let class = le_u16(payload, 0);
    let id = le_u16(payload, 2);
    debug!(
        "ACK-NAK: class: {:02x}({}), id: {:02x}",
        class,
        class_name(class as u8),
        id,
    );
    Ok(FixDelta::default())
}

/// CFG-PRT response: `u8` port, 3 reserved, `u32le` baud.
fn cfg_prt(payload: &[u8], _env: &mut DecodeEnv) -> Result<FixDelta, CasicError> {
    let port = payload[0];
    let baud = le_u32(payload, 4);
    debug!("CFG-PRT: port {} baud {}", port, baud);
    Ok(FixDelta::default())
}

/// MON-VER: two NUL-padded 32-byte strings, software then hardware.
fn mon_ver(payload: &[u8], _env: &mut DecodeEnv) -> Result<FixDelta, CasicError> {
    let trim = |bytes: &[u8]| -> String {
        let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
        String::from_utf8_lossy(&bytes[..end]).into_owned()
    };
    let software = trim(&payload[0..32]);
    let hardware = trim(&payload[32..64]);

    debug!("MON-VER: sw {:?} hw {:?}", software, hardware);

    let mut delta = FixDelta {
        mask: TransferMask::DEVICEID,
        ..Default::default()
    };
    delta.subtype = Some(if hardware.is_empty() {
        software
    } else {
        format!("{},{}", software, hardware)
    });
    Ok(delta)
}

/// NAV-STATUS: `u32le` runtime, `u8` fix mode, `u8` fix status,
/// `u8` antenna state, `u8` jam indicator, 8 reserved.
fn nav_status(payload: &[u8], _env: &mut DecodeEnv) -> Result<FixDelta, CasicError> {
    let mut delta = FixDelta::default();

    delta.fix.mode = FixMode::from_u8(payload[4]).unwrap_or(FixMode::NotSeen);
    delta.fix.status = FixStatus::from_u8(payload[5]).unwrap_or(FixStatus::Unknown);
    delta.mask |= TransferMask::MODE | TransferMask::STATUS;

    if let Some(antenna) = AntennaStatus::from_u8(payload[6]) {
        delta.fix.antenna = antenna;
        delta.mask |= TransferMask::ANTENNA;
    }

    delta.fix.jam = payload[7] as i32;
    delta.mask |= TransferMask::JAM;

    Ok(delta)
}

/// NAV-DOP: `u32le` runtime, then six `f32le`:
/// pDOP, hDOP, vDOP, nDOP, eDOP, tDOP.
fn nav_dop(payload: &[u8], _env: &mut DecodeEnv) -> Result<FixDelta, CasicError> {
    let mut delta = FixDelta {
        mask: TransferMask::DOP,
        ..Default::default()
    };
    delta.dop.pdop = le_f32(payload, 4) as f64;
    delta.dop.hdop = le_f32(payload, 8) as f64;
    delta.dop.vdop = le_f32(payload, 12) as f64;
    delta.dop.ydop = le_f32(payload, 16) as f64;
    delta.dop.xdop = le_f32(payload, 20) as f64;
    delta.dop.tdop = le_f32(payload, 24) as f64;
    Ok(delta)
}

/// NAV-SOL: `u32le` runtime, `u8` position valid, `u8` velocity valid,
/// `u8` SVs used, 1 reserved, `f64le` ECEF x/y/z, `f32le` position
/// accuracy, `f32le` ECEF vx/vy/vz, `f32le` velocity accuracy.
fn nav_sol(payload: &[u8], _env: &mut DecodeEnv) -> Result<FixDelta, CasicError> {
    let mut delta = FixDelta::default();

    if payload[4] != 0 {
        delta.fix.ecef.x = le_f64(payload, 8);
        delta.fix.ecef.y = le_f64(payload, 16);
        delta.fix.ecef.z = le_f64(payload, 24);
        delta.fix.ecef.p_acc = le_f32(payload, 32) as f64;
        delta.mask |= TransferMask::ECEF;
    }
    if payload[5] != 0 {
        delta.fix.ecef.vx = le_f32(payload, 36) as f64;
        delta.fix.ecef.vy = le_f32(payload, 40) as f64;
        delta.fix.ecef.vz = le_f32(payload, 44) as f64;
        delta.fix.ecef.v_acc = le_f32(payload, 48) as f64;
        delta.mask |= TransferMask::VECEF;
    }

    Ok(delta)
}

/// NAV-PV: `u32le` runtime, `u8` position valid (0 none / 2 2D / 3 3D),
/// `u8` velocity valid, `u8` system, `u8` SVs used, `f64le` longitude,
/// `f64le` latitude, `f32le` height, `f32le` geoid separation, `f32le`
/// horizontal accuracy, `f32le` vertical accuracy, `f32le` NED
/// velocities N/E/U, `f32le` 3D speed, `f32le` ground speed, `f32le`
/// heading, `f32le` speed accuracy, `f32le` heading accuracy.
fn nav_pv(payload: &[u8], _env: &mut DecodeEnv) -> Result<FixDelta, CasicError> {
    let mut delta = FixDelta::default();
    let pos_valid = payload[4];
    let vel_valid = payload[5];

    if pos_valid != 0 {
        let longitude = le_f64(payload, 8);
        let latitude = le_f64(payload, 16);
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(CasicError::FieldRange { name: "NAV-PV" });
        }

        delta.fix.longitude = longitude;
        delta.fix.latitude = latitude;
        delta.fix.alt_hae = le_f32(payload, 24) as f64;
        delta.fix.geoid_sep = le_f32(payload, 28) as f64;
        delta.fix.alt_msl = delta.fix.alt_hae - delta.fix.geoid_sep;
        let h_acc = le_f32(payload, 32) as f64;
        delta.fix.epx = h_acc;
        delta.fix.epy = h_acc;
        delta.fix.epv = le_f32(payload, 36) as f64;
        delta.fix.mode = if pos_valid >= 3 {
            FixMode::Fix3d
        } else {
            FixMode::Fix2d
        };
        delta.fix.status = FixStatus::Gps;
        delta.mask |= TransferMask::LATLON
            | TransferMask::ALTITUDE
            | TransferMask::HERR
            | TransferMask::VERR
            | TransferMask::MODE
            | TransferMask::STATUS;
    }

    if vel_valid != 0 {
        let vel_n = le_f32(payload, 40) as f64;
        let vel_e = le_f32(payload, 44) as f64;
        let vel_u = le_f32(payload, 48) as f64;
        delta.fix.ned.vel_n = vel_n;
        delta.fix.ned.vel_e = vel_e;
        delta.fix.ned.vel_d = -vel_u;
        delta.fix.speed = le_f32(payload, 56) as f64;
        delta.fix.track = le_f32(payload, 60) as f64;
        delta.fix.climb = vel_u;
        delta.fix.eps = le_f32(payload, 64) as f64;
        delta.fix.epd = le_f32(payload, 68) as f64;
        delta.mask |= TransferMask::VNED
            | TransferMask::SPEED
            | TransferMask::TRACK
            | TransferMask::CLIMB
            | TransferMask::SPEEDERR
            | TransferMask::TRACKERR;
    }

    Ok(delta)
}

/// NAV-TIMEUTC: `u32le` runtime, `f32le` time accuracy, `u16le` year,
/// `u8` month/day/hour/minute/second, `u8` valid, `u32le` nanoseconds,
/// `i8` leap seconds, 3 reserved.
fn nav_timeutc(payload: &[u8], _env: &mut DecodeEnv) -> Result<FixDelta, CasicError> {
    let mut delta = FixDelta::default();

    if payload[15] & 1 == 0 {
        // no valid UTC solution yet
        return Ok(delta);
    }

    let year = le_u16(payload, 8) as i32;
    let nanos = le_u32(payload, 16);
    let epoch = hifitime::Epoch::maybe_from_gregorian_utc(
        year,
        payload[10],
        payload[11],
        payload[12],
        payload[13],
        payload[14],
        nanos,
    )
    .map_err(|_| CasicError::FieldRange { name: "NAV-TIMEUTC" })?;

    delta.fix.time = Some(epoch);
    delta.fix.ept = le_f32(payload, 4) as f64;
    delta.mask |= TransferMask::TIME | TransferMask::TIMERR;

    debug!("NAV-TIMEUTC: {} leap {}", epoch, payload[20] as i8);
    Ok(delta)
}

/// NAV-SVINFO: `u32le` runtime, `u8` count, 3 reserved, then `count`
/// 12-byte entries: `u8` gnss id, `u8` SV id, `u8` C/N0, `i8`
/// elevation, `i16le` azimuth, `u8` flags (bit 0 used, bits 1-2
/// health), 5 reserved.
fn nav_svinfo(payload: &[u8], _env: &mut DecodeEnv) -> Result<FixDelta, CasicError> {
    let count = payload[4] as usize;
    let want = 8 + count * 12;
    if payload.len() < want {
        return Err(CasicError::Runt {
            name: "NAV-SVINFO",
            want,
            got: payload.len(),
        });
    }

    let mut delta = FixDelta {
        mask: TransferMask::SATELLITE,
        ..Default::default()
    };

    for index in 0..count {
        let base = 8 + index * 12;
        let gnss_id = payload[base];
        let sv_id = payload[base + 1];
        let flags = payload[base + 6];
        delta.satellites.push(Satellite {
            prn: nmea_prn(gnss_id, sv_id),
            gnss_id,
            sv_id,
            snr: payload[base + 2] as f64,
            elevation: (payload[base + 3] as i8) as f64,
            azimuth: crate::bits::le_i16(payload, base + 4) as f64,
            used: flags & 1 == 1,
            health: (flags >> 1) & 0x3,
        });
    }

    Ok(delta)
}

/// NMEA-style PRN from a (gnss id, SV id) pair: GPS and SBAS keep their
/// ids, GLONASS shifts to 64+slot, the rest get 100-plus blocks.
fn nmea_prn(gnss_id: u8, sv_id: u8) -> i16 {
    match gnss_id {
        0 | 1 => sv_id as i16,
        6 => 64 + sv_id as i16,
        2 => 200 + sv_id as i16,
        3 => 300 + sv_id as i16,
        5 => 192 + sv_id as i16,
        _ => -1,
    }
}

/// MSG-GPSFRAME: `u8` SV, `u8` channel, 2 reserved, ten `u32le` raw
/// 30-bit LNAV words.
fn msg_gpsframe(payload: &[u8], env: &mut DecodeEnv) -> Result<FixDelta, CasicError> {
    let sv = payload[0];
    let mut words = [0u32; 10];
    for (index, word) in words.iter_mut().enumerate() {
        *word = le_u32(payload, 4 + index * 4);
    }

    let mut delta = FixDelta::default();
    match env.subframes.gps(env.context, sv, &words) {
        Ok(subframe) => {
            delta.subframe = Some(subframe);
            delta.mask |= TransferMask::SUBFRAME;
        },
        Err(error) => debug!("MSG-GPSFRAME: sv {}: {}", sv, error),
    }
    Ok(delta)
}

/// MSG-BDSFRAME: same layout as MSG-GPSFRAME, D1/D2 words.
fn msg_bdsframe(payload: &[u8], env: &mut DecodeEnv) -> Result<FixDelta, CasicError> {
    let sv = payload[0];
    let mut words = [0u32; 10];
    for (index, word) in words.iter_mut().enumerate() {
        *word = le_u32(payload, 4 + index * 4);
    }

    let mut delta = FixDelta::default();
    match env.subframes.beidou(env.context, sv, &words) {
        Ok(subframe) => {
            delta.subframe = Some(subframe);
            delta.mask |= TransferMask::SUBFRAME;
        },
        Err(error) => debug!("MSG-BDSFRAME: sv {}: {}", sv, error),
    }
    Ok(delta)
}

/// MSG-GLOFRAME: `u8` slot, `i8` frequency channel, `u8` frame number,
/// 1 reserved, four `u32le` string words.
fn msg_gloframe(payload: &[u8], env: &mut DecodeEnv) -> Result<FixDelta, CasicError> {
    let sv = payload[0];
    let frame = payload[2];
    let mut words = [0u32; 4];
    for (index, word) in words.iter_mut().enumerate() {
        *word = le_u32(payload, 4 + index * 4);
    }

    let mut delta = FixDelta::default();
    match env.subframes.glonass(sv, frame, &words) {
        Ok(subframe) => {
            delta.subframe = Some(subframe);
            delta.mask |= TransferMask::SUBFRAME;
        },
        Err(error) => debug!("MSG-GLOFRAME: sv {}: {}", sv, error),
    }
    Ok(delta)
}

/// MSG-GALFRAME: `u8` SV, 3 reserved, eight `u32le` I/NAV words.
fn msg_galframe(payload: &[u8], env: &mut DecodeEnv) -> Result<FixDelta, CasicError> {
    let sv = payload[0];
    let mut words = [0u32; 8];
    for (index, word) in words.iter_mut().enumerate() {
        *word = le_u32(payload, 4 + index * 4);
    }

    let mut delta = FixDelta::default();
    match env.subframes.galileo(env.context, sv, &words) {
        Ok(subframe) => {
            delta.subframe = Some(subframe);
            delta.mask |= TransferMask::SUBFRAME;
        },
        Err(error) => debug!("MSG-GALFRAME: sv {}: {}", sv, error),
    }
    Ok(delta)
}
