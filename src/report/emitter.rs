//! Line-record emission from session state.
//!
//! One function per record class, each encoding the canonical records
//! with the class's field order, per-field precision and inclusion
//! predicates. Fields whose backing value is unset (NaN, sentinel,
//! empty, enum unknown) are left off the line entirely.

use itertools::Itertools;
use num_traits::ToPrimitive;

use crate::fix::{AntennaStatus, FixStatus, Satellite};
use crate::navigation::Orbit;
use crate::report::json::JsonBuf;
use crate::report::WatchPolicy;
use crate::session::{GnssContext, GnssSession};
use crate::subframe::{SubframeAux, SubframeData};

/// Wire protocol revision spoken by this emitter.
pub const PROTO_MAJOR: u8 = 3;
pub const PROTO_MINOR: u8 = 15;

/// Time-position-velocity record.
pub fn tpv_line(session: &GnssSession, context: &GnssContext) -> String {
    let fix = &session.fix;
    let mut line = JsonBuf::new("TPV");

    line.string_field("device", &session.device());
    line.int_field("mode", fix.mode.to_i64().unwrap_or(0));
    if fix.status != FixStatus::Unknown {
        line.int_field("status", fix.status.to_i64().unwrap_or(0));
    }
    line.time_field("time", fix.time);
    line.float_field("ept", fix.ept, 3);
    line.float_field("lat", fix.latitude, 9);
    line.float_field("lon", fix.longitude, 9);
    line.float_field("epx", fix.epx, 3);
    line.float_field("epy", fix.epy, 3);
    line.float_field("altHAE", fix.alt_hae, 4);
    line.float_field("altMSL", fix.alt_msl, 4);
    line.float_field("epv", fix.epv, 3);
    line.float_field("track", fix.track, 4);
    line.float_field("magtrack", fix.magnetic_track, 4);
    line.float_field("magvar", fix.magnetic_var, 1);
    line.float_field("speed", fix.speed, 3);
    line.float_field("climb", fix.climb, 3);
    line.float_field("epd", fix.epd, 4);
    line.float_field("eps", fix.eps, 2);
    line.float_field("epc", fix.epc, 2);
    line.float_field("ecefx", fix.ecef.x, 2);
    line.float_field("ecefy", fix.ecef.y, 2);
    line.float_field("ecefz", fix.ecef.z, 2);
    line.float_field("ecefpAcc", fix.ecef.p_acc, 2);
    line.float_field("ecefvx", fix.ecef.vx, 2);
    line.float_field("ecefvy", fix.ecef.vy, 2);
    line.float_field("ecefvz", fix.ecef.vz, 2);
    line.float_field("ecefvAcc", fix.ecef.v_acc, 2);
    line.float_field("relN", fix.ned.rel_n, 3);
    line.float_field("relE", fix.ned.rel_e, 3);
    line.float_field("relD", fix.ned.rel_d, 3);
    line.float_field("velN", fix.ned.vel_n, 3);
    line.float_field("velE", fix.ned.vel_e, 3);
    line.float_field("velD", fix.ned.vel_d, 3);
    line.float_field("geoidSep", fix.geoid_sep, 3);
    line.float_field("eph", fix.eph, 3);
    line.float_field("sep", fix.sep, 3);
    if fix.dgps_station >= 0 {
        line.float_field("dgpsAge", fix.dgps_age, 2);
        line.int_field("dgpsSta", fix.dgps_station as i64);
    }
    if fix.antenna != AntennaStatus::Unknown {
        line.int_field("ant", fix.antenna.to_i64().unwrap_or(0));
    }
    if fix.jam >= 0 {
        line.int_field("jam", fix.jam as i64);
    }
    line.float_field("depth", fix.depth, 3);
    line.float_field("wanglem", fix.wind_angle_m, 1);
    line.float_field("wangler", fix.wind_angle_r, 1);
    line.float_field("wanglet", fix.wind_angle_t, 1);
    line.float_field("wspeedr", fix.wind_speed_r, 1);
    line.float_field("wspeedt", fix.wind_speed_t, 1);
    line.float_field("temp", fix.temperature, 1);
    line.float_field("wtemp", fix.water_temperature, 1);
    line.string_field("datum", &fix.datum);
    if context.leap_valid {
        line.int_field("leapseconds", context.leap_seconds as i64);
    }

    line.finish()
}

fn satellite_json(satellite: &Satellite) -> String {
    let mut item = JsonBuf::object();
    item.int_field("PRN", satellite.prn as i64);
    item.float_field("el", satellite.elevation, 1);
    item.float_field("az", satellite.azimuth, 1);
    item.float_field("ss", satellite.snr, 1);
    item.bool_field("used", satellite.used);
    item.uint_field("gnssid", satellite.gnss_id as u64);
    item.uint_field("svid", satellite.sv_id as u64);
    if satellite.health != 0 {
        item.uint_field("health", satellite.health as u64);
    }
    item.finish_object()
}

/// Sky-view record: DOPs and the per-satellite table.
pub fn sky_line(session: &GnssSession) -> String {
    let mut line = JsonBuf::new("SKY");

    line.string_field("device", &session.device());
    line.time_field("time", session.fix.time);
    line.float_field("xdop", session.dop.xdop, 2);
    line.float_field("ydop", session.dop.ydop, 2);
    line.float_field("vdop", session.dop.vdop, 2);
    line.float_field("tdop", session.dop.tdop, 2);
    line.float_field("hdop", session.dop.hdop, 2);
    line.float_field("gdop", session.dop.gdop, 2);
    line.float_field("pdop", session.dop.pdop, 2);

    line.uint_field("nSat", session.satellites.len() as u64);
    line.uint_field(
        "uSat",
        session
            .satellites
            .iter()
            .filter(|satellite| satellite.used)
            .count() as u64,
    );

    if !session.satellites.is_empty() {
        let rendered = format!(
            "[{}]",
            session.satellites.iter().map(satellite_json).join(","),
        );
        line.raw_field("satellites", &rendered);
    }

    line.finish()
}

/// Pseudorange noise record.
pub fn gst_line(session: &GnssSession) -> String {
    let gst = &session.gst;
    let mut line = JsonBuf::new("GST");

    line.string_field("device", &session.device());
    line.time_field("time", gst.time);
    line.float_field("rms", gst.rms, 3);
    line.float_field("major", gst.major, 3);
    line.float_field("minor", gst.minor, 3);
    line.float_field("orient", gst.orient, 3);
    line.float_field("lat", gst.lat_err, 3);
    line.float_field("lon", gst.lon_err, 3);
    line.float_field("alt", gst.alt_err, 3);

    line.finish()
}

/// Attitude record; `class` selects between `ATT` and `IMU`.
fn attitude_line(class: &str, session: &GnssSession) -> String {
    let attitude = &session.attitude;
    let mut line = JsonBuf::new(class);

    line.string_field("device", &session.device());
    line.time_field("time", attitude.time);
    line.float_field("heading", attitude.heading, 3);
    if attitude.mag_st != '\0' {
        line.string_field("mag_st", &attitude.mag_st.to_string());
    }
    line.float_field("pitch", attitude.pitch, 3);
    if attitude.pitch_st != '\0' {
        line.string_field("pitch_st", &attitude.pitch_st.to_string());
    }
    line.float_field("roll", attitude.roll, 3);
    if attitude.roll_st != '\0' {
        line.string_field("roll_st", &attitude.roll_st.to_string());
    }
    line.float_field("yaw", attitude.yaw, 3);
    if attitude.yaw_st != '\0' {
        line.string_field("yaw_st", &attitude.yaw_st.to_string());
    }
    line.float_field("dip", attitude.dip, 3);
    line.float_field("mag_len", attitude.mag_len, 3);
    line.float_field("mag_x", attitude.mag_x, 3);
    line.float_field("mag_y", attitude.mag_y, 3);
    line.float_field("mag_z", attitude.mag_z, 3);
    line.float_field("acc_x", attitude.acc_x, 3);
    line.float_field("acc_y", attitude.acc_y, 3);
    line.float_field("acc_z", attitude.acc_z, 3);
    line.float_field("gyro_x", attitude.gyro_x, 3);
    line.float_field("gyro_y", attitude.gyro_y, 3);
    line.float_field("gyro_z", attitude.gyro_z, 3);
    line.float_field("depth", attitude.depth, 3);
    line.float_field("temp", attitude.temperature, 2);

    line.finish()
}

pub fn att_line(session: &GnssSession) -> String {
    attitude_line("ATT", session)
}

pub fn imu_line(session: &GnssSession) -> String {
    attitude_line("IMU", session)
}

fn orbit_json(orbit: &Orbit) -> String {
    let mut inner = JsonBuf::object();
    inner.int_field("sv", orbit.sv.prn as i64);
    inner.string_field(
        "kind",
        match orbit.kind {
            crate::navigation::OrbitKind::None => "",
            crate::navigation::OrbitKind::Ephemeris => "ephemeris",
            crate::navigation::OrbitKind::Almanac => "almanac",
        },
    );
    if orbit.week >= 0 {
        inner.int_field("WN", orbit.week as i64);
    }
    if orbit.toa_s >= 0 {
        inner.int_field("toa", orbit.toa_s);
    }
    if orbit.toc_s >= 0 {
        inner.int_field("toc", orbit.toc_s);
    }
    if orbit.toe_s >= 0 {
        inner.int_field("toe", orbit.toe_s);
    }
    inner.number_field("af0", orbit.af0);
    inner.number_field("af1", orbit.af1);
    inner.number_field("af2", orbit.af2);
    inner.number_field("e", orbit.eccentricity);
    inner.number_field("i0", orbit.i0);
    inner.number_field("IDOT", orbit.idot);
    inner.number_field("M0", orbit.m0);
    inner.number_field("deltan", orbit.delta_n);
    inner.number_field("omega", orbit.omega);
    inner.number_field("Omega0", orbit.omega0);
    inner.number_field("Omegad", orbit.omega_dot);
    inner.number_field("sqrtA", orbit.sqrt_a);
    inner.number_field("Cic", orbit.cic);
    inner.number_field("Cis", orbit.cis);
    inner.number_field("Crc", orbit.crc);
    inner.number_field("Crs", orbit.crs);
    inner.number_field("Cuc", orbit.cuc);
    inner.number_field("Cus", orbit.cus);
    inner.number_field("Tgd", orbit.tgd);
    inner.number_field("Tgd2", orbit.tgd2);
    if orbit.aodc >= 0 {
        inner.int_field("AODC", orbit.aodc as i64);
    }
    if orbit.aode >= 0 {
        inner.int_field("AODE", orbit.aode as i64);
    }
    if orbit.ioda >= 0 {
        inner.int_field("IODA", orbit.ioda as i64);
    }
    if orbit.iodc >= 0 {
        inner.int_field("IODC", orbit.iodc as i64);
    }
    if orbit.iode >= 0 {
        inner.int_field("IODE", orbit.iode as i64);
    }
    if orbit.health >= 0 {
        inner.int_field("health", orbit.health as i64);
    }
    if orbit.accuracy >= 0 {
        inner.int_field("ura", orbit.accuracy as i64);
    }

    inner.finish_object()
}

/// Navigation subframe record.
pub fn subframe_line(session: &GnssSession, subframe: &SubframeData) -> String {
    let mut line = JsonBuf::new("SUBFRAME");

    line.string_field("device", &session.device());
    line.uint_field("gnssId", subframe.gnss_id() as u64);
    line.uint_field("tSV", subframe.tsv as u64);
    line.uint_field("frame", subframe.subframe as u64);
    if subframe.frame != 0 {
        line.uint_field("superframe", subframe.frame as u64);
    }
    if subframe.page != 0 {
        line.uint_field("pageid", subframe.page as u64);
    }
    line.uint_field("TOW", subframe.tow as u64);
    if subframe.week >= 0 {
        line.int_field("WN", subframe.week as i64);
    }

    if let Some(orbit) = &subframe.orbit {
        line.raw_field("orbit", &orbit_json(orbit));
    }
    if let Some(orbit) = &subframe.orbit2 {
        line.raw_field("orbit2", &orbit_json(orbit));
    }

    match &subframe.aux {
        Some(SubframeAux::Ionosphere(iono)) | Some(SubframeAux::GstUtc(iono)) => {
            let mut inner = JsonBuf::object();
            inner.number_field("a0", iono.alpha[0]);
            inner.number_field("a1", iono.alpha[1]);
            inner.number_field("a2", iono.alpha[2]);
            inner.number_field("a3", iono.alpha[3]);
            inner.number_field("b0", iono.beta[0]);
            inner.number_field("b1", iono.beta[1]);
            inner.number_field("b2", iono.beta[2]);
            inner.number_field("b3", iono.beta[3]);
            inner.number_field("A0", iono.a0);
            inner.number_field("A1", iono.a1);
            inner.uint_field("tot", iono.tot as u64);
            inner.uint_field("WNt", iono.wnt as u64);
            inner.int_field("ls", iono.leap as i64);
            inner.uint_field("WNlsf", iono.wn_lsf as u64);
            inner.uint_field("DN", iono.dn as u64);
            inner.int_field("lsf", iono.lsf as i64);
            line.raw_field("iono", &inner.finish_object());
        },
        Some(SubframeAux::Health(table)) => {
            let rendered = format!(
                "{{\"first\":{},\"sv\":[{}]}}",
                table.first_sv,
                table.entries.iter().map(|entry| entry.to_string()).join(","),
            );
            line.raw_field("health", &rendered);
        },
        Some(SubframeAux::Erds(erds)) => {
            let rendered = format!(
                "{{\"ai\":{},\"erd\":[{}]}}",
                erds.ai,
                erds.erds.iter().map(|erd| erd.to_string()).join(","),
            );
            line.raw_field("erd", &rendered);
        },
        Some(SubframeAux::SystemMessage(message)) => {
            line.string_field("system_message", message);
        },
        Some(SubframeAux::GloTime(time)) => {
            let mut inner = JsonBuf::object();
            inner.uint_field("NA", time.na as u64);
            inner.number_field("tauc", time.tau_c);
            inner.uint_field("N4", time.n4 as u64);
            line.raw_field("glo_time", &inner.finish_object());
        },
        None => {},
    }

    line.finish()
}

/// Daemon identity announcement, first line to every client.
pub fn version_line() -> String {
    let mut line = JsonBuf::new("VERSION");
    line.string_field("release", env!("CARGO_PKG_VERSION"));
    line.string_field("rev", env!("CARGO_PKG_VERSION"));
    line.uint_field("proto_major", PROTO_MAJOR as u64);
    line.uint_field("proto_minor", PROTO_MINOR as u64);
    line.finish()
}

fn device_fields(line: &mut JsonBuf, session: &GnssSession) {
    line.string_field("path", &session.device());
    if session.driver != crate::session::Driver::Unknown {
        line.string_field("driver", session.driver.name());
    }
    line.string_field("subtype", &session.subtype);
    line.time_field("activated", session.last_activity);
    line.uint_field("flags", session.seen_packets.bits() as u64);
    line.uint_field("bps", session.line.baud as u64);
    line.string_field("parity", &session.line.parity.to_string());
    line.uint_field("stopbits", session.line.stopbits as u64);
}

fn device_json(session: &GnssSession) -> String {
    let mut item = JsonBuf::object();
    device_fields(&mut item, session);
    item.finish_object()
}

/// Single-device report.
pub fn device_line(session: &GnssSession) -> String {
    let mut line = JsonBuf::new("DEVICE");
    device_fields(&mut line, session);
    line.finish()
}

/// Device enumeration report.
pub fn devices_line(sessions: &[&GnssSession]) -> String {
    let mut line = JsonBuf::new("DEVICES");
    let rendered = format!(
        "[{}]",
        sessions.iter().map(|session| device_json(session)).join(","),
    );
    line.raw_field("devices", &rendered);
    line.finish()
}

/// Watch-policy echo.
pub fn watch_line(policy: &WatchPolicy) -> String {
    let mut line = JsonBuf::new("WATCH");
    line.bool_field("enable", policy.enable);
    line.bool_field("json", policy.json);
    line.bool_field("nmea", policy.nmea);
    line.uint_field("raw", policy.raw as u64);
    line.bool_field("scaled", policy.scaled);
    line.bool_field("split24", policy.split24);
    line.bool_field("pps", policy.pps);
    line.finish()
}

/// Error report to a client.
pub fn error_line(message: &str) -> String {
    let mut line = JsonBuf::new("ERROR");
    line.string_field("message", message);
    line.finish()
}
