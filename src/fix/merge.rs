//! Non-regressing deep merge of partial fix deltas.
//!
//! A driver never re-states what it did not just compute, so the merge
//! writes a field family only when the delta's [TransferMask] names it,
//! and several families carry extra guards: error estimates must be
//! finite, status must strictly improve, DGPS age and station travel as a
//! pair. Fields not signalled are preserved untouched.

use crate::fix::{Attitude, Dop, FixStatus, GnssFix, TransferMask};

/// Fold `from` into `to` under `mask`.
pub fn merge_fix(to: &mut GnssFix, mask: TransferMask, from: &GnssFix) {
    if mask.intersects(TransferMask::TIME) {
        to.time = from.time;
    }

    if mask.intersects(TransferMask::LATLON) {
        // a pair: half a position is no position
        to.latitude = from.latitude;
        to.longitude = from.longitude;
    }

    if mask.intersects(TransferMask::ALTITUDE) {
        if from.alt_hae.is_finite() {
            to.alt_hae = from.alt_hae;
        }
        if from.alt_msl.is_finite() {
            to.alt_msl = from.alt_msl;
        }
        if from.depth.is_finite() {
            to.depth = from.depth;
        }
    }

    if mask.intersects(TransferMask::MODE) {
        to.mode = from.mode;
    }

    if mask.intersects(TransferMask::STATUS) && from.status > to.status {
        to.status = from.status;
    }

    if mask.intersects(TransferMask::SPEED) && from.speed.is_finite() {
        to.speed = from.speed;
    }
    if mask.intersects(TransferMask::TRACK) && from.track.is_finite() {
        to.track = from.track;
    }
    if mask.intersects(TransferMask::CLIMB) && from.climb.is_finite() {
        to.climb = from.climb;
    }
    if mask.intersects(TransferMask::MAGTRACK) {
        if from.magnetic_track.is_finite() {
            to.magnetic_track = from.magnetic_track;
        }
        if from.magnetic_var.is_finite() {
            to.magnetic_var = from.magnetic_var;
        }
    }

    // one-sigma estimates: masked like any family, and only ever
    // improved by real numbers
    if mask.intersects(TransferMask::TIMERR) && from.ept.is_finite() {
        to.ept = from.ept;
    }
    if mask.intersects(TransferMask::HERR) {
        if from.epx.is_finite() {
            to.epx = from.epx;
        }
        if from.epy.is_finite() {
            to.epy = from.epy;
        }
        if from.eph.is_finite() {
            to.eph = from.eph;
        }
    }
    if mask.intersects(TransferMask::VERR) {
        if from.epv.is_finite() {
            to.epv = from.epv;
        }
        if from.sep.is_finite() {
            to.sep = from.sep;
        }
    }
    if mask.intersects(TransferMask::TRACKERR) && from.epd.is_finite() {
        to.epd = from.epd;
    }
    if mask.intersects(TransferMask::SPEEDERR) && from.eps.is_finite() {
        to.eps = from.eps;
    }
    if mask.intersects(TransferMask::CLIMBERR) && from.epc.is_finite() {
        to.epc = from.epc;
    }
    if mask.intersects(TransferMask::ALTITUDE) && from.geoid_sep.is_finite() {
        to.geoid_sep = from.geoid_sep;
    }

    if mask.intersects(TransferMask::ECEF) {
        to.ecef.x = from.ecef.x;
        to.ecef.y = from.ecef.y;
        to.ecef.z = from.ecef.z;
        to.ecef.p_acc = from.ecef.p_acc;
    }
    if mask.intersects(TransferMask::VECEF) {
        to.ecef.vx = from.ecef.vx;
        to.ecef.vy = from.ecef.vy;
        to.ecef.vz = from.ecef.vz;
        to.ecef.v_acc = from.ecef.v_acc;
    }
    if mask.intersects(TransferMask::NED) {
        to.ned.rel_n = from.ned.rel_n;
        to.ned.rel_e = from.ned.rel_e;
        to.ned.rel_d = from.ned.rel_d;
    }
    if mask.intersects(TransferMask::VNED) {
        to.ned.vel_n = from.ned.vel_n;
        to.ned.vel_e = from.ned.vel_e;
        to.ned.vel_d = from.ned.vel_d;
    }

    if mask.intersects(TransferMask::DATUM) && !from.datum.is_empty() {
        to.datum = from.datum.clone();
    }

    if mask.intersects(TransferMask::DGPS) && from.dgps_age.is_finite() && from.dgps_station >= 0 {
        to.dgps_age = from.dgps_age;
        to.dgps_station = from.dgps_station;
    }

    if mask.intersects(TransferMask::BASELINE) && from.baseline.status >= 0 {
        to.baseline = from.baseline;
    }

    if mask.intersects(TransferMask::NAVDATA) {
        if from.wind_angle_r.is_finite() {
            to.wind_angle_r = from.wind_angle_r;
        }
        if from.wind_angle_t.is_finite() {
            to.wind_angle_t = from.wind_angle_t;
        }
        if from.wind_angle_m.is_finite() {
            to.wind_angle_m = from.wind_angle_m;
        }
        if from.wind_speed_r.is_finite() {
            to.wind_speed_r = from.wind_speed_r;
        }
        if from.wind_speed_t.is_finite() {
            to.wind_speed_t = from.wind_speed_t;
        }
    }

    if mask.intersects(TransferMask::ENVIRONMENT) {
        if from.temperature.is_finite() {
            to.temperature = from.temperature;
        }
        if from.water_temperature.is_finite() {
            to.water_temperature = from.water_temperature;
        }
    }

    if mask.intersects(TransferMask::ANTENNA)
        && from.antenna != crate::fix::AntennaStatus::Unknown
    {
        to.antenna = from.antenna;
    }

    if mask.intersects(TransferMask::JAM) && from.jam > 0 {
        to.jam = from.jam;
    }

    if mask.intersects(TransferMask::CLOCK) {
        if from.clock_bias_ns != i64::MIN {
            to.clock_bias_ns = from.clock_bias_ns;
        }
        if from.clock_drift_ns != i64::MIN {
            to.clock_drift_ns = from.clock_drift_ns;
        }
    }
}

/// Fold an attitude delta: every field overwrites iff carried.
pub fn merge_attitude(to: &mut Attitude, from: &Attitude) {
    if from.time.is_some() {
        to.time = from.time;
    }
    if from.roll.is_finite() {
        to.roll = from.roll;
    }
    if from.pitch.is_finite() {
        to.pitch = from.pitch;
    }
    if from.yaw.is_finite() {
        to.yaw = from.yaw;
    }
    if from.heading.is_finite() {
        to.heading = from.heading;
    }
    if from.dip.is_finite() {
        to.dip = from.dip;
    }
    if from.mag_len.is_finite() {
        to.mag_len = from.mag_len;
    }
    if from.mag_x.is_finite() {
        to.mag_x = from.mag_x;
    }
    if from.mag_y.is_finite() {
        to.mag_y = from.mag_y;
    }
    if from.mag_z.is_finite() {
        to.mag_z = from.mag_z;
    }
    if from.acc_x.is_finite() {
        to.acc_x = from.acc_x;
    }
    if from.acc_y.is_finite() {
        to.acc_y = from.acc_y;
    }
    if from.acc_z.is_finite() {
        to.acc_z = from.acc_z;
    }
    if from.gyro_x.is_finite() {
        to.gyro_x = from.gyro_x;
    }
    if from.gyro_y.is_finite() {
        to.gyro_y = from.gyro_y;
    }
    if from.gyro_z.is_finite() {
        to.gyro_z = from.gyro_z;
    }
    if from.temperature.is_finite() {
        to.temperature = from.temperature;
    }
    if from.depth.is_finite() {
        to.depth = from.depth;
    }
    if from.mag_st != '\0' {
        to.mag_st = from.mag_st;
    }
    if from.pitch_st != '\0' {
        to.pitch_st = from.pitch_st;
    }
    if from.roll_st != '\0' {
        to.roll_st = from.roll_st;
    }
    if from.yaw_st != '\0' {
        to.yaw_st = from.yaw_st;
    }
}

/// Fold a DOP delta, per-field by finiteness.
pub fn merge_dop(to: &mut Dop, from: &Dop) {
    if from.xdop.is_finite() {
        to.xdop = from.xdop;
    }
    if from.ydop.is_finite() {
        to.ydop = from.ydop;
    }
    if from.pdop.is_finite() {
        to.pdop = from.pdop;
    }
    if from.hdop.is_finite() {
        to.hdop = from.hdop;
    }
    if from.vdop.is_finite() {
        to.vdop = from.vdop;
    }
    if from.tdop.is_finite() {
        to.tdop = from.tdop;
    }
    if from.gdop.is_finite() {
        to.gdop = from.gdop;
    }
}

/// True once the canonical status may legally relax again: the merge is
/// per-epoch monotone, a new reporting cycle resets via this helper.
pub fn reset_status(fix: &mut GnssFix) {
    fix.status = FixStatus::Unknown;
}
