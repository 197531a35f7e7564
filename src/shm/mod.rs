//! Shared-memory export window.
//!
//! A single System V segment, attached once at startup, carries the
//! last-published fix between two monotone tick counters. The writer
//! bumps the trailing bookend, copies the record, then bumps the
//! leading bookend; a reader that sees both bookends equal (and fresher
//! than its last accepted tick) between its own fenced reads holds a
//! complete record. Readers never block the writer and the writer
//! never waits for readers.
//!
//! The segment is marked for removal right after creation, so it
//! vanishes with its last detach and a later version can re-create it
//! at a different size.

use std::cell::UnsafeCell;
use std::sync::atomic::{fence, AtomicU32, Ordering};

use log::{info, warn};
use num_traits::ToPrimitive;
use thiserror::Error;

use crate::fix::GnssFix;
use crate::session::GnssContext;

/// Default segment key ("NTP0"), overridable with [SHM_KEY_ENV].
pub const DEFAULT_SHM_KEY: i32 = 0x4E54_5030;

/// Environment variable naming the segment key, decimal or 0x-hex.
pub const SHM_KEY_ENV: &str = "GPSD_SHM_KEY";

/// Value planted in [ShmFix::origin] at publish time, so readers can
/// tell a shared-memory record from a socket-borne one.
pub const SHM_ORIGIN: i32 = -1;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShmError {
    #[error("shmget failed, errno {0}")]
    SegmentCreation(i32),

    #[error("shmat failed, errno {0}")]
    Attach(i32),

    #[error("bad {SHM_KEY_ENV} value {0:?}")]
    BadKey(String),
}

/// Plain-data mirror of the fix record, fixed layout, no pointers.
/// Everything a latency-sensitive local reader needs.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShmFix {
    /// Nanoseconds since the Unix epoch; [i64::MIN] when unset
    pub time_ns: i64,
    pub mode: i32,
    pub status: i32,
    pub latitude: f64,
    pub longitude: f64,
    pub alt_hae: f64,
    pub alt_msl: f64,
    pub geoid_sep: f64,
    pub speed: f64,
    pub track: f64,
    pub climb: f64,
    pub ept: f64,
    pub epx: f64,
    pub epy: f64,
    pub eph: f64,
    pub epv: f64,
    pub epd: f64,
    pub eps: f64,
    pub epc: f64,
    pub sep: f64,
    /// x, y, z, pAcc, vx, vy, vz, vAcc
    pub ecef: [f64; 8],
    /// relN, relE, relD, velN, velE, velD
    pub ned: [f64; 6],
    pub leap_seconds: i32,
    /// [SHM_ORIGIN] once published
    pub origin: i32,
}

impl ShmFix {
    /// Snapshot the canonical records into the wire mirror.
    pub fn capture(fix: &GnssFix, context: &GnssContext) -> Self {
        Self {
            time_ns: fix
                .time
                .map(|epoch| (epoch.to_unix_seconds() * 1e9).round() as i64)
                .unwrap_or(i64::MIN),
            mode: fix.mode.to_i32().unwrap_or(0),
            status: fix.status.to_i32().unwrap_or(0),
            latitude: fix.latitude,
            longitude: fix.longitude,
            alt_hae: fix.alt_hae,
            alt_msl: fix.alt_msl,
            geoid_sep: fix.geoid_sep,
            speed: fix.speed,
            track: fix.track,
            climb: fix.climb,
            ept: fix.ept,
            epx: fix.epx,
            epy: fix.epy,
            eph: fix.eph,
            epv: fix.epv,
            epd: fix.epd,
            eps: fix.eps,
            epc: fix.epc,
            sep: fix.sep,
            ecef: [
                fix.ecef.x,
                fix.ecef.y,
                fix.ecef.z,
                fix.ecef.p_acc,
                fix.ecef.vx,
                fix.ecef.vy,
                fix.ecef.vz,
                fix.ecef.v_acc,
            ],
            ned: [
                fix.ned.rel_n,
                fix.ned.rel_e,
                fix.ned.rel_d,
                fix.ned.vel_n,
                fix.ned.vel_e,
                fix.ned.vel_d,
            ],
            leap_seconds: context.leap_seconds,
            origin: 0,
        }
    }

    fn zeroed() -> Self {
        // all-zero is a legal (if meaningless) record; readers gate on
        // the bookends, not the payload
        unsafe { std::mem::zeroed() }
    }
}

/// The segment layout. `bookend1` leads, `bookend2` trails; equal
/// values bracket a complete record.
#[repr(C)]
pub struct ShmSegment {
    bookend1: AtomicU32,
    _pad: u32,
    record: UnsafeCell<ShmFix>,
    bookend2: AtomicU32,
}

// one writer, many readers, synchronized by the bookend protocol
unsafe impl Sync for ShmSegment {}

impl Default for ShmSegment {
    fn default() -> Self {
        Self {
            bookend1: AtomicU32::new(0),
            _pad: 0,
            record: UnsafeCell::new(ShmFix::zeroed()),
            bookend2: AtomicU32::new(0),
        }
    }
}

impl ShmSegment {
    /// Writer side: stamp `tick` around a fresh copy of `record`.
    ///
    /// Step order is the contract: trailing bookend, record copy,
    /// origin sentinel, leading bookend, a barrier between each.
    pub fn publish(&self, tick: u32, record: &ShmFix) {
        self.bookend2.store(tick, Ordering::Relaxed);
        fence(Ordering::SeqCst);

        let mut stamped = *record;
        unsafe {
            std::ptr::write_volatile(self.record.get(), stamped);
        }
        fence(Ordering::SeqCst);

        stamped.origin = SHM_ORIGIN;
        unsafe {
            std::ptr::write_volatile(self.record.get(), stamped);
        }
        fence(Ordering::SeqCst);

        self.bookend1.store(tick, Ordering::Relaxed);
    }

    /// Reader side: copy out the record and accept it only when both
    /// bookends match and the tick is fresher than `last_seen`.
    pub fn consume(&self, last_seen: u32) -> Option<(u32, ShmFix)> {
        let leading = self.bookend1.load(Ordering::Relaxed);
        fence(Ordering::SeqCst);

        let record = unsafe { std::ptr::read_volatile(self.record.get()) };
        fence(Ordering::SeqCst);

        let trailing = self.bookend2.load(Ordering::Relaxed);

        if leading == trailing && leading != last_seen && leading != 0 {
            Some((leading, record))
        } else {
            None
        }
    }
}

/// Resolve the segment key: [SHM_KEY_ENV] when set, else the default.
pub fn shm_key() -> Result<i32, ShmError> {
    match std::env::var(SHM_KEY_ENV) {
        Err(_) => Ok(DEFAULT_SHM_KEY),
        Ok(text) => {
            let parsed = if let Some(hex) = text.trim().strip_prefix("0x") {
                i64::from_str_radix(hex, 16).ok()
            } else {
                text.trim().parse::<i64>().ok()
            };
            match parsed {
                Some(key) if key != 0 => Ok(key as i32),
                _ => Err(ShmError::BadKey(text)),
            }
        },
    }
}

/// Writer handle over the attached segment.
///
/// Creation marks the segment for removal immediately, so it lives
/// exactly as long as its attachments.
#[derive(Debug)]
pub struct ShmExporter {
    segment: *mut ShmSegment,
    tick: u32,
}

impl ShmExporter {
    /// Create (or re-attach) and take the writer role.
    pub fn attach() -> Result<Self, ShmError> {
        let key = shm_key()?;
        let size = std::mem::size_of::<ShmSegment>();

        let shmid = unsafe { libc::shmget(key, size, libc::IPC_CREAT | 0o666) };
        if shmid == -1 {
            return Err(ShmError::SegmentCreation(errno()));
        }

        let segment = unsafe { libc::shmat(shmid, std::ptr::null(), 0) };
        if segment == usize::MAX as *mut libc::c_void {
            return Err(ShmError::Attach(errno()));
        }

        // removed on last detach; never blocks a bigger re-creation
        unsafe {
            libc::shmctl(shmid, libc::IPC_RMID, std::ptr::null_mut());
        }

        let segment = segment as *mut ShmSegment;
        unsafe {
            std::ptr::write(segment, ShmSegment::default());
        }

        info!("shm: attached segment key 0x{:08x}, {} bytes", key, size);
        Ok(Self { segment, tick: 0 })
    }

    /// Publish the session's current fix. Never fails after attach.
    pub fn publish(&mut self, fix: &GnssFix, context: &GnssContext) {
        self.tick = self.tick.wrapping_add(1);
        if self.tick == 0 {
            // zero means "nothing published yet" to readers
            self.tick = 1;
        }
        let record = ShmFix::capture(fix, context);
        unsafe { &*self.segment }.publish(self.tick, &record);
    }
}

impl Drop for ShmExporter {
    fn drop(&mut self) {
        let detached = unsafe { libc::shmdt(self.segment as *const libc::c_void) };
        if detached == -1 {
            warn!("shm: detach failed, errno {}", errno());
        }
    }
}

/// Reader handle; any number may attach.
#[derive(Debug)]
pub struct ShmReader {
    segment: *const ShmSegment,
    last_seen: u32,
}

impl ShmReader {
    pub fn attach() -> Result<Self, ShmError> {
        let key = shm_key()?;
        let size = std::mem::size_of::<ShmSegment>();

        let shmid = unsafe { libc::shmget(key, size, 0o666) };
        if shmid == -1 {
            return Err(ShmError::SegmentCreation(errno()));
        }

        let segment = unsafe { libc::shmat(shmid, std::ptr::null(), libc::SHM_RDONLY) };
        if segment == usize::MAX as *mut libc::c_void {
            return Err(ShmError::Attach(errno()));
        }

        Ok(Self {
            segment: segment as *const ShmSegment,
            last_seen: 0,
        })
    }

    /// Latest fresh record, if the writer published since the last
    /// successful poll.
    pub fn poll(&mut self) -> Option<ShmFix> {
        let (tick, record) = unsafe { &*self.segment }.consume(self.last_seen)?;
        self.last_seen = tick;
        Some(record)
    }
}

impl Drop for ShmReader {
    fn drop(&mut self) {
        unsafe {
            libc::shmdt(self.segment as *const libc::c_void);
        }
    }
}

fn errno() -> i32 {
    std::io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn sample_record(tick: u32) -> ShmFix {
        let mut record = ShmFix::zeroed();
        record.latitude = tick as f64;
        record.longitude = -2.0 * tick as f64;
        record.mode = 3;
        record
    }

    #[test]
    fn publish_then_consume() {
        let segment = ShmSegment::default();
        segment.publish(7, &sample_record(7));

        let (tick, record) = segment.consume(0).expect("fresh record");
        assert_eq!(tick, 7);
        assert_eq!(record.latitude, 7.0);
        assert_eq!(record.origin, SHM_ORIGIN);

        // same tick again: stale, retry
        assert!(segment.consume(7).is_none());
    }

    #[test]
    fn stalled_writer_forces_retry() {
        let segment = ShmSegment::default();
        segment.publish(7, &sample_record(7));
        assert!(segment.consume(0).is_some());

        // writer advances the trailing bookend and stalls mid-publish
        segment.bookend2.store(8, Ordering::SeqCst);
        assert_eq!(segment.consume(7), None);

        // writer completes: record then leading bookend
        unsafe {
            std::ptr::write_volatile(segment.record.get(), sample_record(8));
        }
        segment.bookend1.store(8, Ordering::SeqCst);
        let (tick, record) = segment.consume(7).expect("completed publish");
        assert_eq!(tick, 8);
        assert_eq!(record.latitude, 8.0);
    }

    #[test]
    fn empty_segment_never_validates() {
        let segment = ShmSegment::default();
        assert!(segment.consume(0).is_none());
    }

    #[test]
    fn concurrent_reader_sees_only_whole_records() {
        let segment = Arc::new(ShmSegment::default());
        let writer_segment = Arc::clone(&segment);

        let writer = std::thread::spawn(move || {
            for tick in 1..=5000u32 {
                writer_segment.publish(tick, &sample_record(tick));
            }
        });

        let mut accepted = 0u32;
        let mut last = 0u32;
        while accepted < 200 {
            if let Some((tick, record)) = segment.consume(last) {
                // torn reads would break the lat/lon relation
                assert_eq!(record.longitude, -2.0 * record.latitude);
                assert_eq!(record.latitude, tick as f64);
                assert_eq!(record.origin, SHM_ORIGIN);
                assert!(tick > last);
                last = tick;
                accepted += 1;
            }
            if writer.is_finished() {
                break;
            }
        }
        writer.join().unwrap();

        // the final record is always consumable
        let (tick, record) = segment.consume(0).expect("final record");
        assert_eq!(tick, 5000);
        assert_eq!(record.latitude, 5000.0);
    }

    #[test]
    fn key_resolution() {
        // the default applies when the variable is unset
        std::env::remove_var(SHM_KEY_ENV);
        assert_eq!(shm_key().unwrap(), DEFAULT_SHM_KEY);

        std::env::set_var(SHM_KEY_ENV, "0x4e545031");
        assert_eq!(shm_key().unwrap(), 0x4E545031);

        std::env::set_var(SHM_KEY_ENV, "12345");
        assert_eq!(shm_key().unwrap(), 12345);

        std::env::set_var(SHM_KEY_ENV, "bogus");
        assert!(matches!(shm_key(), Err(ShmError::BadKey(_))));

        std::env::remove_var(SHM_KEY_ENV);
    }

    #[test]
    fn capture_maps_sentinels() {
        let fix = GnssFix::default();
        let context = GnssContext::default();
        let record = ShmFix::capture(&fix, &context);
        assert_eq!(record.time_ns, i64::MIN);
        assert!(record.latitude.is_nan());
        assert_eq!(record.mode, 0);
        assert_eq!(record.leap_seconds, -1);
    }
}
