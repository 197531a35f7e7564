//! GNSS receiver multiplexer core.
//!
//! `gnssd` turns the raw byte stream of a GNSS receiver into a normalized
//! stream of position / velocity / time / satellite / ephemeris records,
//! and publishes that stream two ways:
//!
//! - a line-oriented JSON protocol for socket clients (one self-contained
//!   record per CRLF-terminated line), with a client-side reassembler that
//!   parses the lines back into typed records;
//! - a lock-free, versioned shared-memory window for latency-sensitive
//!   readers on the same host.
//!
//! The decode pipeline is synchronous and allocation-light: a byte-driven
//! frame [lexer](crate::lexer) recognizes and checksum-validates packets,
//! per-protocol [decoders](crate::casic) unpack them into partial fix
//! deltas, the [merge engine](crate::fix::merge) folds each delta into the
//! session's canonical record without downgrading known fields, and the
//! [report emitter](crate::report) serializes the result.
//!
//! Raw navigation pages (GPS/QZSS LNAV, BeiDou D1/D2, Galileo I/NAV,
//! GLONASS strings) are interpreted by the [subframe](crate::subframe)
//! decoders into orbit and almanac records, and drive the process-wide
//! leap-second state.
//!
//! ```no_run
//! use gnssd::prelude::*;
//!
//! let mut context = GnssContext::default();
//! let mut session = GnssSession::new("/dev/ttyUSB0");
//!
//! // bytes read from the device, in arbitrary chunks
//! let chunk = [0xBA, 0xCE, 0x00, 0x00];
//!
//! for event in session.feed(&mut context, &chunk) {
//!     if event.mask.intersects(TransferMask::LATLON) {
//!         let line = gnssd::report::tpv_line(&session, &context);
//!         // write `line` to subscribed clients
//!     }
//! }
//! ```

#[macro_use]
extern crate lazy_static;

extern crate gnss_rs as gnss;

/// Endian-aware byte extraction and the navigation-word bit cursor.
pub mod bits;

/// Byte-stream packet recognizer.
pub mod lexer;

/// CASIC binary protocol decoder.
pub mod casic;

/// Raw navigation subframe interpretation (GPS, BeiDou, Galileo, GLONASS).
pub mod subframe;

/// Orbit (ephemeris / almanac) records.
pub mod navigation;

/// Canonical fix / attitude / DOP records and the merge engine.
pub mod fix;

/// Per-device session state and the process-wide context.
pub mod session;

/// Line-protocol emitter and client-side reassembler.
pub mod report;

/// Shared-memory export window.
pub mod shm;

#[cfg(test)]
mod tests;

pub mod prelude {
    pub use crate::fix::{
        merge::merge_fix, AntennaStatus, Attitude, Dop, FixMode, FixStatus, GnssFix, Satellite,
        TransferMask,
    };
    pub use crate::navigation::{Orbit, OrbitKind};
    pub use crate::session::{Driver, GnssContext, GnssSession, LeapNotify, PacketMask};
    pub use crate::subframe::SubframeData;
    // pre-built time & satellite identity types
    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale};
}
