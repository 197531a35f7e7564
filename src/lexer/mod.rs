//! Byte-stream packet recognizer.
//!
//! A single serial stream may interleave binary frames and textual
//! sentences. The lexer consumes the stream byte by byte, classifies
//! candidate start bytes, accumulates one frame at a time, validates
//! length and checksum, and hands complete packets to the dispatch layer.
//!
//! Corruption never costs more than one frame: on any validation failure
//! the cursor advances one byte past the failed sync byte and scanning
//! resumes, so every subsequent intact frame is still recovered.

use log::{debug, trace, warn};

use crate::bits::{le_u16, le_u32};

/// CASIC frame sync bytes.
pub const CASIC_SYNC: [u8; 2] = [0xBA, 0xCE];

/// Sync + length + class/id ahead of the payload.
pub const CASIC_HEADER_LEN: usize = 6;

/// Smallest complete CASIC frame: header plus 4 checksum bytes.
pub const CASIC_MIN_FRAME: usize = CASIC_HEADER_LEN + 4;

/// Hard cap on a stated payload length. Larger values are treated as
/// corrupt sync, not as frames worth waiting for.
pub const MAX_PAYLOAD: usize = 2048;

/// Longest accepted textual sentence, terminator included.
pub const MAX_TEXT_LINE: usize = 1024;

/// Packet families this lexer recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketFamily {
    /// CASIC binary frame (`0xBA 0xCE` sync).
    Casic,
    /// `$`-led sentence (NMEA 0183 discipline).
    Nmea,
    /// `!`-led sentence (AIVDM discipline).
    Aivdm,
    /// `{`-led JSON line.
    Json,
    /// `#`-led comment line.
    Comment,
}

impl PacketFamily {
    /// True for the byte-counted, checksummed binary framings.
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Casic)
    }

    fn from_start_byte(byte: u8) -> Option<Self> {
        match byte {
            b'$' => Some(Self::Nmea),
            b'!' => Some(Self::Aivdm),
            b'{' => Some(Self::Json),
            b'#' => Some(Self::Comment),
            _ => None,
        }
    }
}

/// Why a span of input was thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// Byte stream noise: no enabled family claims the byte.
    BadSync,
    /// Stated payload length exceeds [MAX_PAYLOAD].
    Oversize,
    /// Checksum mismatch on an otherwise well-formed frame.
    ChecksumBad,
    /// Textual sentence ran past [MAX_TEXT_LINE] without a terminator.
    UnterminatedText,
    /// Frame family rejected by a sticky driver assignment.
    FamilyMismatch,
}

/// One step of lexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexEvent {
    /// The buffered input does not yet hold a complete frame.
    NeedMoreBytes,
    /// A complete validated packet was emitted; grab it with
    /// [Lexer::frame] / [Lexer::payload] before the next call.
    Packet(PacketFamily),
    /// `skipped` bytes were dropped for `reason`.
    Discard {
        reason: DiscardReason,
        skipped: usize,
    },
}

/// Per-stream discard accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexCounters {
    /// Complete packets emitted.
    pub packets: u64,
    /// Bytes dropped while hunting for sync.
    pub dropped_bytes: u64,
    /// Frames lost to checksum failures.
    pub bad_checksums: u64,
    /// Frames lost to oversize or runt lengths.
    pub bad_lengths: u64,
    /// Text sentences lost to missing terminators.
    pub bad_lines: u64,
}

/// Streaming packet lexer.
///
/// Feed arbitrary chunks with [Lexer::feed], then drain events with
/// [Lexer::next_event] until it returns [LexEvent::NeedMoreBytes].
/// Lexing a stream in chunks yields exactly the packets of lexing it
/// whole: the lexer never consumes input it has not fully classified.
#[derive(Debug)]
pub struct Lexer {
    /// Append-only input buffer; consumed prefix compacted lazily.
    buffer: Vec<u8>,
    /// First unconsumed byte.
    cursor: usize,
    /// Last emitted frame, contiguous, valid until the next event.
    frame: Vec<u8>,
    /// Family of the last emitted frame.
    family: Option<PacketFamily>,
    /// Family locked by first successful classification.
    locked: Option<PacketFamily>,
    /// When set, frames of other families are discarded instead of
    /// re-locking the stream.
    sticky: bool,
    counters: LexCounters,
    /// One warning per discard reason, then silence.
    warned: u8,
}

impl Default for Lexer {
    fn default() -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            cursor: 0,
            frame: Vec::with_capacity(MAX_PAYLOAD + CASIC_HEADER_LEN + 4),
            family: None,
            locked: None,
            sticky: false,
            counters: LexCounters::default(),
            warned: 0,
        }
    }
}

impl Lexer {
    /// Append a chunk of raw input.
    pub fn feed(&mut self, bytes: &[u8]) {
        // compact once the consumed prefix dominates
        if self.cursor > 0 && self.cursor * 2 > self.buffer.len() {
            self.buffer.drain(..self.cursor);
            self.cursor = 0;
        }
        self.buffer.extend_from_slice(bytes);
    }

    /// Bytes of the last emitted frame, including framing and checksum.
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    /// Payload of the last emitted binary frame (text frames: the full
    /// sentence minus its terminator).
    pub fn payload(&self) -> &[u8] {
        match self.family {
            Some(PacketFamily::Casic) => &self.frame[CASIC_HEADER_LEN..self.frame.len() - 4],
            Some(_) => {
                let end = self
                    .frame
                    .iter()
                    .position(|b| *b == b'\r' || *b == b'\n')
                    .unwrap_or(self.frame.len());
                &self.frame[..end]
            },
            None => &[],
        }
    }

    /// `(class, id)` of the last emitted CASIC frame.
    pub fn class_id(&self) -> (u8, u8) {
        (self.frame[4], self.frame[5])
    }

    /// Discard accounting since construction.
    pub fn counters(&self) -> &LexCounters {
        &self.counters
    }

    /// Family locked by the first successful classification, if any.
    pub fn locked_family(&self) -> Option<PacketFamily> {
        self.locked
    }

    /// Pin the stream to `family`; other families will be discarded with
    /// [DiscardReason::FamilyMismatch] until reassigned.
    pub fn assign_family(&mut self, family: PacketFamily, sticky: bool) {
        self.locked = Some(family);
        self.sticky = sticky;
    }

    /// Classify the next packet out of the buffered input.
    pub fn next_event(&mut self) -> LexEvent {
        loop {
            let avail = &self.buffer[self.cursor..];
            if avail.is_empty() {
                return LexEvent::NeedMoreBytes;
            }

            // hunt for a candidate start byte, counting the noise
            let start = avail
                .iter()
                .position(|b| *b == CASIC_SYNC[0] || PacketFamily::from_start_byte(*b).is_some());

            let skipped = start.unwrap_or(avail.len());
            if skipped > 0 {
                self.cursor += skipped;
                self.counters.dropped_bytes += skipped as u64;
                self.warn_once(DiscardReason::BadSync, skipped);
                return LexEvent::Discard {
                    reason: DiscardReason::BadSync,
                    skipped,
                };
            }

            let event = if avail[0] == CASIC_SYNC[0] {
                self.lex_casic()
            } else {
                self.lex_text(PacketFamily::from_start_byte(avail[0]).unwrap())
            };

            match event {
                Some(event) => return event,
                // single byte consumed without a reportable event
                None => continue,
            }
        }
    }

    /// Attempt one CASIC frame at the cursor. `None` means one byte was
    /// consumed and scanning should continue silently.
    fn lex_casic(&mut self) -> Option<LexEvent> {
        let avail = &self.buffer[self.cursor..];

        if avail.len() < 2 {
            return Some(LexEvent::NeedMoreBytes);
        }

        if avail[1] != CASIC_SYNC[1] {
            // lone 0xBA is stream noise
            self.cursor += 1;
            self.counters.dropped_bytes += 1;
            return None;
        }

        if avail.len() < CASIC_HEADER_LEN {
            return Some(LexEvent::NeedMoreBytes);
        }

        let length = le_u16(avail, 2) as usize;
        if length > MAX_PAYLOAD {
            self.counters.bad_lengths += 1;
            self.warn_once(DiscardReason::Oversize, length);
            return Some(self.discard(1, DiscardReason::Oversize));
        }

        let total = CASIC_MIN_FRAME + length;
        if avail.len() < total {
            return Some(LexEvent::NeedMoreBytes);
        }

        if length % 4 != 0 {
            // decoder may still reject; framing-wise not fatal
            warn!(
                "casic: payload length {} not 4-byte aligned (class 0x{:02x} id 0x{:02x})",
                length, avail[4], avail[5],
            );
        }

        let expected = le_u32(avail, total - 4);
        let computed = casic_checksum(avail[4], avail[5], length as u16, &avail[6..6 + length]);

        if computed != expected {
            self.counters.bad_checksums += 1;
            self.warn_once(DiscardReason::ChecksumBad, total);
            return Some(self.discard(1, DiscardReason::ChecksumBad));
        }

        if self.sticky && self.locked.is_some() && self.locked != Some(PacketFamily::Casic) {
            return Some(self.discard(total, DiscardReason::FamilyMismatch));
        }

        trace!(
            "casic: frame class 0x{:02x} id 0x{:02x} payload {}",
            avail[4],
            avail[5],
            length,
        );

        Some(self.emit(PacketFamily::Casic, total))
    }

    /// Attempt one textual sentence at the cursor.
    fn lex_text(&mut self, family: PacketFamily) -> Option<LexEvent> {
        let avail = &self.buffer[self.cursor..];

        let terminator = avail
            .iter()
            .take(MAX_TEXT_LINE)
            .position(|b| *b == b'\n' || *b == b'\r');

        let Some(end) = terminator else {
            if avail.len() >= MAX_TEXT_LINE {
                self.counters.bad_lines += 1;
                self.warn_once(DiscardReason::UnterminatedText, MAX_TEXT_LINE);
                return Some(self.discard(1, DiscardReason::UnterminatedText));
            }
            return Some(LexEvent::NeedMoreBytes);
        };

        // swallow a CRLF pair whole
        let mut total = end + 1;
        if avail[end] == b'\r' {
            match avail.get(total) {
                Some(b'\n') => total += 1,
                // cannot yet tell CR from CRLF
                None => return Some(LexEvent::NeedMoreBytes),
                Some(_) => {},
            }
        }

        if self.sticky && self.locked.is_some() && self.locked != Some(family) {
            return Some(self.discard(total, DiscardReason::FamilyMismatch));
        }

        debug!("text: {:?} sentence, {} bytes", family, total);
        Some(self.emit(family, total))
    }

    fn emit(&mut self, family: PacketFamily, total: usize) -> LexEvent {
        self.frame.clear();
        self.frame
            .extend_from_slice(&self.buffer[self.cursor..self.cursor + total]);
        self.cursor += total;
        self.family = Some(family);
        self.counters.packets += 1;
        if !self.sticky {
            self.locked = Some(family);
        }
        LexEvent::Packet(family)
    }

    fn discard(&mut self, skipped: usize, reason: DiscardReason) -> LexEvent {
        self.cursor += skipped;
        self.counters.dropped_bytes += skipped as u64;
        LexEvent::Discard { reason, skipped }
    }

    fn warn_once(&mut self, reason: DiscardReason, magnitude: usize) {
        let bit = 1u8 << (reason as u8);
        if self.warned & bit == 0 {
            self.warned |= bit;
            warn!(
                "lexer: {:?} ({} bytes), further occurrences counted silently",
                reason, magnitude,
            );
        }
    }
}

/// CASIC frame checksum: seed from the class/id/length header, then add
/// each little-endian payload word. Trailing unaligned bytes are
/// zero-padded into a final word.
pub fn casic_checksum(class: u8, id: u8, length: u16, payload: &[u8]) -> u32 {
    let mut ck = ((id as u32) << 24)
        .wrapping_add((class as u32) << 16)
        .wrapping_add(length as u32);

    let mut chunks = payload.chunks_exact(4);
    for word in &mut chunks {
        ck = ck.wrapping_add(le_u32(word, 0));
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut word = [0u8; 4];
        word[..tail.len()].copy_from_slice(tail);
        ck = ck.wrapping_add(le_u32(&word, 0));
    }

    ck
}

/// Build a complete CASIC frame around `payload`.
pub fn casic_frame(class: u8, id: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(CASIC_MIN_FRAME + payload.len());
    frame.extend_from_slice(&CASIC_SYNC);
    frame.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    frame.push(class);
    frame.push(id);
    frame.extend_from_slice(payload);
    let ck = casic_checksum(class, id, payload.len() as u16, payload);
    frame.extend_from_slice(&ck.to_le_bytes());
    frame
}

#[cfg(test)]
mod test {
    use super::*;

    fn drain(lexer: &mut Lexer) -> Vec<(PacketFamily, Vec<u8>)> {
        let mut packets = Vec::new();
        loop {
            match lexer.next_event() {
                LexEvent::NeedMoreBytes => return packets,
                LexEvent::Packet(family) => packets.push((family, lexer.frame().to_vec())),
                LexEvent::Discard { .. } => {},
            }
        }
    }

    #[test]
    fn ack_frame_roundtrip() {
        let frame = casic_frame(0x05, 0x01, &[0x06, 0x00, 0x02, 0x00]);
        assert_eq!(frame.len(), 14);
        assert_eq!(&frame[..2], &CASIC_SYNC);

        let mut lexer = Lexer::default();
        lexer.feed(&frame);
        assert_eq!(lexer.next_event(), LexEvent::Packet(PacketFamily::Casic));
        assert_eq!(lexer.class_id(), (0x05, 0x01));
        assert_eq!(lexer.payload(), &[0x06, 0x00, 0x02, 0x00]);
        assert_eq!(lexer.next_event(), LexEvent::NeedMoreBytes);
    }

    #[test]
    fn checksum_seed_and_payload_words() {
        // seed = id<<24 | class<<16 | len, plus one LE payload word
        assert_eq!(
            casic_checksum(0x05, 0x01, 4, &[0x06, 0x00, 0x02, 0x00]),
            0x01050004 + 0x00020006,
        );
        // empty payload: seed only
        assert_eq!(casic_checksum(0x06, 0x00, 0, &[]), 0x00060000);
    }

    #[test]
    fn streaming_equals_batch() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&casic_frame(0x05, 0x01, &[0x06, 0x00, 0x02, 0x00]));
        stream.extend_from_slice(b"$GNGGA,123519,4807.038,N*47\r\n");
        stream.extend_from_slice(&casic_frame(0x0A, 0x04, &[0u8; 8]));

        let mut batch = Lexer::default();
        batch.feed(&stream);
        let expected = drain(&mut batch);
        assert_eq!(expected.len(), 3);

        // every split point, including mid-header and mid-checksum
        for split in 0..stream.len() {
            let mut lexer = Lexer::default();
            lexer.feed(&stream[..split]);
            let mut packets = drain(&mut lexer);
            lexer.feed(&stream[split..]);
            packets.extend(drain(&mut lexer));
            assert_eq!(packets, expected, "split at {}", split);
        }
    }

    #[test]
    fn corruption_costs_at_most_one_frame() {
        let first = casic_frame(0x05, 0x01, &[0x06, 0x00, 0x02, 0x00]);
        let second = casic_frame(0x05, 0x00, &[0x06, 0x00, 0x03, 0x00]);
        let third = casic_frame(0x0A, 0x04, &[0u8; 4]);

        for corrupt_at in 0..first.len() {
            let mut stream = first.clone();
            stream[corrupt_at] ^= 0xFF;
            stream.extend_from_slice(&second);
            stream.extend_from_slice(&third);
            // a corrupted length field may claim bytes past the real
            // frames; pad so the bogus frame completes and fails its
            // checksum instead of waiting forever
            stream.extend_from_slice(&[0u8; 300]);

            let mut lexer = Lexer::default();
            lexer.feed(&stream);
            let packets = drain(&mut lexer);

            // the corrupted frame may be lost; both followers survive
            let survivors: Vec<&Vec<u8>> = packets.iter().map(|(_, f)| f).collect();
            assert!(survivors.contains(&&second), "corrupt at {}", corrupt_at);
            assert!(survivors.contains(&&third), "corrupt at {}", corrupt_at);
            assert!(packets.len() >= 2 && packets.len() <= 3);
        }
    }

    #[test]
    fn runt_length_discards() {
        // stated length exceeds the cap: the sync byte is surrendered
        let mut frame = casic_frame(0x05, 0x01, &[]);
        frame[2] = 0xFF;
        frame[3] = 0xFF;

        let mut lexer = Lexer::default();
        lexer.feed(&frame);
        assert!(matches!(
            lexer.next_event(),
            LexEvent::Discard {
                reason: DiscardReason::Oversize,
                ..
            }
        ));
    }

    #[test]
    fn text_families_classified() {
        let mut lexer = Lexer::default();
        lexer.feed(b"!AIVDM,1,1,,A,15Mq4J0P01G?cNPE`2<d07k>0L0E,0*4E\r\n{\"class\":\"TPV\"}\r\n#comment\n");
        assert_eq!(lexer.next_event(), LexEvent::Packet(PacketFamily::Aivdm));
        assert_eq!(lexer.next_event(), LexEvent::Packet(PacketFamily::Json));
        assert_eq!(
            String::from_utf8_lossy(lexer.payload()),
            "{\"class\":\"TPV\"}"
        );
        assert_eq!(lexer.next_event(), LexEvent::Packet(PacketFamily::Comment));
        assert_eq!(lexer.next_event(), LexEvent::NeedMoreBytes);
    }

    #[test]
    fn sticky_family_rejects_others() {
        let mut lexer = Lexer::default();
        lexer.assign_family(PacketFamily::Casic, true);
        lexer.feed(b"$GNRMC,,V,,,,,,,,,,N*4D\r\n");
        assert!(matches!(
            lexer.next_event(),
            LexEvent::Discard {
                reason: DiscardReason::FamilyMismatch,
                ..
            }
        ));

        lexer.feed(&casic_frame(0x05, 0x01, &[0x06, 0x00, 0x02, 0x00]));
        assert_eq!(lexer.next_event(), LexEvent::Packet(PacketFamily::Casic));
    }
}
