//! Client-side reassembly of the line protocol.
//!
//! The inverse of the emitter: each line is dispatched on its `class`
//! discriminator into a typed mirror, and the fix-bearing mirrors
//! convert back into the canonical records.
//!
//! The parser is allocation-free: a borrowing scanner walks the line
//! once, and every destination is fixed-extent — bounded strings
//! ([FixedString]) and bounded arrays ([FixedVec]) back all text and
//! sub-array fields. Per class, a declared set of attributes maps wire
//! names onto record fields with a type each; unknown attributes are
//! skipped, missing attributes keep their explicit-unknown defaults,
//! quoted values land only in string/time fields, numeric literals only
//! in numeric fields, and enumeration codes translate through the same
//! numeric mappings the daemon emits.

use hifitime::Epoch;
use num_traits::FromPrimitive;
use thiserror::Error;

use crate::fix::{
    AntennaStatus, Dop, FixMode, FixStatus, GnssFix, Satellite, TransferMask,
};
use crate::navigation::{Orbit, OrbitKind};
use crate::report::json::parse_iso8601;

/// Sky views larger than this are rejected, not spilled to the heap.
pub const MAX_SATELLITES: usize = 64;
/// DEVICES enumerations larger than this are rejected.
pub const MAX_DEVICES: usize = 8;
/// Longest health table a SUBFRAME line may carry.
pub const MAX_HEALTH_ENTRIES: usize = 32;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    /// Line is not a well-formed record.
    #[error("malformed record at byte {0}")]
    Syntax(usize),

    /// A value of the wrong JSON type for its declared attribute.
    #[error("attribute {0:?}: type mismatch")]
    TypeMismatch(&'static str),

    /// `class` names no known record.
    #[error("unknown class {0}")]
    UnknownClass(FixedString<24>),

    /// A string or sub-array outgrew its fixed backing store.
    #[error("fixed-extent store overflow")]
    Overflow,

    /// Unrepresentable string escape.
    #[error("bad string escape")]
    BadEscape,
}

/// Bounded UTF-8 string on the stack.
#[derive(Clone, Copy)]
pub struct FixedString<const N: usize> {
    bytes: [u8; N],
    len: usize,
}

impl<const N: usize> FixedString<N> {
    /// Decode a raw (still escaped) protocol string into the fixed
    /// store. Overlong input is an error, not a truncation.
    pub fn from_escaped(raw: &str) -> Result<Self, ClientError> {
        let mut out = Self::default();
        let bytes = raw.as_bytes();
        let mut index = 0;

        while index < bytes.len() {
            let byte = bytes[index];
            if byte != b'\\' {
                out.push_byte(byte)?;
                index += 1;
                continue;
            }

            let escape = *bytes.get(index + 1).ok_or(ClientError::BadEscape)?;
            index += 2;
            match escape {
                b'"' | b'\\' | b'/' => out.push_byte(escape)?,
                b'n' => out.push_byte(b'\n')?,
                b't' => out.push_byte(b'\t')?,
                b'r' => out.push_byte(b'\r')?,
                b'b' => out.push_byte(0x08)?,
                b'f' => out.push_byte(0x0C)?,
                b'u' => {
                    let digits = bytes
                        .get(index..index + 4)
                        .and_then(|hex| std::str::from_utf8(hex).ok())
                        .ok_or(ClientError::BadEscape)?;
                    let code =
                        u32::from_str_radix(digits, 16).map_err(|_| ClientError::BadEscape)?;
                    index += 4;
                    out.push_code_point(code)?;
                },
                _ => return Err(ClientError::BadEscape),
            }
        }

        Ok(out)
    }

    fn push_byte(&mut self, byte: u8) -> Result<(), ClientError> {
        if self.len >= N {
            return Err(ClientError::Overflow);
        }
        self.bytes[self.len] = byte;
        self.len += 1;
        Ok(())
    }

    fn push_code_point(&mut self, code: u32) -> Result<(), ClientError> {
        // surrogate halves cannot become UTF-8
        if (0xD800..=0xDFFF).contains(&code) {
            return Err(ClientError::BadEscape);
        }
        match code {
            0..=0x7F => self.push_byte(code as u8),
            0x80..=0x7FF => {
                self.push_byte(0xC0 | (code >> 6) as u8)?;
                self.push_byte(0x80 | (code & 0x3F) as u8)
            },
            _ => {
                self.push_byte(0xE0 | (code >> 12) as u8)?;
                self.push_byte(0x80 | ((code >> 6) & 0x3F) as u8)?;
                self.push_byte(0x80 | (code & 0x3F) as u8)
            },
        }
    }

    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes[..self.len]).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<const N: usize> Default for FixedString<N> {
    fn default() -> Self {
        Self {
            bytes: [0; N],
            len: 0,
        }
    }
}

impl<const N: usize> std::fmt::Debug for FixedString<N> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.as_str().fmt(formatter)
    }
}

impl<const N: usize> std::fmt::Display for FixedString<N> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl<const N: usize> PartialEq for FixedString<N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl<const N: usize> PartialEq<&str> for FixedString<N> {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Bounded array on the stack; dereferences to its filled slice.
#[derive(Debug, Clone, Copy)]
pub struct FixedVec<T: Copy + Default, const N: usize> {
    items: [T; N],
    len: usize,
}

impl<T: Copy + Default, const N: usize> FixedVec<T, N> {
    fn push(&mut self, item: T) -> Result<(), ClientError> {
        if self.len >= N {
            return Err(ClientError::Overflow);
        }
        self.items[self.len] = item;
        self.len += 1;
        Ok(())
    }
}

impl<T: Copy + Default, const N: usize> Default for FixedVec<T, N> {
    fn default() -> Self {
        Self {
            items: [T::default(); N],
            len: 0,
        }
    }
}

impl<T: Copy + Default, const N: usize> std::ops::Deref for FixedVec<T, N> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.items[..self.len]
    }
}

impl<T: Copy + Default + PartialEq, const N: usize> PartialEq for FixedVec<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self[..] == other[..]
    }
}

/// One scanned attribute value, borrowed from the line.
#[derive(Debug, Clone, Copy, PartialEq)]
enum RawValue<'a> {
    /// Contents between the quotes, escapes undecoded
    String(&'a str),
    /// Numeric literal with a fraction or exponent
    Number(f64),
    /// Plain integer literal
    Integer(i64),
    Bool(bool),
    Null,
    /// Balanced `{...}` slice, delimiters included
    Object(&'a str),
    /// Balanced `[...]` slice, delimiters included
    Array(&'a str),
}

impl<'a> RawValue<'a> {
    fn float(&self, key: &'static str) -> Result<f64, ClientError> {
        match self {
            Self::Number(value) => Ok(*value),
            Self::Integer(value) => Ok(*value as f64),
            _ => Err(ClientError::TypeMismatch(key)),
        }
    }

    fn integer(&self, key: &'static str) -> Result<i64, ClientError> {
        match self {
            Self::Integer(value) => Ok(*value),
            _ => Err(ClientError::TypeMismatch(key)),
        }
    }

    fn boolean(&self, key: &'static str) -> Result<bool, ClientError> {
        match self {
            Self::Bool(value) => Ok(*value),
            _ => Err(ClientError::TypeMismatch(key)),
        }
    }

    fn string(&self, key: &'static str) -> Result<&'a str, ClientError> {
        match self {
            Self::String(raw) => Ok(raw),
            _ => Err(ClientError::TypeMismatch(key)),
        }
    }

    fn time(&self, key: &'static str) -> Result<Epoch, ClientError> {
        parse_iso8601(self.string(key)?).ok_or(ClientError::TypeMismatch(key))
    }

    fn object(&self, key: &'static str) -> Result<&'a str, ClientError> {
        match self {
            Self::Object(slice) => Ok(slice),
            _ => Err(ClientError::TypeMismatch(key)),
        }
    }

    fn array(&self, key: &'static str) -> Result<&'a str, ClientError> {
        match self {
            Self::Array(slice) => Ok(slice),
            _ => Err(ClientError::TypeMismatch(key)),
        }
    }
}

/// Byte-walking tokenizer over one line. Slices only at ASCII
/// structural characters, so every returned `&str` stays on a char
/// boundary.
struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn bytes(&self) -> &'a [u8] {
        self.text.as_bytes()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), ClientError> {
        self.skip_ws();
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(ClientError::Syntax(self.pos))
        }
    }

    fn eat(&mut self, byte: u8) -> bool {
        self.skip_ws();
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_word(&mut self, word: &str) -> Result<(), ClientError> {
        if self.text[self.pos..].starts_with(word) {
            self.pos += word.len();
            Ok(())
        } else {
            Err(ClientError::Syntax(self.pos))
        }
    }

    /// Quoted string; returns the raw contents, escapes untouched.
    fn parse_string(&mut self) -> Result<&'a str, ClientError> {
        self.expect(b'"')?;
        let start = self.pos;
        let bytes = self.bytes();
        while let Some(byte) = bytes.get(self.pos) {
            match byte {
                b'\\' => self.pos += 2,
                b'"' => {
                    let raw = &self.text[start..self.pos];
                    self.pos += 1;
                    return Ok(raw);
                },
                _ => self.pos += 1,
            }
        }
        Err(ClientError::Syntax(self.pos))
    }

    /// Balanced bracket run, string-aware; returns the whole slice.
    fn scan_balanced(&mut self, open: u8, close: u8) -> Result<&'a str, ClientError> {
        self.expect(open)?;
        let start = self.pos - 1;
        let bytes = self.bytes();
        let mut depth = 1usize;
        let mut in_string = false;

        while let Some(byte) = bytes.get(self.pos) {
            if in_string {
                match byte {
                    b'\\' => self.pos += 1,
                    b'"' => in_string = false,
                    _ => {},
                }
            } else if *byte == b'"' {
                in_string = true;
            } else if *byte == open {
                depth += 1;
            } else if *byte == close {
                depth -= 1;
                if depth == 0 {
                    self.pos += 1;
                    return Ok(&self.text[start..self.pos]);
                }
            }
            self.pos += 1;
        }
        Err(ClientError::Syntax(self.pos))
    }

    fn parse_number(&mut self) -> Result<RawValue<'a>, ClientError> {
        let start = self.pos;
        while matches!(
            self.peek(),
            Some(b'0'..=b'9' | b'-' | b'+' | b'.' | b'e' | b'E'),
        ) {
            self.pos += 1;
        }
        let literal = &self.text[start..self.pos];
        if literal.is_empty() {
            return Err(ClientError::Syntax(start));
        }

        if literal.bytes().any(|byte| matches!(byte, b'.' | b'e' | b'E')) {
            literal
                .parse::<f64>()
                .map(RawValue::Number)
                .map_err(|_| ClientError::Syntax(start))
        } else {
            literal
                .parse::<i64>()
                .map(RawValue::Integer)
                .map_err(|_| ClientError::Syntax(start))
        }
    }

    fn parse_value(&mut self) -> Result<RawValue<'a>, ClientError> {
        self.skip_ws();
        match self.peek().ok_or(ClientError::Syntax(self.pos))? {
            b'"' => Ok(RawValue::String(self.parse_string()?)),
            b'{' => Ok(RawValue::Object(self.scan_balanced(b'{', b'}')?)),
            b'[' => Ok(RawValue::Array(self.scan_balanced(b'[', b']')?)),
            b't' => {
                self.expect_word("true")?;
                Ok(RawValue::Bool(true))
            },
            b'f' => {
                self.expect_word("false")?;
                Ok(RawValue::Bool(false))
            },
            b'n' => {
                self.expect_word("null")?;
                Ok(RawValue::Null)
            },
            _ => self.parse_number(),
        }
    }
}

/// Attribute iterator over one `{...}` object.
struct ObjectParser<'a> {
    scanner: Scanner<'a>,
    parsed_any: bool,
    done: bool,
}

impl<'a> ObjectParser<'a> {
    fn new(text: &'a str) -> Result<Self, ClientError> {
        let mut scanner = Scanner::new(text);
        scanner.expect(b'{')?;
        Ok(Self {
            scanner,
            parsed_any: false,
            done: false,
        })
    }

    fn next_attribute(&mut self) -> Result<Option<(&'a str, RawValue<'a>)>, ClientError> {
        if self.done {
            return Ok(None);
        }
        if self.scanner.eat(b'}') {
            self.done = true;
            return Ok(None);
        }
        if self.parsed_any {
            self.scanner.expect(b',')?;
        }
        self.parsed_any = true;

        let key = self.scanner.parse_string()?;
        self.scanner.expect(b':')?;
        let value = self.scanner.parse_value()?;
        Ok(Some((key, value)))
    }

    fn position(&self) -> usize {
        self.scanner.pos
    }
}

/// Element iterator over one `[...]` array.
struct ArrayParser<'a> {
    scanner: Scanner<'a>,
    parsed_any: bool,
    done: bool,
}

impl<'a> ArrayParser<'a> {
    fn new(text: &'a str) -> Result<Self, ClientError> {
        let mut scanner = Scanner::new(text);
        scanner.expect(b'[')?;
        Ok(Self {
            scanner,
            parsed_any: false,
            done: false,
        })
    }

    fn next_element(&mut self) -> Result<Option<RawValue<'a>>, ClientError> {
        if self.done {
            return Ok(None);
        }
        if self.scanner.eat(b']') {
            self.done = true;
            return Ok(None);
        }
        if self.parsed_any {
            self.scanner.expect(b',')?;
        }
        self.parsed_any = true;
        Ok(Some(self.scanner.parse_value()?))
    }
}

/// One record off the wire, dispatched by `class`.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Version(VersionReport),
    Devices(DevicesReport),
    Device(DeviceReport),
    Watch(WatchReport),
    Tpv(TpvReport),
    Sky(SkyReport),
    Gst(GstReport),
    Att(AttReport),
    Imu(AttReport),
    Subframe(SubframeReport),
    Error(ErrorReport),
}

/// Parse one CRLF-terminated line. The `class` discriminator leads the
/// record, per the framing contract.
pub fn parse_line(line: &str) -> Result<Report, ClientError> {
    let mut parser = ObjectParser::new(line.trim_end())?;

    let (key, value) = parser
        .next_attribute()?
        .ok_or(ClientError::Syntax(0))?;
    if key != "class" {
        return Err(ClientError::Syntax(parser.position()));
    }

    match value.string("class")? {
        "VERSION" => Ok(Report::Version(fill_version(&mut parser)?)),
        "DEVICES" => Ok(Report::Devices(fill_devices(&mut parser)?)),
        "DEVICE" => Ok(Report::Device(fill_device(&mut parser)?)),
        "WATCH" => Ok(Report::Watch(fill_watch(&mut parser)?)),
        "TPV" => Ok(Report::Tpv(fill_tpv(&mut parser)?)),
        "SKY" => Ok(Report::Sky(fill_sky(&mut parser)?)),
        "GST" => Ok(Report::Gst(fill_gst(&mut parser)?)),
        "ATT" => Ok(Report::Att(fill_att(&mut parser)?)),
        "IMU" => Ok(Report::Imu(fill_att(&mut parser)?)),
        "SUBFRAME" => Ok(Report::Subframe(fill_subframe(&mut parser)?)),
        "ERROR" => Ok(Report::Error(fill_error(&mut parser)?)),
        other => Err(ClientError::UnknownClass(FixedString::from_escaped(other)?)),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VersionReport {
    pub release: FixedString<24>,
    pub rev: FixedString<24>,
    pub proto_major: u8,
    pub proto_minor: u8,
}

fn fill_version(parser: &mut ObjectParser) -> Result<VersionReport, ClientError> {
    let mut report = VersionReport::default();
    while let Some((key, value)) = parser.next_attribute()? {
        match key {
            "release" => report.release = FixedString::from_escaped(value.string("release")?)?,
            "rev" => report.rev = FixedString::from_escaped(value.string("rev")?)?,
            "proto_major" => report.proto_major = value.integer("proto_major")? as u8,
            "proto_minor" => report.proto_minor = value.integer("proto_minor")? as u8,
            _ => {},
        }
    }
    Ok(report)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DeviceReport {
    pub path: Option<FixedString<96>>,
    pub driver: Option<FixedString<16>>,
    pub subtype: Option<FixedString<96>>,
    pub activated: Option<Epoch>,
    pub flags: Option<u32>,
    pub bps: Option<u32>,
    pub parity: Option<char>,
    pub stopbits: Option<u8>,
}

fn fill_device_fields(
    report: &mut DeviceReport,
    key: &str,
    value: &RawValue,
) -> Result<(), ClientError> {
    match key {
        "path" => report.path = Some(FixedString::from_escaped(value.string("path")?)?),
        "driver" => report.driver = Some(FixedString::from_escaped(value.string("driver")?)?),
        "subtype" => report.subtype = Some(FixedString::from_escaped(value.string("subtype")?)?),
        "activated" => report.activated = Some(value.time("activated")?),
        "flags" => report.flags = Some(value.integer("flags")? as u32),
        "bps" => report.bps = Some(value.integer("bps")? as u32),
        "parity" => report.parity = value.string("parity")?.chars().next(),
        "stopbits" => report.stopbits = Some(value.integer("stopbits")? as u8),
        _ => {},
    }
    Ok(())
}

fn fill_device(parser: &mut ObjectParser) -> Result<DeviceReport, ClientError> {
    let mut report = DeviceReport::default();
    while let Some((key, value)) = parser.next_attribute()? {
        fill_device_fields(&mut report, key, &value)?;
    }
    Ok(report)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DevicesReport {
    pub devices: FixedVec<DeviceReport, MAX_DEVICES>,
}

fn fill_devices(parser: &mut ObjectParser) -> Result<DevicesReport, ClientError> {
    let mut report = DevicesReport::default();
    while let Some((key, value)) = parser.next_attribute()? {
        if key == "devices" {
            let mut array = ArrayParser::new(value.array("devices")?)?;
            while let Some(element) = array.next_element()? {
                let mut device = DeviceReport::default();
                let mut object = ObjectParser::new(element.object("devices")?)?;
                while let Some((key, value)) = object.next_attribute()? {
                    fill_device_fields(&mut device, key, &value)?;
                }
                report.devices.push(device)?;
            }
        }
    }
    Ok(report)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WatchReport {
    pub enable: Option<bool>,
    pub json: Option<bool>,
    pub nmea: Option<bool>,
    pub raw: Option<u8>,
    pub scaled: Option<bool>,
    pub split24: Option<bool>,
    pub pps: Option<bool>,
}

fn fill_watch(parser: &mut ObjectParser) -> Result<WatchReport, ClientError> {
    let mut report = WatchReport::default();
    while let Some((key, value)) = parser.next_attribute()? {
        match key {
            "enable" => report.enable = Some(value.boolean("enable")?),
            "json" => report.json = Some(value.boolean("json")?),
            "nmea" => report.nmea = Some(value.boolean("nmea")?),
            "raw" => report.raw = Some(value.integer("raw")? as u8),
            "scaled" => report.scaled = Some(value.boolean("scaled")?),
            "split24" => report.split24 = Some(value.boolean("split24")?),
            "pps" => report.pps = Some(value.boolean("pps")?),
            _ => {},
        }
    }
    Ok(report)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ErrorReport {
    pub message: FixedString<224>,
}

fn fill_error(parser: &mut ObjectParser) -> Result<ErrorReport, ClientError> {
    let mut report = ErrorReport::default();
    while let Some((key, value)) = parser.next_attribute()? {
        if key == "message" {
            report.message = FixedString::from_escaped(value.string("message")?)?;
        }
    }
    Ok(report)
}

/// Time-position-velocity mirror.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TpvReport {
    pub device: Option<FixedString<96>>,
    pub mode: Option<i32>,
    pub status: Option<i32>,
    pub time: Option<Epoch>,
    pub ept: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub epx: Option<f64>,
    pub epy: Option<f64>,
    pub alt_hae: Option<f64>,
    pub alt_msl: Option<f64>,
    pub epv: Option<f64>,
    pub track: Option<f64>,
    pub magtrack: Option<f64>,
    pub magvar: Option<f64>,
    pub speed: Option<f64>,
    pub climb: Option<f64>,
    pub epd: Option<f64>,
    pub eps: Option<f64>,
    pub epc: Option<f64>,
    pub ecefx: Option<f64>,
    pub ecefy: Option<f64>,
    pub ecefz: Option<f64>,
    pub ecef_p_acc: Option<f64>,
    pub ecefvx: Option<f64>,
    pub ecefvy: Option<f64>,
    pub ecefvz: Option<f64>,
    pub ecef_v_acc: Option<f64>,
    pub rel_n: Option<f64>,
    pub rel_e: Option<f64>,
    pub rel_d: Option<f64>,
    pub vel_n: Option<f64>,
    pub vel_e: Option<f64>,
    pub vel_d: Option<f64>,
    pub geoid_sep: Option<f64>,
    pub eph: Option<f64>,
    pub sep: Option<f64>,
    pub dgps_age: Option<f64>,
    pub dgps_sta: Option<i32>,
    pub ant: Option<i32>,
    pub jam: Option<i32>,
    pub depth: Option<f64>,
    pub wanglem: Option<f64>,
    pub wangler: Option<f64>,
    pub wanglet: Option<f64>,
    pub wspeedr: Option<f64>,
    pub wspeedt: Option<f64>,
    pub temp: Option<f64>,
    pub wtemp: Option<f64>,
    pub datum: Option<FixedString<24>>,
    pub leapseconds: Option<i32>,
    pub truncated: Option<bool>,
}

fn fill_tpv(parser: &mut ObjectParser) -> Result<TpvReport, ClientError> {
    let mut report = TpvReport::default();
    while let Some((key, value)) = parser.next_attribute()? {
        match key {
            "device" => report.device = Some(FixedString::from_escaped(value.string("device")?)?),
            "mode" => report.mode = Some(value.integer("mode")? as i32),
            "status" => report.status = Some(value.integer("status")? as i32),
            "time" => report.time = Some(value.time("time")?),
            "ept" => report.ept = Some(value.float("ept")?),
            "lat" => report.lat = Some(value.float("lat")?),
            "lon" => report.lon = Some(value.float("lon")?),
            "epx" => report.epx = Some(value.float("epx")?),
            "epy" => report.epy = Some(value.float("epy")?),
            "altHAE" => report.alt_hae = Some(value.float("altHAE")?),
            "altMSL" => report.alt_msl = Some(value.float("altMSL")?),
            "epv" => report.epv = Some(value.float("epv")?),
            "track" => report.track = Some(value.float("track")?),
            "magtrack" => report.magtrack = Some(value.float("magtrack")?),
            "magvar" => report.magvar = Some(value.float("magvar")?),
            "speed" => report.speed = Some(value.float("speed")?),
            "climb" => report.climb = Some(value.float("climb")?),
            "epd" => report.epd = Some(value.float("epd")?),
            "eps" => report.eps = Some(value.float("eps")?),
            "epc" => report.epc = Some(value.float("epc")?),
            "ecefx" => report.ecefx = Some(value.float("ecefx")?),
            "ecefy" => report.ecefy = Some(value.float("ecefy")?),
            "ecefz" => report.ecefz = Some(value.float("ecefz")?),
            "ecefpAcc" => report.ecef_p_acc = Some(value.float("ecefpAcc")?),
            "ecefvx" => report.ecefvx = Some(value.float("ecefvx")?),
            "ecefvy" => report.ecefvy = Some(value.float("ecefvy")?),
            "ecefvz" => report.ecefvz = Some(value.float("ecefvz")?),
            "ecefvAcc" => report.ecef_v_acc = Some(value.float("ecefvAcc")?),
            "relN" => report.rel_n = Some(value.float("relN")?),
            "relE" => report.rel_e = Some(value.float("relE")?),
            "relD" => report.rel_d = Some(value.float("relD")?),
            "velN" => report.vel_n = Some(value.float("velN")?),
            "velE" => report.vel_e = Some(value.float("velE")?),
            "velD" => report.vel_d = Some(value.float("velD")?),
            "geoidSep" => report.geoid_sep = Some(value.float("geoidSep")?),
            "eph" => report.eph = Some(value.float("eph")?),
            "sep" => report.sep = Some(value.float("sep")?),
            "dgpsAge" => report.dgps_age = Some(value.float("dgpsAge")?),
            "dgpsSta" => report.dgps_sta = Some(value.integer("dgpsSta")? as i32),
            "ant" => report.ant = Some(value.integer("ant")? as i32),
            "jam" => report.jam = Some(value.integer("jam")? as i32),
            "depth" => report.depth = Some(value.float("depth")?),
            "wanglem" => report.wanglem = Some(value.float("wanglem")?),
            "wangler" => report.wangler = Some(value.float("wangler")?),
            "wanglet" => report.wanglet = Some(value.float("wanglet")?),
            "wspeedr" => report.wspeedr = Some(value.float("wspeedr")?),
            "wspeedt" => report.wspeedt = Some(value.float("wspeedt")?),
            "temp" => report.temp = Some(value.float("temp")?),
            "wtemp" => report.wtemp = Some(value.float("wtemp")?),
            "datum" => report.datum = Some(FixedString::from_escaped(value.string("datum")?)?),
            "leapseconds" => report.leapseconds = Some(value.integer("leapseconds")? as i32),
            "truncated" => report.truncated = Some(value.boolean("truncated")?),
            _ => {},
        }
    }
    Ok(report)
}

impl TpvReport {
    /// Rebuild the canonical fix from the fields the line carried.
    pub fn to_fix(&self) -> GnssFix {
        let mut fix = GnssFix::default();

        fix.mode = self
            .mode
            .and_then(FixMode::from_i32)
            .unwrap_or(FixMode::NotSeen);
        fix.status = self
            .status
            .and_then(FixStatus::from_i32)
            .unwrap_or(FixStatus::Unknown);
        fix.time = self.time;

        let float = |value: Option<f64>| value.unwrap_or(f64::NAN);
        fix.latitude = float(self.lat);
        fix.longitude = float(self.lon);
        fix.alt_hae = float(self.alt_hae);
        fix.alt_msl = float(self.alt_msl);
        fix.geoid_sep = float(self.geoid_sep);
        fix.depth = float(self.depth);
        fix.speed = float(self.speed);
        fix.track = float(self.track);
        fix.climb = float(self.climb);
        fix.magnetic_track = float(self.magtrack);
        fix.magnetic_var = float(self.magvar);
        fix.ept = float(self.ept);
        fix.epx = float(self.epx);
        fix.epy = float(self.epy);
        fix.eph = float(self.eph);
        fix.epv = float(self.epv);
        fix.epd = float(self.epd);
        fix.eps = float(self.eps);
        fix.epc = float(self.epc);
        fix.sep = float(self.sep);
        fix.ecef.x = float(self.ecefx);
        fix.ecef.y = float(self.ecefy);
        fix.ecef.z = float(self.ecefz);
        fix.ecef.p_acc = float(self.ecef_p_acc);
        fix.ecef.vx = float(self.ecefvx);
        fix.ecef.vy = float(self.ecefvy);
        fix.ecef.vz = float(self.ecefvz);
        fix.ecef.v_acc = float(self.ecef_v_acc);
        fix.ned.rel_n = float(self.rel_n);
        fix.ned.rel_e = float(self.rel_e);
        fix.ned.rel_d = float(self.rel_d);
        fix.ned.vel_n = float(self.vel_n);
        fix.ned.vel_e = float(self.vel_e);
        fix.ned.vel_d = float(self.vel_d);
        fix.dgps_age = float(self.dgps_age);
        fix.dgps_station = self.dgps_sta.unwrap_or(-1);
        fix.antenna = self
            .ant
            .and_then(AntennaStatus::from_i32)
            .unwrap_or(AntennaStatus::Unknown);
        fix.jam = self.jam.unwrap_or(-1);
        fix.datum = self
            .datum
            .map(|datum| datum.as_str().to_string())
            .unwrap_or_default();
        fix.wind_angle_m = float(self.wanglem);
        fix.wind_angle_r = float(self.wangler);
        fix.wind_angle_t = float(self.wanglet);
        fix.wind_speed_r = float(self.wspeedr);
        fix.wind_speed_t = float(self.wspeedt);
        fix.temperature = float(self.temp);
        fix.water_temperature = float(self.wtemp);

        fix
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SatelliteReport {
    pub prn: i16,
    pub el: Option<f64>,
    pub az: Option<f64>,
    pub ss: Option<f64>,
    pub used: bool,
    pub gnssid: Option<u8>,
    pub svid: Option<u8>,
    pub health: Option<u8>,
}

impl Default for SatelliteReport {
    fn default() -> Self {
        Self {
            prn: -1,
            el: None,
            az: None,
            ss: None,
            used: false,
            gnssid: None,
            svid: None,
            health: None,
        }
    }
}

impl SatelliteReport {
    pub fn to_satellite(&self) -> Satellite {
        Satellite {
            prn: self.prn,
            gnss_id: self.gnssid.unwrap_or(0),
            sv_id: self.svid.unwrap_or(0),
            elevation: self.el.unwrap_or(f64::NAN),
            azimuth: self.az.unwrap_or(f64::NAN),
            snr: self.ss.unwrap_or(f64::NAN),
            used: self.used,
            health: self.health.unwrap_or(0),
        }
    }
}

fn fill_satellite(slice: &str) -> Result<SatelliteReport, ClientError> {
    let mut report = SatelliteReport::default();
    let mut parser = ObjectParser::new(slice)?;
    while let Some((key, value)) = parser.next_attribute()? {
        match key {
            "PRN" => report.prn = value.integer("PRN")? as i16,
            "el" => report.el = Some(value.float("el")?),
            "az" => report.az = Some(value.float("az")?),
            "ss" => report.ss = Some(value.float("ss")?),
            "used" => report.used = value.boolean("used")?,
            "gnssid" => report.gnssid = Some(value.integer("gnssid")? as u8),
            "svid" => report.svid = Some(value.integer("svid")? as u8),
            "health" => report.health = Some(value.integer("health")? as u8),
            _ => {},
        }
    }
    Ok(report)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SkyReport {
    pub device: Option<FixedString<96>>,
    pub time: Option<Epoch>,
    pub xdop: Option<f64>,
    pub ydop: Option<f64>,
    pub vdop: Option<f64>,
    pub tdop: Option<f64>,
    pub hdop: Option<f64>,
    pub gdop: Option<f64>,
    pub pdop: Option<f64>,
    pub n_sat: Option<u32>,
    pub u_sat: Option<u32>,
    pub satellites: FixedVec<SatelliteReport, MAX_SATELLITES>,
}

fn fill_sky(parser: &mut ObjectParser) -> Result<SkyReport, ClientError> {
    let mut report = SkyReport::default();
    while let Some((key, value)) = parser.next_attribute()? {
        match key {
            "device" => report.device = Some(FixedString::from_escaped(value.string("device")?)?),
            "time" => report.time = Some(value.time("time")?),
            "xdop" => report.xdop = Some(value.float("xdop")?),
            "ydop" => report.ydop = Some(value.float("ydop")?),
            "vdop" => report.vdop = Some(value.float("vdop")?),
            "tdop" => report.tdop = Some(value.float("tdop")?),
            "hdop" => report.hdop = Some(value.float("hdop")?),
            "gdop" => report.gdop = Some(value.float("gdop")?),
            "pdop" => report.pdop = Some(value.float("pdop")?),
            "nSat" => report.n_sat = Some(value.integer("nSat")? as u32),
            "uSat" => report.u_sat = Some(value.integer("uSat")? as u32),
            "satellites" => {
                let mut array = ArrayParser::new(value.array("satellites")?)?;
                while let Some(element) = array.next_element()? {
                    report
                        .satellites
                        .push(fill_satellite(element.object("satellites")?)?)?;
                }
            },
            _ => {},
        }
    }
    Ok(report)
}

impl SkyReport {
    pub fn to_dop(&self) -> Dop {
        Dop {
            xdop: self.xdop.unwrap_or(f64::NAN),
            ydop: self.ydop.unwrap_or(f64::NAN),
            pdop: self.pdop.unwrap_or(f64::NAN),
            hdop: self.hdop.unwrap_or(f64::NAN),
            vdop: self.vdop.unwrap_or(f64::NAN),
            tdop: self.tdop.unwrap_or(f64::NAN),
            gdop: self.gdop.unwrap_or(f64::NAN),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GstReport {
    pub device: Option<FixedString<96>>,
    pub time: Option<Epoch>,
    pub rms: Option<f64>,
    pub major: Option<f64>,
    pub minor: Option<f64>,
    pub orient: Option<f64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub alt: Option<f64>,
}

fn fill_gst(parser: &mut ObjectParser) -> Result<GstReport, ClientError> {
    let mut report = GstReport::default();
    while let Some((key, value)) = parser.next_attribute()? {
        match key {
            "device" => report.device = Some(FixedString::from_escaped(value.string("device")?)?),
            "time" => report.time = Some(value.time("time")?),
            "rms" => report.rms = Some(value.float("rms")?),
            "major" => report.major = Some(value.float("major")?),
            "minor" => report.minor = Some(value.float("minor")?),
            "orient" => report.orient = Some(value.float("orient")?),
            "lat" => report.lat = Some(value.float("lat")?),
            "lon" => report.lon = Some(value.float("lon")?),
            "alt" => report.alt = Some(value.float("alt")?),
            _ => {},
        }
    }
    Ok(report)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AttReport {
    pub device: Option<FixedString<96>>,
    pub time: Option<Epoch>,
    pub heading: Option<f64>,
    pub mag_st: Option<char>,
    pub pitch: Option<f64>,
    pub pitch_st: Option<char>,
    pub roll: Option<f64>,
    pub roll_st: Option<char>,
    pub yaw: Option<f64>,
    pub yaw_st: Option<char>,
    pub dip: Option<f64>,
    pub mag_len: Option<f64>,
    pub mag_x: Option<f64>,
    pub mag_y: Option<f64>,
    pub mag_z: Option<f64>,
    pub acc_x: Option<f64>,
    pub acc_y: Option<f64>,
    pub acc_z: Option<f64>,
    pub gyro_x: Option<f64>,
    pub gyro_y: Option<f64>,
    pub gyro_z: Option<f64>,
    pub depth: Option<f64>,
    pub temp: Option<f64>,
}

fn fill_att(parser: &mut ObjectParser) -> Result<AttReport, ClientError> {
    let mut report = AttReport::default();
    while let Some((key, value)) = parser.next_attribute()? {
        match key {
            "device" => report.device = Some(FixedString::from_escaped(value.string("device")?)?),
            "time" => report.time = Some(value.time("time")?),
            "heading" => report.heading = Some(value.float("heading")?),
            "mag_st" => report.mag_st = value.string("mag_st")?.chars().next(),
            "pitch" => report.pitch = Some(value.float("pitch")?),
            "pitch_st" => report.pitch_st = value.string("pitch_st")?.chars().next(),
            "roll" => report.roll = Some(value.float("roll")?),
            "roll_st" => report.roll_st = value.string("roll_st")?.chars().next(),
            "yaw" => report.yaw = Some(value.float("yaw")?),
            "yaw_st" => report.yaw_st = value.string("yaw_st")?.chars().next(),
            "dip" => report.dip = Some(value.float("dip")?),
            "mag_len" => report.mag_len = Some(value.float("mag_len")?),
            "mag_x" => report.mag_x = Some(value.float("mag_x")?),
            "mag_y" => report.mag_y = Some(value.float("mag_y")?),
            "mag_z" => report.mag_z = Some(value.float("mag_z")?),
            "acc_x" => report.acc_x = Some(value.float("acc_x")?),
            "acc_y" => report.acc_y = Some(value.float("acc_y")?),
            "acc_z" => report.acc_z = Some(value.float("acc_z")?),
            "gyro_x" => report.gyro_x = Some(value.float("gyro_x")?),
            "gyro_y" => report.gyro_y = Some(value.float("gyro_y")?),
            "gyro_z" => report.gyro_z = Some(value.float("gyro_z")?),
            "depth" => report.depth = Some(value.float("depth")?),
            "temp" => report.temp = Some(value.float("temp")?),
            _ => {},
        }
    }
    Ok(report)
}

/// Orbit mirror inside SUBFRAME records.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrbitReport {
    pub sv: Option<u8>,
    pub ephemeris: Option<bool>,
    pub week: Option<i32>,
    pub toa: Option<i64>,
    pub toc: Option<i64>,
    pub toe: Option<i64>,
    pub af0: Option<f64>,
    pub af1: Option<f64>,
    pub af2: Option<f64>,
    pub e: Option<f64>,
    pub i0: Option<f64>,
    pub idot: Option<f64>,
    pub m0: Option<f64>,
    pub deltan: Option<f64>,
    pub omega: Option<f64>,
    pub omega0: Option<f64>,
    pub omega_dot: Option<f64>,
    pub sqrt_a: Option<f64>,
    pub cic: Option<f64>,
    pub cis: Option<f64>,
    pub crc: Option<f64>,
    pub crs: Option<f64>,
    pub cuc: Option<f64>,
    pub cus: Option<f64>,
    pub tgd: Option<f64>,
    pub tgd2: Option<f64>,
    pub aodc: Option<i32>,
    pub aode: Option<i32>,
    pub ioda: Option<i32>,
    pub iodc: Option<i32>,
    pub iode: Option<i32>,
    pub health: Option<i32>,
    pub ura: Option<i32>,
}

fn fill_orbit(slice: &str) -> Result<OrbitReport, ClientError> {
    let mut report = OrbitReport::default();
    let mut parser = ObjectParser::new(slice)?;
    while let Some((key, value)) = parser.next_attribute()? {
        match key {
            "sv" => report.sv = Some(value.integer("sv")? as u8),
            "kind" => {
                report.ephemeris = match value.string("kind")? {
                    "ephemeris" => Some(true),
                    "almanac" => Some(false),
                    _ => None,
                }
            },
            "WN" => report.week = Some(value.integer("WN")? as i32),
            "toa" => report.toa = Some(value.integer("toa")?),
            "toc" => report.toc = Some(value.integer("toc")?),
            "toe" => report.toe = Some(value.integer("toe")?),
            "af0" => report.af0 = Some(value.float("af0")?),
            "af1" => report.af1 = Some(value.float("af1")?),
            "af2" => report.af2 = Some(value.float("af2")?),
            "e" => report.e = Some(value.float("e")?),
            "i0" => report.i0 = Some(value.float("i0")?),
            "IDOT" => report.idot = Some(value.float("IDOT")?),
            "M0" => report.m0 = Some(value.float("M0")?),
            "deltan" => report.deltan = Some(value.float("deltan")?),
            "omega" => report.omega = Some(value.float("omega")?),
            "Omega0" => report.omega0 = Some(value.float("Omega0")?),
            "Omegad" => report.omega_dot = Some(value.float("Omegad")?),
            "sqrtA" => report.sqrt_a = Some(value.float("sqrtA")?),
            "Cic" => report.cic = Some(value.float("Cic")?),
            "Cis" => report.cis = Some(value.float("Cis")?),
            "Crc" => report.crc = Some(value.float("Crc")?),
            "Crs" => report.crs = Some(value.float("Crs")?),
            "Cuc" => report.cuc = Some(value.float("Cuc")?),
            "Cus" => report.cus = Some(value.float("Cus")?),
            "Tgd" => report.tgd = Some(value.float("Tgd")?),
            "Tgd2" => report.tgd2 = Some(value.float("Tgd2")?),
            "AODC" => report.aodc = Some(value.integer("AODC")? as i32),
            "AODE" => report.aode = Some(value.integer("AODE")? as i32),
            "IODA" => report.ioda = Some(value.integer("IODA")? as i32),
            "IODC" => report.iodc = Some(value.integer("IODC")? as i32),
            "IODE" => report.iode = Some(value.integer("IODE")? as i32),
            "health" => report.health = Some(value.integer("health")? as i32),
            "ura" => report.ura = Some(value.integer("ura")? as i32),
            _ => {},
        }
    }
    Ok(report)
}

impl OrbitReport {
    /// Rebuild an [Orbit]; the SV constellation comes from the
    /// enclosing SUBFRAME's gnssId.
    pub fn to_orbit(&self, constellation: gnss::prelude::Constellation) -> Orbit {
        let mut orbit = Orbit::new(
            gnss::prelude::SV::new(constellation, self.sv.unwrap_or(0)),
            match self.ephemeris {
                Some(true) => OrbitKind::Ephemeris,
                Some(false) => OrbitKind::Almanac,
                None => OrbitKind::None,
            },
        );

        let float = |value: Option<f64>| value.unwrap_or(f64::NAN);
        orbit.week = self.week.unwrap_or(-1);
        orbit.toa_s = self.toa.unwrap_or(-1);
        orbit.toc_s = self.toc.unwrap_or(-1);
        orbit.toe_s = self.toe.unwrap_or(-1);
        orbit.af0 = float(self.af0);
        orbit.af1 = float(self.af1);
        orbit.af2 = float(self.af2);
        orbit.eccentricity = float(self.e);
        orbit.i0 = float(self.i0);
        orbit.idot = float(self.idot);
        orbit.m0 = float(self.m0);
        orbit.delta_n = float(self.deltan);
        orbit.omega = float(self.omega);
        orbit.omega0 = float(self.omega0);
        orbit.omega_dot = float(self.omega_dot);
        orbit.sqrt_a = float(self.sqrt_a);
        orbit.cic = float(self.cic);
        orbit.cis = float(self.cis);
        orbit.crc = float(self.crc);
        orbit.crs = float(self.crs);
        orbit.cuc = float(self.cuc);
        orbit.cus = float(self.cus);
        orbit.tgd = float(self.tgd);
        orbit.tgd2 = float(self.tgd2);
        orbit.aodc = self.aodc.unwrap_or(-1);
        orbit.aode = self.aode.unwrap_or(-1);
        orbit.ioda = self.ioda.unwrap_or(-1);
        orbit.iodc = self.iodc.unwrap_or(-1);
        orbit.iode = self.iode.unwrap_or(-1);
        orbit.health = self.health.unwrap_or(-1);
        orbit.accuracy = self.ura.unwrap_or(-1);
        orbit
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IonoReport {
    pub a0: Option<f64>,
    pub a1: Option<f64>,
    pub a2: Option<f64>,
    pub a3: Option<f64>,
    pub b0: Option<f64>,
    pub b1: Option<f64>,
    pub b2: Option<f64>,
    pub b3: Option<f64>,
    pub utc_a0: Option<f64>,
    pub utc_a1: Option<f64>,
    pub tot: Option<u32>,
    pub wnt: Option<u16>,
    pub ls: Option<i8>,
    pub wn_lsf: Option<u16>,
    pub dn: Option<u8>,
    pub lsf: Option<i8>,
}

fn fill_iono(slice: &str) -> Result<IonoReport, ClientError> {
    let mut report = IonoReport::default();
    let mut parser = ObjectParser::new(slice)?;
    while let Some((key, value)) = parser.next_attribute()? {
        match key {
            "a0" => report.a0 = Some(value.float("a0")?),
            "a1" => report.a1 = Some(value.float("a1")?),
            "a2" => report.a2 = Some(value.float("a2")?),
            "a3" => report.a3 = Some(value.float("a3")?),
            "b0" => report.b0 = Some(value.float("b0")?),
            "b1" => report.b1 = Some(value.float("b1")?),
            "b2" => report.b2 = Some(value.float("b2")?),
            "b3" => report.b3 = Some(value.float("b3")?),
            "A0" => report.utc_a0 = Some(value.float("A0")?),
            "A1" => report.utc_a1 = Some(value.float("A1")?),
            "tot" => report.tot = Some(value.integer("tot")? as u32),
            "WNt" => report.wnt = Some(value.integer("WNt")? as u16),
            "ls" => report.ls = Some(value.integer("ls")? as i8),
            "WNlsf" => report.wn_lsf = Some(value.integer("WNlsf")? as u16),
            "DN" => report.dn = Some(value.integer("DN")? as u8),
            "lsf" => report.lsf = Some(value.integer("lsf")? as i8),
            _ => {},
        }
    }
    Ok(report)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HealthReport {
    pub first: u8,
    pub sv: FixedVec<u16, MAX_HEALTH_ENTRIES>,
}

fn fill_health(slice: &str) -> Result<HealthReport, ClientError> {
    let mut report = HealthReport::default();
    let mut parser = ObjectParser::new(slice)?;
    while let Some((key, value)) = parser.next_attribute()? {
        match key {
            "first" => report.first = value.integer("first")? as u8,
            "sv" => {
                let mut array = ArrayParser::new(value.array("sv")?)?;
                while let Some(element) = array.next_element()? {
                    report.sv.push(element.integer("sv")? as u16)?;
                }
            },
            _ => {},
        }
    }
    Ok(report)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubframeReport {
    pub device: Option<FixedString<96>>,
    pub gnss_id: u8,
    pub tsv: u8,
    pub frame: u8,
    pub superframe: Option<u8>,
    pub pageid: Option<u8>,
    pub tow: Option<u32>,
    pub week: Option<i32>,
    pub orbit: Option<OrbitReport>,
    pub orbit2: Option<OrbitReport>,
    pub iono: Option<IonoReport>,
    pub health: Option<HealthReport>,
    pub system_message: Option<FixedString<32>>,
}

fn fill_subframe(parser: &mut ObjectParser) -> Result<SubframeReport, ClientError> {
    let mut report = SubframeReport::default();
    while let Some((key, value)) = parser.next_attribute()? {
        match key {
            "device" => report.device = Some(FixedString::from_escaped(value.string("device")?)?),
            "gnssId" => report.gnss_id = value.integer("gnssId")? as u8,
            "tSV" => report.tsv = value.integer("tSV")? as u8,
            "frame" => report.frame = value.integer("frame")? as u8,
            "superframe" => report.superframe = Some(value.integer("superframe")? as u8),
            "pageid" => report.pageid = Some(value.integer("pageid")? as u8),
            "TOW" => report.tow = Some(value.integer("TOW")? as u32),
            "WN" => report.week = Some(value.integer("WN")? as i32),
            "orbit" => report.orbit = Some(fill_orbit(value.object("orbit")?)?),
            "orbit2" => report.orbit2 = Some(fill_orbit(value.object("orbit2")?)?),
            "iono" => report.iono = Some(fill_iono(value.object("iono")?)?),
            "health" => report.health = Some(fill_health(value.object("health")?)?),
            "system_message" => {
                report.system_message =
                    Some(FixedString::from_escaped(value.string("system_message")?)?)
            },
            _ => {},
        }
    }
    Ok(report)
}

impl SubframeReport {
    /// The constellation announced by `gnssId`.
    pub fn constellation(&self) -> gnss::prelude::Constellation {
        use gnss::prelude::Constellation;
        match self.gnss_id {
            0 => Constellation::GPS,
            2 => Constellation::Galileo,
            3 => Constellation::BeiDou,
            5 => Constellation::QZSS,
            6 => Constellation::Glonass,
            _ => Constellation::GPS,
        }
    }
}

/// Fields of one TPV line folded back into a delta, for mirrors that
/// track a remote daemon the same way a local driver would.
pub fn tpv_delta(report: &TpvReport) -> (GnssFix, TransferMask) {
    let fix = report.to_fix();
    let mut mask = TransferMask::empty();

    if fix.time.is_some() {
        mask |= TransferMask::TIME;
    }
    if fix.latitude.is_finite() && fix.longitude.is_finite() {
        mask |= TransferMask::LATLON;
    }
    if fix.alt_hae.is_finite() || fix.alt_msl.is_finite() {
        mask |= TransferMask::ALTITUDE;
    }
    if report.mode.is_some() {
        mask |= TransferMask::MODE;
    }
    if report.status.is_some() {
        mask |= TransferMask::STATUS;
    }
    if fix.speed.is_finite() {
        mask |= TransferMask::SPEED;
    }
    if fix.track.is_finite() {
        mask |= TransferMask::TRACK;
    }
    if fix.climb.is_finite() {
        mask |= TransferMask::CLIMB;
    }
    if fix.ecef.x.is_finite() {
        mask |= TransferMask::ECEF;
    }
    if fix.ecef.vx.is_finite() {
        mask |= TransferMask::VECEF;
    }

    (fix, mask)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn dispatches_on_class() {
        let report = parse_line(
            "{\"class\":\"VERSION\",\"release\":\"0.1.0\",\"rev\":\"0.1.0\",\
             \"proto_major\":3,\"proto_minor\":15}\r\n",
        )
        .unwrap();
        assert!(matches!(report, Report::Version(_)));

        let report =
            parse_line("{\"class\":\"ERROR\",\"message\":\"unrecognized request\"}\r\n").unwrap();
        match report {
            Report::Error(error) => assert_eq!(error.message.as_str(), "unrecognized request"),
            other => panic!("wrong dispatch: {:?}", other),
        }

        assert!(matches!(
            parse_line("{\"class\":\"BOGUS\"}"),
            Err(ClientError::UnknownClass(_))
        ));
    }

    #[test]
    fn unknown_attributes_ignored() {
        let report = parse_line(
            "{\"class\":\"TPV\",\"mode\":3,\"lat\":1.0,\"lon\":2.0,\
             \"futurefield\":42,\"futureobj\":{\"x\":[1,2]}}",
        )
        .unwrap();
        match report {
            Report::Tpv(tpv) => {
                assert_eq!(tpv.mode, Some(3));
                assert_eq!(tpv.lat, Some(1.0));
                assert_eq!(tpv.lon, Some(2.0));
            },
            other => panic!("wrong dispatch: {:?}", other),
        }
    }

    #[test]
    fn missing_attributes_take_defaults() {
        let report = parse_line("{\"class\":\"TPV\",\"mode\":0}").unwrap();
        match report {
            Report::Tpv(tpv) => {
                let fix = tpv.to_fix();
                assert_eq!(fix.mode, FixMode::NotSeen);
                assert!(fix.latitude.is_nan());
                assert_eq!(fix.dgps_station, -1);
                assert_eq!(fix.jam, -1);
                assert!(fix.datum.is_empty());
            },
            other => panic!("wrong dispatch: {:?}", other),
        }
    }

    #[test]
    fn quoted_values_only_into_string_like_fields() {
        // a numeric literal where a string is declared is malformed
        assert!(matches!(
            parse_line("{\"class\":\"ERROR\",\"message\":7}"),
            Err(ClientError::TypeMismatch("message"))
        ));
        // a quoted value where a number is declared is malformed
        assert!(matches!(
            parse_line("{\"class\":\"TPV\",\"lat\":\"37.1\"}"),
            Err(ClientError::TypeMismatch("lat"))
        ));
        // integers do not accept fractions
        assert!(matches!(
            parse_line("{\"class\":\"TPV\",\"mode\":3.5}"),
            Err(ClientError::TypeMismatch("mode"))
        ));
    }

    #[test]
    fn enumeration_codes_translate() {
        let report = parse_line("{\"class\":\"TPV\",\"mode\":3,\"status\":2,\"ant\":3}").unwrap();
        match report {
            Report::Tpv(tpv) => {
                let fix = tpv.to_fix();
                assert_eq!(fix.mode, FixMode::Fix3d);
                assert_eq!(fix.status, FixStatus::Dgps);
                assert_eq!(fix.antenna, AntennaStatus::Short);
            },
            other => panic!("wrong dispatch: {:?}", other),
        }
    }

    #[test]
    fn string_escapes_decode_into_fixed_store() {
        // inverse of the emitter's escaping discipline
        let report =
            parse_line("{\"class\":\"ERROR\",\"message\":\"ab\\u0001c\\\"d\\\\e\"}").unwrap();
        match report {
            Report::Error(error) => assert_eq!(error.message.as_str(), "ab\u{1}c\"d\\e"),
            other => panic!("wrong dispatch: {:?}", other),
        }

        // multi-byte UTF-8 passes through the fixed store intact
        let report = parse_line("{\"class\":\"ERROR\",\"message\":\"h\u{e9}llo \\u00e9\"}").unwrap();
        match report {
            Report::Error(error) => assert_eq!(error.message.as_str(), "héllo é"),
            other => panic!("wrong dispatch: {:?}", other),
        }
    }

    #[test]
    fn fixed_stores_bound_their_input() {
        // an oversized string overflows instead of spilling to the heap
        let long = "x".repeat(400);
        let line = format!("{{\"class\":\"ERROR\",\"message\":\"{}\"}}", long);
        assert!(matches!(parse_line(&line), Err(ClientError::Overflow)));

        // a sky view past the satellite cap is rejected whole
        let mut line = String::from("{\"class\":\"SKY\",\"satellites\":[");
        for prn in 0..(MAX_SATELLITES + 1) {
            if prn > 0 {
                line.push(',');
            }
            line.push_str(&format!("{{\"PRN\":{},\"used\":false}}", prn + 1));
        }
        line.push_str("]}");
        assert!(matches!(parse_line(&line), Err(ClientError::Overflow)));
    }

    #[test]
    fn class_must_lead_the_record() {
        assert!(parse_line("{\"mode\":3,\"class\":\"TPV\"}").is_err());
        assert!(parse_line("not json at all").is_err());
        assert!(parse_line("{\"class\":\"TPV\"").is_err());
    }
}
