//! XML-RPC request encoding and response decoding.
//!
//! The codec knows nothing about torrents: it marshals [`Value`]s into `<methodCall>`
//! documents and turns `<methodResponse>` documents back into values or a [`Fault`].
//!
//! String payloads are carried as bytes. rTorrent hands torrent names and paths through
//! unchanged, so they are not guaranteed to be UTF-8.

use std::{borrow::Cow, collections::BTreeMap, fmt, str::Utf8Error};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::NaiveDateTime;
use quick_xml::{Reader, escape::unescape, events::Event};
use rtorrent_types::{Fault, RTorrentError};

/// The procedure that executes a batch of calls in one round trip.
pub const MULTICALL: &str = "system.multicall";

const DATETIME_FORMAT: &str = "%Y%m%dT%H:%M:%S";
const DATETIME_FORMAT_DASHED: &str = "%Y-%m-%dT%H:%M:%S";

/// The bytes of a `<string>` payload, entity references resolved.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct RawString(Vec<u8>);

impl RawString {
    /// Wrap `bytes` as they are.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The exact bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume into the exact bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// The payload as text, if it is valid UTF-8.
    pub fn to_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(&self.0)
    }

    /// The payload as text, invalid sequences replaced with U+FFFD.
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    /// Consume into text, invalid sequences replaced with U+FFFD.
    pub fn into_string_lossy(self) -> String {
        match String::from_utf8(self.0) {
            Ok(text) => text,
            Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
        }
    }
}

impl fmt::Debug for RawString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_str() {
            Ok(text) => write!(f, "{text:?}"),
            Err(_) => write!(f, "b\"{}\"", self.0.escape_ascii()),
        }
    }
}

impl From<&str> for RawString {
    fn from(text: &str) -> Self {
        Self(text.as_bytes().to_vec())
    }
}

impl From<String> for RawString {
    fn from(text: String) -> Self {
        Self(text.into_bytes())
    }
}

impl From<&[u8]> for RawString {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<Vec<u8>> for RawString {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl PartialEq<str> for RawString {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for RawString {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

/// A value on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `<i4>`, `<i8>` or `<int>`.
    Int(i64),
    /// `<boolean>`.
    Bool(bool),
    /// `<double>`.
    Double(f64),
    /// `<string>`, or untyped text inside `<value>`.
    String(RawString),
    /// `<base64>`, an opaque byte payload.
    Base64(Vec<u8>),
    /// `<dateTime.iso8601>`.
    DateTime(NaiveDateTime),
    /// `<array>`.
    Array(Vec<Value>),
    /// `<struct>`.
    Struct(BTreeMap<String, Value>),
}

impl Value {
    /// Name of the wire type, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Bool(_) => "boolean",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Base64(_) => "base64",
            Self::DateTime(_) => "dateTime",
            Self::Array(_) => "array",
            Self::Struct(_) => "struct",
        }
    }

    /// The integer, if this is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// The string, if this is one and it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => value.to_str().ok(),
            _ => None,
        }
    }

    /// The string payload, whatever its encoding.
    pub fn as_raw_str(&self) -> Option<&RawString> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// A boolean, or an integer flag that is exactly 0 or 1.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            Self::Int(0) => Some(false),
            Self::Int(1) => Some(true),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value.into())
    }
}

impl From<RawString> for Value {
    fn from(value: RawString) -> Self {
        Self::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Self::Array(values)
    }
}

/// A procedure invocation. Within a batch its identity is its position.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    method: String,
    params: Vec<Value>,
}

impl Call {
    /// Create a call of `method` with positional `params`.
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// The procedure name.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The positional parameters.
    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

/// A decoded `<methodResponse>`.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The response parameters.
    Success(Vec<Value>),
    /// The daemon rejected the call.
    Fault(Fault),
}

impl Response {
    /// The parameters, with a fault turned into [`RTorrentError::Fault`].
    pub fn into_result(self) -> Result<Vec<Value>, RTorrentError> {
        match self {
            Self::Success(values) => Ok(values),
            Self::Fault(fault) => Err(fault.into()),
        }
    }
}

/// Encode a single `<methodCall>`.
///
/// Fails with [`RTorrentError::Encode`] when a parameter has no XML representation.
pub fn encode_call(call: &Call) -> Result<Vec<u8>, RTorrentError> {
    let mut body = br#"<?xml version="1.0"?>"#.to_vec();
    body.extend_from_slice(b"<methodCall><methodName>");
    escape_into(&mut body, call.method.as_bytes())?;
    body.extend_from_slice(b"</methodName><params>");
    for param in &call.params {
        body.extend_from_slice(b"<param>");
        write_value(&mut body, param)?;
        body.extend_from_slice(b"</param>");
    }
    body.extend_from_slice(b"</params></methodCall>");
    Ok(body)
}

/// Encode a `system.multicall` whose single array parameter holds one
/// `{methodName, params}` struct per call, in order.
pub fn encode_multicall(calls: &[Call]) -> Result<Vec<u8>, RTorrentError> {
    let mut body = br#"<?xml version="1.0"?>"#.to_vec();
    body.extend_from_slice(b"<methodCall><methodName>");
    body.extend_from_slice(MULTICALL.as_bytes());
    body.extend_from_slice(b"</methodName><params><param><value><array><data>");
    for call in calls {
        body.extend_from_slice(b"<value><struct><member><name>methodName</name><value><string>");
        escape_into(&mut body, call.method.as_bytes())?;
        body.extend_from_slice(b"</string></value></member>");
        body.extend_from_slice(b"<member><name>params</name><value><array><data>");
        for param in &call.params {
            write_value(&mut body, param)?;
        }
        body.extend_from_slice(b"</data></array></value></member></struct></value>");
    }
    body.extend_from_slice(b"</data></array></value></param></params></methodCall>");
    Ok(body)
}

/// Write `value` as a `<value>` element.
pub(crate) fn write_value(out: &mut Vec<u8>, value: &Value) -> Result<(), RTorrentError> {
    out.extend_from_slice(b"<value>");
    match value {
        Value::Int(int) => {
            let tag = if i32::try_from(*int).is_ok() { "i4" } else { "i8" };
            out.extend_from_slice(format!("<{tag}>{int}</{tag}>").as_bytes());
        }
        Value::Bool(flag) => {
            out.extend_from_slice(if *flag {
                b"<boolean>1</boolean>"
            } else {
                b"<boolean>0</boolean>"
            });
        }
        Value::Double(double) if !double.is_finite() => {
            return Err(RTorrentError::Encode(format!(
                "{double} has no XML-RPC representation"
            )));
        }
        Value::Double(double) => {
            out.extend_from_slice(format!("<double>{double}</double>").as_bytes());
        }
        Value::String(text) => {
            out.extend_from_slice(b"<string>");
            escape_into(out, text.as_bytes())?;
            out.extend_from_slice(b"</string>");
        }
        Value::Base64(bytes) => {
            out.extend_from_slice(b"<base64>");
            out.extend_from_slice(STANDARD.encode(bytes).as_bytes());
            out.extend_from_slice(b"</base64>");
        }
        Value::DateTime(at) => {
            out.extend_from_slice(
                format!(
                    "<dateTime.iso8601>{}</dateTime.iso8601>",
                    at.format(DATETIME_FORMAT)
                )
                .as_bytes(),
            );
        }
        Value::Array(items) => {
            out.extend_from_slice(b"<array><data>");
            for item in items {
                write_value(out, item)?;
            }
            out.extend_from_slice(b"</data></array>");
        }
        Value::Struct(members) => {
            out.extend_from_slice(b"<struct>");
            for (name, member) in members {
                out.extend_from_slice(b"<member><name>");
                escape_into(out, name.as_bytes())?;
                out.extend_from_slice(b"</name>");
                write_value(out, member)?;
                out.extend_from_slice(b"</member>");
            }
            out.extend_from_slice(b"</struct>");
        }
    }
    out.extend_from_slice(b"</value>");
    Ok(())
}

/// Escape markup characters. XML 1.0 has no way to carry C0 controls other than tab,
/// newline and carriage return, so those are rejected.
fn escape_into(out: &mut Vec<u8>, text: &[u8]) -> Result<(), RTorrentError> {
    for &byte in text {
        match byte {
            b'&' => out.extend_from_slice(b"&amp;"),
            b'<' => out.extend_from_slice(b"&lt;"),
            b'>' => out.extend_from_slice(b"&gt;"),
            b'"' => out.extend_from_slice(b"&quot;"),
            b'\'' => out.extend_from_slice(b"&apos;"),
            b'\t' | b'\n' | b'\r' => out.push(byte),
            0x00..=0x1f => {
                return Err(RTorrentError::Encode(format!(
                    "control character {byte:#04x} cannot be sent in XML"
                )));
            }
            byte => out.push(byte),
        }
    }
    Ok(())
}

/// Decode a `<methodResponse>` document.
///
/// Structural problems are [`RTorrentError::Decode`]; a well-formed fault is
/// [`Response::Fault`].
pub fn decode_response(body: &[u8]) -> Result<Response, RTorrentError> {
    let root = parse_document(body)?;
    if root.name != "methodResponse" {
        return Err(decode_error(format!(
            "expected <methodResponse>, found <{}>",
            root.name
        )));
    }

    let content = root.only_child()?;
    match content.name.as_str() {
        "params" => content
            .children
            .iter()
            .map(|param| {
                param.expect("param")?;
                parse_value(param.only_child()?)
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Response::Success),
        "fault" => match parse_value(content.only_child()?)? {
            Value::Struct(members) => fault_from_members(&members).map(Response::Fault),
            other => Err(decode_error(format!(
                "fault must be a struct, found {}",
                other.kind()
            ))),
        },
        other => Err(decode_error(format!(
            "expected <params> or <fault>, found <{other}>"
        ))),
    }
}

/// Read a `{faultCode, faultString}` struct.
pub(crate) fn fault_from_members(
    members: &BTreeMap<String, Value>,
) -> Result<Fault, RTorrentError> {
    let code = members
        .get("faultCode")
        .and_then(Value::as_i64)
        .ok_or_else(|| decode_error("fault without an integer faultCode"))?;
    let message = members
        .get("faultString")
        .and_then(Value::as_raw_str)
        .ok_or_else(|| decode_error("fault without a string faultString"))?;
    Ok(Fault::new(code, message.to_string_lossy()))
}

fn decode_error(message: impl Into<String>) -> RTorrentError {
    RTorrentError::Decode(message.into())
}

fn malformed(err: impl fmt::Display) -> RTorrentError {
    RTorrentError::Decode(format!("malformed XML: {err}"))
}

/// A parsed element: its name, its concatenated unescaped text and its child elements.
#[derive(Debug, Default)]
struct Element {
    name: String,
    text: Vec<u8>,
    children: Vec<Element>,
}

impl Element {
    fn named(name: &[u8]) -> Result<Self, RTorrentError> {
        let name = std::str::from_utf8(name).map_err(malformed)?;
        Ok(Self {
            name: name.to_string(),
            ..Default::default()
        })
    }

    fn expect(&self, name: &str) -> Result<(), RTorrentError> {
        if self.name == name {
            Ok(())
        } else {
            Err(decode_error(format!(
                "expected <{name}>, found <{}>",
                self.name
            )))
        }
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    fn only_child(&self) -> Result<&Element, RTorrentError> {
        match self.children.as_slice() {
            [child] => Ok(child),
            children => Err(decode_error(format!(
                "<{}> must hold exactly one element, found {}",
                self.name,
                children.len()
            ))),
        }
    }

    /// The text of a scalar that must be ASCII on the wire, such as a number.
    fn scalar_text(&self) -> Result<&str, RTorrentError> {
        std::str::from_utf8(&self.text)
            .map_err(|e| decode_error(format!("invalid <{}> text: {e}", self.name)))
    }
}

fn parse_document(body: &[u8]) -> Result<Element, RTorrentError> {
    let mut reader = Reader::from_reader(body);
    let mut open: Vec<Element> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(start) => open.push(Element::named(start.name().as_ref())?),
            Event::Empty(start) => {
                let element = Element::named(start.name().as_ref())?;
                attach(&mut open, &mut root, element)?;
            }
            Event::End(_) => {
                let element = open
                    .pop()
                    .ok_or_else(|| decode_error("unbalanced closing tag"))?;
                attach(&mut open, &mut root, element)?;
            }
            Event::Text(text) => match open.last_mut() {
                Some(element) => unescape_into(&mut element.text, &text)?,
                None if text.iter().all(u8::is_ascii_whitespace) => {}
                None => return Err(decode_error("text outside of the document element")),
            },
            Event::CData(data) => match open.last_mut() {
                Some(element) => element.text.extend_from_slice(&data),
                None => return Err(decode_error("CDATA outside of the document element")),
            },
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if !open.is_empty() {
        return Err(decode_error("unexpected end of document"));
    }
    root.ok_or_else(|| decode_error("empty document"))
}

/// Append `raw` with entity and character references resolved. Every other byte is
/// copied as is, so text in any encoding survives.
fn unescape_into(out: &mut Vec<u8>, raw: &[u8]) -> Result<(), RTorrentError> {
    let mut rest = raw;
    while let Some(start) = rest.iter().position(|&b| b == b'&') {
        out.extend_from_slice(&rest[..start]);
        let end = rest[start..]
            .iter()
            .position(|&b| b == b';')
            .map(|len| start + len)
            .ok_or_else(|| malformed("unterminated entity reference"))?;
        let reference = std::str::from_utf8(&rest[start..=end]).map_err(malformed)?;
        out.extend_from_slice(unescape(reference).map_err(malformed)?.as_bytes());
        rest = &rest[end + 1..];
    }
    out.extend_from_slice(rest);
    Ok(())
}

fn attach(
    open: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), RTorrentError> {
    match open.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(decode_error("more than one document element")),
    }
    Ok(())
}

fn parse_value(element: &Element) -> Result<Value, RTorrentError> {
    element.expect("value")?;
    let typed = match element.children.as_slice() {
        [] => return Ok(Value::String(RawString::new(element.text.clone()))),
        [typed] => typed,
        children => {
            return Err(decode_error(format!(
                "<value> must hold at most one element, found {}",
                children.len()
            )));
        }
    };

    match typed.name.as_str() {
        "i4" | "i8" | "int" => {
            let text = typed.scalar_text()?;
            text.trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| decode_error(format!("invalid integer {text:?}: {e}")))
        }
        "boolean" => match typed.scalar_text()?.trim() {
            "0" => Ok(Value::Bool(false)),
            "1" => Ok(Value::Bool(true)),
            other => Err(decode_error(format!("invalid boolean {other:?}"))),
        },
        "double" => {
            let text = typed.scalar_text()?;
            text.trim()
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|e| decode_error(format!("invalid double {text:?}: {e}")))
        }
        "string" => Ok(Value::String(RawString::new(typed.text.clone()))),
        "base64" => {
            let compact: Vec<u8> = typed
                .text
                .iter()
                .copied()
                .filter(|b| !b.is_ascii_whitespace())
                .collect();
            STANDARD
                .decode(compact)
                .map(Value::Base64)
                .map_err(|e| decode_error(format!("invalid base64: {e}")))
        }
        "dateTime.iso8601" => {
            let text = typed.scalar_text()?.trim();
            NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
                .or_else(|_| NaiveDateTime::parse_from_str(text, DATETIME_FORMAT_DASHED))
                .map(Value::DateTime)
                .map_err(|e| decode_error(format!("invalid dateTime {text:?}: {e}")))
        }
        "array" => {
            let data = typed.only_child()?;
            data.expect("data")?;
            data.children
                .iter()
                .map(parse_value)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        "struct" => {
            let mut members = BTreeMap::new();
            for member in &typed.children {
                member.expect("member")?;
                let name = member
                    .child("name")
                    .ok_or_else(|| decode_error("struct member without <name>"))?;
                let value = member
                    .child("value")
                    .ok_or_else(|| decode_error("struct member without <value>"))?;
                members.insert(name.scalar_text()?.to_string(), parse_value(value)?);
            }
            Ok(Value::Struct(members))
        }
        other => Err(decode_error(format!("unsupported value type <{other}>"))),
    }
}
