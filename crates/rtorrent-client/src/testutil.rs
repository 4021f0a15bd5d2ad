//! Shared test utilities and fixtures.

use std::collections::BTreeMap;

use crate::codec::{Value, write_value};

pub(crate) const HASH: &str = "B185765BE59BC56AB29A4860A5820863BF0512AD";
pub(crate) const NAME: &str = "ubuntu-20.04.2-live-server-arm64.iso";
pub(crate) const SIZE: i64 = 1_193_754_624;

/// `value` as a `<value>` element.
fn value_xml(value: &Value) -> String {
    let mut out = Vec::new();
    write_value(&mut out, value).unwrap();
    String::from_utf8(out).unwrap()
}

/// A `<methodResponse>` carrying `values` as its parameters.
pub(crate) fn response(values: &[Value]) -> String {
    let mut body = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    body.push_str("<methodResponse><params>");
    for value in values {
        body.push_str("<param>");
        body.push_str(&value_xml(value));
        body.push_str("</param>");
    }
    body.push_str("</params></methodResponse>");
    body
}

/// A top-level fault `<methodResponse>`.
pub(crate) fn fault_response(code: i64, message: &str) -> String {
    format!(
        "<methodResponse><fault>{}</fault></methodResponse>",
        value_xml(&fault(code, message))
    )
}

/// A `{faultCode, faultString}` struct, as found inside multicall results.
pub(crate) fn fault(code: i64, message: &str) -> Value {
    Value::Struct(BTreeMap::from([
        ("faultCode".to_string(), Value::Int(code)),
        ("faultString".to_string(), Value::from(message)),
    ]))
}

/// A `system.multicall` response: one single-element array per successful call,
/// a fault struct otherwise.
pub(crate) fn multicall_response(results: Vec<Result<Value, (i64, &str)>>) -> String {
    let entries = results
        .into_iter()
        .map(|result| match result {
            Ok(value) => Value::Array(vec![value]),
            Err((code, message)) => fault(code, message),
        })
        .collect();
    response(&[Value::Array(entries)])
}

/// One `d.multicall2` row in torrent field order.
pub(crate) fn torrent_row(hash: &str, name: &str, label: &str, path: &str) -> Value {
    Value::Array(torrent_fields(hash, name, label, path))
}

/// The torrent field values in field order, for per-field system.multicall responses.
pub(crate) fn torrent_fields(hash: &str, name: &str, label: &str, path: &str) -> Vec<Value> {
    vec![
        Value::from(hash),
        Value::from(name),
        Value::Int(SIZE),
        Value::from(label),
        Value::from(path),
        Value::Int(0),
        Value::Int(1500),
        Value::Int(1_613_743_735),
        Value::Int(0),
        Value::Int(0),
    ]
}

/// Request body as text, for assertions.
pub(crate) fn body_text(body: &[u8]) -> &str {
    std::str::from_utf8(body).unwrap()
}
