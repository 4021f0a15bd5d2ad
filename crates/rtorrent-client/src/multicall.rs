//! Batched execution of independent procedure calls.
//!
//! Several calls are submitted as one `system.multicall` round trip and the batched
//! response is split back into one outcome per call, in submission order.

use rtorrent_types::{Fault, RTorrentError};
use tracing::trace;

use crate::codec::{self, Call, Response, Value};
use crate::transport::Transport;

/// The outcome of one call within a batch.
pub type CallResult = Result<Value, Fault>;

/// Execute `calls` in a single round trip.
///
/// The result has exactly one entry per call, `results[i]` being the outcome of
/// `calls[i]`. A per-call fault is returned in place and does not affect the other calls.
/// Transport and decode failures, a fault on the batch itself, and a result count that
/// differs from the number of calls fail the whole batch.
pub fn execute<T: Transport + ?Sized>(
    transport: &T,
    calls: &[Call],
) -> Result<Vec<CallResult>, RTorrentError> {
    match calls {
        [] => Ok(Vec::new()),
        [call] => {
            trace!("calling {}", call.method());
            let body = transport.send(codec::encode_call(call)?)?;
            match codec::decode_response(&body)? {
                Response::Success(values) => Ok(vec![Ok(single(call.method(), values)?)]),
                Response::Fault(fault) => Ok(vec![Err(fault)]),
            }
        }
        calls => {
            trace!("submitting a batch of {} calls", calls.len());
            let body = transport.send(codec::encode_multicall(calls)?)?;
            let values = codec::decode_response(&body)?.into_result()?;
            let entries = match single(codec::MULTICALL, values)? {
                Value::Array(entries) => entries,
                other => {
                    return Err(RTorrentError::Decode(format!(
                        "{} returned {} instead of an array",
                        codec::MULTICALL,
                        other.kind()
                    )));
                }
            };

            if entries.len() != calls.len() {
                return Err(RTorrentError::BatchSizeMismatch {
                    expected: calls.len(),
                    actual: entries.len(),
                });
            }

            entries
                .into_iter()
                .zip(calls)
                .map(|(entry, call)| split_entry(call, entry))
                .collect()
        }
    }
}

/// Execute one call, turning a fault into [`RTorrentError::Fault`].
pub fn call<T: Transport + ?Sized>(transport: &T, call: Call) -> Result<Value, RTorrentError> {
    let mut results = execute(transport, std::slice::from_ref(&call))?;
    match results.pop() {
        Some(result) => result.map_err(RTorrentError::from),
        None => Err(RTorrentError::BatchSizeMismatch {
            expected: 1,
            actual: 0,
        }),
    }
}

/// Execute `calls` and require every one of them to succeed; the first fault fails all.
pub(crate) fn execute_all<T: Transport + ?Sized>(
    transport: &T,
    calls: &[Call],
) -> Result<Vec<Value>, RTorrentError> {
    execute(transport, calls)?
        .into_iter()
        .map(|result| result.map_err(RTorrentError::from))
        .collect()
}

/// A response must carry exactly one value.
fn single(method: &str, mut values: Vec<Value>) -> Result<Value, RTorrentError> {
    match values.len() {
        1 => Ok(values.remove(0)),
        n => Err(RTorrentError::Decode(format!(
            "{method} returned {n} values instead of one"
        ))),
    }
}

/// A multicall entry is a one-element array on success, or a fault struct.
fn split_entry(call: &Call, entry: Value) -> Result<CallResult, RTorrentError> {
    match entry {
        Value::Array(values) => single(call.method(), values).map(Ok),
        Value::Struct(members) => codec::fault_from_members(&members).map(Err),
        other => Err(RTorrentError::Decode(format!(
            "{} result is a {}, neither an array nor a fault",
            call.method(),
            other.kind()
        ))),
    }
}
