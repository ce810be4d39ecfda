//! Completion detection: a single point-in-time, non-blocking check per job.

use std::io::{self, Read};
use std::net::TcpStream;

use crate::transport::JobHandle;

/// Outcome of polling one running job.
#[derive(Debug, PartialEq, Eq)]
pub enum PollStatus {
    /// The remote stream reached end-of-stream; the handle has been closed
    /// and must not be polled again.
    Finished,
    /// Stream still open. Carries whatever bytes were buffered, drained for
    /// diagnostics only (often empty).
    Active(Vec<u8>),
    /// The handle was already closed when polled. Indicates a double-poll
    /// or double-close upstream; callers count it as a completion.
    AlreadyClosed,
}

enum Drain {
    Eof(Vec<u8>),
    Blocked(Vec<u8>),
    Failed(io::Error),
}

fn drain_nonblocking(stream: &mut TcpStream) -> Drain {
    let mut drained = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => return Drain::Eof(drained),
            Ok(n) => drained.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Drain::Blocked(drained),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Drain::Failed(e),
        }
    }
}

/// Check one running job without blocking. No retry logic here; the
/// scheduler calls again on the next tick.
pub fn poll(handle: &mut JobHandle) -> PollStatus {
    let outcome = match handle.stream_mut() {
        Some(stream) => drain_nonblocking(stream),
        None => return PollStatus::AlreadyClosed,
    };
    match outcome {
        Drain::Eof(bytes) => {
            if !bytes.is_empty() {
                tracing::trace!(discarded = bytes.len(), "bytes drained in final poll");
            }
            handle.close();
            PollStatus::Finished
        }
        Drain::Failed(e) => {
            // The peer is gone; no later poll can see a cleaner EOF.
            tracing::debug!(error = %e, "poll read failed; treating stream as ended");
            handle.close();
            PollStatus::Finished
        }
        Drain::Blocked(bytes) => PollStatus::Active(bytes),
    }
}
