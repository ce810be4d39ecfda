//! Asynchronous dispatch: one outbound connection per job.
//!
//! Dispatch opens a `TcpStream` to the configured server, writes a single
//! minimal HTTP/1.1 GET with `Connection: Close`, then switches the socket
//! to non-blocking so the poll pass can check it without stalling the run.
//! The response stream reaching EOF is the job's completion signal; the
//! body is never interpreted.

use std::io::{self, Write};
use std::net::{TcpStream, ToSocketAddrs};
use thiserror::Error;

use crate::job::JobSpec;

/// Dispatch failures. `Connect` and `Resolve` are fatal to the whole run:
/// the scheduler does not treat them as per-job failures.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("connect to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("no usable address for {host}:{port}")]
    Resolve { host: String, port: u16 },
    #[error("request to {host}:{port} failed: {source}")]
    Request {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("dispatch produced no usable connection handle")]
    InvalidHandle,
}

/// Live connection for one dispatched job. Exclusively owned by the
/// scheduler's running set until completion is observed.
#[derive(Debug)]
pub struct JobHandle {
    stream: Option<TcpStream>,
}

impl JobHandle {
    pub(crate) fn new(stream: TcpStream) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Release the connection. Safe to call more than once.
    pub fn close(&mut self) {
        self.stream = None;
    }

    pub(crate) fn stream_mut(&mut self) -> Option<&mut TcpStream> {
        self.stream.as_mut()
    }
}

/// Opens connections to one configured server and fires job requests at it.
#[derive(Debug, Clone)]
pub struct HttpDispatcher {
    host: String,
    port: u16,
}

impl HttpDispatcher {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Dispatch one job: connect (bounded by the job's connect timeout),
    /// send the GET request, switch to non-blocking, and return the handle.
    pub fn dispatch(&self, job: &JobSpec) -> Result<JobHandle, DispatchError> {
        let target = job.request_target();
        let addr = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|source| DispatchError::Connect {
                host: self.host.clone(),
                port: self.port,
                source,
            })?
            .next()
            .ok_or_else(|| DispatchError::Resolve {
                host: self.host.clone(),
                port: self.port,
            })?;

        let stream = TcpStream::connect_timeout(&addr, job.connect_timeout).map_err(|source| {
            DispatchError::Connect {
                host: self.host.clone(),
                port: self.port,
                source,
            }
        })?;

        // The rw deadline covers the request write (still blocking here)
        // and any blocking operation a future caller might perform.
        stream
            .set_read_timeout(Some(job.rw_timeout))
            .and_then(|_| stream.set_write_timeout(Some(job.rw_timeout)))
            .map_err(|source| self.request_error(source))?;

        let request = format!(
            "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: Close\r\n\r\n",
            target, self.host
        );
        let mut stream = stream;
        stream
            .write_all(request.as_bytes())
            .map_err(|source| self.request_error(source))?;

        stream
            .set_nonblocking(true)
            .map_err(|source| self.request_error(source))?;

        // A socket that cannot report its peer right after the write is no
        // longer a usable handle; surface that instead of returning it.
        if stream.peer_addr().is_err() {
            return Err(DispatchError::InvalidHandle);
        }

        tracing::debug!(url = %target, host = %self.host, port = self.port, "dispatched job");
        Ok(JobHandle::new(stream))
    }

    fn request_error(&self, source: io::Error) -> DispatchError {
        DispatchError::Request {
            host: self.host.clone(),
            port: self.port,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;

    #[test]
    fn dispatch_emits_fixed_request_shape() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let dispatcher = HttpDispatcher::new("127.0.0.1", port);
        let job = JobSpec::new("/work.php").arg("batch", "9");

        let handle = dispatcher.dispatch(&job).expect("dispatch");
        assert!(!handle.is_closed());

        let (mut conn, _) = listener.accept().expect("accept");
        let mut buf = [0u8; 1024];
        let n = conn.read(&mut buf).expect("read request");
        let request = std::str::from_utf8(&buf[..n]).expect("utf8");
        assert_eq!(
            request,
            "GET /work.php?batch=9 HTTP/1.1\r\nHost: 127.0.0.1\r\nConnection: Close\r\n\r\n"
        );
    }

    #[test]
    fn connection_refused_is_fatal() {
        // Grab a free port, then close the listener so nothing accepts.
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let dispatcher = HttpDispatcher::new("127.0.0.1", port);
        let err = dispatcher
            .dispatch(&JobSpec::new("/work.php"))
            .expect_err("connect must fail");
        assert!(matches!(err, DispatchError::Connect { .. }), "got {err}");
    }

    #[test]
    fn handle_close_is_idempotent() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let dispatcher = HttpDispatcher::new("127.0.0.1", port);
        let mut handle = dispatcher.dispatch(&JobSpec::new("/x")).expect("dispatch");
        handle.close();
        assert!(handle.is_closed());
        handle.close();
        assert!(handle.is_closed());
    }
}
