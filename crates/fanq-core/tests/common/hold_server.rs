//! Minimal HTTP/1.1 server for integration tests.
//!
//! Accepts each connection on a background thread, records the raw request,
//! holds the connection open for a configurable time, then writes a small
//! response and closes. The hold time makes completion timing controllable;
//! the accepted/open counters let tests assert the concurrency bound.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct HoldServerOptions {
    /// How long each connection stays open before the response is written.
    pub hold: Duration,
    /// Write the status line immediately on accept, so pollers observe
    /// drained bytes while the job is still active.
    pub early_status: bool,
}

impl Default for HoldServerOptions {
    fn default() -> Self {
        Self {
            hold: Duration::from_millis(50),
            early_status: false,
        }
    }
}

pub struct HoldServer {
    pub host: String,
    pub port: u16,
    accepted: Arc<AtomicUsize>,
    peak_open: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl HoldServer {
    /// Connections accepted so far.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Highest number of connections that were open at the same time.
    pub fn peak_open(&self) -> usize {
        self.peak_open.load(Ordering::SeqCst)
    }

    /// Raw requests received, in accept order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Starts a server whose connections are held open for `hold` before the
/// response is sent. The server runs until the process exits.
pub fn start(hold: Duration) -> HoldServer {
    start_with_options(HoldServerOptions {
        hold,
        ..Default::default()
    })
}

pub fn start_with_options(opts: HoldServerOptions) -> HoldServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let accepted = Arc::new(AtomicUsize::new(0));
    let open = Arc::new(AtomicUsize::new(0));
    let peak_open = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));

    {
        let accepted = Arc::clone(&accepted);
        let open = Arc::clone(&open);
        let peak_open = Arc::clone(&peak_open);
        let requests = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                accepted.fetch_add(1, Ordering::SeqCst);
                let now_open = open.fetch_add(1, Ordering::SeqCst) + 1;
                peak_open.fetch_max(now_open, Ordering::SeqCst);
                let open = Arc::clone(&open);
                let requests = Arc::clone(&requests);
                thread::spawn(move || {
                    handle(stream, opts, &requests);
                    open.fetch_sub(1, Ordering::SeqCst);
                });
            }
        });
    }

    HoldServer {
        host: "127.0.0.1".to_string(),
        port,
        accepted,
        peak_open,
        requests,
    }
}

fn handle(mut stream: TcpStream, opts: HoldServerOptions, requests: &Mutex<Vec<String>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    if let Ok(n) = stream.read(&mut buf) {
        if n > 0 {
            if let Ok(request) = std::str::from_utf8(&buf[..n]) {
                requests.lock().unwrap().push(request.to_string());
            }
        }
    }
    if opts.early_status {
        let _ = stream.write_all(b"HTTP/1.1 200 OK\r\n");
        thread::sleep(opts.hold);
        let _ = stream.write_all(b"Content-Length: 4\r\nConnection: close\r\n\r\ndone");
    } else {
        thread::sleep(opts.hold);
        let _ = stream
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\nConnection: close\r\n\r\ndone");
    }
}
