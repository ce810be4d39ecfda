//! Job description: a script path on the target server plus optional GET
//! arguments and per-job timeouts. Immutable once enqueued.

use std::time::Duration;
use url::form_urlencoded;

/// Default connection-establishment timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default read/write deadline for the dispatched connection.
pub const DEFAULT_RW_TIMEOUT: Duration = Duration::from_secs(86_400);

/// One queued job: the request target and its connection timeouts.
#[derive(Debug, Clone)]
pub struct JobSpec {
    /// Script path on the target server, e.g. `/jobs/reindex.php`.
    pub path: String,
    /// Ordered GET arguments appended as an urlencoded query string.
    pub args: Vec<(String, String)>,
    /// Connection establishment bound.
    pub connect_timeout: Duration,
    /// Read/write deadline applied to the open connection.
    pub rw_timeout: Duration,
}

impl JobSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            args: Vec::new(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            rw_timeout: DEFAULT_RW_TIMEOUT,
        }
    }

    /// Append one GET argument; argument order is preserved in the query.
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.push((key.into(), value.into()));
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn rw_timeout(mut self, timeout: Duration) -> Self {
        self.rw_timeout = timeout;
        self
    }

    /// Request target for the GET line: the path, plus `?<query>` when
    /// arguments are present.
    pub fn request_target(&self) -> String {
        if self.args.is_empty() {
            return self.path.clone();
        }
        let query: String = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.args.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish();
        format!("{}?{}", self.path, query)
    }
}
