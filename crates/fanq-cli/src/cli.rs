//! CLI for the fanq job queue: enqueue a batch of script paths, run the
//! queue, and report how it went.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::time::Duration;
use url::form_urlencoded;

use fanq_core::config::{self, LogTarget, QueueConfig};
use fanq_core::job::JobSpec;
use fanq_core::load::StaticLoad;
use fanq_core::scheduler::Scheduler;

/// Fan out HTTP-triggered jobs with bounded concurrency, throttled by host load.
#[derive(Debug, Parser)]
#[command(name = "fanq")]
#[command(about = "fanq: load-aware fan-out queue for HTTP-triggered jobs", long_about = None)]
pub struct Cli {
    /// Script paths to trigger on the target server, e.g. /jobs/reindex.php.
    /// A ?query suffix is parsed into GET arguments.
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<String>,

    /// Target server host (overrides config.toml).
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Target server port (overrides config.toml).
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Maximum number of jobs running at once (overrides config.toml).
    #[arg(long, value_name = "N")]
    pub max_jobs: Option<usize>,

    /// Load-average ceiling for admitting jobs (overrides config.toml).
    #[arg(long, value_name = "LOAD")]
    pub min_load: Option<f64>,

    /// Global timeout in seconds; 0 waits until every job finishes.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Run-log destination: stream, silent, or error-channel.
    #[arg(long, value_name = "TARGET", value_parser = parse_log_target)]
    pub log: Option<LogTarget>,

    /// Extra GET argument applied to every job, as KEY=VALUE. Repeatable.
    #[arg(long = "arg", value_name = "KEY=VALUE")]
    pub args: Vec<String>,

    /// Per-job connection timeout in seconds (default 30).
    #[arg(long, value_name = "SECS")]
    pub connect_timeout: Option<u64>,

    /// Per-job read/write timeout in seconds (default 86400).
    #[arg(long, value_name = "SECS")]
    pub rw_timeout: Option<u64>,

    /// Skip the platform load probe and assume this fixed load figure.
    #[arg(long, value_name = "LOAD")]
    pub assume_load: Option<f64>,
}

fn parse_log_target(s: &str) -> Result<LogTarget, String> {
    match s {
        "stream" => Ok(LogTarget::Stream),
        "silent" => Ok(LogTarget::Silent),
        "error-channel" => Ok(LogTarget::ErrorChannel),
        other => Err(format!(
            "unknown log target '{other}' (expected stream, silent, or error-channel)"
        )),
    }
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let file_cfg = config::load_or_init().context("loading config")?;
        let cfg = self.effective_config(file_cfg);

        let mut scheduler = match self.assume_load {
            Some(load) => Scheduler::with_probe(cfg, Box::new(StaticLoad(load))),
            None => Scheduler::new(cfg),
        };

        for path in &self.paths {
            let job = self.job_for(path)?;
            let index = scheduler.enqueue(job);
            tracing::debug!(index, path = %path, "queued");
        }

        // Entries were already routed per log_target while running; the
        // returned blob is for library callers.
        let _log = scheduler.run().context("queue run failed")?;
        tracing::info!(
            finished = scheduler.finished_count(),
            job_count = scheduler.job_count(),
            "queue run complete"
        );
        Ok(())
    }

    /// File config with CLI flag overrides applied.
    fn effective_config(&self, mut cfg: QueueConfig) -> QueueConfig {
        if let Some(host) = &self.host {
            cfg.server_host = host.clone();
        }
        if let Some(port) = self.port {
            cfg.server_port = port;
        }
        if let Some(max_jobs) = self.max_jobs {
            cfg.max_jobs = max_jobs;
        }
        if let Some(min_load) = self.min_load {
            cfg.min_load = min_load;
        }
        if let Some(timeout) = self.timeout {
            cfg.timeout_secs = timeout;
        }
        if let Some(log) = self.log {
            cfg.log_target = log;
        }
        cfg
    }

    /// Build one job from a positional path plus the batch-wide options.
    fn job_for(&self, path: &str) -> Result<JobSpec> {
        let (path, query) = match path.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (path, None),
        };
        let mut job = JobSpec::new(path);
        if let Some(query) = query {
            for (key, value) in form_urlencoded::parse(query.as_bytes()) {
                job = job.arg(key, value);
            }
        }
        for pair in &self.args {
            let Some((key, value)) = pair.split_once('=') else {
                bail!("--arg expects KEY=VALUE, got '{pair}'");
            };
            job = job.arg(key, value);
        }
        if let Some(secs) = self.connect_timeout {
            job = job.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.rw_timeout {
            job = job.rw_timeout(Duration::from_secs(secs));
        }
        Ok(job)
    }
}
