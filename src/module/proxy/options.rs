use crate::constants;
use crate::library::helpers::parse_seconds_or;
use crate::module::options::RedisOptions;
use std::time::Duration;
use structopt::StructOpt;

/// Options for the gating proxy module
#[derive(Debug, StructOpt)]
pub struct Options {
    #[allow(missing_docs)]
    #[structopt(flatten)]
    pub redis: RedisOptions,

    /// Backend address (host:port) to which requests are forwarded
    #[structopt(
        short,
        long,
        env = "BACKEND",
        default_value = constants::DEFAULT_BACKEND,
        value_name = "host:port"
    )]
    pub backend: String,

    /// Maximum number of seconds a request is held back while waiting for a notification.
    /// Zero, negative or unparsable values fall back to the default.
    #[structopt(
        short = "t",
        long,
        env = "WAIT_TIMEOUT",
        default_value = "5",
        parse(from_str = parse_wait_timeout),
        value_name = "seconds"
    )]
    pub wait_timeout: Duration,

    /// Port on which the HTTP server will listen
    #[structopt(short, long, env = "PORT", default_value = constants::PORT_PROXY)]
    pub port: u16,

    /// Maximum number of concurrently gated requests. Requests arriving while the
    /// limit is reached queue for a free slot, bounded by the wait timeout, and are
    /// forwarded ungated if none frees up in time.
    #[structopt(long, env, default_value = "1000")]
    pub pending_request_limit: usize,
}

fn parse_wait_timeout(src: &str) -> Duration {
    parse_seconds_or(src, Duration::from_secs(constants::DEFAULT_WAIT_TIMEOUT_SECS))
}
