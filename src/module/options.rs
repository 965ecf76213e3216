//! Various options usable by modules
//!
//! The structs in this module allow other modules to flatten them into
//! their own options struct. This allows for a unified yet non-cluttered
//! option set.

use crate::constants;
use structopt::StructOpt;

/// Options for connecting to the Redis server acting as notification bus
#[derive(Debug, StructOpt)]
pub struct RedisOptions {
    /// Redis database server URL
    #[structopt(
        short = "r",
        long = "redis",
        env = "REDIS",
        default_value = constants::DEFAULT_REDIS_URL,
        value_name = "url"
    )]
    pub url: String,

    /// Pub/Sub channel on which the backend announces fresh state
    #[structopt(long, env = "TOPIC", default_value = constants::NOTIFICATION_TOPIC)]
    pub topic: String,
}

/// Variable names used by earlier deployments, paired with their current equivalent
pub const LEGACY_ENV_NAMES: &[(&str, &str)] = &[
    ("ISUROXY_BACKEND", "BACKEND"),
    ("ISUROXY_TIMEOUT", "WAIT_TIMEOUT"),
    ("ISUBATA_REDIS_URL", "REDIS"),
];

/// Resolves values of legacy variables whose current equivalent is unset.
/// The current name always takes precedence when both are present.
pub fn legacy_env_fallbacks<F>(lookup: F) -> Vec<(&'static str, String)>
where
    F: Fn(&str) -> Option<String>,
{
    LEGACY_ENV_NAMES
        .iter()
        .filter(|(_, current)| lookup(current).is_none())
        .filter_map(|(legacy, current)| lookup(legacy).map(|value| (*current, value)))
        .collect()
}

/// Copies legacy variables into their current names so that option parsing picks them up.
/// Has to run before any options are parsed.
pub fn adopt_legacy_env() {
    for (name, value) in legacy_env_fallbacks(|key| std::env::var(key).ok()) {
        std::env::set_var(name, value);
    }
}
