//! Default values shared across modules

/// Port on which the gating proxy listens for inbound HTTP requests
pub const PORT_PROXY: &str = "9000";

/// Pub/Sub channel on which the backend announces fresh state
pub const NOTIFICATION_TOPIC: &str = "isubata:stream:message";

/// Backend address used when none has been configured
pub const DEFAULT_BACKEND: &str = "localhost:5000";

/// Notification bus URL used when none has been configured
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379/0";

/// Wait timeout in seconds used when none (or an invalid value) has been configured
pub const DEFAULT_WAIT_TIMEOUT_SECS: u64 = 5;

/// Maximum number of simultaneously gated requests
pub const DEFAULT_PENDING_REQUEST_LIMIT: usize = 1000;
