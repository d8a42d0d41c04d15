//! Environment variable names and default values.
//!
//! Grouped the way the upstream constants module is: one `ENV_*` constant
//! per environment variable, paired with a `DEFAULT_*` constant for its
//! fallback value.

// =============================================================================
// Environment variable names
// =============================================================================

pub const ENV_MONGO_URI: &str = "MONGO_URI";
pub const ENV_REDIS_HOST: &str = "REDIS_HOST";
pub const ENV_REDIS_PORT: &str = "REDIS_PORT";
pub const ENV_APP_PORT: &str = "APP_PORT";
pub const ENV_CACHE_TTL: &str = "CACHE_TTL";
pub const ENV_BATCH_SIZE: &str = "BATCH_SIZE";
pub const ENV_FLUSH_INTERVAL: &str = "FLUSH_INTERVAL";
pub const ENV_MAX_RETRIES: &str = "MAX_RETRIES";
pub const ENV_RETRY_DELAY: &str = "RETRY_DELAY";
pub const ENV_HOSTNAME: &str = "HOSTNAME";
pub const ENV_CLAIM_IDLE_MS: &str = "CLAIM_IDLE_MS";
pub const ENV_LOG_FILTER: &str = "WRITESHED_LOG";

// =============================================================================
// Defaults
// =============================================================================

pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_REDIS_HOST: &str = "localhost";
pub const DEFAULT_REDIS_PORT: u16 = 6379;
pub const DEFAULT_APP_PORT: u16 = 8080;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;
pub const DEFAULT_BATCH_SIZE: usize = 500;
pub const DEFAULT_FLUSH_INTERVAL_SECS: f64 = 2.0;
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_RETRY_DELAY_SECS: f64 = 1.0;
pub const DEFAULT_CLAIM_IDLE_MS: u64 = 30_000;
pub const DEFAULT_HOSTNAME: &str = "writeshed-consumer";

// =============================================================================
// Mongo document store schema
// =============================================================================

pub const MONGO_DB_NAME: &str = "assessmentdb";
pub const MONGO_COLLECTION: &str = "records";

// =============================================================================
// Broker stream / consumer-group schema
// =============================================================================

pub const STREAM_NAME: &str = "writes";
pub const CONSUMER_GROUP: &str = "mongo-writers";
pub const STREAM_FIELD: &str = "data";
pub const STREAM_MAXLEN_APPROX: u64 = 100_000;
pub const STREAM_GROUP_START_ID: &str = "0";

// =============================================================================
// Cache schema
// =============================================================================

pub const CACHE_KEY_PREFIX: &str = "doc:";
pub const CACHE_CLEAR_PATTERN: &str = "doc:*";

// =============================================================================
// Ingress request shape
// =============================================================================

pub const WRITES_PER_REQUEST: usize = 5;
pub const READS_PER_REQUEST: usize = 5;
pub const WRITE_PAYLOAD_BYTES: usize = 512;
pub const WRITE_DOC_TYPE: &str = "write";

// =============================================================================
// Consumer throttling
// =============================================================================

pub const POST_FLUSH_SLEEP_MS_MIN: u64 = 50;
pub const POST_FLUSH_SLEEP_MS_MAX: u64 = 100;
pub const STARTUP_JITTER_SECS_MIN: u64 = 1;
pub const STARTUP_JITTER_SECS_MAX: u64 = 5;
pub const READ_GROUP_BLOCK_MS: u64 = 2_000;
pub const MAX_CLAIMS_PER_ITERATION: usize = 100;
pub const POISON_PILL_DELIVERY_THRESHOLD: u64 = 5;

// =============================================================================
// Pool sizing (store is the scarce resource; pools throttle, not tune perf)
// =============================================================================

pub const INGRESS_BROKER_POOL_SIZE: usize = 256;
pub const INGRESS_STORE_POOL_SIZE: u32 = 10;
pub const CONSUMER_BROKER_POOL_SIZE: usize = 8;
pub const CONSUMER_STORE_POOL_SIZE: u32 = 5;

// =============================================================================
// Deadlines
// =============================================================================

pub const CONNECT_TIMEOUT_SECS: u64 = 5;
pub const SOCKET_TIMEOUT_SECS: u64 = 5;
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;
