//! Infrastructure constants and default values

use std::time::Duration;

// ============================================================================
// Circuit Breaker
// ============================================================================

/// Consecutive failures before the circuit opens
pub const CIRCUIT_BREAKER_FAILURE_THRESHOLD: u32 = 5;

/// How long an open circuit waits before allowing a half-open probe
pub const CIRCUIT_BREAKER_RECOVERY_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Probe calls admitted in the half-open state
pub const CIRCUIT_BREAKER_HALF_OPEN_MAX_REQUESTS: u32 = 1;

// ============================================================================
// Rate Limiting
// ============================================================================

/// Requests admitted per sliding window
pub const RATE_LIMIT_MAX_REQUESTS: usize = 60;

/// Width of the sliding rate-limit window
pub const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

// ============================================================================
// Configuration
// ============================================================================

/// Environment variable prefix for configuration overrides
pub const CONFIG_ENV_PREFIX: &str = "SEMDEX_";

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "semdex.toml";

/// Environment variable controlling the log filter
pub const LOG_FILTER_ENV: &str = "SEMDEX_LOG";
