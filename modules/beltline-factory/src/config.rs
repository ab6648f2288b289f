//! Factory configuration loaded from environment variables.
//!
//! Numeric thresholds are configuration, not policy — every knob has a
//! default so the demo runs with a bare environment.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FactoryConfig {
    // Machine
    pub machine_capacity: i64,
    pub produce_qty: i64,
    pub produce_delay: Duration,

    // Robot
    pub pickup_min: i64,
    pub pickup_qty: i64,
    pub robot_input_capacity: i64,
    pub robot_output_capacity: i64,
    pub pickup_delay: Duration,
    pub package_delay: Duration,

    // Forklift
    pub dropoff_delay: Duration,
    pub dropoff_cooldown: Duration,

    // Coin toss
    pub toss_delay: Duration,
}

impl FactoryConfig {
    /// Load configuration from environment variables, defaulting every knob.
    /// Panics with a clear message if a set variable does not parse.
    pub fn from_env() -> Self {
        Self {
            machine_capacity: env_i64("MACHINE_CAPACITY", 3),
            produce_qty: env_i64("PRODUCE_QTY", 1),
            produce_delay: env_ms("PRODUCE_DELAY_MS", 1_000),
            pickup_min: env_i64("PICKUP_MIN", 1),
            pickup_qty: env_i64("PICKUP_QTY", 2),
            robot_input_capacity: env_i64("ROBOT_INPUT_CAPACITY", 9),
            robot_output_capacity: env_i64("ROBOT_OUTPUT_CAPACITY", 9),
            pickup_delay: env_ms("PICKUP_DELAY_MS", 1_500),
            package_delay: env_ms("PACKAGE_DELAY_MS", 2_000),
            dropoff_delay: env_ms("DROPOFF_DELAY_MS", 1_000),
            dropoff_cooldown: env_ms("DROPOFF_COOLDOWN_MS", 5_000),
            toss_delay: env_ms("TOSS_DELAY_MS", 2_000),
        }
    }

    /// The one debug toggle: `BELTLINE_DEBUG=1` enables verbose transition
    /// logging.
    pub fn debug_enabled() -> bool {
        env::var("BELTLINE_DEBUG")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    match env::var(key) {
        Ok(value) => value
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number")),
        Err(_) => default,
    }
}

fn env_ms(key: &str, default_ms: u64) -> Duration {
    match env::var(key) {
        Ok(value) => Duration::from_millis(
            value
                .parse()
                .unwrap_or_else(|_| panic!("{key} must be a number of milliseconds")),
        ),
        Err(_) => Duration::from_millis(default_ms),
    }
}
