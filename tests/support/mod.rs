//! Shared helpers for the integration suites.

#![allow(dead_code)]

use std::sync::Once;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

pub const TIMEOUT: Duration = Duration::from_secs(2);

/// Payload used across the suites: `{"msg": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDto {
    pub msg: String,
}

impl TestDto {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// Install a test-writer subscriber once per binary. Honours `RUST_LOG`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Poll `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// Give in-flight deliveries a moment before asserting that nothing happened.
pub fn settle() {
    thread::sleep(Duration::from_millis(50));
}
