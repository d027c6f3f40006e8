use crate::subscribers::SubscriberRegistry;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct KernelHealth {
    pub uptime_seconds: u64,
    pub hosts_tracked: u32,
    pub subscribers: u32,
    pub probe_cycles: u64,
}

#[derive(Clone)]
pub struct HealthTracker {
    start_time: Instant,
    probe_cycles: Arc<AtomicU64>,
}

impl Default for HealthTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl HealthTracker {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            probe_cycles: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn record_cycle(&self) {
        self.probe_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn probe_cycles(&self) -> u64 {
        self.probe_cycles.load(Ordering::Relaxed)
    }

    pub fn get_health(&self, hosts_tracked: usize, subscribers: &SubscriberRegistry) -> KernelHealth {
        KernelHealth {
            uptime_seconds: self.start_time.elapsed().as_secs(),
            hosts_tracked: hosts_tracked as u32,
            subscribers: subscribers.len() as u32,
            probe_cycles: self.probe_cycles(),
        }
    }
}
