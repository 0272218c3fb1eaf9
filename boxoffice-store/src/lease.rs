//! Short-lived, single-key mutual exclusion.
//!
//! Stands in for a distributed lock (a Redis `SET NX EX` or a consensus-backed lease). Callers
//! never block: `acquire` either hands out a lease or reports who holds the key until when, and
//! retry policy is left to the caller.

use boxoffice_shared::Clock;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};
use uuid::Uuid;

/// Transient ownership of `key`. The token makes every issued lease distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    key: String,
    token: Uuid,
    expires_at: DateTime<Utc>,
}

impl Lease {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn token(&self) -> Uuid {
        self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeaseError {
    #[error("Lease for {key} is held until {expires_at}")]
    Busy {
        key: String,
        expires_at: DateTime<Utc>,
    },
}

pub trait LeaseService: Send + Sync {
    /// Take the lease for `key` unless someone holds an unexpired one
    fn acquire(&self, key: &str) -> Result<Lease, LeaseError>;

    /// Give the lease back. Only succeeds for the exact lease currently stored under its key.
    fn release(&self, lease: &Lease) -> bool;
}

/// Process-local lease table with a fixed TTL.
pub struct InMemoryLeaseService {
    leases: Mutex<HashMap<String, Lease>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl InMemoryLeaseService {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            leases: Mutex::new(HashMap::new()),
            clock,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl LeaseService for InMemoryLeaseService {
    fn acquire(&self, key: &str) -> Result<Lease, LeaseError> {
        let now = self.clock.now();
        let mut leases = self.leases.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(current) = leases.get(key) {
            if current.expires_at > now {
                return Err(LeaseError::Busy {
                    key: key.to_string(),
                    expires_at: current.expires_at,
                });
            }
            debug!("Lease for {} expired at {}, replacing", key, current.expires_at);
        }

        let lease = Lease {
            key: key.to_string(),
            token: Uuid::new_v4(),
            expires_at: now + self.ttl,
        };
        leases.insert(key.to_string(), lease.clone());
        debug!("Lease acquired: {} until {}", key, lease.expires_at);
        Ok(lease)
    }

    fn release(&self, lease: &Lease) -> bool {
        let mut leases = self.leases.lock().unwrap_or_else(PoisonError::into_inner);
        match leases.get(&lease.key) {
            Some(current) if current == lease => {
                leases.remove(&lease.key);
                debug!("Lease released: {}", lease.key);
                true
            }
            _ => false,
        }
    }
}

/// Holds a lease for the length of a scope and gives it back on drop.
pub struct LeaseGuard<'a> {
    service: &'a dyn LeaseService,
    lease: Lease,
}

impl<'a> LeaseGuard<'a> {
    pub fn acquire(service: &'a dyn LeaseService, key: &str) -> Result<Self, LeaseError> {
        let lease = service.acquire(key)?;
        Ok(Self { service, lease })
    }

    pub fn lease(&self) -> &Lease {
        &self.lease
    }
}

impl Drop for LeaseGuard<'_> {
    fn drop(&mut self) {
        if !self.service.release(&self.lease) {
            // TTL ran out mid-operation and someone else took the key
            warn!("Lease for {} was lost before release", self.lease.key);
        }
    }
}
