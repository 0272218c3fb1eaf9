pub mod app_config;
pub mod lease;

pub use app_config::Config;
pub use lease::{InMemoryLeaseService, Lease, LeaseError, LeaseGuard, LeaseService};
