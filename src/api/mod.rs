//! REST access to the LeadBridge API.
//!
//! `ApiClient` owns the HTTP plumbing (bearer auth, refresh-on-401) and
//! implements the `ApiTransport` seam. Resource modules (`leads`,
//! `dashboard`) sit on top of a transport plus a [`crate::cache::ResponseCache`]
//! and decide per operation what to cache and what to invalidate.

pub mod auth;
pub mod client;
pub mod dashboard;
pub mod leads;
pub mod transport;

pub use auth::AuthTokens;
pub use client::ApiClient;
pub use dashboard::{DashboardApi, DashboardMetrics};
pub use leads::{Lead, LeadPage, LeadPatch, LeadsApi, NewLead};
pub use transport::ApiTransport;
