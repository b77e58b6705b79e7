//! # Instatus Integration Library
//!
//! An async client for the Instatus status-page API with:
//! - Endpoint coverage for pages, components, incidents, maintenances,
//!   team, subscribers, metrics and the public summary
//! - Per-endpoint request serialization that honours the rate-limit headers
//! - Global rate-limit pauses shared by every request of a client
//! - Retries for rate limits, 500/502 responses and reset connections
//! - A blocking adapter for synchronous code
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use integrations_instatus::{InstatusClient, IncidentRequest, IncidentStatus};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = InstatusClient::builder()
//!         .api_key("your-api-key")
//!         .build()?;
//!
//!     let incident = client
//!         .incidents()
//!         .create(
//!             "page-id",
//!             &IncidentRequest {
//!                 name: Some("Elevated error rates".into()),
//!                 status: Some(IncidentStatus::Investigating),
//!                 ..Default::default()
//!             },
//!         )
//!         .await?;
//!     println!("opened {}", incident.id);
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod errors;
pub mod types;

// Wire format
pub mod route;
pub mod serialization;

// HTTP client and dispatch
pub mod client;

// API Services
pub mod services;

// Synchronous adapter
pub mod blocking;

// Resilience patterns
pub mod resilience;

// Observability
pub mod observability;

// Re-exports for convenience
pub use blocking::BlockingClient;
pub use client::{FileUpload, InstatusClient, InstatusClientBuilder, RequestOptions};
pub use config::{InstatusConfig, InstatusConfigBuilder};
pub use errors::{InstatusError, InstatusErrorKind, InstatusResult};
pub use route::{PathParam, Route};
pub use serialization::ResponseBody;
pub use services::*;
pub use types::*;
