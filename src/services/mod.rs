//! Instatus API service implementations.

mod components;
mod incidents;
mod maintenances;
mod metrics;
mod pages;
mod subscribers;
mod summary;
mod team;
mod user;

pub use components::*;
pub use incidents::*;
pub use maintenances::*;
pub use metrics::*;
pub use pages::*;
pub use subscribers::*;
pub use summary::*;
pub use team::*;
pub use user::*;
