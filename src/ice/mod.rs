//! Public emergency card ("ICE") access.

pub mod cached_client;
pub mod client;
pub mod error;
pub mod types;

pub use cached_client::{CachedIceClient, CardView};
pub use client::IceClient;
