//! Services layer (ports + adapters).
//!
//! - `ports`: pure contracts/types used across the app (kernel-facing).
//! - `adapters`: OS/thread specific implementations.

pub mod adapters;
pub mod ports;
