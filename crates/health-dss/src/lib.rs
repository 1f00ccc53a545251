//! Clinical decision support engine for occupational and school health records.

pub mod config;
pub mod dss;
pub mod error;
pub mod telemetry;

pub use error::AppError;
