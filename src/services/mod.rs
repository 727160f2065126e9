pub mod family;
pub mod metrics;
