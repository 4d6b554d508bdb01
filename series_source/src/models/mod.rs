//! Vendor-agnostic series models.

pub mod data_point;
pub mod filter;
pub mod series_meta;
