pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::config::cli::LocalStorage;
#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::core::engine::BenchEngine;
pub use crate::core::filter::{
    filter_services_by_supplier, filter_services_by_supplier_naive,
    filter_services_by_supplier_ref,
};
pub use crate::domain::model::{
    Document, NormalizedId, ServiceRecord, SupplierProfile, SupplierRecord,
};
pub use crate::domain::ports::{ServiceIdentity, SupplierIdentity};
pub use crate::utils::error::{BeventError, Result};
