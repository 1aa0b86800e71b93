pub mod bench;
pub mod dataset;
pub mod engine;
pub mod filter;
pub mod notify;
pub mod report;
pub mod soak;

pub use crate::domain::model::{Document, NormalizedId, ServiceRecord, SupplierRecord};
pub use crate::domain::ports::{
    ConfigProvider, EnergyProbe, Notifier, ServiceIdentity, Storage, SupplierIdentity,
};
pub use crate::utils::error::Result;
