use crate::domain::model::NormalizedId;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::borrow::Cow;

/// Anything that can be identified as a supplier.
pub trait SupplierIdentity {
    /// Field name reported when the identifier is missing.
    const ID_FIELD: &'static str = "id";

    fn supplier_id(&self) -> Option<Cow<'_, NormalizedId>>;
}

/// Anything offered by exactly one supplier.
pub trait ServiceIdentity {
    const ID_FIELD: &'static str = "id";
    const SUPPLIER_FIELD: &'static str = "supplier";

    fn service_id(&self) -> Option<Cow<'_, NormalizedId>>;
    fn supplier_ref(&self) -> Option<Cow<'_, NormalizedId>>;
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Outbound message transport. Fails with `BeventError::DeliveryError`
/// when the transport is unavailable.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
}

/// Cumulative energy counter of the machine, in microjoules.
pub trait EnergyProbe: Send + Sync {
    fn read_energy_uj(&self) -> Option<u64>;

    /// Value at which the counter wraps back to zero, if known.
    fn max_energy_uj(&self) -> Option<u64> {
        None
    }
}

pub trait ConfigProvider: Send + Sync {
    fn benchmark_name(&self) -> &str;
    fn supplier_count(&self) -> usize;
    fn service_count(&self) -> usize;
    fn supplier_modulus(&self) -> usize;
    fn warmup_rounds(&self) -> usize;
    fn rounds(&self) -> usize;
    fn pedantic_rounds(&self) -> usize;
    fn pedantic_iterations(&self) -> usize;
    fn soak_duration_secs(&self) -> f64;
    fn sample_interval_ms(&self) -> u64;
    fn include_naive(&self) -> bool;
    fn output_path(&self) -> &str;
    fn output_formats(&self) -> &[String];
}
