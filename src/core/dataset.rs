use crate::domain::model::{Document, NormalizedId, ServiceRecord, SupplierRecord};
use crate::utils::error::{BeventError, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Shape of the synthetic load: `suppliers` ids `0..suppliers`, and
/// service `i` offered by supplier `i % modulus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSpec {
    pub suppliers: usize,
    pub services: usize,
    pub modulus: usize,
}

impl Default for DatasetSpec {
    fn default() -> Self {
        // Half of the services point at suppliers 1000..1999, which do not exist.
        Self {
            suppliers: 1_000,
            services: 10_000,
            modulus: 2_000,
        }
    }
}

impl DatasetSpec {
    /// Number of services the filter must keep for this shape.
    pub fn expected_matches(&self) -> usize {
        if self.modulus == 0 {
            return 0;
        }
        let live = self.suppliers.min(self.modulus);
        let full_cycles = self.services / self.modulus;
        let remainder = self.services % self.modulus;
        full_cycles * live + remainder.min(live)
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticDataset {
    pub spec: DatasetSpec,
    pub suppliers: Vec<SupplierRecord>,
    pub services: Vec<ServiceRecord>,
}

impl SyntheticDataset {
    pub fn generate(spec: DatasetSpec) -> Result<Self> {
        if spec.modulus == 0 {
            return Err(BeventError::InvalidConfigValueError {
                field: "dataset.modulus".to_string(),
                value: "0".to_string(),
                reason: "Modulus must be at least 1".to_string(),
            });
        }

        tracing::debug!(
            "Generating synthetic dataset: {} suppliers, {} services, modulus {}",
            spec.suppliers,
            spec.services,
            spec.modulus
        );

        let suppliers = (0..spec.suppliers)
            .map(|i| SupplierRecord::new(NormalizedId::from(i)))
            .collect();

        let services = (0..spec.services)
            .map(|i| {
                ServiceRecord::new(NormalizedId::from(i), NormalizedId::from(i % spec.modulus))
            })
            .collect();

        Ok(Self {
            spec,
            suppliers,
            services,
        })
    }

    /// The same data as persistence documents: supplier and service `_id`s
    /// are strings, `fornitore_associato` references are integers.
    pub fn to_documents(&self) -> (Vec<Document>, Vec<Document>) {
        let services = self
            .services
            .iter()
            .map(|s| {
                Document::new(json!({
                    "_id": s.id.as_str(),
                    "fornitore_associato": s.supplier.as_str().parse::<u64>().ok(),
                }))
            })
            .collect();

        let suppliers = self
            .suppliers
            .iter()
            .map(|s| Document::new(json!({ "_id": s.id.as_str() })))
            .collect();

        (services, suppliers)
    }
}
