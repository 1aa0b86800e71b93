//! Matching services to the suppliers that offer them.

use crate::domain::model::NormalizedId;
use crate::domain::ports::{ServiceIdentity, SupplierIdentity};
use crate::utils::error::{BeventError, RecordRole, Result};
use std::borrow::Cow;
use std::collections::HashSet;

/// Returns the services whose supplier reference matches one of
/// `suppliers`, in the order they appear in `services`.
///
/// Supplier ids go into a hash set first, so the whole call is
/// O(N + M). Services pointing at unknown suppliers are dropped. An
/// element without a usable identifier fails the whole call with
/// [`BeventError::MissingIdentifier`].
pub fn filter_services_by_supplier<S, F>(services: &[S], suppliers: &[F]) -> Result<Vec<S>>
where
    S: ServiceIdentity + Clone,
    F: SupplierIdentity,
{
    Ok(filter_services_by_supplier_ref(services, suppliers)?
        .into_iter()
        .cloned()
        .collect())
}

/// Same as [`filter_services_by_supplier`] but borrows the matches.
pub fn filter_services_by_supplier_ref<'s, S, F>(
    services: &'s [S],
    suppliers: &[F],
) -> Result<Vec<&'s S>>
where
    S: ServiceIdentity,
    F: SupplierIdentity,
{
    if suppliers.is_empty() || services.is_empty() {
        return Ok(Vec::new());
    }

    let mut supplier_ids: HashSet<Cow<'_, NormalizedId>> = HashSet::with_capacity(suppliers.len());
    for (index, supplier) in suppliers.iter().enumerate() {
        supplier_ids.insert(supplier_key(supplier, index)?);
    }

    let mut filtered = Vec::new();
    for (index, service) in services.iter().enumerate() {
        let supplier_ref = service_key(service, index)?;
        if supplier_ids.contains(&*supplier_ref) {
            filtered.push(service);
        }
    }

    Ok(filtered)
}

/// Linear-membership version of [`filter_services_by_supplier`], O(N·M).
///
/// Kept as a correctness oracle and as the baseline the benchmarks
/// compare against.
pub fn filter_services_by_supplier_naive<S, F>(services: &[S], suppliers: &[F]) -> Result<Vec<S>>
where
    S: ServiceIdentity + Clone,
    F: SupplierIdentity,
{
    if suppliers.is_empty() || services.is_empty() {
        return Ok(Vec::new());
    }

    let mut supplier_ids: Vec<Cow<'_, NormalizedId>> = Vec::with_capacity(suppliers.len());
    for (index, supplier) in suppliers.iter().enumerate() {
        supplier_ids.push(supplier_key(supplier, index)?);
    }

    let mut filtered = Vec::new();
    for (index, service) in services.iter().enumerate() {
        let supplier_ref = service_key(service, index)?;
        if supplier_ids.iter().any(|id| **id == *supplier_ref) {
            filtered.push(service.clone());
        }
    }

    Ok(filtered)
}

fn supplier_key<F: SupplierIdentity>(supplier: &F, index: usize) -> Result<Cow<'_, NormalizedId>> {
    supplier
        .supplier_id()
        .ok_or_else(|| BeventError::MissingIdentifier {
            role: RecordRole::Supplier,
            index,
            field: F::ID_FIELD.to_string(),
        })
}

fn service_key<S: ServiceIdentity>(service: &S, index: usize) -> Result<Cow<'_, NormalizedId>> {
    service
        .supplier_ref()
        .ok_or_else(|| BeventError::MissingIdentifier {
            role: RecordRole::Service,
            index,
            field: S::SUPPLIER_FIELD.to_string(),
        })
}
