use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;

use crate::domain::ports::{ServiceIdentity, SupplierIdentity};

/// Field holding a document's own identifier.
pub const DOCUMENT_ID_FIELD: &str = "_id";
/// Field on a service document pointing at the supplier that offers it.
pub const DOCUMENT_SUPPLIER_FIELD: &str = "fornitore_associato";

const NOT_SPECIFIED: &str = "Not specified";

/// Canonical string form of an identifier.
///
/// Integers render in decimal, strings are trimmed, and Mongo
/// extended-JSON object ids (`{"$oid": "..."}`) are lower-cased, so that
/// `7`, `"7"` and `" 7 "` all compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "String")]
pub struct NormalizedId(String);

impl NormalizedId {
    /// Returns `None` for empty or whitespace-only input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Some(Self(u.to_string()))
                } else if let Some(i) = n.as_i64() {
                    Some(Self(i.to_string()))
                } else {
                    // 7.0 is still the integer 7; 7.5 is not an identifier
                    let f = n.as_f64()?;
                    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
                        Some(Self((f as i64).to_string()))
                    } else {
                        None
                    }
                }
            }
            Value::Object(map) if map.len() == 1 => match map.get("$oid") {
                Some(Value::String(hex)) => Self::parse(&hex.to_ascii_lowercase()),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for NormalizedId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for NormalizedId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<usize> for NormalizedId {
    fn from(value: usize) -> Self {
        Self(value.to_string())
    }
}

impl From<NormalizedId> for String {
    fn from(value: NormalizedId) -> Self {
        value.0
    }
}

impl TryFrom<Value> for NormalizedId {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(&value).ok_or_else(|| format!("not an identifier: {}", value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SupplierRecord {
    pub id: NormalizedId,
}

impl SupplierRecord {
    pub fn new(id: NormalizedId) -> Self {
        Self { id }
    }
}

impl SupplierIdentity for SupplierRecord {
    fn supplier_id(&self) -> Option<Cow<'_, NormalizedId>> {
        Some(Cow::Borrowed(&self.id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub id: NormalizedId,
    pub supplier: NormalizedId,
}

impl ServiceRecord {
    pub fn new(id: NormalizedId, supplier: NormalizedId) -> Self {
        Self { id, supplier }
    }
}

impl ServiceIdentity for ServiceRecord {
    fn service_id(&self) -> Option<Cow<'_, NormalizedId>> {
        Some(Cow::Borrowed(&self.id))
    }

    fn supplier_ref(&self) -> Option<Cow<'_, NormalizedId>> {
        Some(Cow::Borrowed(&self.supplier))
    }
}

/// Loosely typed record as stored in the document database.
///
/// Identifier lookups are fallible: a document may lack the field or carry
/// a value that is not an identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(pub Value);

impl Document {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn field_id(&self, field: &str) -> Option<NormalizedId> {
        self.get(field).and_then(NormalizedId::from_value)
    }

    fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }
}

impl SupplierIdentity for Document {
    const ID_FIELD: &'static str = DOCUMENT_ID_FIELD;

    fn supplier_id(&self) -> Option<Cow<'_, NormalizedId>> {
        self.field_id(DOCUMENT_ID_FIELD).map(Cow::Owned)
    }
}

impl ServiceIdentity for Document {
    const ID_FIELD: &'static str = DOCUMENT_ID_FIELD;
    const SUPPLIER_FIELD: &'static str = DOCUMENT_SUPPLIER_FIELD;

    fn service_id(&self) -> Option<Cow<'_, NormalizedId>> {
        self.field_id(DOCUMENT_ID_FIELD).map(Cow::Owned)
    }

    fn supplier_ref(&self) -> Option<Cow<'_, NormalizedId>> {
        self.field_id(DOCUMENT_SUPPLIER_FIELD).map(Cow::Owned)
    }
}

/// Supplier-specific part of a user document, with defaults for anything
/// the document leaves out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierProfile {
    pub id: NormalizedId,
    pub email: Option<String>,
    pub description: String,
    pub max_daily_events: u32,
    pub working_hours: String,
    /// Base64-encoded images, kept encoded.
    pub photos: Vec<String>,
    pub city: String,
    pub street: String,
    pub vat_number: String,
    pub is_location: bool,
}

impl SupplierProfile {
    /// Returns `None` only when the document has no usable `_id`.
    pub fn from_document(doc: &Document) -> Option<Self> {
        let id = doc.field_id(DOCUMENT_ID_FIELD)?;
        let empty = serde_json::Map::new();
        let info = doc
            .get("Fornitore")
            .and_then(Value::as_object)
            .unwrap_or(&empty);

        let text = |key: &str| {
            info.get(key)
                .and_then(Value::as_str)
                .unwrap_or(NOT_SPECIFIED)
                .to_string()
        };

        let mut photos = Vec::new();
        if let Some(entries) = info.get("Foto").and_then(Value::as_array) {
            for (i, entry) in entries.iter().enumerate() {
                match entry.as_str() {
                    Some(encoded) => photos.push(encoded.to_string()),
                    None => tracing::warn!(
                        "Supplier {}: photo {} is not a base64 string, skipped",
                        id,
                        i
                    ),
                }
            }
        }

        Some(Self {
            email: doc.text("email").map(str::to_string),
            description: text("Descrizione"),
            max_daily_events: info
                .get("EventiMassimiGiornaliero")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0),
            working_hours: text("OrarioDiLavoro"),
            photos,
            city: text("Citta"),
            street: text("Via"),
            vat_number: text("Partita_Iva"),
            is_location: info
                .get("isLocation")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            id,
        })
    }
}

impl SupplierIdentity for SupplierProfile {
    fn supplier_id(&self) -> Option<Cow<'_, NormalizedId>> {
        Some(Cow::Borrowed(&self.id))
    }
}
