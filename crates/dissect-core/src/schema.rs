//! Header field-layout schema and its fingerprint.
//!
//! The schema is the contract with the accessor code generator: an ordered
//! list of fields, each with a scalar type and optional getter/setter
//! directives. Offsets are cumulative in declaration order.
//!
//! The fingerprint is a CRC-16/MODBUS over, per field, its name, type,
//! decimal offset, and the getter then setter mapping functions when
//! present. Generated code embeds it as a compatibility tag. The header's
//! version constant is the fingerprint of [`Layout::header`].

use crc::{CRC_16_MODBUS, Crc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const LAYOUT_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    U8,
    U16,
    U32,
    U64,
}

impl ScalarType {
    /// Width in bytes.
    pub fn width(self) -> usize {
        match self {
            ScalarType::U8 => 1,
            ScalarType::U16 => 2,
            ScalarType::U32 => 4,
            ScalarType::U64 => 8,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScalarType::U8 => "u8",
            ScalarType::U16 => "u16",
            ScalarType::U32 => "u32",
            ScalarType::U64 => "u64",
        }
    }
}

/// Getter or setter directive for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accessor {
    /// Name of the generated function.
    #[serde(rename = "fn")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vis: Option<String>,
    #[serde(default, rename = "unsafe")]
    pub is_unsafe: bool,
    /// Function applied to the value on the way in or out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ScalarType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Accessor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<Accessor>,
}

/// A field placed at its computed offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedField<'a> {
    pub field: &'a FieldSpec,
    pub offset: usize,
}

impl PlacedField<'_> {
    pub fn width(&self) -> usize {
        self.field.ty.width()
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.width()
    }
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("schema declares no fields")]
    Empty,
    #[error("duplicate field name: {name}")]
    DuplicateField { name: String },
}

/// Ordered field layout.
///
/// # Examples
/// ```
/// use dissect_core::packet::{HEADER_SIZE, PROTOCOL_VERSION};
/// use dissect_core::schema::Layout;
///
/// let layout = Layout::header();
/// assert_eq!(layout.size(), HEADER_SIZE);
/// assert_eq!(layout.fingerprint(), PROTOCOL_VERSION);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    fields: Vec<FieldSpec>,
}

impl Layout {
    /// # Errors
    /// Returns `SchemaError` when `fields` is empty or repeats a name.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        if fields.is_empty() {
            return Err(SchemaError::Empty);
        }
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|prior| prior.name == field.name) {
                return Err(SchemaError::DuplicateField {
                    name: field.name.clone(),
                });
            }
        }
        Ok(Self { fields })
    }

    /// Parse a JSON array of field specs.
    ///
    /// # Errors
    /// Returns `SchemaError` on malformed JSON, unknown scalar types, or an
    /// invalid field list.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let fields: Vec<FieldSpec> = serde_json::from_str(json)?;
        Self::new(fields)
    }

    /// Layout of the packet header decoded by [`crate::packet`].
    pub fn header() -> Self {
        let field = |name: &str, ty: ScalarType, map: Option<(&str, &str)>| FieldSpec {
            name: name.to_string(),
            ty,
            get: Some(accessor(&format!("unsafe_get_{name}"), map.map(|m| m.0))),
            set: Some(accessor(&format!("unsafe_set_{name}"), map.map(|m| m.1))),
        };
        let be = Some(("u16::from_be", "u16::to_be"));

        Self {
            fields: vec![
                field("version", ScalarType::U16, be),
                field("packet_length", ScalarType::U16, be),
                field("header_checksum", ScalarType::U16, None),
                field("flags", ScalarType::U8, None),
                field("packet_id", ScalarType::U8, None),
            ],
        }
    }

    /// Fields with their offsets, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = PlacedField<'_>> {
        self.fields.iter().scan(0usize, |offset, field| {
            let placed = PlacedField {
                field,
                offset: *offset,
            };
            *offset += field.ty.width();
            Some(placed)
        })
    }

    pub fn field(&self, name: &str) -> Option<PlacedField<'_>> {
        self.fields().find(|placed| placed.field.name == name)
    }

    /// Total size in bytes.
    pub fn size(&self) -> usize {
        self.fields.iter().map(|field| field.ty.width()).sum()
    }

    /// The string the fingerprint is computed over.
    pub fn fingerprint_input(&self) -> String {
        let mut input = String::new();
        for placed in self.fields() {
            let field = placed.field;
            input.push_str(&field.name);
            input.push_str(field.ty.as_str());
            input.push_str(&placed.offset.to_string());
            for accessor in [&field.get, &field.set].into_iter().flatten() {
                if let Some(map) = &accessor.map {
                    input.push_str(map);
                }
            }
        }
        input
    }

    pub fn fingerprint(&self) -> u16 {
        LAYOUT_CRC.checksum(self.fingerprint_input().as_bytes())
    }
}

fn accessor(name: &str, map: Option<&str>) -> Accessor {
    Accessor {
        name: name.to_string(),
        vis: Some("pub".to_string()),
        is_unsafe: true,
        map: map.map(str::to_string),
    }
}
