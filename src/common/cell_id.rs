//! Cell identifier codec and detector element identifiers
//!
//! Every tracker hit carries a 64-bit cell identifier whose bits pack the
//! subdetector, side, layer, module and sensor the hit was recorded on. The
//! packing is described by an encoding string of comma-separated fields:
//!
//! ```text
//! subdet:5,side:-2,layer:9,module:8,sensor:8
//! ```
//!
//! Each item is `name:width` (placed right after the previous field) or
//! `name:offset:width`. A negative width marks a signed, two's complement field.
//!
//! Detector elements are identified by the low 32 bits of the cell identifier
//! ([`DetectorElementId`]). Element identifiers are only ever compared by their
//! raw integer value.

use std::fmt;

use super::constants::{FIELD_LAYER, FIELD_MODULE, FIELD_SENSOR, FIELD_SIDE, FIELD_SUBDET};

/// Errors from parsing an encoding string or packing field values
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellIdError {
    /// The encoding string is malformed
    InvalidEncoding {
        /// Description of the problem
        description: String,
    },

    /// The requested field is not part of the encoding
    UnknownField {
        /// Field name
        name: String,
    },

    /// The value cannot be represented in the field
    ValueOutOfRange {
        /// Field name
        field: String,
        /// Rejected value
        value: i64,
        /// Smallest representable value
        min: i64,
        /// Largest representable value
        max: i64,
    },
}

impl fmt::Display for CellIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellIdError::InvalidEncoding { description } => {
                write!(f, "Invalid cell id encoding: {}", description)
            }
            CellIdError::UnknownField { name } => {
                write!(f, "Unknown cell id field '{}'", name)
            }
            CellIdError::ValueOutOfRange {
                field,
                value,
                min,
                max,
            } => write!(
                f,
                "Value {} out of range [{}, {}] for cell id field '{}'",
                value, min, max, field
            ),
        }
    }
}

impl std::error::Error for CellIdError {}

/// A single named field of a cell identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitField {
    name: String,
    offset: u32,
    width: u32,
    signed: bool,
}

impl BitField {
    fn new(name: &str, offset: u32, width: u32, signed: bool) -> Self {
        Self {
            name: name.to_string(),
            offset,
            width,
            signed,
        }
    }

    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bit offset of the least significant bit
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Number of bits
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Whether the field holds a signed value
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    #[inline]
    fn low_mask(&self) -> u64 {
        (1u64 << self.width) - 1
    }

    #[inline]
    fn mask(&self) -> u64 {
        self.low_mask() << self.offset
    }

    /// Smallest value the field can hold
    pub fn min_value(&self) -> i64 {
        if self.signed {
            -(1i64 << (self.width - 1))
        } else {
            0
        }
    }

    /// Largest value the field can hold
    pub fn max_value(&self) -> i64 {
        if self.signed {
            (1i64 << (self.width - 1)) - 1
        } else {
            self.low_mask() as i64
        }
    }

    fn extract(&self, cell_id: u64) -> i64 {
        let raw = (cell_id >> self.offset) & self.low_mask();
        if self.signed && raw & (1u64 << (self.width - 1)) != 0 {
            raw as i64 - (1i64 << self.width)
        } else {
            raw as i64
        }
    }

    fn insert(&self, cell_id: u64, value: i64) -> Result<u64, CellIdError> {
        if value < self.min_value() || value > self.max_value() {
            return Err(CellIdError::ValueOutOfRange {
                field: self.name.clone(),
                value,
                min: self.min_value(),
                max: self.max_value(),
            });
        }
        let bits = (value as u64) & self.low_mask();
        Ok((cell_id & !self.mask()) | (bits << self.offset))
    }
}

/// Decoded position of a detector element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ElementFields {
    /// Subdetector index
    pub subdet: i64,
    /// Detector side (0 when the encoding has no side field)
    pub side: i64,
    /// Layer index
    pub layer: i64,
    /// Module (stave / ladder / petal) index
    pub module: i64,
    /// Sensor index within the module
    pub sensor: i64,
}

/// Bit-field codec for cell identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellIdCodec {
    encoding: String,
    fields: Vec<BitField>,
}

impl CellIdCodec {
    /// Parse an encoding string.
    ///
    /// # Errors
    /// Returns [`CellIdError::InvalidEncoding`] for malformed items, duplicate
    /// names, zero or oversized widths, overlapping fields, or layouts that
    /// exceed 64 bits.
    pub fn parse(encoding: &str) -> Result<Self, CellIdError> {
        let invalid = |description: String| CellIdError::InvalidEncoding { description };

        let mut fields: Vec<BitField> = Vec::new();
        let mut next_offset = 0u32;

        for item in encoding.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let parts: Vec<&str> = item.split(':').map(str::trim).collect();
            let (name, offset, width) = match parts.as_slice() {
                [name, width] => (*name, next_offset, *width),
                [name, offset, width] => {
                    let offset = offset
                        .parse::<u32>()
                        .map_err(|_| invalid(format!("bad offset in '{}'", item)))?;
                    (*name, offset, *width)
                }
                _ => return Err(invalid(format!("expected name:width in '{}'", item))),
            };

            if name.is_empty() {
                return Err(invalid(format!("empty field name in '{}'", item)));
            }
            if fields.iter().any(|f| f.name == name) {
                return Err(invalid(format!("duplicate field '{}'", name)));
            }

            let width: i64 = width
                .parse()
                .map_err(|_| invalid(format!("bad width in '{}'", item)))?;
            let signed = width < 0;
            let width = width.unsigned_abs();
            if width == 0 || width > 63 {
                return Err(invalid(format!("width of '{}' must be within 1..=63", name)));
            }
            let width = width as u32;
            let end = offset
                .checked_add(width)
                .filter(|&end| end <= 64)
                .ok_or_else(|| invalid(format!("field '{}' exceeds 64 bits", name)))?;

            let field = BitField::new(name, offset, width, signed);
            if let Some(other) = fields.iter().find(|f| f.mask() & field.mask() != 0) {
                return Err(invalid(format!(
                    "field '{}' overlaps field '{}'",
                    name, other.name
                )));
            }

            next_offset = end;
            fields.push(field);
        }

        if fields.is_empty() {
            return Err(invalid("no fields".to_string()));
        }

        Ok(Self {
            encoding: encoding.to_string(),
            fields,
        })
    }

    /// Codec for the standard tracker layout
    /// ([`ILD_CELL_ID_ENCODING`](super::constants::ILD_CELL_ID_ENCODING)).
    pub fn ild() -> Self {
        Self {
            encoding: super::constants::ILD_CELL_ID_ENCODING.to_string(),
            fields: vec![
                BitField::new(FIELD_SUBDET, 0, 5, false),
                BitField::new(FIELD_SIDE, 5, 2, true),
                BitField::new(FIELD_LAYER, 7, 9, false),
                BitField::new(FIELD_MODULE, 16, 8, false),
                BitField::new(FIELD_SENSOR, 24, 8, false),
            ],
        }
    }

    /// The encoding string this codec was built from
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// All fields in declaration order
    pub fn fields(&self) -> &[BitField] {
        &self.fields
    }

    /// Look up a field by name
    pub fn field(&self, name: &str) -> Result<&BitField, CellIdError> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| CellIdError::UnknownField {
                name: name.to_string(),
            })
    }

    #[inline]
    fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Read a field from a cell identifier
    pub fn value(&self, cell_id: u64, name: &str) -> Result<i64, CellIdError> {
        Ok(self.field(name)?.extract(cell_id))
    }

    /// Return `cell_id` with one field replaced
    pub fn with_value(&self, cell_id: u64, name: &str, value: i64) -> Result<u64, CellIdError> {
        self.field(name)?.insert(cell_id, value)
    }

    /// Pack field values into a fresh identifier; unspecified fields are zero.
    pub fn encode(&self, values: &[(&str, i64)]) -> Result<u64, CellIdError> {
        values
            .iter()
            .try_fold(0u64, |id, &(name, value)| self.with_value(id, name, value))
    }

    /// Decode the element position fields of an element identifier
    pub fn element_fields(&self, id: DetectorElementId) -> Result<ElementFields, CellIdError> {
        let raw = id.raw() as u64;
        let side = if self.has_field(FIELD_SIDE) {
            self.value(raw, FIELD_SIDE)?
        } else {
            0
        };
        Ok(ElementFields {
            subdet: self.value(raw, FIELD_SUBDET)?,
            side,
            layer: self.value(raw, FIELD_LAYER)?,
            module: self.value(raw, FIELD_MODULE)?,
            sensor: self.value(raw, FIELD_SENSOR)?,
        })
    }

    /// Pack element position fields into an element identifier
    pub fn element_id(&self, fields: &ElementFields) -> Result<DetectorElementId, CellIdError> {
        let mut id = self.encode(&[
            (FIELD_SUBDET, fields.subdet),
            (FIELD_LAYER, fields.layer),
            (FIELD_MODULE, fields.module),
            (FIELD_SENSOR, fields.sensor),
        ])?;
        if self.has_field(FIELD_SIDE) {
            id = self.with_value(id, FIELD_SIDE, fields.side)?;
        }
        Ok(DetectorElementId::from_cell_id(id))
    }

    /// Identifier of a whole layer: only subdetector and layer are set.
    pub fn layer_key(&self, subdet: i64, layer: i64) -> Result<DetectorElementId, CellIdError> {
        let id = self.encode(&[(FIELD_SUBDET, subdet), (FIELD_LAYER, layer)])?;
        Ok(DetectorElementId::from_cell_id(id))
    }
}

impl Default for CellIdCodec {
    fn default() -> Self {
        Self::ild()
    }
}

/// Identifier of a detector element (the low 32 bits of a cell identifier)
///
/// Equality, ordering and hashing use the raw integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DetectorElementId(u32);

impl DetectorElementId {
    /// The "nothing struck" identifier returned by propagation
    pub const NONE: DetectorElementId = DetectorElementId(0);

    /// Wrap a raw 32-bit identifier
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Element identifier of a full 64-bit cell identifier
    #[inline]
    pub const fn from_cell_id(cell_id: u64) -> Self {
        Self(cell_id as u32)
    }

    /// Raw integer value
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Whether this identifies an actual element
    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for DetectorElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
