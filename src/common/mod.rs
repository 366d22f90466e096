//! Low-level shared pieces: cell identifier codec and constants.

pub mod cell_id;
pub mod constants;

pub use cell_id::{BitField, CellIdCodec, CellIdError, DetectorElementId, ElementFields};
