//! Data model for typed tables and raw cell grids

mod grid;
mod table;
mod value;

pub use grid::{Cell, Grid, Sheet};
pub use table::{Column, Table};
pub use value::{Value, UNDEFINED_LITERAL};
