pub mod table;

pub use table::{RawTable, TableReader};
