pub mod extractor;
pub mod inventory_builder;

pub use extractor::Extractor;
pub use inventory_builder::{total_storage, InventoryBuilder};
