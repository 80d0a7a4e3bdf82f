//! Data module - spreadsheet loading and cleaning

mod cleaner;
pub mod dates;
mod loader;

pub use cleaner::DataCleaner;
pub use loader::{is_numeric_dtype, LoaderError, OrderLoader};

/// Required column names, exact spelling.
pub const ORDER_DATE: &str = "Order Date";
pub const CATEGORY: &str = "Category";
pub const PRODUCT_NAME: &str = "Product Name";
pub const PRICE: &str = "Price";
pub const QUANTITY: &str = "Quantity";

pub const REQUIRED_COLUMNS: [&str; 5] = [ORDER_DATE, CATEGORY, PRODUCT_NAME, PRICE, QUANTITY];
