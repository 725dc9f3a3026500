pub mod loader;
pub mod similarity;
pub mod store;
