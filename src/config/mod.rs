pub mod defaults;
pub mod loader;
pub mod types;

pub use defaults::{API_URL_ENV, DEFAULT_API_URL};
pub use loader::ConfigLoader;
pub use types::*;
