pub mod logging;
pub mod runtime;

pub use logging::init_logging;
pub use runtime::block_on;
