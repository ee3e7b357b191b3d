use once_cell::sync::OnceCell;
use std::future::Future;
use std::io;
use tokio::runtime::{Builder, Runtime};

/// Global tokio runtime for the catalog client calls made by the CLI
static GLOBAL_RUNTIME: OnceCell<Runtime> = OnceCell::new();

/// The shared runtime, created on first use
pub fn runtime() -> io::Result<&'static Runtime> {
    GLOBAL_RUNTIME.get_or_try_init(|| Builder::new_current_thread().enable_all().build())
}

/// Execute a future on the global runtime
pub fn block_on<F>(future: F) -> io::Result<F::Output>
where
    F: Future,
{
    Ok(runtime()?.block_on(future))
}
