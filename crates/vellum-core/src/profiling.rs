//! Profiling utilities based on the `puffin` crate.
//!
//! With the `profiling` feature disabled the scope macros expand to nothing, so
//! call sites never need their own `cfg` guards.

#[cfg(feature = "profiling")]
pub use puffin::{profile_function, profile_scope};

#[cfg(not(feature = "profiling"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __vellum_profile_noop {
    ($($arg:tt)*) => {};
}

#[cfg(not(feature = "profiling"))]
pub use crate::__vellum_profile_noop as profile_function;
#[cfg(not(feature = "profiling"))]
pub use crate::__vellum_profile_noop as profile_scope;

/// Default address of the puffin HTTP server.
pub const DEFAULT_PUFFIN_ADDRESS: &str = "0.0.0.0:8585";

/// Profiling backend options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfilingBackend {
    /// Send profiling data to puffin_viewer via HTTP.
    PuffinHttp {
        /// Socket address the server binds to.
        address: String,
    },
}

impl Default for ProfilingBackend {
    fn default() -> Self {
        ProfilingBackend::PuffinHttp {
            address: DEFAULT_PUFFIN_ADDRESS.to_string(),
        }
    }
}

#[cfg(feature = "profiling")]
static PROFILING_SERVER: std::sync::OnceLock<puffin_http::Server> = std::sync::OnceLock::new();

/// Start collecting profiling scopes and serve them through `backend`.
///
/// Returns `false` if the backend could not be started (or profiling is compiled out).
#[cfg(feature = "profiling")]
pub fn init_profiling(backend: ProfilingBackend) -> bool {
    match backend {
        ProfilingBackend::PuffinHttp { address } => {
            puffin::set_scopes_on(true);
            match puffin_http::Server::new(&address) {
                Ok(server) => {
                    tracing::info!("Puffin profiler server started on http://{}", address);
                    let _ = PROFILING_SERVER.set(server);
                    true
                }
                Err(e) => {
                    tracing::error!("Failed to start puffin server on {}: {}", address, e);
                    false
                }
            }
        }
    }
}

#[cfg(not(feature = "profiling"))]
pub fn init_profiling(_backend: ProfilingBackend) -> bool {
    tracing::warn!("Profiling requested but the `profiling` feature is disabled");
    false
}

/// Close the current profiling frame.
///
/// The asset system calls this whenever the last open compilation batch ends, so
/// one frame in the viewer corresponds to one batch of compiled assets.
#[inline]
pub fn new_frame() {
    #[cfg(feature = "profiling")]
    puffin::GlobalProfiler::lock().new_frame();
}
