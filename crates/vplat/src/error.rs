use thiserror::Error;

/// Every fatal condition the kernel can raise, from config parsing through
/// binding resolution, plus [`VpError::InterfaceCallOnUnboundPort`], which is
/// never returned as an `Err` — it exists only so the unbound-port no-op
/// path in [`crate::port`] has a typed message to log (see
/// [`crate::interface`]).
#[derive(Error, Debug)]
pub enum VpError {
    #[error("failed to parse configuration")]
    ConfigParse(#[from] serde_json::Error),

    #[error("config lookup at '{path}' failed: {reason}")]
    ConfigLookup { path: String, reason: String },

    #[error("module '{name}' not found (searched: {searched:?})")]
    ModuleNotFound { name: String, searched: Vec<String> },

    #[error("failed to load module at '{path}'")]
    ModuleLoad {
        path: String,
        #[source]
        source: libloading::Error,
    },

    #[error("module '{module}' exposes neither vp_constructor nor gv_new")]
    FactoryMissing { module: String },

    #[error("binding error: {0}")]
    Binding(String),

    /// Logged, never propagated: see the type-level doc comment above.
    #[error("interface call on unbound port '{port}'")]
    InterfaceCallOnUnboundPort { port: String },

    #[error("assertion failed at '{path}': {message}")]
    Assertion { path: String, message: String },

    #[error("simulated target fault in '{component}'")]
    SimulatedTargetFault {
        component: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

pub type VpResult<T> = Result<T, VpError>;
