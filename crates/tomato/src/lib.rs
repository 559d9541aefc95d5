//! Tomato: an embedded JavaScript context.
//!
//! Compiles and runs script text in an isolated V8 context, exposes host
//! functions as JavaScript globals, and hands results back as Rust values.
//!
//! # Architecture
//!
//! - [`Context`] owns one isolate (via `deno_core::JsRuntime`) and runs the
//!   compile/run pipeline inside a scoped handle region
//! - [`bridge`] converts primitives directly and everything else through the
//!   script's own `JSON.stringify`
//! - [`natives`] holds the functions installed on the global object at
//!   construction time, including `debug(...args)`
//! - [`error`] turns captured engine exceptions into [`ContextError`]s
//!
//! ```ignore
//! let mut ctx = tomato::Context::new()?;
//! assert_eq!(ctx.run("6 * 7")?.as_i64(), Some(42));
//! assert_eq!(ctx.run("({ a: 1 })")?.as_str(), Some(r#"{"a":1}"#));
//! ```

pub mod binding;
pub mod bridge;
pub mod config;
pub mod context;
pub mod error;
pub mod natives;
mod ops;

pub use binding::RunArgs;
pub use bridge::{Conversion, HostValue, Shape};
pub use config::{ContextConfig, DYNAMIC_SCRIPT_NAME};
pub use context::{init_platform, Context, ContextBuilder, ScriptUnit};
pub use error::{ContextError, EngineError, Phase, Result, SourceLocation};
pub use natives::{DebugLog, DebugOutput, DebugSink, NativeFunction, NativeRegistry};

/// Re-exported so callers can write native callbacks against the same V8.
pub use deno_core::v8;
