//! Deno ops available to scripts.
//!
//! Ops complement the global natives: they are registered through a
//! deno_core extension and reached from JS as `Deno.core.ops.<name>`.

use deno_core::op2;

/// Write a message to the Rust tracing system at the given level.
#[op2(fast)]
pub fn op_log(#[string] level: &str, #[string] msg: &str) {
    match level {
        "error" => tracing::error!(target: "tomato.js", "{}", msg),
        "warn" => tracing::warn!(target: "tomato.js", "{}", msg),
        "debug" => tracing::debug!(target: "tomato.js", "{}", msg),
        "trace" => tracing::trace!(target: "tomato.js", "{}", msg),
        _ => tracing::info!(target: "tomato.js", "{}", msg),
    }
}

deno_core::extension!(tomato_ops, ops = [op_log]);
