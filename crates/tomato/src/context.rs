//! Script execution context.
//!
//! A [`Context`] owns one V8 isolate and its main context through a
//! `deno_core::JsRuntime`. Every operation that touches engine values runs
//! inside a handle scope entered into that context; the scope (and any
//! `TryCatch` nested in it) is released when the operation returns, whether it
//! succeeded or not. Values only leave a scope as owned [`HostValue`]s.
//!
//! Contexts are not `Send`. Use one per thread.

use std::sync::Mutex;
use std::sync::Once;

use deno_core::v8;
use deno_core::Extension;
use deno_core::JsRuntime;
use deno_core::RuntimeOptions;

use crate::bridge::{self, HostValue};
use crate::config::ContextConfig;
use crate::error::{ContextError, EngineError, Phase, Result};
use crate::natives::{DebugSink, NativeFunction, NativeRegistry};
use crate::ops::tomato_ops;

/// Ensure V8 platform is initialized exactly once.
static V8_INIT: Once = Once::new();

/// Mutex to serialize V8 isolate creation.
static ISOLATE_CREATE_LOCK: Mutex<()> = Mutex::new(());

/// Initialize the V8 platform. Safe to call multiple times - will only
/// initialize once. Called implicitly when the first context is built.
pub fn init_platform() {
    V8_INIT.call_once(|| {
        JsRuntime::init_platform(None, false);
    });
}

/// Source text plus the name it is reported under. Lives for one run.
#[derive(Debug, Clone, Copy)]
pub struct ScriptUnit<'a> {
    pub source: &'a str,
    pub name: &'a str,
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Collects everything that must be fixed before the engine context exists.
pub struct ContextBuilder {
    config: ContextConfig,
    natives: NativeRegistry,
    extensions: Vec<Extension>,
    debug_sink: Option<DebugSink>,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self {
            config: ContextConfig::default(),
            natives: NativeRegistry::default(),
            extensions: Vec::new(),
            debug_sink: None,
        }
    }
}

impl ContextBuilder {
    pub fn config(mut self, config: ContextConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the whole native registry (including the built-in `debug`).
    pub fn natives(mut self, natives: NativeRegistry) -> Self {
        self.natives = natives;
        self
    }

    /// Add one native global function.
    pub fn native(mut self, function: NativeFunction) -> Self {
        self.natives.register(function);
        self
    }

    /// Add a deno_core extension (ops, global template middleware).
    pub fn extension(mut self, extension: Extension) -> Self {
        self.extensions.push(extension);
        self
    }

    /// Override where `debug` writes, ignoring `config.debug_output`.
    pub fn debug_sink(mut self, sink: DebugSink) -> Self {
        self.debug_sink = Some(sink);
        self
    }

    /// Create the isolate and its context, then install the natives.
    ///
    /// No user script runs here.
    pub fn build(self) -> Result<Context> {
        let ContextBuilder {
            config,
            natives,
            extensions,
            debug_sink,
        } = self;

        init_platform();

        let mut all_extensions = vec![tomato_ops::init_ops_and_esm()];
        all_extensions.extend(extensions);

        let mut runtime = {
            let _lock = ISOLATE_CREATE_LOCK
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            tracing::debug!(natives = natives.len(), "creating JsRuntime");
            JsRuntime::try_new(RuntimeOptions {
                extensions: all_extensions,
                create_params: config.create_params(),
                ..Default::default()
            })
            .map_err(|e| ContextError::FatalInit(e.to_string()))?
        };

        let sink = debug_sink.unwrap_or_else(|| config.debug_output.into());
        runtime.v8_isolate().set_slot(sink);

        {
            let scope = &mut runtime.handle_scope();
            natives.install(scope)?;
        }

        tracing::debug!("context ready");

        Ok(Context {
            runtime,
            script_name: config.script_name,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Context
// ─────────────────────────────────────────────────────────────────────────────

/// An isolated JavaScript execution environment.
///
/// Globals persist across [`run`](Context::run) calls on the same context
/// and are never shared between contexts.
pub struct Context {
    runtime: JsRuntime,
    script_name: String,
}

impl Context {
    /// Create a context with default configuration and the `debug` native.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    pub fn with_config(config: ContextConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    /// Run `source` under the configured default name.
    pub fn run(&mut self, source: &str) -> Result<HostValue> {
        let Context {
            runtime,
            script_name,
        } = self;
        let unit = ScriptUnit {
            source,
            name: script_name,
        };
        execute(runtime, unit)
    }

    /// Run `source`, reporting errors and stack frames under `name`.
    pub fn run_named(&mut self, source: &str, name: &str) -> Result<HostValue> {
        execute(&mut self.runtime, ScriptUnit { source, name })
    }

    /// Give `f` the global object inside an active scope.
    ///
    /// Handles cannot outlive the closure.
    pub fn with_global<R>(
        &mut self,
        f: impl for<'s> FnOnce(&mut v8::HandleScope<'s>, v8::Local<'s, v8::Object>) -> R,
    ) -> R {
        let scope = &mut self.runtime.handle_scope();
        let global = scope.get_current_context().global(scope);
        f(scope, global)
    }

    /// Set a global variable from a host value.
    pub fn bind(&mut self, name: &str, value: impl Into<HostValue>) -> Result<()> {
        let value = value.into();
        tracing::debug!(name, %value, "binding global");
        self.with_global(|scope, global| {
            let local = bridge::to_engine(scope, &value)?;
            set_property(scope, global, name, local)
        })
    }

    /// Set a global variable from JSON data (objects and arrays included).
    pub fn bind_json(&mut self, name: &str, value: &serde_json::Value) -> Result<()> {
        tracing::debug!(name, "binding JSON global");
        self.with_global(|scope, global| {
            let local = bridge::json_to_engine(scope, value)?;
            set_property(scope, global, name, local)
        })
    }

    /// Dispose of the engine context. Consuming `self` makes a second
    /// disposal impossible.
    pub fn dispose(self) {
        drop(self);
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        tracing::debug!("disposing context");
    }
}

/// Compile and run one unit inside a fresh handle scope.
fn execute(runtime: &mut JsRuntime, unit: ScriptUnit) -> Result<HostValue> {
    tracing::debug!(script = unit.name, bytes = unit.source.len(), "running script");
    let scope = &mut runtime.handle_scope();
    compile_and_run(scope, unit)
}

fn compile_and_run(scope: &mut v8::HandleScope, unit: ScriptUnit) -> Result<HostValue> {
    let tc = &mut v8::TryCatch::new(scope);

    let source = v8::String::new(tc, unit.source)
        .ok_or_else(|| ContextError::Argument("script source is too large".to_string()))?;
    let name = v8::String::new(tc, unit.name)
        .ok_or_else(|| ContextError::Argument("script name is too large".to_string()))?;
    let origin = script_origin(tc, name);

    let Some(script) = v8::Script::compile(tc, source, Some(&origin)) else {
        return Err(EngineError::capture(tc, Phase::Compile).into());
    };

    let Some(result) = script.run(tc) else {
        return Err(EngineError::capture(tc, Phase::Run).into());
    };

    bridge::to_host_or_json(tc, result)
}

fn script_origin<'s>(
    scope: &mut v8::HandleScope<'s>,
    name: v8::Local<'s, v8::String>,
) -> v8::ScriptOrigin<'s> {
    v8::ScriptOrigin::new(
        scope,
        name.into(),
        0,
        0,
        false,
        0,
        None,
        false,
        false,
        false,
        None,
    )
}

fn set_property<'s>(
    scope: &mut v8::HandleScope<'s>,
    object: v8::Local<'s, v8::Object>,
    name: &str,
    value: v8::Local<'s, v8::Value>,
) -> Result<()> {
    let key = v8::String::new(scope, name)
        .ok_or_else(|| ContextError::Argument(format!("invalid global name {}", name)))?;
    object
        .set(scope, key.into(), value)
        .map(|_| ())
        .ok_or_else(|| ContextError::Serialization(format!("failed to set global {}", name)))
}
