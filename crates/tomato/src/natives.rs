//! Native functions exposed as JavaScript globals.
//!
//! A [`NativeRegistry`] is assembled before a context exists and consumed
//! when the context is built. There is no way to add a function afterwards.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use deno_core::v8;
use deno_core::v8::MapFnTo;
use serde::Deserialize;

use crate::bridge;
use crate::error::{ContextError, Result};

/// A host callable installed under `name` on the global object.
#[derive(Clone)]
pub struct NativeFunction {
    name: String,
    callback: v8::FunctionCallback,
}

impl NativeFunction {
    /// Wrap a V8 callback, e.g.
    /// `fn f(scope: &mut v8::HandleScope, args: v8::FunctionCallbackArguments, rv: v8::ReturnValue)`.
    pub fn new(name: impl Into<String>, callback: impl MapFnTo<v8::FunctionCallback>) -> Self {
        Self {
            name: name.into(),
            callback: callback.map_fn_to(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeFunction").field("name", &self.name).finish()
    }
}

/// The set of natives a context starts with.
#[derive(Debug, Clone)]
pub struct NativeRegistry {
    functions: Vec<NativeFunction>,
}

impl Default for NativeRegistry {
    /// Registry with the built-in `debug` function.
    fn default() -> Self {
        Self {
            functions: vec![NativeFunction::new("debug", debug)],
        }
    }
}

impl NativeRegistry {
    /// Registry with no functions at all.
    pub fn empty() -> Self {
        Self { functions: Vec::new() }
    }

    /// Add a function. A later registration with the same name replaces the
    /// earlier one.
    pub fn register(&mut self, function: NativeFunction) {
        self.functions.retain(|f| f.name != function.name);
        self.functions.push(function);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Install every function on the global object of the scope's context.
    pub(crate) fn install(self, scope: &mut v8::HandleScope) -> Result<()> {
        let global = scope.get_current_context().global(scope);

        for native in self.functions {
            let name = v8::String::new(scope, &native.name)
                .ok_or_else(|| ContextError::FatalInit(format!("invalid native name {}", native.name)))?;
            let function = v8::Function::builder_raw(native.callback)
                .build(scope)
                .ok_or_else(|| ContextError::FatalInit(format!("failed to create native {}", native.name)))?;
            function.set_name(name);

            if global.set(scope, name.into(), function.into()).is_none() {
                return Err(ContextError::FatalInit(format!(
                    "failed to install native {}",
                    native.name
                )));
            }
            tracing::debug!(name = %native.name, "installed native function");
        }

        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// debug(...args)
// ─────────────────────────────────────────────────────────────────────────────

/// Where configuration sends `debug` output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugOutput {
    #[default]
    Stderr,
    Stdout,
    /// `tracing::info!` with target `tomato.js`
    Log,
}

/// Destination for lines written by `debug`. Stored in an isolate slot.
#[derive(Debug, Clone)]
pub enum DebugSink {
    Output(DebugOutput),
    Capture(DebugLog),
}

impl From<DebugOutput> for DebugSink {
    fn from(output: DebugOutput) -> Self {
        DebugSink::Output(output)
    }
}

impl DebugSink {
    /// A sink that keeps lines in memory, and the handle to read them.
    pub fn capture() -> (Self, DebugLog) {
        let log = DebugLog::default();
        (DebugSink::Capture(log.clone()), log)
    }

    fn write_line(&self, line: &str) {
        match self {
            DebugSink::Output(DebugOutput::Stderr) => {
                let _ = writeln!(std::io::stderr().lock(), "{}", line);
            }
            DebugSink::Output(DebugOutput::Stdout) => {
                let _ = writeln!(std::io::stdout().lock(), "{}", line);
            }
            DebugSink::Output(DebugOutput::Log) => {
                tracing::info!(target: "tomato.js", "{}", line);
            }
            DebugSink::Capture(log) => log.push(line),
        }
    }
}

/// Lines captured by [`DebugSink::capture`].
#[derive(Debug, Clone, Default)]
pub struct DebugLog(Rc<RefCell<Vec<String>>>);

impl DebugLog {
    fn push(&self, line: &str) {
        self.0.borrow_mut().push(line.to_string());
    }

    pub fn lines(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

/// Format each argument as `<json>` and join them with `, `.
///
/// `JSON` is read from the object `debug` was called on, which is the
/// global object for a plain call.
fn format_debug_line<'s>(
    scope: &mut v8::HandleScope<'s>,
    args: &v8::FunctionCallbackArguments<'s>,
) -> Result<String> {
    let holder = args.holder();
    let mut parts = Vec::with_capacity(args.length().max(0) as usize);
    for i in 0..args.length() {
        let text = bridge::to_json_with(scope, holder, args.get(i))?;
        parts.push(format!("<{}>", text));
    }
    Ok(parts.join(", "))
}

fn debug<'s>(
    scope: &mut v8::HandleScope<'s>,
    args: v8::FunctionCallbackArguments<'s>,
    mut rv: v8::ReturnValue,
) {
    match format_debug_line(scope, &args) {
        Ok(line) => {
            let sink = scope
                .get_slot::<DebugSink>()
                .cloned()
                .unwrap_or(DebugSink::Output(DebugOutput::Stderr));
            sink.write_line(&line);
            rv.set(v8::null(scope).into());
        }
        Err(e) => {
            if let Some(msg) = v8::String::new(scope, &e.to_string()) {
                let exception = v8::Exception::error(scope, msg);
                scope.throw_exception(exception);
            }
        }
    }
}
