//! Entry points for callers that pass untyped argument lists.
//!
//! Embedders with a dynamic calling convention (a CLI, a scripting-language
//! extension) hand over the raw argument list; it is checked here before it
//! reaches [`Context::run_named`].

use deno_core::v8;

use crate::bridge::HostValue;
use crate::context::Context;
use crate::error::{ContextError, Result};

/// `run(source, filename = default)`, validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunArgs<'a> {
    pub source: &'a str,
    pub filename: Option<&'a str>,
}

impl<'a> RunArgs<'a> {
    /// Accepts one or two arguments: the script, then an optional file name.
    pub fn parse<S: AsRef<str>>(args: &'a [S]) -> Result<Self> {
        match args {
            [] => Err(ContextError::Argument(
                "expected at least 1 argument: the JavaScript to be executed".to_string(),
            )),
            [source] => Ok(Self {
                source: source.as_ref(),
                filename: None,
            }),
            [source, filename] => Ok(Self {
                source: source.as_ref(),
                filename: Some(filename.as_ref()),
            }),
            _ => Err(ContextError::Argument(
                "expected at most 2 arguments: the JavaScript to be executed, and an optional file name"
                    .to_string(),
            )),
        }
    }
}

impl Context {
    /// Run with an unchecked argument list (`source [filename]`).
    pub fn run_args<S: AsRef<str>>(&mut self, args: &[S]) -> Result<HostValue> {
        let args = RunArgs::parse(args)?;
        match args.filename {
            Some(filename) => self.run_named(args.source, filename),
            None => self.run(args.source),
        }
    }

    /// Version string of the embedded V8.
    pub fn version() -> &'static str {
        v8::V8::get_version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arity() {
        let none: [&str; 0] = [];
        assert!(matches!(RunArgs::parse(none.as_slice()), Err(ContextError::Argument(_))));
        assert!(matches!(
            RunArgs::parse(&["1", "a.js", "extra"]),
            Err(ContextError::Argument(_))
        ));

        let one = RunArgs::parse(&["1"]).unwrap();
        assert_eq!(one.source, "1");
        assert_eq!(one.filename, None);

        let owned = ["1".to_string(), "a.js".to_string()];
        let two = RunArgs::parse(&owned).unwrap();
        assert_eq!(two.filename, Some("a.js"));
    }

    #[test]
    fn test_run_args() {
        let mut ctx = Context::new().unwrap();

        let none: Vec<String> = Vec::new();
        let err = ctx.run_args(none.as_slice()).unwrap_err();
        assert!(err.to_string().contains("at least 1 argument"));

        let err = ctx.run_args(&["1", "a.js", "b"]).unwrap_err();
        assert!(err.to_string().contains("at most 2 arguments"));

        assert_eq!(ctx.run_args(&["6 * 7"]).unwrap().as_i64(), Some(42));
        assert_eq!(ctx.run_args(&["6 * 7", "math.js"]).unwrap().as_i64(), Some(42));
    }

    #[test]
    fn test_run_args_filename_is_diagnostic_name() {
        let mut ctx = Context::new().unwrap();

        let err = ctx.run_args(&["throw new Error('x')", "named.js"]).unwrap_err();
        let location = err.engine_error().unwrap().location.clone().unwrap();
        assert_eq!(location.resource, "named.js");
    }

    #[test]
    fn test_version() {
        let version = Context::version();
        assert!(!version.is_empty());
        assert_eq!(version, Context::version());
    }
}
