//! Embedding example for tomato
//!
//! Run with: cargo run -p tomato --example embed

use tomato::{Context, ContextError};

fn main() -> Result<(), ContextError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    println!("V8 {}", Context::version());

    let mut ctx = Context::new()?;

    ctx.bind("user", "world")?;
    println!("{}", ctx.run("'hello, ' + user")?);
    println!("{}", ctx.run("({ primes: [2, 3, 5, 7] })")?);

    // Written to stderr as <"point">, <{"x":1,"y":2}>
    ctx.run(r#"debug("point", { x: 1, y: 2 })"#)?;

    match ctx.run_named("throw new Error('boom')", "example.js") {
        Err(e) => println!("caught: {}", e),
        Ok(value) => println!("unexpected: {}", value),
    }

    ctx.dispose();
    Ok(())
}
