//! Basic log layer usage example
//!
//! Wraps the console backend, adds context and metadata, logs errors and
//! shows the effect of muting and prefixes.
//!
//! Run with: cargo run --example basic_usage

use rust_log_layer::prelude::*;
use rust_log_layer::{fields, info};
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== Rust Log Layer - Basic Usage Example ===\n");

    let log = LogLayer::builder(Arc::new(ConsoleBackend::new()))
        .kind(BackendKind::Console)
        .copy_msg_on_only_error(true)
        .build()?;

    println!("1. Logging at different levels:");
    log.trace("This is a trace message")?;
    log.debug("This is a debug message")?;
    log.info("This is an info message")?;
    log.warn("This is a warning message")?;
    log.error("This is an error message")?;
    // The console has no fatal method, so this lands on error
    log.fatal("This is a fatal message")?;

    println!("\n2. Persistent context:");
    log.with_context(fields! { "service" => "checkout", "version" => "1.4.2" });
    log.info("context is attached to every call")?;

    println!("\n3. Per-call metadata and errors:");
    log.with_metadata(fields! { "order_id" => 981, "items" => 3 })
        .info("order placed")?;
    log.with_error("card declined")
        .with_metadata(fields! { "order_id" => 982 })
        .warn("payment failed")?;
    log.error_only("inventory service unreachable", ErrorOnlyOpts::default())?;
    log.metadata_only(fields! { "queue_depth" => 12 }, LogLevel::Debug)?;

    println!("\n4. Muting:");
    log.mute_context();
    log.info("context muted")?;
    log.unmute_context();

    println!("\n5. Prefixed child:");
    let payments = log.with_prefix("[payments]");
    info!(payments, "settled {} transactions", 42)?;
    log.info("parent stays unprefixed")?;

    println!("\n6. Disabled layer:");
    log.disable_logging();
    log.info("you will not see this")?;
    log.enable_logging();

    println!(
        "\nDispatched {} calls, dropped {}",
        log.metrics().dispatched(),
        log.metrics().dropped()
    );
    println!("\n=== Example completed successfully! ===");
    Ok(())
}
