//! Plugin pipeline example
//!
//! Redacts secrets, stamps a hostname, filters noisy levels and uppercases
//! messages, then toggles plugins at runtime.
//!
//! Run with: cargo run --example plugins

use rust_log_layer::prelude::*;
use rust_log_layer::fields;
use serde_json::Value;
use std::sync::Arc;

fn main() -> Result<()> {
    println!("=== Rust Log Layer - Plugins Example ===\n");

    let redact = Plugin::new().with_id("redact").on_before_data_out(|params| {
        let data = params.data?;
        data.contains_key("password")
            .then(|| fields! { "password" => "[REDACTED]" })
    });

    let hostname = Plugin::new()
        .with_id("hostname")
        .on_before_data_out(|_| Some(fields! { "host" => "web-01" }));

    let no_trace = Plugin::new()
        .with_id("no-trace")
        .should_send_to_logger(|params| params.log_level != LogLevel::Trace);

    let shout = Plugin::new()
        .with_id("shout")
        .disabled(true)
        .on_before_message_out(|params| {
            Some(
                params
                    .messages
                    .iter()
                    .map(|message| match message {
                        Value::String(s) => Value::String(s.to_uppercase()),
                        other => other.clone(),
                    })
                    .collect(),
            )
        });

    let drop_empty = Plugin::new()
        .with_id("drop-empty")
        .on_metadata_called(|metadata| (!metadata.is_empty()).then_some(metadata));

    let log = LogLayer::builder(Arc::new(ConsoleBackend::new()))
        .kind(BackendKind::Pino)
        .console_debug(false)
        .plugins([redact, hostname, no_trace, shout, drop_empty])
        .build()?;

    println!("1. Redaction and enrichment:");
    log.with_metadata(fields! { "user" => "ana", "password" => "hunter2" })
        .info("login")?;

    println!("\n2. Trace calls are vetoed:");
    log.trace("never printed")?;
    println!("   vetoed so far: {}", log.metrics().vetoed());

    println!("\n3. Enabling a plugin affects children too:");
    let child = log.child();
    log.enable_plugin("shout");
    child.warn("children share the registry")?;
    log.disable_plugin("shout");

    println!("\n4. Metadata-only calls can be dropped by plugins:");
    log.metadata_only(Fields::new(), LogLevel::Info)?;
    log.metadata_only(fields! { "cache_hits" => 1024 }, LogLevel::Info)?;

    println!("\n5. Duplicate ids are rejected:");
    match log.add_plugins([Plugin::new().with_id("redact")]) {
        Err(err) => println!("   {}", err),
        Ok(()) => println!("   unexpectedly accepted"),
    }

    println!("\nRegistered plugins: {:?}", log.plugins().plugin_ids());
    println!("\n=== Example completed successfully! ===");
    Ok(())
}
