//! Channel backend example
//!
//! Hands every call to a worker thread over a bounded crossbeam channel and
//! prints what a remote library would receive.
//!
//! Run with: cargo run --example channel_backend

use rust_log_layer::core::render_params;
use rust_log_layer::fields;
use rust_log_layer::prelude::*;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Rust Log Layer - Channel Backend Example ===\n");

    let (backend, receiver) = ChannelBackend::bounded(64);
    let backend = backend.with_send_timeout(Duration::from_millis(100));

    let worker = thread::spawn(move || {
        let mut count = 0;
        for call in receiver {
            count += 1;
            println!(
                "[worker] {} {:<5} {}",
                call.timestamp.format("%H:%M:%S%.3f"),
                call.method.to_str(),
                render_params(&call.params)
            );
        }
        count
    });

    let log = Arc::new(
        LogLayer::builder(Arc::new(backend))
            .kind(BackendKind::Winston)
            .metadata_field_name("meta")
            .build()?,
    );
    log.with_context(fields! { "app" => "importer" });

    let producers: Vec<_> = (0..3)
        .map(|id| {
            let log = Arc::clone(&log);
            thread::spawn(move || -> Result<()> {
                let log = log.with_prefix(format!("[producer-{}]", id));
                for batch in 0..3 {
                    log.with_metadata(fields! { "batch" => batch })
                        .info("imported batch")?;
                }
                log.fatal("producer finished")
            })
        })
        .collect();

    for producer in producers {
        if let Err(err) = producer.join().unwrap_or(Ok(())) {
            eprintln!("producer failed: {}", err);
        }
    }

    // Dropping the last layer closes the channel and stops the worker
    drop(log);
    let received = worker.join().unwrap_or(0);

    println!("\nWorker received {} calls", received);
    println!("\n=== Example completed successfully! ===");
    Ok(())
}
