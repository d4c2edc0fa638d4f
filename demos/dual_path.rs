//! Dual-path logging example
//!
//! A worker thread logs through the blocking adapter while a task logs
//! through the async adapter. Both write JSON lines for the same facade to
//! stdout, then the facade drains and closes.
//!
//! Run with: cargo run --example dual_path

use janus_logging::prelude::*;
use std::thread;
use std::time::Duration;

const COUNTER: i64 = 4;

fn threaded(log: SyncAdapter) -> Result<()> {
    for i in 0..COUNTER {
        let extra = Extra::new()
            .with_field("counter", i)
            .with_field("log_type", "sync")
            .with_field("log_status", "running");
        log.log_with_extra(LogLevel::Info, "s-Hello #{}", &[i.into()], &extra)?;
        thread::sleep(Duration::from_millis(10));
    }
    log.info("s-Finished #{}", &[COUNTER.into()])
}

async fn coroutine(log: AsyncAdapter) -> Result<()> {
    for i in 0..COUNTER {
        let extra = Extra::new()
            .with_field("counter", i)
            .with_field("log_type", "async")
            .with_field("log_status", "running");
        log.log_with_extra(LogLevel::Info, "aio-Hello #{}", &[i.into()], &extra)
            .await?;
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    log.info("aio-Finished", &[]).await
}

#[tokio::main]
async fn main() -> Result<()> {
    let janus = JanusLogger::builder("my_janus_logger")
        .level(LogLevel::Debug)
        .json()
        .extra(Extra::new().with_field("bla", "blabla"))
        .build()?;

    let sync_log = janus.logger_sync(Extra::new().with_field("logger_name", "logger_sync"));
    let async_log = janus.logger_async(Extra::new().with_field("logger_name", "logger_async"));

    let worker = tokio::task::spawn_blocking(move || threaded(sync_log));
    coroutine(async_log).await?;
    worker
        .await
        .map_err(|e| LoggerError::worker(e.to_string()))??;

    if !janus.shutdown().await {
        eprintln!("janus logger did not shut down cleanly");
        std::process::exit(1);
    }
    Ok(())
}
