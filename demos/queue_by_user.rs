//! # Demo: queue_by_user
//!
//! Wraps a request handler so calls for the same user run one at a time, then
//! floods one user to show overload shedding.
//!
//! Shows how to:
//! - Build [`Lanes`] with the built-in [`LogWriter`] subscriber.
//! - Compose [`Guarded`] and [`Queued`] around a [`HandlerFn`].
//! - Recognize [`LaneError::TooBusy`] and the abandoned backlog.
//!
//! ## Flow
//! ```text
//! call(args) ──► Guarded (status?) ──► Queued (uid → key) ──► Lanes::submit
//!     ├─ u1 / u2: interleaved across users, ordered within a user
//!     └─ u3 x 25: tasks 1..20 abandoned, task 21 TooBusy, 22..25 run
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=keylane=debug cargo run --example queue_by_user
//! ```

use std::sync::Arc;
use std::time::Duration;

use keylane::{
    Args, Config, Guarded, Handler, HandlerFn, LaneError, Lanes, LogWriter, Queued, ServerStatus,
    StatusFlag,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = Config::default();
    let lanes = Lanes::builder(cfg.clone())
        .with_subscriber(Arc::new(LogWriter::new()))
        .build();
    let status = StatusFlag::running();

    let save = HandlerFn::new("save_profile", |args: Args| async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let uid = args[0]["uid"].as_str().unwrap_or("?").to_string();
        let step = args.get(1).cloned().unwrap_or_default();
        Ok::<_, LaneError>(format!("{uid} saved step {step}"))
    });
    let handler = Arc::new(
        Guarded::new(status.clone(), Queued::new(Arc::clone(&lanes), save)).with_bus(lanes.bus().clone()),
    );

    // Two users, three steps each.
    let mut calls = Vec::new();
    for step in 0..3 {
        for uid in ["u1", "u2"] {
            let h = Arc::clone(&handler);
            calls.push(tokio::spawn(async move {
                h.call(vec![json!({ "uid": uid }), json!(step)]).await
            }));
        }
    }
    for call in calls {
        println!("{:?}", call.await?);
    }

    // One user floods its lane.
    let mut flood = Vec::new();
    for i in 1..=25 {
        flood.push(handler.call(vec![json!({ "uid": "u3" }), json!(i)]));
    }
    for (i, res) in futures::future::join_all(flood).await.into_iter().enumerate() {
        match res {
            Ok(out) => println!("#{:02} ok      {:?}", i + 1, out),
            Err(e) if e.is_overload() => println!("#{:02} busy    {e}", i + 1),
            Err(e) => println!("#{:02} dropped {e}", i + 1),
        }
    }

    status.set(ServerStatus::Closing);
    let skipped = handler.call(vec![json!({ "uid": "u1" })]).await?;
    println!("while closing: {skipped:?}");

    lanes.shutdown(cfg.grace).await?;
    Ok(())
}
