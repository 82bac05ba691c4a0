//! Synthetic load for `pulse --demo`.

use crate::core::Op;
use crate::telemetry::Telemetry;
use rand::Rng;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

/// Bursts per window
const BURSTS: u32 = 4;

/// Record synthetic metrics and notes until the store stops.
pub async fn run(telemetry: Telemetry, period: Duration) {
    if let Err(e) = define(&telemetry).await {
        tracing::warn!(error = %e, "demo could not define metrics");
        return;
    }

    let mut ticker = interval((period / BURSTS).max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut bursts: u64 = 0;

    loop {
        ticker.tick().await;
        bursts += 1;

        let (requests, latency, bytes) = {
            let mut rng = rand::thread_rng();
            let requests = rng.gen_range(1..=50_i64);
            let latency: f64 = (0..requests).map(|_| rng.gen_range(2.0..120.0)).sum();
            (requests, latency, rng.gen_range(512.0..65_536.0))
        };

        let outcome = async {
            telemetry.record_metric("requests", requests, requests as f64).await?;
            telemetry.record_metric("latency_ms", requests, latency).await?;
            telemetry.record_metric("bytes_out", 1, bytes).await?;
            if bursts % u64::from(BURSTS * 10) == 0 {
                telemetry
                    .record_note("demo.bursts", bursts.to_string())
                    .await?;
            }
            crate::core::Result::Ok(())
        }
        .await;

        if let Err(e) = outcome {
            tracing::debug!(error = %e, "demo stopped");
            return;
        }
    }
}

async fn define(telemetry: &Telemetry) -> crate::core::Result<()> {
    telemetry.define_metric("requests", Op::Count, "Requests").await?;
    telemetry
        .define_metric("latency_ms", Op::Average, "Latency (ms)")
        .await?;
    telemetry
        .define_metric("bytes_out", Op::Sum, "Bytes out")
        .await?;
    telemetry.record_note("demo", "synthetic load").await
}
