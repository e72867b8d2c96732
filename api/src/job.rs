use std::time::Duration;

use chrono::Utc;
use kernel::model::reservation::SweepReport;
use registry::AppRegistry;
use shared::error::AppResult;
use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

/// リマインダー送信と期限切れ処理を一定間隔で繰り返すタスクを起動する
pub fn spawn_reservation_sweeper(registry: AppRegistry, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(interval);
        // 処理が遅れても取りこぼしを一気に実行しない
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            // 失敗しても次の周期で再実行されるのでログだけ残す
            if let Err(e) = run_sweep_tick(&registry).await {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "reservation sweep failed"
                );
            }
        }
    })
}

pub async fn run_sweep_tick(registry: &AppRegistry) -> AppResult<SweepReport> {
    let report = registry.reservation_repository().sweep(Utc::now()).await?;
    if !report.is_empty() {
        tracing::info!(
            reminders_set = report.reminders_set,
            expired = report.expired,
            "reservation sweep finished"
        );
    }
    Ok(report)
}
