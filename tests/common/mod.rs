//! Common test utilities for batch-uploader integration tests

#[allow(dead_code)]
pub mod fixtures;

#[allow(unused_imports)]
pub use fixtures::*;

use batch_uploader::{Config, ProgressEvent, ResultChannel, RunHandle};
use std::time::Duration;

/// Config pointing at `{server_uri}/upload`
pub fn config_for(server_uri: &str, num_workers: usize) -> Config {
    Config {
        endpoint_url: format!("{server_uri}/upload"),
        num_workers,
        request_timeout: Some(Duration::from_secs(10)),
        ..Config::default()
    }
}

/// Drain every event of a run, failing the test if it takes too long
#[allow(dead_code)]
pub async fn collect_events(channel: ResultChannel, handle: RunHandle) -> Vec<ProgressEvent> {
    tokio::time::timeout(Duration::from_secs(30), async move {
        let mut events = Vec::new();
        while let Some(event) = handle.next_event(&channel).await {
            events.push(event);
        }
        events
    })
    .await
    .expect("run did not finish within 30 seconds")
}
