//! HTTP load generation with the traffic shape the service is sized for:
//! health 3, list 2, metrics 2, upload 1.

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use serde::Deserialize;
use tokio::task::JoinSet;

use crate::http_perf::{file_form, start_test_server};

#[derive(Clone, Copy, Debug)]
enum Task {
    Health,
    ListFiles,
    Metrics,
    Upload,
}

const WEIGHTS: &[(Task, u32)] = &[
    (Task::Health, 3),
    (Task::ListFiles, 2),
    (Task::Metrics, 2),
    (Task::Upload, 1),
];

#[derive(Debug, Deserialize)]
struct MetricsSnapshot {
    files_current: u64,
    files_stored_total: u64,
    total_storage_bytes: u64,
}

/// Expands the weights into one round of the schedule.
fn schedule() -> Vec<Task> {
    WEIGHTS
        .iter()
        .flat_map(|(task, weight)| std::iter::repeat_n(*task, *weight as usize))
        .collect()
}

/// One simulated client; returns how many uploads it performed.
async fn run_user(
    user: usize,
    client: Arc<reqwest::Client>,
    base_url: String,
    rounds: usize,
    wait: Duration,
) -> u64 {
    let tasks = schedule();
    let mut uploads = 0;

    for round in 0..rounds {
        // Rotate so users don't march in lock step.
        for step in 0..tasks.len() {
            let task = tasks[(step + user + round) % tasks.len()];
            let response = match task {
                Task::Health => client.get(format!("{}/health", base_url)).send().await,
                Task::ListFiles => client.get(format!("{}/files", base_url)).send().await,
                Task::Metrics => client.get(format!("{}/metrics", base_url)).send().await,
                Task::Upload => {
                    uploads += 1;
                    let filename = format!("file_{}_{}.txt", user, round);
                    let content = format!("payload-{}-{}", user, round).into_bytes();
                    client
                        .post(format!("{}/files", base_url))
                        .multipart(file_form(filename, content))
                        .send()
                        .await
                }
            };
            assert_eq!(response.unwrap().status(), StatusCode::OK, "{task:?}");
            tokio::time::sleep(wait).await;
        }
    }

    uploads
}

#[tokio::test]
async fn weighted_mixed_load() {
    let (base_url, _storage, _tmp) = start_test_server().await;
    let client = Arc::new(reqwest::Client::new());
    let users = 20;
    let rounds = 5;

    println!("\n=== Weighted Load (health 3 / list 2 / metrics 2 / upload 1) ===");

    let start = Instant::now();
    let mut tasks = JoinSet::new();
    for user in 0..users {
        tasks.spawn(run_user(
            user,
            Arc::clone(&client),
            base_url.clone(),
            rounds,
            Duration::from_millis(5),
        ));
    }

    let mut uploads = 0;
    while let Some(result) = tasks.join_next().await {
        uploads += result.unwrap();
    }
    let elapsed = start.elapsed();

    let requests = users * rounds * schedule().len();
    let metrics: MetricsSnapshot = client
        .get(format!("{}/metrics", base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(uploads, (users * rounds) as u64);
    assert_eq!(metrics.files_stored_total, uploads);
    assert_eq!(metrics.files_current, uploads);
    assert!(metrics.total_storage_bytes > 0);

    println!("Users: {}", users);
    println!("Requests: {}", requests);
    println!("Total time: {:?}", elapsed);
    println!("Throughput: {:.2} req/sec", requests as f64 / elapsed.as_secs_f64());
}
