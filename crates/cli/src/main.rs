//! `vidwatch` -- command-line observer for video fetch-and-transcode jobs.
//!
//! Submits a source URL to the job runner and streams step-level
//! progress to the terminal until the job succeeds, fails, or the
//! event channel stalls.
//!
//! # Usage
//!
//! ```text
//! vidwatch <source-url>
//! ```
//!
//! # Environment variables
//!
//! | Variable         | Required | Default | Description                                   |
//! |------------------|----------|---------|-----------------------------------------------|
//! | `RUNNER_API_URL` | yes      | --      | Start-job endpoint base, e.g. `http://host:5000` |
//! | `RUNNER_WS_URL`  | yes      | --      | Event channel address, e.g. `ws://host:5000`  |

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidwatch_core::reducer::STEP_ERROR;
use vidwatch_core::session::{Session, SessionStatus};
use vidwatch_core::source::{is_video_platform_url, validate_source_url};
use vidwatch_runner::observer::{JobObserver, ObserverConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidwatch=info,vidwatch_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let api_url = std::env::var("RUNNER_API_URL").unwrap_or_else(|_| {
        tracing::error!("RUNNER_API_URL environment variable is required");
        std::process::exit(1);
    });

    let ws_url = std::env::var("RUNNER_WS_URL").unwrap_or_else(|_| {
        tracing::error!("RUNNER_WS_URL environment variable is required");
        std::process::exit(1);
    });

    let source_url = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: vidwatch <source-url>");
        std::process::exit(2);
    });

    // URL-shape validation is the caller's job, not the orchestrator's.
    if let Err(e) = validate_source_url(&source_url) {
        tracing::error!(error = %e, "Invalid source URL");
        std::process::exit(2);
    }
    if !is_video_platform_url(&source_url) {
        tracing::warn!(url = %source_url, "Source is not a known video platform; the runner may reject it");
    }

    let observer = JobObserver::new(ObserverConfig { api_url, ws_url });
    let mut rx = observer.subscribe();

    let session_id = match observer.submit(&source_url).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!(error = %e, "Submission failed");
            std::process::exit(1);
        }
    };
    tracing::info!(session_id = %session_id, "Job accepted");

    let code = watch_session(&mut rx).await;
    observer.shutdown().await;
    std::process::exit(code);
}

/// Render snapshots until the session reaches an outcome.
///
/// Returns the process exit code: 0 on success, 1 on failure or a
/// stalled channel.
async fn watch_session(rx: &mut tokio::sync::watch::Receiver<Session>) -> i32 {
    let mut printed = 0usize;

    loop {
        let snapshot = rx.borrow_and_update().clone();

        for entry in snapshot.logs.since(printed) {
            println!(
                "{:>3}% [{:<8}] {}: {}",
                snapshot.progress,
                entry.class,
                entry.step,
                entry.display_message(),
            );
        }
        printed = snapshot.logs.total();

        match snapshot.status {
            SessionStatus::Succeeded => {
                let result = snapshot.result.expect("succeeded session carries a result");
                println!();
                println!("Download ready: {}", result.download_url);
                println!("  title:    {}", result.video_info.title);
                println!("  duration: {}", result.video_info.duration);
                if let Some(size) = result.video_info.file_size_bytes {
                    println!("  size:     {size} bytes");
                }
                if let Some(thumb) = &result.video_info.thumbnail_url {
                    println!("  thumb:    {thumb}");
                }
                return 0;
            }
            SessionStatus::Failed => {
                let message = snapshot
                    .error
                    .map(|e| e.message)
                    .unwrap_or_else(|| "job failed".into());
                eprintln!();
                eprintln!("Download failed: {message}");
                return 1;
            }
            SessionStatus::Running if snapshot.current_step == STEP_ERROR => {
                eprintln!();
                eprintln!("Event channel lost before the job finished; giving up");
                return 1;
            }
            _ => {}
        }

        if rx.changed().await.is_err() {
            tracing::error!("Observer dropped before a terminal state");
            return 1;
        }
    }
}
