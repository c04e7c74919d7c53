//! Sentinel entrypoint: JSON-lines evaluation jobs on stdin, verdicts on stdout.

use mimalloc::MiMalloc;
use serde::Deserialize;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;

use sentinel::config::Config;
use sentinel::context::ServiceContext;
use sentinel::orchestrator::{Submission, Task};
use sentinel::queue::Ticket;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Debug, Deserialize)]
struct Job {
    task: Task,
    submission: Submission,
}

enum Output {
    Pending(Ticket),
    Rejected(String),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!(
        base_url = %config.base_url,
        workers = config.workers,
        queue_capacity = config.queue_capacity,
        "Sentinel starting"
    );

    let context = ServiceContext::from_config(&config)?;
    let queue = context.start_queue();

    let (output_tx, output_rx) = mpsc::channel(config.queue_capacity);
    let printer = tokio::spawn(print_outputs(output_rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = &mut shutdown => break,
        };
        let Some(line) = line else {
            tracing::info!("Input closed");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let output = match serde_json::from_str::<Job>(&line) {
            Ok(job) => match queue.submit(job.task, job.submission).await {
                Ok(ticket) => Output::Pending(ticket),
                Err(e) => Output::Rejected(e.to_string()),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Invalid job line");
                Output::Rejected(format!("invalid job: {e}"))
            }
        };

        if output_tx.send(output).await.is_err() {
            tracing::error!("Output writer stopped");
            break;
        }
    }

    drop(output_tx);
    queue.shutdown().await;
    printer.await??;

    tracing::info!("Sentinel shutdown complete");
    Ok(())
}

/// Writes one JSON line per job, in submission order.
async fn print_outputs(mut outputs: mpsc::Receiver<Output>) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();

    while let Some(output) = outputs.recv().await {
        let line = match output {
            Output::Pending(ticket) => {
                let task_id = ticket.task_id().to_string();
                match ticket.wait().await {
                    Ok(Ok(verdict)) => serde_json::to_string(&verdict)?,
                    Ok(Err(e)) => json!({ "task_id": task_id, "error": e.to_string() }).to_string(),
                    Err(e) => json!({ "task_id": task_id, "error": e.to_string() }).to_string(),
                }
            }
            Output::Rejected(reason) => json!({ "error": reason }).to_string(),
        };

        stdout.write_all(line.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, draining queue");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, draining queue");
        }
    }
}
