use super::*;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::cache::ResultCache;
use crate::gateway::{MockFailure, MockInferenceBackend};
use crate::orchestrator::{BranchKind, Orchestrator, OrchestratorConfig, Submission, Task};
use crate::similarity::{SimilarityConfig, SimilarityIndex};

const CHAT: &str = "chat-model";
const CODER: &str = "coder-model";

const QUALITY_REPLY: &str = r#"{"correctness_score": 90, "overall_score": 85}"#;
const AUTHENTICITY_REPLY: &str = r#"{"similarity_score": 10, "likely_source": "original"}"#;

fn orchestrator(backend: MockInferenceBackend) -> Arc<Orchestrator<MockInferenceBackend>> {
    let backend = Arc::new(backend);
    let index = Arc::new(SimilarityIndex::new(
        Arc::clone(&backend),
        SimilarityConfig::default(),
    ));
    let config = OrchestratorConfig {
        chat_model: CHAT.to_string(),
        coder_model: CODER.to_string(),
        ..Default::default()
    };
    Arc::new(Orchestrator::new(
        backend,
        Arc::new(ResultCache::default()),
        index,
        config,
    ))
}

fn scripted() -> MockInferenceBackend {
    MockInferenceBackend::new()
        .with_reply(CHAT, QUALITY_REPLY)
        .with_reply(CODER, AUTHENTICITY_REPLY)
}

fn job(n: usize) -> (Task, Submission) {
    (
        Task::new(format!("task-{n}"), "Reverse a list", "Reverse in place."),
        Submission::new(format!("def solve(xs):  # {n}\n    xs.reverse()"), "python"),
    )
}

#[tokio::test]
async fn test_jobs_are_acknowledged_with_verdicts() {
    let queue = EvaluationQueue::start(orchestrator(scripted()), 2, 8);

    let mut tickets = Vec::new();
    for n in 0..5 {
        let (task, submission) = job(n);
        tickets.push(queue.submit(task, submission).await.unwrap());
    }

    for (n, ticket) in tickets.into_iter().enumerate() {
        assert_eq!(ticket.task_id(), format!("task-{n}"));
        let verdict = ticket.wait().await.unwrap().unwrap();
        assert_eq!(verdict.task_id, format!("task-{n}"));
        assert_eq!(verdict.overall, 85.0);
        assert_eq!(verdict.likely_source, "original");
    }

    queue.shutdown().await;
}

#[tokio::test]
async fn test_evaluation_error_reaches_ticket() {
    let backend = MockInferenceBackend::new()
        .with_reply(CHAT, QUALITY_REPLY)
        .with_failure(CODER, MockFailure::Status(503));
    let queue = EvaluationQueue::start(orchestrator(backend), 1, 4);

    let (task, submission) = job(0);
    let ticket = queue.submit(task, submission).await.unwrap();
    let err = ticket.wait().await.unwrap().unwrap_err();

    assert_eq!(err.branch_kind(), Some(BranchKind::Authenticity));
    queue.shutdown().await;
}

#[tokio::test]
async fn test_try_submit_reports_full_queue() {
    // Workers cannot run before the first await on the current-thread runtime.
    let queue = EvaluationQueue::start(orchestrator(scripted()), 1, 2);

    let (task, submission) = job(0);
    let first = queue.try_submit(task, submission).unwrap();
    let (task, submission) = job(1);
    let second = queue.try_submit(task, submission).unwrap();
    assert_eq!(queue.pending(), 2);

    let (task, submission) = job(2);
    assert_eq!(
        queue.try_submit(task, submission).unwrap_err(),
        QueueError::Full
    );

    assert!(first.wait().await.unwrap().is_ok());
    assert!(second.wait().await.unwrap().is_ok());
    queue.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_workers_run_in_parallel() {
    let backend = scripted()
        .with_delay(CHAT, Duration::from_secs(10))
        .with_delay(CODER, Duration::from_secs(10));
    let queue = EvaluationQueue::start(orchestrator(backend), 3, 8);
    let started = Instant::now();

    let mut tickets = Vec::new();
    for n in 0..3 {
        let (task, submission) = job(n);
        tickets.push(queue.submit(task, submission).await.unwrap());
    }
    for ticket in tickets {
        ticket.wait().await.unwrap().unwrap();
    }

    let elapsed = started.elapsed();
    assert!(elapsed < Duration::from_secs(20), "jobs ran sequentially: {elapsed:?}");
    queue.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_drains_queued_jobs() {
    let backend = scripted().with_delay(CHAT, Duration::from_secs(5));
    let orchestrator = orchestrator(backend);
    let queue = EvaluationQueue::start(Arc::clone(&orchestrator), 1, 8);

    let mut tickets = Vec::new();
    for n in 0..4 {
        let (task, submission) = job(n);
        tickets.push(queue.submit(task, submission).await.unwrap());
    }

    queue.shutdown().await;
    assert!(queue.is_closed());

    for ticket in tickets {
        assert!(ticket.wait().await.unwrap().is_ok());
    }
    assert_eq!(orchestrator.cache().stats().entries, Some(4));
}

#[tokio::test]
async fn test_submit_after_shutdown_is_rejected() {
    let queue = EvaluationQueue::start(orchestrator(scripted()), 1, 1);
    queue.shutdown().await;
    queue.shutdown().await;

    let (task, submission) = job(0);
    assert_eq!(
        queue.submit(task, submission).await.unwrap_err(),
        QueueError::Closed
    );
    let (task, submission) = job(1);
    assert_eq!(
        queue.try_submit(task, submission).unwrap_err(),
        QueueError::Closed
    );
    assert_eq!(queue.pending(), 0);
}

#[tokio::test]
async fn test_abandoned_job_reports_worker_gone() {
    let (reply, receiver) = oneshot::channel();
    let ticket = Ticket {
        task_id: "task-0".to_string(),
        receiver,
    };
    drop(reply);

    assert_eq!(ticket.wait().await.unwrap_err(), QueueError::WorkerGone);
}
