//! Tasks, submissions and config pointed at a mock upstream.

use std::time::Duration;

use sentinel::config::{Config, ModelSet};
use sentinel::orchestrator::{Submission, Task};

pub const CHAT_MODEL: &str = "chat-model";
pub const CODER_MODEL: &str = "coder-model";
pub const EMBED_MODEL: &str = "embed-model";

pub const QUALITY_JSON: &str = r#"{"correctness_score": 95, "code_quality_score": 85, "efficiency_score": 90, "edge_cases_score": 70, "overall_score": 88, "feedback": {"summary": "Solid.", "strengths": ["linear time"], "improvements": [], "complexity_analysis": "O(n)"}, "next_challenge_level": "senior"}"#;

pub const AUTHENTICITY_JSON: &str = r#"{"similarity_score": 80, "is_suspicious": true, "likely_source": "leetcode", "reasoning": "Canonical answer.", "confidence": "medium", "flags": [], "recommendation": "review"}"#;

/// Config for a gateway at `server_uri`, with generous limits and a short deadline.
pub fn test_config(server_uri: &str) -> Config {
    Config {
        base_url: format!("{server_uri}/v1"),
        api_key: "sk-test".to_string(),
        request_timeout: Duration::from_secs(5),
        models: ModelSet {
            chat: CHAT_MODEL.to_string(),
            coder: CODER_MODEL.to_string(),
            embedding: EMBED_MODEL.to_string(),
        },
        chat_limit: 100,
        coder_limit: 100,
        embedding_limit: 100,
        workers: 2,
        queue_capacity: 8,
        ..Default::default()
    }
}

pub fn task(id: &str) -> Task {
    Task::new(id, "Two Sum", "Return indices of the two numbers that add up to target.")
}

pub fn submission(variant: usize) -> Submission {
    Submission::new(
        format!(
            "def two_sum(nums, target):  # v{variant}\n    seen = {{}}\n    for i, n in enumerate(nums):\n        if target - n in seen:\n            return [seen[target - n], i]\n        seen[n] = i\n"
        ),
        "python",
    )
}
