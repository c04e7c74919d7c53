use std::fmt;
use std::time::Duration;

use crate::config::Config;
use crate::constants::{
    DEFAULT_CONVERSATION_TTL_SECS, DEFAULT_EVAL_TTL_SECS, DEFAULT_TASK_TTL_SECS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Key family. Each namespace has its own prefix and default TTL.
pub enum CacheNamespace {
    /// Generated tasks, keyed by `{level, domain}`.
    Task,
    /// Submission verdicts.
    Evaluation,
    /// Interviewer dialogue history, keyed by session id.
    Conversation,
}

impl CacheNamespace {
    pub const ALL: [CacheNamespace; 3] = [
        CacheNamespace::Task,
        CacheNamespace::Evaluation,
        CacheNamespace::Conversation,
    ];

    /// Key prefix, without the separator.
    pub fn prefix(&self) -> &'static str {
        match self {
            CacheNamespace::Task => "task",
            CacheNamespace::Evaluation => "eval",
            CacheNamespace::Conversation => "conversation",
        }
    }

    /// Full store key for an already hashed input.
    pub fn key(&self, digest: &str) -> String {
        format!("{}:{}", self.prefix(), digest)
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Per-namespace entry lifetimes.
pub struct CacheTtls {
    pub task: Duration,
    pub evaluation: Duration,
    pub conversation: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            task: Duration::from_secs(DEFAULT_TASK_TTL_SECS),
            evaluation: Duration::from_secs(DEFAULT_EVAL_TTL_SECS),
            conversation: Duration::from_secs(DEFAULT_CONVERSATION_TTL_SECS),
        }
    }
}

impl CacheTtls {
    /// TTL applied to writes in `namespace` when none is given.
    pub fn for_namespace(&self, namespace: CacheNamespace) -> Duration {
        match namespace {
            CacheNamespace::Task => self.task,
            CacheNamespace::Evaluation => self.evaluation,
            CacheNamespace::Conversation => self.conversation,
        }
    }
}

impl From<&Config> for CacheTtls {
    fn from(config: &Config) -> Self {
        Self {
            task: config.task_ttl,
            evaluation: config.eval_ttl,
            conversation: config.conversation_ttl,
        }
    }
}
