//! Message builders for each upstream call.

use std::fmt::Write as _;

use super::types::{ExecutionReport, GeneratedTask, InterviewContext, Task};
use crate::gateway::ChatMessage;

const CONTEXT_DESCRIPTION_CHARS: usize = 200;

const QUALITY_SYSTEM: &str = "You are a senior technical interviewer reviewing a candidate's \
code. Judge correctness, code quality, efficiency and edge-case handling objectively and \
constructively. Reply with JSON only.";

const AUTHENTICITY_SYSTEM: &str = "You are an expert code analyst. Decide whether the code was \
likely copied from a well-known source. Be thorough but fair. Reply with JSON only.";

const HINT_SYSTEM: &str = "You are a coding mentor. Give a subtle hint that points towards an \
approach without revealing the solution.";

const TASK_SYSTEM: &str = "You are an experienced technical interviewer who writes coding \
interview tasks solvable in 10 to 15 minutes. Reply with JSON only.";

const STYLE_SYSTEM: &str = "You are a code reviewer. Analyze the coding style and patterns \
in this code. Reply with JSON only.";

const ADAPT_SYSTEM: &str = "You are an expert in adaptive interviewing. Rewrite tasks to match \
the candidate's performance. Reply with JSON only.";

const TASK_SHAPE: &str = "{\"title\": \"\", \"description\": \"\", \"input_format\": \"\", \
\"output_format\": \"\", \"constraints\": [], \
\"examples\": [{\"input\": \"\", \"output\": \"\", \"explanation\": \"\"}], \
\"hidden_tests\": [{\"input\": \"\", \"output\": \"\", \"edge_case_type\": \"\"}], \
\"time_limit\": \"2s\", \"memory_limit\": \"256MB\"}";

const DIALOGUE_SYSTEM: &str = "You are a friendly AI coding interviewer. Help the candidate \
show their skills through conversation. Ask clarifying questions instead of giving direct \
answers, give constructive feedback when it helps, and keep replies to one or two short \
paragraphs.";

pub(crate) fn quality_messages(
    task: &Task,
    code: &str,
    language: &str,
    execution: Option<&ExecutionReport>,
) -> Vec<ChatMessage> {
    let tests = match execution {
        Some(report) => format!(
            "Visible tests: {}/{} passed\nHidden tests: {}/{} passed\nExecution time: {}ms",
            report.visible_passed,
            report.visible_total,
            report.hidden_passed,
            report.hidden_total,
            report.execution_time_ms
        ),
        None => "The code has not been executed.".to_string(),
    };

    let user = format!(
        "Evaluate this {language} solution.\n\n\
         Problem: {title}\n\
         Description: {description}\n\n\
         Code:\n```{language}\n{code}\n```\n\n\
         Test results:\n{tests}\n\n\
         Score each criterion from 0 to 100: correctness, code quality, efficiency, edge cases.\n\
         Reply with JSON of this shape:\n\
         {{\"correctness_score\": 0, \"code_quality_score\": 0, \"efficiency_score\": 0, \
         \"edge_cases_score\": 0, \"overall_score\": 0, \
         \"feedback\": {{\"summary\": \"\", \"strengths\": [], \"improvements\": [], \
         \"complexity_analysis\": \"\"}}, \
         \"next_challenge_level\": \"junior|middle|senior\"}}",
        title = task.title,
        description = task.description,
    );

    vec![ChatMessage::system(QUALITY_SYSTEM), ChatMessage::user(user)]
}

pub(crate) fn authenticity_messages(task: &Task, code: &str, language: &str) -> Vec<ChatMessage> {
    let user = format!(
        "Analyze this {language} code for originality.\n\n\
         ```{language}\n{code}\n```\n\n\
         Task context: {title}\n\n\
         Compare against common LeetCode and StackOverflow answers, public repositories and \
         textbook algorithms. Look for verbatim copies, unusual naming, paste artifacts and \
         polish inconsistent with the rest of the code.\n\n\
         similarity_score: 0-30 original, 31-60 some resemblance, 61-80 notable resemblance, \
         81-100 near copy.\n\
         Reply with JSON of this shape:\n\
         {{\"similarity_score\": 0, \"is_suspicious\": false, \
         \"likely_source\": \"leetcode|stackoverflow|github|original|unknown\", \
         \"reasoning\": \"\", \"confidence\": \"low|medium|high\", \"flags\": [], \
         \"recommendation\": \"accept|review|reject\"}}",
        title = task.title,
    );

    vec![ChatMessage::system(AUTHENTICITY_SYSTEM), ChatMessage::user(user)]
}

pub(crate) fn hint_messages(task: &Task, code: &str, language: &str) -> Vec<ChatMessage> {
    let user = format!(
        "The candidate is working on: {title}\n\n\
         Problem: {description}\n\n\
         Current code:\n```{language}\n{code}\n```\n\n\
         Give one or two sentences of hint. Do not reveal the solution.",
        title = task.title,
        description = task.description,
    );

    vec![ChatMessage::system(HINT_SYSTEM), ChatMessage::user(user)]
}

/// Steering text for the previous task's score.
pub(crate) fn adaptation(previous_score: Option<f64>) -> &'static str {
    match previous_score {
        Some(score) if score >= 85.0 => "Make it significantly harder than the previous task.",
        Some(score) if score < 50.0 => "Make it easier than the previous task.",
        Some(_) => "Keep a similar difficulty to the previous task.",
        None => "",
    }
}

pub(crate) fn task_messages(
    level: &str,
    domain: &str,
    previous_score: Option<f64>,
) -> Vec<ChatMessage> {
    let user = format!(
        "Write a coding interview task.\n\n\
         Level: {level}\n\
         Domain: {domain}\n\
         {adaptation}\n\n\
         Include three worked examples and five hidden tests covering edge cases, with a \
         clear input and output format.\n\
         Reply with JSON of this shape:\n{TASK_SHAPE}",
        adaptation = adaptation(previous_score),
    );

    vec![ChatMessage::system(TASK_SYSTEM), ChatMessage::user(user)]
}

/// How the rewritten task should compare to one scored `score`.
pub(crate) fn adjustment(score: f64) -> &'static str {
    if score >= 90.0 {
        "significantly harder"
    } else if score >= 70.0 {
        "slightly harder"
    } else if score >= 50.0 {
        "at the same difficulty"
    } else {
        "easier"
    }
}

pub(crate) fn adapt_messages(original: &GeneratedTask, score: f64) -> Vec<ChatMessage> {
    let user = format!(
        "The candidate scored {score}/100 on this task:\n\n\
         Title: {title}\n\
         Description: {description}\n\n\
         Write a new task, {adjustment}, in the same domain. It must not repeat the \
         previous one.\n\
         Reply with JSON of this shape:\n{TASK_SHAPE}",
        title = original.title,
        description = original.description,
        adjustment = adjustment(score),
    );

    vec![ChatMessage::system(ADAPT_SYSTEM), ChatMessage::user(user)]
}

pub(crate) fn style_messages(code: &str, language: &str) -> Vec<ChatMessage> {
    let user = format!(
        "Analyze the style of this {language} code.\n\n\
         ```{language}\n{code}\n```\n\n\
         Reply with JSON of this shape:\n\
         {{\"style_confidence\": \"low|medium|high\", \
         \"coding_level\": \"junior|middle|senior\", \"common_patterns\": [], \
         \"unusual_aspects\": [], \"suggests_external_help\": false}}"
    );

    vec![ChatMessage::system(STYLE_SYSTEM), ChatMessage::user(user)]
}

/// Renders interview state as short labelled lines.
pub(crate) fn context_summary(context: &InterviewContext) -> String {
    let mut out = String::new();

    if let Some(title) = &context.task_title {
        let _ = writeln!(out, "Current task: {title}");
    }
    if let Some(description) = &context.task_description {
        let excerpt: String = description.chars().take(CONTEXT_DESCRIPTION_CHARS).collect();
        if excerpt.len() < description.len() {
            let _ = writeln!(out, "Problem: {excerpt}...");
        } else {
            let _ = writeln!(out, "Problem: {excerpt}");
        }
    }
    if context.code_submitted {
        let _ = writeln!(out, "Status: code has been submitted");
    }
    if let Some(status) = &context.test_status {
        let _ = writeln!(out, "Tests: {status}");
    }
    if let Some(level) = &context.candidate_level {
        let _ = writeln!(out, "Level: {level}");
    }

    if out.is_empty() {
        "Interview in progress".to_string()
    } else {
        out.trim_end().to_string()
    }
}

pub(crate) fn dialogue_messages(
    context: &InterviewContext,
    history: &[ChatMessage],
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(DIALOGUE_SYSTEM));
    messages.push(ChatMessage::system(format!(
        "Interview context:\n{}",
        context_summary(context)
    )));
    messages.extend_from_slice(history);
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_prompt_includes_test_counts() {
        let task = Task::new("t", "Two Sum", "Find two indices");
        let report = ExecutionReport {
            visible_passed: 3,
            visible_total: 3,
            hidden_passed: 4,
            hidden_total: 5,
            execution_time_ms: 12.5,
            ..Default::default()
        };

        let messages = quality_messages(&task, "pass", "python", Some(&report));
        assert_eq!(messages[0].role, "system");
        assert!(messages[1].content.contains("Visible tests: 3/3 passed"));
        assert!(messages[1].content.contains("Hidden tests: 4/5 passed"));
        assert!(messages[1].content.contains("```python\npass\n```"));
    }

    #[test]
    fn test_adaptation_thresholds() {
        assert!(adaptation(Some(85.0)).contains("harder"));
        assert!(adaptation(Some(49.9)).contains("easier"));
        assert!(adaptation(Some(50.0)).contains("similar"));
        assert_eq!(adaptation(None), "");
    }

    #[test]
    fn test_adjustment_tiers() {
        assert_eq!(adjustment(95.0), "significantly harder");
        assert_eq!(adjustment(90.0), "significantly harder");
        assert_eq!(adjustment(89.9), "slightly harder");
        assert_eq!(adjustment(70.0), "slightly harder");
        assert_eq!(adjustment(50.0), "at the same difficulty");
        assert_eq!(adjustment(49.9), "easier");
    }

    #[test]
    fn test_adapt_prompt_carries_original_task() {
        let original = GeneratedTask {
            title: "Balanced Brackets".into(),
            description: "Check bracket balance.".into(),
            ..Default::default()
        };

        let messages = adapt_messages(&original, 72.5);
        assert!(messages[1].content.contains("scored 72.5/100"));
        assert!(messages[1].content.contains("Title: Balanced Brackets"));
        assert!(messages[1].content.contains("slightly harder"));
        assert!(messages[1].content.contains("\"hidden_tests\""));
    }

    #[test]
    fn test_context_summary_truncates_description() {
        let context = InterviewContext {
            task_title: Some("LRU cache".into()),
            task_description: Some("x".repeat(500)),
            code_submitted: true,
            ..Default::default()
        };

        let summary = context_summary(&context);
        assert!(summary.starts_with("Current task: LRU cache"));
        assert!(summary.contains(&format!("Problem: {}...", "x".repeat(200))));
        assert!(summary.ends_with("Status: code has been submitted"));
    }

    #[test]
    fn test_context_summary_empty() {
        assert_eq!(context_summary(&InterviewContext::default()), "Interview in progress");
    }
}
