use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

use super::{AiError, PrioritizedTasks};

static FENCED_JSON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("fenced JSON regex is valid")
});

pub fn build_prompt(tasks: &[String]) -> String {
    let mut prompt = String::from(
        "You are an AI task prioritization expert. Given a list of tasks, analyze them \
         and determine the optimal order of execution.\n\nTasks:\n",
    );
    for task in tasks {
        let _ = writeln!(prompt, "- {task}");
    }
    prompt.push_str(
        "\nReturn every task exactly once, reordered, and a detailed explanation of why the \
         order was changed, including what makes a task more important than the others.\n\n\
         Respond with only a JSON object of the form:\n\
         {\"prioritizedTasks\": [\"<task>\", ...], \"reasoning\": \"<explanation>\"}\n",
    );
    prompt
}

/// Pull the JSON object out of a model reply, tolerating markdown fences and
/// chatter around it.
pub fn parse_response(text: &str) -> Result<PrioritizedTasks, AiError> {
    let trimmed = text.trim();
    let candidate = if let Some(caps) = FENCED_JSON_RE.captures(trimmed) {
        caps.get(1).map_or(trimmed, |m| m.as_str())
    } else if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && start < end
    {
        &trimmed[start..=end]
    } else {
        trimmed
    };

    serde_json::from_str(candidate).map_err(|e| {
        AiError::InvalidResponse(format!("could not parse reply as JSON ({e}): {trimmed}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_every_task() {
        let prompt = build_prompt(&["Write docs".into(), "Fix bug".into()]);
        assert!(prompt.contains("- Write docs\n"));
        assert!(prompt.contains("- Fix bug\n"));
        assert!(prompt.contains("prioritizedTasks"));
    }

    #[test]
    fn parses_bare_json() {
        let parsed =
            parse_response(r#"{"prioritizedTasks":["B","A"],"reasoning":"B is urgent"}"#).unwrap();
        assert_eq!(parsed.prioritized_tasks, vec!["B", "A"]);
        assert_eq!(parsed.reasoning, "B is urgent");
    }

    #[test]
    fn parses_fenced_json() {
        let reply = "Sure!\n```json\n{\"prioritizedTasks\": [\"A\"], \"reasoning\": \"only one\"}\n```\n";
        let parsed = parse_response(reply).unwrap();
        assert_eq!(parsed.prioritized_tasks, vec!["A"]);
    }

    #[test]
    fn parses_json_with_surrounding_text() {
        let reply = "Here you go: {\"prioritizedTasks\": [], \"reasoning\": \"\"} hope it helps";
        assert!(parse_response(reply).is_ok());
    }

    #[test]
    fn rejects_reply_with_braces_out_of_order() {
        let err = parse_response("} sorry, I can't do that {").unwrap_err();
        assert!(matches!(err, AiError::InvalidResponse(_)));
    }

    #[test]
    fn rejects_schema_violations() {
        assert!(matches!(
            parse_response(r#"{"tasks":["A"]}"#),
            Err(AiError::InvalidResponse(_))
        ));
        assert!(parse_response("no json at all").is_err());
        assert!(parse_response(r#"{"prioritizedTasks":"A","reasoning":"x"}"#).is_err());
    }
}
