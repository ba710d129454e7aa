//! Prompt rendering
//!
//! Pure functions; the rendering a run uses is a property of its backend
//! (see [`BackendKind::prompt_style`](crate::BackendKind::prompt_style)).

/// How goal and command are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    /// Command is an instruction the model should help run
    Task,
    /// Command is free-form continuation text
    Creative,
}

/// `My goal is: {goal}. Please help me run: {command}`
pub fn build_prompt(goal: &str, command: &str) -> String {
    format!("My goal is: {}. Please help me run: {}", goal, command)
}

/// `{goal}\n\n{command}`, or just the goal when there is no command
pub fn build_creative_prompt(goal: &str, command: &str) -> String {
    if command.is_empty() {
        goal.to_string()
    } else {
        format!("{}\n\n{}", goal, command)
    }
}

pub fn render_prompt(style: PromptStyle, goal: &str, command: &str) -> String {
    match style {
        PromptStyle::Task => build_prompt(goal, command),
        PromptStyle::Creative => build_creative_prompt(goal, command),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_prompt_contains_goal_and_command() {
        let goal = "list files: *.rs, then {count} them";
        let command = "ls -la | wc -l";
        let prompt = build_prompt(goal, command);

        assert_eq!(prompt, build_prompt(goal, command));
        assert!(prompt.contains(goal));
        assert!(prompt.contains(command));
        assert_eq!(
            prompt,
            "My goal is: list files: *.rs, then {count} them. Please help me run: ls -la | wc -l"
        );
    }

    #[test]
    fn test_task_prompt_with_empty_goal() {
        assert_eq!(build_prompt("", ""), "My goal is: . Please help me run: ");
    }

    #[test]
    fn test_creative_prompt_without_command() {
        assert_eq!(build_creative_prompt("summarize X", ""), "summarize X");
    }

    #[test]
    fn test_creative_prompt_with_command() {
        assert_eq!(
            build_creative_prompt("write a poem", "about the sea"),
            "write a poem\n\nabout the sea"
        );
    }

    #[test]
    fn test_render_dispatches_on_style() {
        assert_eq!(render_prompt(PromptStyle::Creative, "g", ""), "g");
        assert!(render_prompt(PromptStyle::Task, "g", "").starts_with("My goal is: g."));
    }
}
