use bankbuddy_client::ClientError;

use crate::output::format::key_value_rows;

const FALLBACK_STEP: &str = "Retry the command.";

fn heading(error: &ClientError) -> &'static str {
    if error.is_internal() {
        "The ledger could not complete this command."
    } else {
        "Something went wrong, but it's easy to fix."
    }
}

pub fn render_error(error: &ClientError) -> String {
    let mut lines = vec![heading(error).to_string(), String::new()];
    lines.extend(key_value_rows(
        &[
            ("Error:", error.code.clone()),
            ("Details:", error.message.clone()),
        ],
        2,
    ));
    lines.push(String::new());
    lines.push("What to do next:".to_string());

    let steps = if error.recovery_steps.is_empty() {
        vec![FALLBACK_STEP.to_string()]
    } else {
        error.recovery_steps.clone()
    };
    lines.extend(
        steps
            .iter()
            .enumerate()
            .map(|(index, step)| format!("  {}. {step}", index + 1)),
    );

    lines.join("\n")
}
