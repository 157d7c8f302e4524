//! Prompt assembly and model-output normalization

use crate::config::Persona;
use crate::history::{Message, Role};

/// Build the free-form chat prompt: persona preamble, recent conversation
/// context, then the new user turn.
pub fn chat_prompt(persona: &Persona, history: &[Message], prompt: &str) -> String {
    let mut out = format!("You are {}, a {}.\n", persona.name, persona.role);

    if !history.is_empty() {
        out.push_str("\nPrevious conversation context:\n");
        for msg in history {
            let label = match msg.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            out.push_str(&format!("{}: {}\n", label, msg.content));
        }
    }

    out.push_str(&format!("\nUser: {}\nAssistant:", prompt));
    out
}

/// Build the constrained command-generation prompt. The backend is told to
/// emit exactly one shell command line with no prose; `normalize_command`
/// cleans up backends that ignore the instruction anyway.
pub fn command_prompt(persona: &Persona, description: &str) -> String {
    format!(
        "You are {}, a {}. Convert the user's request into a single shell \
         command.\n\
         Respond with EXACTLY one shell command line. No explanation, no \
         markdown, no code fences, no prefix text.\n\n\
         Request: {}\nCommand:",
        persona.name, persona.role, description
    )
}

/// Best-effort cleanup of a generated command: strips code fences, inline
/// backticks and conversational prefixes, then takes the first non-empty
/// line. Returns `None` when nothing usable remains, so callers surface a
/// model error instead of executing an empty command.
pub fn normalize_command(raw: &str) -> Option<String> {
    let mut candidate = None;

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("```") {
            continue;
        }
        candidate = Some(line);
        break;
    }

    let mut command = candidate?.trim_matches('`').trim();

    for prefix in ["Generated command:", "Command:", "$"] {
        if let Some(rest) = command.strip_prefix(prefix) {
            command = rest.trim();
        }
    }

    if command.is_empty() {
        None
    } else {
        Some(command.to_string())
    }
}
