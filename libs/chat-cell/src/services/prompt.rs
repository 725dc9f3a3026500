use crate::models::ChatMessage;

pub const SYSTEM_INSTRUCTION: &str = "
You are HealthLink AI, a helpful healthcare assistant. Keep responses SHORT and CONCISE (2-3 paragraphs max).

Rules:
1. Give brief, direct answers about health topics
2. Use bullet points when listing symptoms or tips
3. Always end with: \"Consult a doctor for proper diagnosis.\"
4. For emergencies, say: \"Call 911 immediately.\"
5. Don't prescribe medications - suggest seeing a doctor

Be friendly but keep it short. No lengthy explanations unless asked.
";

pub const EMPTY_ANSWER_FALLBACK: &str = "I'm sorry, I couldn't process that. Please try again.";
pub const PROVIDER_FAILURE_FALLBACK: &str = "I'm experiencing technical difficulties. Please try again.";

/// Wraps the user's question with retrieved context; returns it untouched when there is none.
pub fn augment_message(message: &str, context: &str) -> String {
    if context.is_empty() {
        return message.to_string();
    }

    format!(
        "RELEVANT HEALTHCARE INFORMATION:\n{context}\n\nUSER QUESTION: {message}\n\n\
         Please answer the user's question using the relevant healthcare information provided above. \
         If the information is helpful, incorporate it into your response. \
         Always include appropriate medical disclaimers."
    )
}

/// Maps a client-side role onto the OpenAI-compatible vocabulary.
pub fn openai_role(role: &str) -> &str {
    if role == "model" {
        "assistant"
    } else {
        role
    }
}

/// Single-string prompt for completion APIs without a message list.
pub fn flattened_prompt(system: &str, history: &[ChatMessage], message: &str, context: &str) -> String {
    let mut prompt = format!("{}\n\n", system);

    for turn in history {
        let label = if turn.is_user() { "User" } else { "Assistant" };
        prompt.push_str(&format!("{}: {}\n\n", label, turn.text));
    }

    if context.is_empty() {
        prompt.push_str(&format!("User: {}", message));
    } else {
        prompt.push_str(&augment_message(message, context));
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_message_without_context() {
        assert_eq!(augment_message("hello", ""), "hello");
    }

    #[test]
    fn context_is_wrapped() {
        let augmented = augment_message("What causes fever?", "[DISEASES]\nFlu");
        assert!(augmented.starts_with("RELEVANT HEALTHCARE INFORMATION:\n[DISEASES]\nFlu\n\nUSER QUESTION: What causes fever?\n\n"));
        assert!(augmented.ends_with("Always include appropriate medical disclaimers."));
    }

    #[test]
    fn model_role_becomes_assistant() {
        assert_eq!(openai_role("model"), "assistant");
        assert_eq!(openai_role("user"), "user");
    }

    #[test]
    fn flattened_prompt_labels_history() {
        let history = vec![
            ChatMessage { role: "user".into(), text: "hi".into() },
            ChatMessage { role: "model".into(), text: "hello".into() },
        ];
        let prompt = flattened_prompt("SYS", &history, "I have a cough", "");
        assert_eq!(prompt, "SYS\n\nUser: hi\n\nAssistant: hello\n\nUser: I have a cough");
    }
}
