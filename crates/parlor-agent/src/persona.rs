/// Standing instructions for the assistant.
pub const AGENT_INSTRUCTIONS: &str = "You are a helpful and friendly voice assistant. \
Keep your responses concise and natural, as if having a conversation. \
Be warm and engaging. Keep responses under 3 sentences unless asked for more detail.";

/// One-off instructions for the reply spoken when the session starts.
pub const GREETING_INSTRUCTIONS: &str =
    "Greet the user warmly and briefly ask how you can help them today. Keep it under 2 sentences.";

/// The persona a session speaks as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    instructions: String,
}

impl Agent {
    pub fn new(instructions: impl Into<String>) -> Self {
        Self {
            instructions: instructions.into(),
        }
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self::new(AGENT_INSTRUCTIONS)
    }
}
