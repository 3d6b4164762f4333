//! Scripted `AiService` for tests: replays queued replies and records prompts.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{AiService, LlmError};

#[derive(Default)]
pub struct ScriptedAi {
    replies: Mutex<VecDeque<Result<String, u16>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedAi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()))
    }

    /// Queues an API failure with the given HTTP status.
    pub fn fail(self, status: u16) -> Self {
        self.push(Err(status))
    }

    fn push(self, entry: Result<String, u16>) -> Self {
        self.replies.lock().unwrap().push_back(entry);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl AiService for ScriptedAi {
    async fn send_prompt(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(status)) => Err(LlmError::Api {
                status,
                message: "scripted failure".to_string(),
            }),
            None => Err(LlmError::EmptyContent),
        }
    }
}

/// A well-formed five-question reply wrapped the way models usually wrap it.
pub fn five_questions_reply() -> String {
    let items: Vec<String> = (1..=5)
        .map(|i| format!(r#"{{"question": "Question {i}?", "answer": "Answer {i}."}}"#))
        .collect();
    format!("```json\n[{}]\n```", items.join(",\n"))
}
