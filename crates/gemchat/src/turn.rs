// One request/response turn: context in, streamed answer out.

use crate::client::ChatClient;
use crate::config::Settings;
use crate::context::ContextBuffer;
use crate::error::Error;
use crate::stream::collect_answer;
use crate::wire::{GenerateRequest, GenerationConfig};

/// Instruction prefix attached to every user prompt folded into context.
/// Answers are appended untagged, so the two entry kinds stay distinct.
pub const PROMPT_INSTRUCTION: &str = "Answer the question Briefly: ";

/// Drives one request/response cycle at a time.
///
/// Per turn: the prompt is appended to the context buffer, the rendered
/// context goes out as a single user turn, the streamed body is consumed by
/// a fresh single-purpose worker task, and the assembled answer is folded
/// back into the buffer as a new entry. Turns never overlap; the buffer is
/// touched only between turn boundaries.
pub struct TurnOrchestrator {
    client: ChatClient,
    context: ContextBuffer,
    generation_config: Option<GenerationConfig>,
}

impl TurnOrchestrator {
    pub fn new(settings: &Settings) -> Self {
        Self {
            client: ChatClient::new(settings),
            context: ContextBuffer::new(settings.history_limit),
            generation_config: generation_config(settings),
        }
    }

    /// Run one full turn and return the assembled answer.
    ///
    /// On a transport error the buffer is left as-is, so the failed turn's
    /// prompt remains the newest context entry.
    pub async fn run_turn(&mut self, prompt: &str) -> Result<String, Error> {
        self.context
            .append(format!("{PROMPT_INSTRUCTION}{prompt}"));
        let full_prompt = self.context.render();

        let request = GenerateRequest::single_turn(full_prompt)
            .with_generation_config(self.generation_config.clone());
        let response = self.client.stream_generate(&request).await?;

        // Fresh worker per turn, joined before the next turn can start.
        let read_timeout = self.client.stream_read_timeout();
        let answer = tokio::spawn(collect_answer(response, read_timeout))
            .await
            .map_err(|e| Error::stream("answer worker failed", e))??;

        self.context.append(answer.clone());
        Ok(answer)
    }

    /// The rolling conversation context backing this session.
    pub fn context(&self) -> &ContextBuffer {
        &self.context
    }
}

/// Sampling options from the config file, or none at all.
fn generation_config(settings: &Settings) -> Option<GenerationConfig> {
    if settings.temperature.is_none()
        && settings.top_p.is_none()
        && settings.top_k.is_none()
        && settings.max_output_tokens.is_none()
    {
        return None;
    }
    Some(GenerationConfig {
        temperature: settings.temperature,
        top_p: settings.top_p,
        top_k: settings.top_k,
        max_output_tokens: settings.max_output_tokens,
        response_mime_type: None,
    })
}
