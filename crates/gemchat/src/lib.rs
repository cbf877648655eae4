// gemchat: terminal chat client for the Gemini streaming API.

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod session;
pub mod stream;
pub mod turn;
pub mod wire;

// Curated re-exports: the surface a consumer (including the binary and the
// integration tests) actually needs.
pub use client::ChatClient;
pub use config::{ChatTimeout, Settings};
pub use context::ContextBuffer;
pub use error::{Error, ErrorKind};
pub use session::{Session, ANSWER_PREFIX, INPUT_PROMPT, QUIT_COMMAND};
pub use stream::{collect_answer, AnswerAccumulator, FrameParser, FRAME_PREFIX_LEN};
pub use turn::{TurnOrchestrator, PROMPT_INSTRUCTION};
pub use wire::{
    Candidate, Content, GenerateRequest, GenerateResponse, GenerationConfig, Part, UsageMetadata,
};
