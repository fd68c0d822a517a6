pub mod backend;
pub mod gemini;
pub mod ollama;

pub use backend::ModelBackend;
pub use gemini::GeminiClient;
pub use ollama::{OllamaClient, DEFAULT_OLLAMA_URL};
