// Public modules
pub mod content;
pub mod generate;
pub mod message;
pub mod model;

// Re-exports
pub use content::{Content, Part};
pub use generate::{Candidate, GenerateContentRequest, GenerateContentResponse, PromptFeedback};
pub use message::{Message, Role};
pub use model::{KnownModel, Model};
