pub mod llm_service;
pub mod prompt_builder;
pub mod result_parser;
pub mod result_writer;
pub mod warn_writer;

pub use llm_service::{ChatModel, LlmService};
pub use prompt_builder::{build_prompt, PromptRequest};
pub use result_parser::parse_reply;
pub use result_writer::ResultWriter;
pub use warn_writer::WarnWriter;
