pub mod asset_loader;
pub mod essay_loader;

pub use asset_loader::{load_prompt_templates, load_rubric, PromptTemplates};
pub use essay_loader::{EssayDir, EssayIter};
