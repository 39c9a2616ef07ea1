pub mod criterion;
pub mod essay;
pub mod evaluation;
pub mod loaders;
pub mod rubric;

pub use criterion::Criterion;
pub use essay::Essay;
pub use evaluation::{CriterionEntry, Evaluation, PairOutcome, ResultDocument};
pub use loaders::{load_prompt_templates, load_rubric, EssayDir, PromptTemplates};
pub use rubric::{RubricBand, RubricTable};
