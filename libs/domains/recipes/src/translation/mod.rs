mod backend;
mod config;
mod openai;
mod translator;
mod units;

pub use backend::TranslationBackend;
pub use config::TranslatorConfig;
pub(crate) use config::seconds;
pub use openai::OpenAITranslator;
pub use translator::ParallelTranslator;
pub use units::{TranslationUnit, UnitTag, assemble, needs_translation, translation_units};
