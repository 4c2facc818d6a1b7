use async_trait::async_trait;

use crate::credentials::CredentialSlot;
use crate::error::RecipeResult;

/// A remote model that turns Korean recipe text into English.
///
/// One call per text. Any error is treated by the caller as a transient
/// failure of that single call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    async fn translate(&self, credential: &CredentialSlot, text: &str) -> RecipeResult<String>;
}
