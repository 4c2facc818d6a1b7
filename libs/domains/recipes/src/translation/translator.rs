use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::{FutureExt, StreamExt, stream};
use tokio::sync::{OnceCell, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use super::TranslationBackend;
use super::units::{assemble, english_for, needs_translation, place, translation_units};
use crate::cache::TranslationCache;
use crate::credentials::CredentialPool;
use crate::error::RecipeError;
use crate::models::{Recipe, TranslatedRecipe};

type Claim = Arc<OnceCell<Option<String>>>;

/// Translates recipes concurrently across a credential pool.
///
/// Cheap to clone; clones share the pool, the cache and the table of
/// in-flight requests, so identical texts requested from different recipes
/// at the same time still produce one backend call.
#[derive(Clone)]
pub struct ParallelTranslator {
    pool: Arc<CredentialPool>,
    cache: Arc<TranslationCache>,
    backend: Arc<dyn TranslationBackend>,
    delay: Duration,
    call_timeout: Duration,
    inflight: Arc<Mutex<HashMap<String, Claim>>>,
}

impl ParallelTranslator {
    pub fn new(
        pool: Arc<CredentialPool>,
        cache: Arc<TranslationCache>,
        backend: Arc<dyn TranslationBackend>,
    ) -> Self {
        Self {
            pool,
            cache,
            backend,
            delay: Duration::from_secs(2),
            call_timeout: Duration::from_secs(30),
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn cache(&self) -> &Arc<TranslationCache> {
        &self.cache
    }

    /// Translate one string.
    ///
    /// Text without Korean is returned as is; a failed call returns the
    /// source text.
    pub async fn translate_text(&self, text: &str) -> String {
        if !needs_translation(text) {
            return text.to_string();
        }
        let mut translations = self.translate_sources(vec![text]).await;
        translations.remove(text).unwrap_or_else(|| text.to_string())
    }

    /// Translate every Korean field of `recipe`.
    #[instrument(skip_all, fields(url = %recipe.url))]
    pub async fn translate_recipe(&self, recipe: Recipe) -> TranslatedRecipe {
        let sources: Vec<&str> = translation_units(&recipe).iter().map(|u| u.text).collect();
        let translations = self.translate_sources(sources).await;

        let translated = assemble(recipe, &translations);
        info!(title = %translated.recipe.title, "Translated recipe");
        translated
    }

    /// Translate a batch of recipes, returning them in input order.
    ///
    /// With more than one credential, recipes are processed in parallel
    /// (at most one recipe per credential at a time). A recipe whose task
    /// dies is returned with its source text in the English fields.
    #[instrument(skip_all, fields(recipes = recipes.len(), credentials = self.pool.len()))]
    pub async fn translate_all(&self, recipes: Vec<Recipe>) -> Vec<TranslatedRecipe> {
        info!("Translating recipes");

        if self.pool.len() == 1 || recipes.len() <= 1 {
            let mut out = Vec::with_capacity(recipes.len());
            for recipe in recipes {
                out.push(self.translate_recipe(recipe).await);
            }
            return out;
        }

        let workers = Arc::new(Semaphore::new(self.pool.len().min(recipes.len())));
        let mut tasks = JoinSet::new();

        for (index, recipe) in recipes.iter().cloned().enumerate() {
            let translator = self.clone();
            let workers = Arc::clone(&workers);
            tasks.spawn(async move {
                let _permit = workers.acquire_owned().await.ok();
                let outcome = AssertUnwindSafe(translator.translate_recipe(recipe))
                    .catch_unwind()
                    .await;
                (index, outcome.ok())
            });
        }

        let mut finished: Vec<(usize, TranslatedRecipe)> = Vec::with_capacity(recipes.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Some(translated))) => finished.push((index, translated)),
                Ok((index, None)) => {
                    error!(url = %recipes[index].url, "Recipe translation panicked, keeping source text");
                }
                Err(e) => error!(error = %e, "Recipe translation task failed"),
            }
        }

        let done: HashSet<usize> = finished.iter().map(|(index, _)| *index).collect();
        for (index, recipe) in recipes.into_iter().enumerate() {
            if !done.contains(&index) {
                finished.push((index, TranslatedRecipe::untranslated(recipe)));
            }
        }

        // completion order is arbitrary; restore input order
        finished.sort_by_key(|(index, _)| *index);
        finished.into_iter().map(|(_, translated)| translated).collect()
    }

    /// Retranslate only the fields whose English text is missing, empty, or
    /// still identical to the Korean source.
    #[instrument(skip_all, fields(url = %translated.recipe.url))]
    pub async fn fill_missing(&self, mut translated: TranslatedRecipe) -> TranslatedRecipe {
        let recipe = &translated.recipe;
        let ingredients = recipe.ingredients.len();
        let steps = recipe.cooking_steps.len();

        // pad short English sequences with source text so every index has a slot
        for i in translated.ingredients_en.len()..ingredients {
            let source = translated.recipe.ingredients[i].clone();
            translated.ingredients_en.push(source);
        }
        for i in translated.cooking_steps_en.len()..steps {
            let source = translated.recipe.cooking_steps[i].text.clone();
            translated.cooking_steps_en.push(source);
        }

        let missing: Vec<_> = translation_units(&translated.recipe)
            .into_iter()
            .filter(|unit| {
                english_for(&translated, unit.tag)
                    .is_none_or(|en| en.trim().is_empty() || en == unit.text)
            })
            .map(|unit| (unit.tag, unit.text.to_string()))
            .collect();

        if missing.is_empty() {
            return translated;
        }
        debug!(fields = missing.len(), "Repairing missing translations");

        let translations = self
            .translate_sources(missing.iter().map(|(_, text)| text.as_str()).collect())
            .await;

        for (tag, text) in missing {
            if let Some(value) = translations.get(&text) {
                place(&mut translated, tag, value.clone());
            }
        }
        translated
    }

    /// Resolve a set of Korean source texts to translations.
    ///
    /// Cache hits are answered directly; the remaining unique texts are
    /// dispatched with at most one in-flight call per credential. Texts
    /// whose call failed are absent from the result.
    async fn translate_sources(&self, sources: Vec<&str>) -> HashMap<String, String> {
        let (mut translations, novel) = self.cache.partition(sources).await;
        if novel.is_empty() {
            return translations;
        }

        let workers = self.pool.len().min(novel.len());
        debug!(cached = translations.len(), novel = novel.len(), workers, "Dispatching translations");

        let resolved: Vec<(String, Option<String>)> = if self.pool.len() == 1 {
            let mut resolved = Vec::with_capacity(novel.len());
            for text in novel {
                let result = self.resolve(&text).await;
                resolved.push((text, result));
            }
            resolved
        } else {
            stream::iter(novel)
                .map(|text| async move {
                    let result = self.resolve(&text).await;
                    (text, result)
                })
                .buffer_unordered(workers)
                .collect()
                .await
        };

        translations.extend(
            resolved
                .into_iter()
                .filter_map(|(text, result)| result.map(|translated| (text, translated))),
        );
        translations
    }

    /// Translate one novel text, coalescing with any identical request
    /// already in flight.
    async fn resolve(&self, text: &str) -> Option<String> {
        let claim = {
            let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(inflight.entry(text.to_string()).or_default())
        };

        let result = claim.get_or_init(|| self.dispatch(text)).await.clone();

        let mut inflight = self.inflight.lock().unwrap_or_else(PoisonError::into_inner);
        if inflight.get(text).is_some_and(|current| Arc::ptr_eq(current, &claim)) {
            inflight.remove(text);
        }

        result
    }

    /// Issue one backend call with the next credential, then hold the
    /// worker for the configured delay whatever the outcome.
    async fn dispatch(&self, text: &str) -> Option<String> {
        // a claim released just before ours may already have filled the cache
        if let Some(hit) = self.cache.lookup(text).await {
            return Some(hit);
        }

        let credential = self.pool.next();
        debug!(slot = credential.index(), "Requesting translation");

        let outcome = match tokio::time::timeout(
            self.call_timeout,
            self.backend.translate(&credential, text),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(RecipeError::Timeout(self.call_timeout)),
        };

        let result = match outcome {
            Ok(translated) => {
                if let Err(e) = self.cache.store(text, &translated).await {
                    warn!(error = %e, "Failed to persist translation cache");
                }
                Some(translated)
            }
            Err(e) => {
                warn!(slot = credential.index(), error = %e, "Translation failed, keeping source text");
                None
            }
        };

        tokio::time::sleep(self.delay).await;
        result
    }
}
