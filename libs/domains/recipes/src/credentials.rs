//! Round-robin pool of interchangeable API credentials.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use core_config::env_optional;
use tracing::info;

use crate::error::{RecipeError, RecipeResult};

/// Upper bound on configured credentials (`OPENAI_API_KEY` .. `OPENAI_API_KEY_10`).
pub const MAX_CREDENTIALS: usize = 10;

/// Value shipped in sample env files; never a real key.
pub const PLACEHOLDER_KEY: &str = "your-api-key-here";

/// One API token and its position in the pool.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialSlot {
    index: usize,
    token: Arc<str>,
}

impl CredentialSlot {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for CredentialSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSlot")
            .field("index", &self.index)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Fixed, ordered set of credentials handed out in strict rotation.
///
/// The cursor is advanced atomically, so concurrent callers each receive
/// the next slot in the cycle and no slot is handed out twice in a row
/// while others are skipped.
#[derive(Debug)]
pub struct CredentialPool {
    slots: Vec<CredentialSlot>,
    cursor: AtomicUsize,
}

impl CredentialPool {
    /// Build a pool from raw key values.
    ///
    /// Blank values, the sample placeholder and duplicates are dropped.
    /// Fails when nothing usable remains or more than [`MAX_CREDENTIALS`]
    /// distinct keys are given.
    pub fn from_keys<I, S>(keys: I) -> RecipeResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tokens: Vec<String> = Vec::new();
        for key in keys {
            let key = key.as_ref().trim();
            if key.is_empty() || key == PLACEHOLDER_KEY || tokens.iter().any(|t| t == key) {
                continue;
            }
            tokens.push(key.to_string());
        }

        if tokens.is_empty() {
            return Err(RecipeError::Config("No valid API keys found".to_string()));
        }
        if tokens.len() > MAX_CREDENTIALS {
            return Err(RecipeError::Config(format!(
                "At most {} API keys are supported, got {}",
                MAX_CREDENTIALS,
                tokens.len()
            )));
        }

        let slots = tokens
            .into_iter()
            .enumerate()
            .map(|(index, token)| CredentialSlot {
                index,
                token: Arc::from(token),
            })
            .collect();

        Ok(Self {
            slots,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Load keys from `OPENAI_API_KEY`, `OPENAI_API_KEY_2` .. `OPENAI_API_KEY_10`.
    pub fn from_env() -> RecipeResult<Self> {
        let keys: Vec<String> = (1..=MAX_CREDENTIALS)
            .filter_map(|i| env_optional(&slot_name(i)))
            .collect();

        let pool = Self::from_keys(keys)?;
        info!(credentials = pool.len(), "Loaded API credentials");
        Ok(pool)
    }

    /// Hand out the next credential in the cycle.
    pub fn next(&self) -> CredentialSlot {
        let len = self.slots.len();
        let position = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some((c + 1) % len))
            .unwrap_or_else(|current| current);

        self.slots[position].clone()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; an empty pool cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

fn slot_name(i: usize) -> String {
    if i == 1 {
        "OPENAI_API_KEY".to_string()
    } else {
        format!("OPENAI_API_KEY_{}", i)
    }
}
