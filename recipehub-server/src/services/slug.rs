//! URL slugs
//!
//! Slugs are lowercase ASCII alphanumerics joined by single hyphens. Uniqueness
//! is established by probing (`base`, `base-2`, `base-3`, ...) and backed by
//! the UNIQUE constraint on `recipes.slug`.

use async_trait::async_trait;
use recipehub_common::{Error, Result};
use sqlx::SqliteConnection;
use std::collections::HashSet;

const FALLBACK_SLUG: &str = "recipe";
const MAX_SUFFIX: u32 = 10_000;

/// Derive a URL-safe slug from a title
///
/// Non-ASCII letters are dropped along with punctuation; a title with no
/// usable characters yields `recipe`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Answers whether a slug is already taken
#[async_trait]
pub trait SlugProbe: Send {
    async fn is_taken(&mut self, slug: &str) -> Result<bool>;
}

#[async_trait]
impl SlugProbe for SqliteConnection {
    async fn is_taken(&mut self, slug: &str) -> Result<bool> {
        crate::db::recipes::slug_exists(self, slug).await
    }
}

#[async_trait]
impl SlugProbe for HashSet<String> {
    async fn is_taken(&mut self, slug: &str) -> Result<bool> {
        Ok(self.contains(slug))
    }
}

/// First free slug for `title`: the bare slug, then `-2`, `-3`, ...
pub async fn unique_slug<P>(title: &str, probe: &mut P) -> Result<String>
where
    P: SlugProbe + ?Sized,
{
    let base = slugify(title);
    if !probe.is_taken(&base).await? {
        return Ok(base);
    }

    for suffix in 2..=MAX_SUFFIX {
        let candidate = format!("{}-{}", base, suffix);
        if !probe.is_taken(&candidate).await? {
            return Ok(candidate);
        }
    }

    Err(Error::Internal(format!(
        "No free slug for '{}' after {} attempts",
        base, MAX_SUFFIX
    )))
}
