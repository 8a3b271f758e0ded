use include_dir::{include_dir, Dir};
use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

static CATALOG_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/catalog");

/// Category label meaning "match any passage"
pub const ANY_CATEGORY: &str = "All";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// One entry of the passage catalog. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPassage {
    pub id: String,
    pub text: String,
    pub category: String,
    pub language: String,
    pub difficulty: Difficulty,
}

impl TextPassage {
    /// Number of characters a user must type to finish the passage
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    #[allow(dead_code)]
    name: String,
    passages: Vec<TextPassage>,
}

/// Ordered, immutable collection of passages
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    passages: Vec<TextPassage>,
}

impl Catalog {
    pub fn new(passages: Vec<TextPassage>) -> Self {
        Self { passages }
    }

    /// The catalog compiled into the binary
    pub fn builtin() -> Result<Self> {
        Self::from_embedded("passages.json")
    }

    fn from_embedded(file_name: &str) -> Result<Self> {
        let file = CATALOG_DIR
            .get_file(file_name)
            .ok_or_else(|| Error::Catalog(format!("{file_name} not found")))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| Error::Catalog(format!("{file_name} is not utf-8")))?;
        Self::from_json(contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let parsed: CatalogFile =
            serde_json::from_str(json).map_err(|e| Error::Catalog(e.to_string()))?;
        Ok(Self::new(parsed.passages))
    }

    pub fn passages(&self) -> &[TextPassage] {
        &self.passages
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Distinct categories in order of first appearance
    pub fn categories(&self) -> Vec<String> {
        self.passages
            .iter()
            .map(|p| p.category.clone())
            .unique()
            .collect()
    }

    /// Whether `category` would select at least one passage
    pub fn offers(&self, category: &str) -> bool {
        if category == ANY_CATEGORY {
            !self.is_empty()
        } else {
            self.passages.iter().any(|p| p.category == category)
        }
    }

    pub fn select(&self, category: &str) -> Result<TextPassage> {
        select_passage(&self.passages, category)
    }

    pub fn select_with<R: Rng + ?Sized>(&self, category: &str, rng: &mut R) -> Result<TextPassage> {
        select_passage_with(&self.passages, category, rng)
    }
}

/// Pick a random passage whose category equals `category`, or any passage
/// when `category` is [`ANY_CATEGORY`].
pub fn select_passage(catalog: &[TextPassage], category: &str) -> Result<TextPassage> {
    select_passage_with(catalog, category, &mut rand::thread_rng())
}

pub fn select_passage_with<R: Rng + ?Sized>(
    catalog: &[TextPassage],
    category: &str,
    rng: &mut R,
) -> Result<TextPassage> {
    let candidates: Vec<&TextPassage> = catalog
        .iter()
        .filter(|p| category == ANY_CATEGORY || p.category == category)
        .collect();

    match candidates.choose(rng) {
        Some(passage) => Ok((*passage).clone()),
        None if catalog.is_empty() => Err(Error::EmptyCatalog),
        None => Err(Error::NoPassagesForCategory {
            category: category.to_string(),
        }),
    }
}
