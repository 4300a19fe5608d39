//! Book model

use serde::{Deserialize, Deserializer, Serialize};

use super::id::{EntityId, LenientNumber};
use crate::error::{Error, Result};
use crate::util::normalize_text_option;

/// A book as the catalog service returns it.
///
/// Only foreign-key ids are carried here; names are joined in at display time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: EntityId,
    #[serde(rename = "judul", alias = "title")]
    pub title: String,
    #[serde(rename = "pengarang", alias = "author")]
    pub author: String,
    #[serde(rename = "penerbit", alias = "publisher")]
    pub publisher: String,
    #[serde(rename = "tahunTerbit", alias = "year", deserialize_with = "lenient_year")]
    pub year: i32,
    #[serde(rename = "statusBukuId", alias = "statusId")]
    pub status_id: EntityId,
    #[serde(
        rename = "userId",
        alias = "ownerId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub owner_id: Option<EntityId>,
    #[serde(
        rename = "kategoriId",
        alias = "categoryId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub category_id: Option<EntityId>,
}

/// Create/update payload: a book without its server-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDraft {
    #[serde(rename = "judul")]
    pub title: String,
    #[serde(rename = "pengarang")]
    pub author: String,
    #[serde(rename = "penerbit")]
    pub publisher: String,
    #[serde(rename = "tahunTerbit")]
    pub year: i32,
    #[serde(rename = "statusBukuId")]
    pub status_id: EntityId,
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<EntityId>,
    #[serde(rename = "kategoriId", default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<EntityId>,
}

impl BookDraft {
    /// Trim text fields and reject empty ones before anything is sent.
    pub fn normalized(self) -> Result<Self> {
        let title = required_text(self.title, "title")?;
        let author = required_text(self.author, "author")?;
        let publisher = required_text(self.publisher, "publisher")?;
        Ok(Self {
            title,
            author,
            publisher,
            ..self
        })
    }
}

impl From<&Book> for BookDraft {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            publisher: book.publisher.clone(),
            year: book.year,
            status_id: book.status_id,
            owner_id: book.owner_id,
            category_id: book.category_id,
        }
    }
}

fn required_text(value: String, field: &str) -> Result<String> {
    normalize_text_option(Some(value))
        .ok_or_else(|| Error::InvalidInput(format!("{field} must not be empty")))
}

fn lenient_year<'de, D>(deserializer: D) -> std::result::Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = LenientNumber::deserialize(deserializer)?;
    let value = raw.as_i64().map_err(serde::de::Error::custom)?;
    i32::try_from(value).map_err(|_| serde::de::Error::custom(format!("year {value} out of range")))
}
