//! Denormalized, display-ready books.
//!
//! A `DisplayBook` is recomputed from a `Book` and the lookup tables every
//! time; it is never stored, so it cannot drift from its inputs.

use serde::Serialize;

use crate::models::{Book, EntityId, LookupKind};

/// Shown for a foreign key the lookup tables do not know about.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Id → name resolution with no I/O.
pub trait LookupResolver {
    fn resolve_name(&self, kind: LookupKind, id: EntityId) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayBook {
    pub id: EntityId,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub year: i32,
    pub status_id: EntityId,
    pub status_name: String,
    pub owner_id: Option<EntityId>,
    pub owner_name: Option<String>,
    pub category_id: Option<EntityId>,
    pub category_name: Option<String>,
}

/// Join `book` against `lookups`. Never fails: unknown keys become [`UNKNOWN_NAME`].
pub fn to_display<R: LookupResolver + ?Sized>(book: &Book, lookups: &R) -> DisplayBook {
    let name_of = |kind: LookupKind, id: EntityId| {
        lookups
            .resolve_name(kind, id)
            .unwrap_or_else(|| UNKNOWN_NAME.to_string())
    };

    DisplayBook {
        id: book.id,
        title: book.title.clone(),
        author: book.author.clone(),
        publisher: book.publisher.clone(),
        year: book.year,
        status_id: book.status_id,
        status_name: name_of(LookupKind::Status, book.status_id),
        owner_id: book.owner_id,
        owner_name: book.owner_id.map(|id| name_of(LookupKind::User, id)),
        category_id: book.category_id,
        category_name: book.category_id.map(|id| name_of(LookupKind::Category, id)),
    }
}

pub fn to_display_all<R: LookupResolver + ?Sized>(books: &[Book], lookups: &R) -> Vec<DisplayBook> {
    books.iter().map(|book| to_display(book, lookups)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::LookupSnapshot;
    use crate::models::LookupEntry;
    use pretty_assertions::assert_eq;

    fn book(status_id: i64) -> Book {
        Book {
            id: EntityId::new(10),
            title: "Ronggeng Dukuh Paruk".to_string(),
            author: "Ahmad Tohari".to_string(),
            publisher: "Gramedia".to_string(),
            year: 1982,
            status_id: EntityId::new(status_id),
            owner_id: Some(EntityId::new(4)),
            category_id: None,
        }
    }

    fn lookups() -> LookupSnapshot {
        LookupSnapshot::from_entries([
            (
                LookupKind::Status,
                vec![
                    LookupEntry::new(1, "Tersedia"),
                    LookupEntry::new(2, "Dipinjam"),
                ],
            ),
            (LookupKind::User, vec![LookupEntry::new(4, "dewi")]),
        ])
    }

    #[test]
    fn resolves_known_keys() {
        let display = to_display(&book(2), &lookups());
        assert_eq!(display.status_name, "Dipinjam");
        assert_eq!(display.owner_name.as_deref(), Some("dewi"));
        assert_eq!(display.category_name, None);
    }

    #[test]
    fn missing_status_degrades_to_sentinel() {
        let display = to_display(&book(7), &lookups());
        assert_eq!(display.status_name, UNKNOWN_NAME);
    }

    #[test]
    fn empty_lookups_never_panic() {
        let display = to_display(&book(1), &LookupSnapshot::default());
        assert_eq!(display.status_name, UNKNOWN_NAME);
        assert_eq!(display.owner_name.as_deref(), Some(UNKNOWN_NAME));
    }

    #[test]
    fn join_is_idempotent() {
        let lookups = lookups();
        let input = book(1);
        assert_eq!(to_display(&input, &lookups), to_display(&input, &lookups));
    }

    #[test]
    fn to_display_all_keeps_order() {
        let books = vec![book(1), Book { id: EntityId::new(11), ..book(2) }];
        let names = to_display_all(&books, &lookups())
            .into_iter()
            .map(|display| display.status_name)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Tersedia", "Dipinjam"]);
    }
}
