use std::sync::Arc;

use katalog_core::gateway::HttpGateway;
use katalog_core::store::FileSessionStore;
use katalog_core::sync::BookSnapshot;
use katalog_core::{BookDraft, CatalogService, DisplayBook, EntityId, InitReport, LookupEntry};

use crate::auth::ProfileCredentials;
use crate::cli::BookFields;
use crate::config_profiles::{default_session_dir, CliProfilesConfig};
use crate::error::CliError;

pub type Service = CatalogService<HttpGateway>;

/// Resolve the profile, then wire gateway, token lookup and session store.
pub fn open_service(global_profile: Option<&str>) -> Result<Service, CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let client_config = config
        .profile(&profile_name)
        .cloned()
        .unwrap_or_default()
        .client_config(|name| std::env::var(name).ok())?;
    let session_dir = default_session_dir(&profile_name).map_err(CliError::Config)?;
    tracing::debug!(
        "Profile '{profile_name}' -> {} (session cache {})",
        client_config.api_base_url,
        session_dir.display()
    );

    let store = FileSessionStore::open(session_dir)?;
    Ok(CatalogService::connect(
        &client_config,
        Arc::new(ProfileCredentials::new(&profile_name)),
        Arc::new(store),
    )?)
}

/// Print degraded-mode warnings. Fails only when no books could be shown.
pub fn report_init(report: InitReport, snapshot: &BookSnapshot) -> Result<(), CliError> {
    for (kind, error) in &report.lookup_failures {
        eprintln!("warning: could not refresh {kind} names: {}", error.user_message());
    }
    if let Some(error) = report.book_error {
        if !snapshot.source.is_cached() {
            return Err(error.into());
        }
        eprintln!("warning: {}", error.user_message());
    }
    if let Some(notice) = cached_notice(snapshot) {
        eprintln!("{notice}");
    }
    Ok(())
}

pub fn cached_notice(snapshot: &BookSnapshot) -> Option<String> {
    if !snapshot.source.is_cached() {
        return None;
    }
    let fetched = snapshot.fetched_at.map_or_else(
        || "an earlier session".to_string(),
        |at| at.format("%Y-%m-%d %H:%M UTC").to_string(),
    );
    Some(format!("Showing cached data from {fetched}."))
}

pub fn format_book_lines(books: &[DisplayBook]) -> Vec<String> {
    books.iter().map(format_book_line).collect()
}

pub fn format_book_line(book: &DisplayBook) -> String {
    let mut line = format!(
        "{:>5}  {} by {} ({}, {})  [{}]",
        book.id, book.title, book.author, book.publisher, book.year, book.status_name
    );
    if let Some(category) = &book.category_name {
        line.push_str(&format!("  #{category}"));
    }
    if let Some(owner) = &book.owner_name {
        line.push_str(&format!("  @{owner}"));
    }
    line
}

pub fn format_lookup_lines(entries: &[LookupEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| format!("{:>5}  {}", entry.id, entry.name))
        .collect()
}

/// Build a create payload; every book field except owner and category is required.
pub fn draft_from_fields(fields: BookFields) -> Result<BookDraft, CliError> {
    let draft = BookDraft {
        title: fields.title.ok_or(CliError::MissingField("title"))?,
        author: fields.author.ok_or(CliError::MissingField("author"))?,
        publisher: fields.publisher.ok_or(CliError::MissingField("publisher"))?,
        year: fields.year.ok_or(CliError::MissingField("year"))?,
        status_id: fields
            .status
            .map(EntityId::new)
            .ok_or(CliError::MissingField("status"))?,
        owner_id: fields.owner.map(EntityId::new),
        category_id: fields.category.map(EntityId::new),
    };
    Ok(draft.normalized()?)
}

/// Overlay the given fields on an existing book's values.
pub fn merge_fields(current: BookDraft, fields: BookFields) -> Result<BookDraft, CliError> {
    let draft = BookDraft {
        title: fields.title.unwrap_or(current.title),
        author: fields.author.unwrap_or(current.author),
        publisher: fields.publisher.unwrap_or(current.publisher),
        year: fields.year.unwrap_or(current.year),
        status_id: fields.status.map_or(current.status_id, EntityId::new),
        owner_id: fields.owner.map(EntityId::new).or(current.owner_id),
        category_id: fields.category.map(EntityId::new).or(current.category_id),
    };
    Ok(draft.normalized()?)
}
