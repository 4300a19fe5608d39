use katalog_core::{BookDraft, EntityId, FilterKind};

use crate::cli::{BookFields, BooksCommands};
use crate::commands::common::{
    draft_from_fields, format_book_line, format_book_lines, merge_fields, open_service,
    report_init, Service,
};
use crate::error::CliError;

pub async fn run_books(command: BooksCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    let service = open_service(global_profile)?;
    let report = service.init().await;
    report_init(report, &service.snapshot())?;

    match command {
        BooksCommands::List {
            filter,
            value,
            json,
        } => run_list(&service, filter, &value, json).await,
        BooksCommands::Add { fields } => run_add(&service, fields).await,
        BooksCommands::Edit { id, fields } => run_edit(&service, id, fields).await,
        BooksCommands::Delete { id } => run_delete(&service, id).await,
    }
}

async fn run_list(service: &Service, filter: FilterKind, value: &str, as_json: bool) -> Result<(), CliError> {
    if filter != FilterKind::All {
        service.apply_filter(filter, value).await?;
    }

    let books = service.display_books();
    if as_json {
        println!("{}", serde_json::to_string_pretty(&books)?);
    } else if books.is_empty() {
        println!("No books.");
    } else {
        for line in format_book_lines(&books) {
            println!("{line}");
        }
    }
    Ok(())
}

async fn run_add(service: &Service, fields: BookFields) -> Result<(), CliError> {
    let draft = draft_from_fields(fields)?;
    let created = service.create_book(&draft).await?;
    println!("Added {}", format_book_line(&created));
    Ok(())
}

async fn run_edit(service: &Service, id: i64, fields: BookFields) -> Result<(), CliError> {
    let id = EntityId::new(id);
    let current = service
        .books()
        .books()
        .iter()
        .find(|book| book.id == id)
        .map(BookDraft::from)
        .ok_or(CliError::BookNotFound(id.get()))?;
    let draft = merge_fields(current, fields)?;
    let updated = service.update_book(id, &draft).await?;
    println!("Updated {}", format_book_line(&updated));
    Ok(())
}

async fn run_delete(service: &Service, id: i64) -> Result<(), CliError> {
    service.delete_book(EntityId::new(id)).await?;
    println!("Deleted book {id}");
    Ok(())
}
