use katalog_core::{EntityId, LookupKind};

use crate::cli::StatusCommands;
use crate::commands::common::{format_lookup_lines, open_service};
use crate::error::CliError;

pub async fn run_status(command: StatusCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    let service = open_service(global_profile)?;
    let lookups = service.lookups();
    // Mutations re-persist the table, so it has to be loaded first.
    if let Err(error) = lookups.ensure_loaded(LookupKind::Status).await {
        if lookups.get(LookupKind::Status).is_empty() {
            return Err(error.into());
        }
        eprintln!("warning: {}", error.user_message());
    }

    match command {
        StatusCommands::List { json } => {
            let table = lookups.get(LookupKind::Status);
            if json {
                println!("{}", serde_json::to_string_pretty(table.entries())?);
            } else {
                for line in format_lookup_lines(table.entries()) {
                    println!("{line}");
                }
            }
        }
        StatusCommands::Add { name } => {
            let entry = service.create_status(&name).await?;
            println!("Added status {} ({})", entry.name, entry.id);
        }
        StatusCommands::Rename { id, name } => {
            let entry = service.rename_status(EntityId::new(id), &name).await?;
            println!("Renamed status {} to {}", entry.id, entry.name);
        }
        StatusCommands::Delete { id } => {
            service.delete_status(EntityId::new(id)).await?;
            println!("Deleted status {id}");
        }
    }
    Ok(())
}
