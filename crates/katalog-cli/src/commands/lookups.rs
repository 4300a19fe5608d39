use katalog_core::{DataSource, LookupKind};

use crate::commands::common::{format_lookup_lines, open_service};
use crate::error::CliError;

pub async fn run_lookups(kind: LookupKind, as_json: bool, global_profile: Option<&str>) -> Result<(), CliError> {
    let service = open_service(global_profile)?;
    let lookups = service.lookups();
    if let Err(error) = lookups.refresh(kind).await {
        if lookups.source(kind) != DataSource::Cached {
            return Err(error.into());
        }
        eprintln!("warning: {}; showing cached {kind} names", error.user_message());
    }

    let table = lookups.get(kind);
    if as_json {
        println!("{}", serde_json::to_string_pretty(table.entries())?);
    } else {
        for line in format_lookup_lines(table.entries()) {
            println!("{line}");
        }
    }
    Ok(())
}
