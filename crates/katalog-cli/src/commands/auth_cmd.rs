use katalog_core::credential::Token;

use crate::auth::{ProfileCredentials, TokenOrigin, TokenStore};
use crate::cli::AuthCommands;
use crate::config_profiles::CliProfilesConfig;
use crate::error::CliError;

pub fn run_auth(command: AuthCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);

    match command {
        AuthCommands::SetToken { token } => {
            let token = Token::new(token)
                .ok_or_else(|| CliError::Auth("Token must not be empty".to_string()))?;
            TokenStore::new(&profile_name).save(&token)?;
            println!("Stored token for profile '{profile_name}'");
        }
        AuthCommands::Status => match ProfileCredentials::new(&profile_name).resolve()? {
            Some((_, TokenOrigin::Environment)) => {
                println!("Profile '{profile_name}' uses the token from KATALOG_TOKEN");
            }
            Some((_, TokenOrigin::Keychain)) => {
                println!("Profile '{profile_name}' has a stored token");
            }
            None => println!("Profile '{profile_name}' has no token; requests are anonymous."),
        },
        AuthCommands::Clear => {
            TokenStore::new(&profile_name).clear()?;
            println!("Cleared token for profile '{profile_name}'");
        }
    }
    Ok(())
}
