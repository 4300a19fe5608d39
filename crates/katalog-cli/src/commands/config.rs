use katalog_core::util::normalize_text_option;

use crate::auth::{ProfileCredentials, TokenOrigin};
use crate::cli::ConfigCommands;
use crate::config_profiles::{default_config_path, default_session_dir, CliProfile, CliProfilesConfig};
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, global_profile: Option<&str>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            api_base_url,
            timeout_secs,
            no_activate,
        } => run_config_init(global_profile, api_base_url, timeout_secs, no_activate),
        ConfigCommands::Show => run_config_show(global_profile),
    }
}

pub fn run_config_init(
    profile_name: Option<&str>,
    api_base_url: Option<String>,
    timeout_secs: Option<u64>,
    no_activate: bool,
) -> Result<(), CliError> {
    let mut config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(profile_name);

    let profile = config.profile_mut_or_default(&profile_name);
    apply_profile_fields(profile, api_base_url, timeout_secs)?;

    if !no_activate {
        config.active_profile = Some(profile_name.clone());
    }

    let path = config.save().map_err(CliError::Config)?;
    println!(
        "Profile '{}' initialized at {}",
        profile_name,
        path.display()
    );
    if config
        .profile(&profile_name)
        .is_some_and(|profile| profile.api_base_url.is_none())
    {
        println!("Profile '{profile_name}' has no api_base_url; the default endpoint will be used.");
    }
    Ok(())
}

/// Merge explicit values into `profile`, rejecting anything the gateway could not use.
pub fn apply_profile_fields(
    profile: &mut CliProfile,
    api_base_url: Option<String>,
    timeout_secs: Option<u64>,
) -> Result<(), CliError> {
    let mut candidate = profile.clone();
    if let Some(url) = normalize_text_option(api_base_url) {
        candidate.api_base_url = Some(url);
    }
    if let Some(secs) = timeout_secs {
        candidate.request_timeout_secs = Some(secs);
    }
    let validated = candidate
        .client_config(|_| None)
        .map_err(|error| CliError::Config(error.to_string()))?;
    if candidate.api_base_url.is_some() {
        candidate.api_base_url = Some(validated.api_base_url);
    }
    *profile = candidate;
    Ok(())
}

fn run_config_show(global_profile: Option<&str>) -> Result<(), CliError> {
    let config = CliProfilesConfig::load().map_err(CliError::Config)?;
    let profile_name = config.resolve_profile_name(global_profile);
    let client_config = config
        .profile(&profile_name)
        .cloned()
        .unwrap_or_default()
        .client_config(|name| std::env::var(name).ok())?;
    let token = match ProfileCredentials::new(&profile_name).resolve()? {
        Some((_, TokenOrigin::Environment)) => "set (environment)",
        Some((_, TokenOrigin::Keychain)) => "set (keychain)",
        None => "not set",
    };

    println!("profile:       {profile_name}");
    println!(
        "config file:   {}",
        default_config_path().map_err(CliError::Config)?.display()
    );
    println!(
        "session cache: {}",
        default_session_dir(&profile_name)
            .map_err(CliError::Config)?
            .display()
    );
    println!("api_base_url:  {}", client_config.api_base_url);
    println!("timeout:       {}s", client_config.request_timeout_secs);
    println!("token:         {token}");
    Ok(())
}
