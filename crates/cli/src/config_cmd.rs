// config show / set-key / delete-key

use unfollowers_config::keys::{self, keychain_available};
use unfollowers_config::{get_api_key, Session, Settings, API_KEY_ENV};

use crate::CliError;

pub fn show(json: bool) -> Result<(), CliError> {
    let settings = Settings::load();
    let key = get_api_key();
    let session = Session::load();
    let saved_fid = session.as_ref().and_then(|s| s.fid);

    if json {
        let out = serde_json::json!({
            "settings_path": Settings::config_path_display(),
            "api_base": settings.api_base,
            "unfollowers_limit": settings.unfollowers_limit,
            "request_timeout_secs": settings.request_timeout_secs,
            "key": if key.is_present() { "present" } else { "missing" },
            "key_source": key.source.as_str(),
            "keychain": if keychain_available() { "ok" } else { "unavailable" },
            "saved_fid": saved_fid,
        });
        let text = serde_json::to_string_pretty(&out)
            .map_err(|e| CliError::io(format!("failed to encode config: {}", e)))?;
        println!("{}", text);
        return Ok(());
    }

    println!("settings:        {}", Settings::config_path_display());
    println!("api_base:        {}", settings.api_base);
    println!("limit:           {}", settings.unfollowers_limit);
    println!("timeout_secs:    {}", settings.request_timeout_secs);
    println!("key:             {}", if key.is_present() { "present" } else { "missing" });
    println!("key_source:      {}", key.source.as_str());
    println!("keychain:        {}", if keychain_available() { "ok" } else { "unavailable" });
    match saved_fid {
        Some(fid) => println!("saved_fid:       {}", fid),
        None => println!("saved_fid:       (none)"),
    }

    if !key.is_present() {
        println!();
        println!("Fix: set {} or run `unfollowers config set-key <KEY>`", API_KEY_ENV);
    }
    Ok(())
}

pub fn set_key(key: &str) -> Result<(), CliError> {
    if key.trim().is_empty() {
        return Err(CliError::args("API key is empty"));
    }
    keys::set_api_key(key)
        .map_err(|e| CliError::io(e.to_string()).with_hint(format!("set {} instead", API_KEY_ENV)))?;
    eprintln!("API key stored in keychain");
    Ok(())
}

pub fn delete_key() -> Result<(), CliError> {
    keys::delete_api_key().map_err(|e| CliError::io(e.to_string()))?;
    eprintln!("API key removed from keychain");
    Ok(())
}
