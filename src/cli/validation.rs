//! CLI argument validation functions
//!
//! Value parsers for arguments that need more than clap's built-in checks.

use std::fs;
use std::path::PathBuf;

/// Validate port number is within valid range (1-65535)
pub fn validate_port(port_str: &str) -> Result<u16, String> {
    let port: u16 = port_str.parse().map_err(|_| {
        format!("Port must be a valid number between 1 and 65535, got: '{port_str}'")
    })?;

    if port == 0 {
        return Err("Port must be between 1 and 65535. Port 0 is not allowed.".to_string());
    }

    Ok(port)
}

/// Validate that a file path is accessible (exists and is readable)
pub fn validate_config_file_path(path_str: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(format!("Configuration file does not exist: '{path_str}'"));
    }

    if !path.is_file() {
        return Err(format!("Configuration path is not a file: '{path_str}'"));
    }

    match fs::File::open(&path) {
        Ok(_) => Ok(path),
        Err(e) => Err(format!("Cannot read configuration file '{path_str}': {e}")),
    }
}

/// Validate a request record identifier
///
/// Identifiers end up in log fields and URL paths, so whitespace and `/`
/// are rejected.
pub fn validate_request_id(id_str: &str) -> Result<String, String> {
    let id = id_str.trim();

    if id.is_empty() {
        return Err("Request id cannot be empty".to_string());
    }

    if id.chars().any(|c| c.is_whitespace() || c == '/') {
        return Err(format!(
            "Request id cannot contain whitespace or '/', got: '{id_str}'"
        ));
    }

    Ok(id.to_string())
}

/// Validate host address format (basic validation)
pub fn validate_host_address(host_str: &str) -> Result<String, String> {
    let host = host_str.trim();

    if host.is_empty() {
        return Err("Host address cannot be empty".to_string());
    }

    if host.contains(' ') {
        return Err("Host address cannot contain spaces".to_string());
    }

    if host == "localhost" || host == "0.0.0.0" || host.starts_with("127.") {
        return Ok(host.to_string());
    }

    if host.chars().all(|c| c.is_ascii_digit() || c == '.') {
        let parts: Vec<&str> = host.split('.').collect();
        if parts.len() == 4 {
            for part in parts {
                if part.parse::<u8>().is_err() {
                    return Err(format!("Invalid IPv4 address format: '{host_str}'"));
                }
            }
            return Ok(host.to_string());
        }
    }

    if host.len() > 253 {
        return Err("Host address is too long (maximum 253 characters)".to_string());
    }

    Ok(host.to_string())
}
