use serde::de::DeserializeOwned;
use std::io::{self, Read};

/// Request piped on stdin, parsed as JSON. `None` when stdin is a terminal
/// or the pipe is empty.
pub fn read_request<T: DeserializeOwned>() -> Result<Option<T>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let request = serde_json::from_str(trimmed)
        .map_err(|e| format!("Failed to parse stdin request: {e}"))?;
    Ok(Some(request))
}
