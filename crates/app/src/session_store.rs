//! Persists the session identity between runs.
//!
//! A missing file simply means logged out.

use std::{fs, path::Path};

use engine::Session;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub fn load(path: &str) -> Result<Session> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Session::logged_out());
        }
        Err(err) => return Err(err.into()),
    };
    Ok(serde_json::from_str(&content)?)
}

pub fn save(path: &str, session: &Session) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    let payload = serde_json::to_string_pretty(session)?;
    fs::write(path, payload)?;
    Ok(())
}
