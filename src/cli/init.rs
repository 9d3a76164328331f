use regex::Regex;
use serde_json::json;

use crate::db::{generate_id, SqliteStore};
use crate::error::{FactdeskError, Result};
use crate::models::USERS;
use crate::settings::{load_settings, save_settings, shellexpand_path};
use crate::store::DocumentStore;

pub fn is_valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
        .map(|re| re.is_match(email))
        .unwrap_or(false)
}

pub fn run(data_dir: Option<String>, email: &str) -> Result<()> {
    let email = email.trim();
    if !is_valid_email(email) {
        return Err(FactdeskError::InvalidField {
            field: "email".into(),
            reason: format!("{email:?} is not an email address"),
        });
    }

    let mut settings = load_settings();
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    if settings.user_id.is_empty() {
        settings.user_id = generate_id();
    }
    settings.email = email.to_string();
    save_settings(&settings)?;

    let resolved = settings.data_path();
    std::fs::create_dir_all(&resolved)?;
    std::fs::create_dir_all(resolved.join("blobs"))?;
    std::fs::create_dir_all(resolved.join("exports"))?;

    let store = SqliteStore::open(&settings.db_path())?;
    store.set_document(USERS, &settings.user_id, json!({ "email": settings.email }))?;
    tracing::info!(user_id = %settings.user_id, "initialized");

    println!("Initialized factdesk at {}", resolved.display());
    println!("Signed in as {}", settings.email);
    Ok(())
}
