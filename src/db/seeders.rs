use anyhow::{Context, Result};
use bson::doc;
use tracing::info;

use super::{Admin, Db};
use crate::api::auth::hash_password;

/// Ensure an admin account exists for the configured credentials.
///
/// The login API never creates or updates admins, so this is the only way
/// accounts come into being. An existing admin is left untouched; in
/// particular the password is not rotated here.
pub async fn seed_admin_user(db: &Db, username: &str, password: &str) -> Result<()> {
    let existing = db
        .admins()
        .find_one(doc! { "username": username })
        .await
        .context("Failed to look up admin user")?;

    if existing.is_some() {
        return Ok(());
    }

    let password_hash =
        hash_password(password).map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?;

    db.admins()
        .insert_one(Admin {
            id: None,
            username: username.to_string(),
            password_hash,
        })
        .await
        .context("Failed to insert admin user")?;

    info!("Seeded admin user {}", username);
    Ok(())
}
