use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{extract::State, Json};
use bson::doc;
use std::sync::Arc;

use super::error::ApiError;
use crate::db::{Admin, LoginRequest, LoginResponse};
use crate::AppState;

/// Placeholder token returned on successful login. There is no session or
/// JWT mechanism behind it; clients only check for presence.
const LOGIN_TOKEN: &str = "dummy-token";

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Admin login. Unknown usernames and wrong passwords produce the same
/// response so the API does not leak which accounts exist.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let admin: Option<Admin> = state
        .db
        .admins()
        .find_one(doc! { "username": &request.username })
        .await?;

    let admin = admin.ok_or_else(|| ApiError::unauthorized("Invalid username or password"))?;

    if !verify_password(&request.password, &admin.password_hash) {
        return Err(ApiError::unauthorized("Invalid username or password"));
    }

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        token: Some(LOGIN_TOKEN.to_string()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("community-fund-2025").unwrap();
        assert!(verify_password("community-fund-2025", &hash));
        assert!(!verify_password("wrong-password", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("secret").unwrap();
        let b = hash_password("secret").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(!verify_password("secret", "not-a-phc-string"));
    }
}
