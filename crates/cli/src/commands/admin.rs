//! Admin account management commands.

use sqlx::PgPool;

use schoolmall_core::{Email, UserRole};
use schoolmall_server::db::UserRepository;
use schoolmall_server::services::{AuthError, AuthService};

/// Create an admin account.
///
/// # Errors
///
/// Returns `AuthError::UserAlreadyExists` when the email or phone is taken,
/// plus the usual validation errors.
pub async fn create(
    pool: &PgPool,
    email: &str,
    name: &str,
    password: &str,
    phone: Option<&str>,
) -> Result<(), AuthError> {
    tracing::info!("Creating admin user: {}", email);

    let user = AuthService::new(pool)
        .register(email, name, phone, password, UserRole::Admin)
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(())
}

/// Replace the password of the account registered under `email`.
///
/// # Errors
///
/// Returns `AuthError::UserNotFound` for an unknown email.
pub async fn set_password(pool: &PgPool, email: &str, password: &str) -> Result<(), AuthError> {
    let email = Email::parse(email)?;
    let user = UserRepository::new(pool)
        .get_by_email(&email)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    AuthService::new(pool).set_password(user.id, password).await?;

    tracing::info!("Password updated for {}", user.email);
    Ok(())
}
