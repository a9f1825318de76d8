// src/services/auth.rs

use validator::Validate;

use crate::{
    config::Config,
    db::UserRepository,
    error::AppError,
    models::user::{CreateUserRequest, Identity, LoginRequest, LoginResponse, NewUser},
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

/// Registers a new, non-staff account.
///
/// Hashes the password using Argon2 before storing it. Usernames are unique
/// case-insensitively; a clash is reported as `Conflict`.
pub async fn register<S>(store: &S, payload: CreateUserRequest) -> Result<Identity, AppError>
where
    S: UserRepository + ?Sized,
{
    payload.validate()?;

    let hashed_password = hash_password(&payload.password)?;

    let user = NewUser {
        username: payload.username,
        password_hash: hashed_password,
        email: payload.email.filter(|e| !e.trim().is_empty()),
        first_name: payload.first_name,
        last_name: payload.last_name,
        is_staff: false,
    };

    insert_user(store, &user).await?;
    tracing::info!(username = %user.username, "User registered");

    Ok(Identity {
        username: user.username,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        is_staff: user.is_staff,
    })
}

/// Authenticates by username or email and issues a signed token.
///
/// Unknown accounts and wrong passwords get the same answer.
pub async fn login<S>(
    store: &S,
    config: &Config,
    payload: LoginRequest,
) -> Result<LoginResponse, AppError>
where
    S: UserRepository + ?Sized,
{
    payload.validate()?;

    let user = store
        .find_user_by_login(payload.username.trim())
        .await
        .map_err(|e| {
            tracing::error!("Login DB error: {:?}", e);
            AppError::unavailable(e)
        })?
        .ok_or_else(invalid_credentials)?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(invalid_credentials());
    }

    let token = sign_jwt(
        &user.username,
        user.is_staff,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        is_staff: user.is_staff,
    })
}

/// Creates the staff account named by `ADMIN_USERNAME`/`ADMIN_PASSWORD`
/// unless an account by that name already exists.
pub async fn seed_admin_user<S>(store: &S, config: &Config) -> Result<(), AppError>
where
    S: UserRepository + ?Sized,
{
    let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) else {
        return Ok(());
    };

    if store.find_user(username).await?.is_some() {
        tracing::debug!(%username, "Admin user already present");
        return Ok(());
    }

    tracing::info!("Seeding admin user: {}", username);
    let user = NewUser {
        username: username.clone(),
        password_hash: hash_password(password)?,
        email: None,
        first_name: None,
        last_name: None,
        is_staff: true,
    };
    insert_user(store, &user).await?;
    tracing::info!("Admin user created successfully.");

    Ok(())
}

async fn insert_user<S>(store: &S, user: &NewUser) -> Result<i64, AppError>
where
    S: UserRepository + ?Sized,
{
    store.create_user(user).await.map_err(|e| {
        let is_unique = e
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if is_unique {
            AppError::Conflict(format!("Username '{}' already exists", user.username))
        } else {
            tracing::error!("Failed to create user: {:?}", e);
            AppError::from(e)
        }
    })
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid username or password".to_string())
}
