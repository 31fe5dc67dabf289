use tracing::{info, warn};

use crate::db::models::{User, UserPatch};
use crate::db::{Store, StoreError};
use crate::graphql::types::{ChangePasswordInput, LoginInput, RegisterInput, UpdateProfileInput};
use crate::services::auth_service::CredentialService;
use crate::web::error::AppError;
use crate::web::models::AuthenticatedUser;

pub const MIN_PASSWORD_LEN: usize = 8;

/// A freshly authenticated user together with the token that proves it.
#[derive(Debug)]
pub struct AuthOutcome {
    pub user: User,
    pub token: String,
}

fn scrubbed(mut user: User) -> User {
    user.password_hash.clear();
    user
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("name is required".to_string()));
    }
    Ok(name.to_string())
}

fn validate_email(email: &str) -> Result<String, AppError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::InvalidInput("email is required".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::InvalidInput("email address is not valid".to_string()));
    }
    Ok(email.to_string())
}

fn validate_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}

pub async fn register(
    store: &dyn Store,
    credentials: &CredentialService,
    input: RegisterInput,
) -> Result<AuthOutcome, AppError> {
    let name = validate_name(&input.name)?;
    let email = validate_email(&input.email)?;
    validate_password(&input.password)?;

    let password_hash = credentials.hash_password(&input.password)?;
    let user = store.create_user(&name, &email, &password_hash).await?;
    let token = credentials.issue_token(&user)?;

    info!(user_id = %user.id, "User registered.");
    Ok(AuthOutcome {
        user: scrubbed(user),
        token,
    })
}

/// Unknown email and wrong password are reported identically.
pub async fn login(
    store: &dyn Store,
    credentials: &CredentialService,
    input: LoginInput,
) -> Result<AuthOutcome, AppError> {
    let user = match store.get_user_by_email(input.email.trim()).await {
        Ok(user) => user,
        Err(StoreError::NotFound(_)) => {
            warn!("Login attempt for unknown email.");
            return Err(AppError::InvalidCredentials);
        }
        Err(e) => return Err(e.into()),
    };

    if !credentials.verify_password(&input.password, &user.password_hash) {
        warn!(user_id = %user.id, "Login attempt with wrong password.");
        return Err(AppError::InvalidCredentials);
    }

    let token = credentials.issue_token(&user)?;
    info!(user_id = %user.id, "User logged in.");
    Ok(AuthOutcome {
        user: scrubbed(user),
        token,
    })
}

pub async fn me(store: &dyn Store, user: &AuthenticatedUser) -> Result<User, AppError> {
    Ok(scrubbed(store.get_user_by_id(user.id).await?))
}

pub async fn update_profile(
    store: &dyn Store,
    user: &AuthenticatedUser,
    input: UpdateProfileInput,
) -> Result<User, AppError> {
    let patch = UserPatch {
        name: input.name.as_deref().map(validate_name).transpose()?,
        email: input.email.as_deref().map(validate_email).transpose()?,
    };
    let updated = store.update_user(user.id, patch).await?;
    info!(user_id = %user.id, "Profile updated.");
    Ok(scrubbed(updated))
}

pub async fn change_password(
    store: &dyn Store,
    credentials: &CredentialService,
    user: &AuthenticatedUser,
    input: ChangePasswordInput,
) -> Result<bool, AppError> {
    let stored = store.get_user_by_id(user.id).await?;
    if !credentials.verify_password(&input.current_password, &stored.password_hash) {
        warn!(user_id = %user.id, "Password change rejected: current password mismatch.");
        return Err(AppError::InvalidCredentials);
    }
    validate_password(&input.new_password)?;

    let password_hash = credentials.hash_password(&input.new_password)?;
    store.update_user_password(user.id, &password_hash).await?;
    info!(user_id = %user.id, "Password changed.");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn credentials() -> CredentialService {
        CredentialService::new("account-test-secret", 4)
    }

    fn register_input(email: &str, password: &str) -> RegisterInput {
        RegisterInput {
            name: "Grace".to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn identity(user: &User) -> AuthenticatedUser {
        AuthenticatedUser {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryStore::new();
        let credentials = credentials();

        let registered = register(&store, &credentials, register_input("grace@example.com", "hopper1906"))
            .await
            .unwrap();
        assert!(registered.user.password_hash.is_empty());
        assert_eq!(credentials.validate_token(&registered.token).unwrap().id, registered.user.id);

        let logged_in = login(
            &store,
            &credentials,
            LoginInput {
                email: "grace@example.com".to_string(),
                password: "hopper1906".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);
        assert!(logged_in.user.password_hash.is_empty());
    }

    #[tokio::test]
    async fn test_register_validation() {
        let store = MemoryStore::new();
        let credentials = credentials();

        let short = register(&store, &credentials, register_input("grace@example.com", "short")).await;
        assert!(matches!(short, Err(AppError::InvalidInput(_))));

        let no_at = register(&store, &credentials, register_input("grace.example.com", "longenough")).await;
        assert!(matches!(no_at, Err(AppError::InvalidInput(_))));

        let mut blank_name = register_input("grace@example.com", "longenough");
        blank_name.name = "  ".to_string();
        assert!(matches!(
            register(&store, &credentials, blank_name).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        let credentials = credentials();
        register(&store, &credentials, register_input("dup@example.com", "password1"))
            .await
            .unwrap();
        let second = register(&store, &credentials, register_input("dup@example.com", "password2")).await;
        assert!(matches!(second, Err(AppError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store = MemoryStore::new();
        let credentials = credentials();
        register(&store, &credentials, register_input("grace@example.com", "hopper1906"))
            .await
            .unwrap();

        let wrong_password = login(
            &store,
            &credentials,
            LoginInput {
                email: "grace@example.com".to_string(),
                password: "not-the-password".to_string(),
            },
        )
        .await
        .unwrap_err();
        let unknown_email = login(
            &store,
            &credentials,
            LoginInput {
                email: "nobody@example.com".to_string(),
                password: "hopper1906".to_string(),
            },
        )
        .await
        .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert_eq!(wrong_password.code(), "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn test_change_password() {
        let store = MemoryStore::new();
        let credentials = credentials();
        let outcome = register(&store, &credentials, register_input("grace@example.com", "hopper1906"))
            .await
            .unwrap();
        let me = identity(&outcome.user);

        let wrong = change_password(
            &store,
            &credentials,
            &me,
            ChangePasswordInput {
                current_password: "guess-again".to_string(),
                new_password: "brand-new-pass".to_string(),
            },
        )
        .await;
        assert!(matches!(wrong, Err(AppError::InvalidCredentials)));

        let changed = change_password(
            &store,
            &credentials,
            &me,
            ChangePasswordInput {
                current_password: "hopper1906".to_string(),
                new_password: "brand-new-pass".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(changed);

        let relogin = login(
            &store,
            &credentials,
            LoginInput {
                email: "grace@example.com".to_string(),
                password: "brand-new-pass".to_string(),
            },
        )
        .await;
        assert!(relogin.is_ok());
    }

    #[tokio::test]
    async fn test_update_profile_partial() {
        let store = MemoryStore::new();
        let credentials = credentials();
        let outcome = register(&store, &credentials, register_input("grace@example.com", "hopper1906"))
            .await
            .unwrap();
        let me = identity(&outcome.user);

        let updated = update_profile(
            &store,
            &me,
            UpdateProfileInput {
                name: Some("Rear Admiral Hopper".to_string()),
                email: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Rear Admiral Hopper");
        assert_eq!(updated.email, "grace@example.com");
        assert!(updated.password_hash.is_empty());
    }
}
