use std::sync::Arc;

use tracing::{debug, info};

use crate::auth::password::{hash_password, verify_password};
use crate::error::{AppError, AppResult};
use crate::model::UserId;
use crate::model::profile::ProfileDefaults;
use crate::store::{Store, StoreError};
use crate::utils::username_cache::UsernameCache;
use crate::utils::username_filter::UsernameFilter;

/// Signup and login. Resolves credentials to a `UserId`; nothing downstream
/// looks at credentials again.
pub struct Accounts {
    store: Arc<dyn Store>,
    defaults: ProfileDefaults,
    filter: UsernameFilter,
    cache: UsernameCache,
}

impl Accounts {
    pub fn new(store: Arc<dyn Store>, defaults: ProfileDefaults) -> Self {
        Self {
            store,
            defaults,
            filter: UsernameFilter::default(),
            cache: UsernameCache::default(),
        }
    }

    pub async fn warmup(&self, batch_size: usize) -> anyhow::Result<()> {
        self.filter.warmup(&*self.store, batch_size).await
    }

    /// true  => username AVAILABLE
    /// false => username TAKEN
    pub async fn is_username_available(&self, username: &str) -> AppResult<bool> {
        // 1️⃣ Cuckoo filter: fast negative
        if !self.filter.might_exist(username) {
            return Ok(true);
        }

        // 2️⃣ Moka cache: fast positive
        if self.cache.is_taken(username).await {
            return Ok(false);
        }

        // 3️⃣ Store fallback
        let exists = self.store.username_exists(username).await?;
        if exists {
            self.cache.mark_taken(username).await;
        }
        Ok(!exists)
    }

    pub async fn signup(
        &self,
        username: &str,
        password: &str,
        confirm_password: &str,
    ) -> AppResult<UserId> {
        let username = username.trim();

        if username.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Username and password must not be empty".into(),
            ));
        }
        if password != confirm_password {
            return Err(AppError::Validation("Passwords do not match".into()));
        }

        if !self.is_username_available(username).await? {
            return Err(AppError::UsernameTaken);
        }

        let hashed = hash_password(password).map_err(|e| AppError::Internal(e.to_string()))?;

        // the store has the final word if two signups race past the filter
        let user_id = match self.store.insert_user(username, &hashed).await {
            Ok(id) => id,
            Err(StoreError::Duplicate) => return Err(AppError::UsernameTaken),
            Err(e) => return Err(e.into()),
        };

        self.filter.insert(username);
        self.cache.mark_taken(username).await;

        self.store
            .insert_profile_if_absent(&self.defaults.profile_for(user_id))
            .await?;

        info!(user_id, username, "User registered");
        Ok(user_id)
    }

    pub async fn login(&self, username: &str, password: &str) -> AppResult<UserId> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AppError::InvalidCredentials);
        }

        let user = match self.store.find_user_by_username(username).await? {
            Some(user) => user,
            None => {
                info!("Invalid credentials: user not found");
                return Err(AppError::InvalidCredentials);
            }
        };

        if let Err(e) = verify_password(password, &user.password) {
            info!(error = %e, "Invalid credentials: password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        debug!(user_id = user.id, "Password verified");
        self.cache.mark_taken(&user.username).await;
        Ok(user.id)
    }

    /// Drops a deleted account's name from the in-memory indexes.
    pub async fn forget_username(&self, username: &str) {
        self.filter.remove(username);
        self.cache.forget(username).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, ProfileStore, UserStore};

    fn accounts() -> (Arc<MemoryStore>, Accounts) {
        let store = Arc::new(MemoryStore::new());
        let accounts = Accounts::new(store.clone(), ProfileDefaults::default());
        (store, accounts)
    }

    #[actix_web::test]
    async fn signup_then_login_resolves_the_same_user() {
        let (store, accounts) = accounts();
        let user_id = accounts.signup("ada", "s3cret", "s3cret").await.unwrap();

        assert_eq!(accounts.login("ada", "s3cret").await.unwrap(), user_id);
        // signup hands out the default profile
        let profile = store.find_profile(user_id).await.unwrap().unwrap();
        assert_eq!(profile.leave_balance, ProfileDefaults::default().leave_balance);
    }

    #[actix_web::test]
    async fn duplicate_username_is_taken() {
        let (_, accounts) = accounts();
        accounts.signup("ada", "a", "a").await.unwrap();

        assert!(matches!(
            accounts.signup("ada", "b", "b").await,
            Err(AppError::UsernameTaken)
        ));
        assert!(matches!(
            accounts.signup("  ada ", "b", "b").await,
            Err(AppError::UsernameTaken)
        ));
    }

    #[actix_web::test]
    async fn store_catches_names_the_filter_never_saw() {
        let (store, accounts) = accounts();
        store.insert_user("grace", "hash").await.unwrap();

        assert!(matches!(
            accounts.signup("grace", "x", "x").await,
            Err(AppError::UsernameTaken)
        ));
    }

    #[actix_web::test]
    async fn mismatched_or_empty_passwords_are_rejected() {
        let (_, accounts) = accounts();
        assert!(matches!(
            accounts.signup("ada", "one", "two").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            accounts.signup("   ", "one", "one").await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            accounts.signup("ada", "", "").await,
            Err(AppError::Validation(_))
        ));
    }

    #[actix_web::test]
    async fn wrong_secret_and_unknown_user_are_invalid_credentials() {
        let (_, accounts) = accounts();
        accounts.signup("ada", "right", "right").await.unwrap();

        assert!(matches!(
            accounts.login("ada", "wrong").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            accounts.login("nobody", "right").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[actix_web::test]
    async fn forgotten_username_becomes_available_after_account_removal() {
        let (store, accounts) = accounts();
        let user_id = accounts.signup("ada", "a", "a").await.unwrap();
        assert!(!accounts.is_username_available("ada").await.unwrap());

        crate::store::Store::delete_account(&*store, user_id).await.unwrap();
        accounts.forget_username("ada").await;

        assert!(accounts.is_username_available("ada").await.unwrap());
        accounts.signup("ada", "b", "b").await.unwrap();
    }
}
