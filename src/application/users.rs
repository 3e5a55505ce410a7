use tracing::{error, info, warn, Span};

use crate::domain::{BalanceOverflow, Cents, LedgerEngine, NewUser, User, UserId, UserInfo};
use crate::storage::{DuplicateLogin, Repository};

use super::{hash_password, validate_credentials, validate_registration, verify_password};
use super::{AppError, Registration};

/// Registration, authentication and user lookup.
/// Every user returned to callers carries a balance freshly derived from the ledger.
pub struct UserService {
    repo: Repository,
    span: Span,
}

impl UserService {
    pub fn new(repo: Repository) -> Self {
        Self {
            repo,
            span: Span::none(),
        }
    }

    /// Emit this service's events under `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Register a new user. The password is stored as an Argon2 hash only.
    pub async fn register(&self, form: Registration) -> Result<User, AppError> {
        let login = form.login.trim().to_string();

        if let Err(errors) = validate_registration(&form) {
            warn!(parent: &self.span, login = %login, %errors, "registration rejected");
            return Err(errors.into());
        }

        if self.repo.get_user_by_login(&login).await?.is_some() {
            warn!(parent: &self.span, login = %login, "login already exists");
            return Err(AppError::LoginExists(login));
        }

        let password_hash = hash_password(&form.password).inspect_err(|err| {
            error!(parent: &self.span, error = %err, "hash password failed");
        })?;

        let new_user = NewUser {
            login,
            password_hash,
            name: form.name.trim().to_string(),
            birth: form.birth,
        };

        match self.repo.save_user(&new_user).await {
            Ok(user) => {
                info!(parent: &self.span, user_id = user.id, login = %user.login, "user registered");
                Ok(user)
            }
            // Lost a race with a concurrent registration of the same login
            Err(err) if err.is::<DuplicateLogin>() => {
                warn!(parent: &self.span, login = %new_user.login, "login already exists");
                Err(AppError::LoginExists(new_user.login))
            }
            Err(err) => {
                error!(parent: &self.span, error = %err, "create user failed");
                Err(err.into())
            }
        }
    }

    /// Check a login/password pair.
    /// Unknown logins and wrong passwords both yield [`AppError::InvalidCredentials`].
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<UserInfo, AppError> {
        validate_credentials(login, password)?;
        let login = login.trim();

        let user = match self.repo.get_user_by_login(login).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!(parent: &self.span, login, "unknown login");
                return Err(AppError::InvalidCredentials);
            }
            Err(err) => {
                error!(parent: &self.span, login, error = %err, "get user by login failed");
                return Err(err.into());
            }
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(parent: &self.span, user_id = user.id, "invalid password");
            return Err(AppError::InvalidCredentials);
        }

        let balance = self.balance(user.id).await?;
        Ok(UserInfo { user, balance })
    }

    /// Look a user up by ID, with their current balance.
    pub async fn get_user(&self, user_id: UserId) -> Result<UserInfo, AppError> {
        let user = self
            .repo
            .get_user(user_id)
            .await
            .inspect_err(|err| {
                error!(parent: &self.span, user_id, error = %err, "get user failed");
            })?
            .ok_or(AppError::UserNotFound(user_id))?;

        let balance = self.balance(user_id).await?;
        Ok(UserInfo { user, balance })
    }

    /// Current balance, recomputed from every operation of the user.
    pub async fn balance(&self, user_id: UserId) -> Result<Cents, AppError> {
        LedgerEngine::new(&self.repo)
            .compute_balance(user_id)
            .await
            .map_err(|err| {
                error!(parent: &self.span, user_id, error = %err, "get balance failed");
                if err.is::<BalanceOverflow>() {
                    AppError::BalanceOverflow(user_id)
                } else {
                    AppError::Database(err)
                }
            })
    }
}
