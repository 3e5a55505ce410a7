use tracing::Span;

use crate::storage::Repository;

use super::{AppError, OperationService, UserService};

/// The application services sharing one database.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
pub struct Services {
    pub users: UserService,
    pub operations: OperationService,
}

impl Services {
    /// Create the services over the given repository.
    pub fn new(repo: Repository) -> Self {
        Self {
            users: UserService::new(repo.clone()),
            operations: OperationService::new(repo),
        }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Route every service's events through `span`.
    pub fn with_span(self, span: Span) -> Self {
        Self {
            users: self.users.with_span(span.clone()),
            operations: self.operations.with_span(span),
        }
    }
}
