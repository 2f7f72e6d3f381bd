//! Profile reads and edits.

use std::sync::Arc;

use ardath_shared::models::{Record, UpdateProfileRequest, User};
use ardath_shared::{paths, UserId};
use ardath_store::{DbPath, Query, RemoteStore};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::listeners::decode_children;
use crate::session::Session;

pub struct UserRepository {
    store: Arc<dyn RemoteStore>,
    session: Session,
    config: ClientConfig,
}

impl UserRepository {
    pub fn new(store: Arc<dyn RemoteStore>, session: Session, config: ClientConfig) -> Self {
        Self {
            store,
            session,
            config,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Up to `user_page_size` users, excluding the signed-in user.
    pub async fn get_users(&self) -> Result<Vec<User>> {
        let query = Query::at(DbPath::parse(&paths::users())?)
            .order_by_key()
            .limit_to_first(self.config.user_page_size);
        let snapshot = self.store.get(&query).await?;
        let users: Vec<User> = decode_children::<User>(&snapshot)
            .into_iter()
            .filter(|user| user.id != self.session.user_id)
            .collect();
        debug!(count = users.len(), "users listed");
        Ok(users)
    }

    pub async fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>> {
        let snapshot = self
            .store
            .get(&Query::at(DbPath::parse(&paths::user(id))?))
            .await?;
        if !snapshot.exists() {
            return Ok(None);
        }
        Ok(Some(User::decode(id.as_str(), snapshot.value())?))
    }

    pub async fn get_current_user(&self) -> Result<Option<User>> {
        self.get_user_by_id(&self.session.user_id).await
    }

    /// Overwrite the signed-in user's profile with the edited, trimmed copy.
    pub async fn update_profile(&self, request: UpdateProfileRequest) -> Result<()> {
        let mut user = request.build();
        user.id = self.session.user_id.clone();
        let path = DbPath::parse(&paths::user(&user.id))?;
        self.store.set(&path, user.encode()?).await?;
        info!(user = %user.id, "profile updated");
        Ok(())
    }

    /// Change the signed-in user's username. Rejects blank names and names
    /// already held by someone else; the check and the write are not atomic.
    pub async fn update_username(&self, username: &str) -> Result<()> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ClientError::InvalidArgument("username is empty".to_string()));
        }
        let holders = self.username_holders(username).await?;
        if holders.iter().any(|id| id != &self.session.user_id) {
            return Err(ClientError::UsernameTaken(username.to_string()));
        }
        let path = DbPath::parse(&paths::username(&self.session.user_id))?;
        self.store
            .set(&path, Value::String(username.to_string()))
            .await?;
        info!(user = %self.session.user_id, "username updated");
        Ok(())
    }

    pub async fn get_name_by_id(&self, id: &UserId) -> Result<Option<String>> {
        Ok(self.get_user_by_id(id).await?.map(|user| user.name))
    }

    pub async fn is_username_taken(&self, username: &str) -> Result<bool> {
        Ok(!self.username_holders(username.trim()).await?.is_empty())
    }

    async fn username_holders(&self, username: &str) -> Result<Vec<UserId>> {
        let query = Query::at(DbPath::parse(&paths::users())?)
            .order_by_child(paths::USERNAME_FIELD)
            .equal_to(username);
        let snapshot = self.store.get(&query).await?;
        Ok(snapshot.keys().map(UserId::from).collect())
    }
}
