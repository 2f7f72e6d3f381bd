//! Profiles and username editor view model.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ardath_shared::models::UpdateProfileRequest;
use ardath_shared::UserId;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::error;

use crate::config::ClientConfig;
use crate::platform::PlatformServices;
use crate::repository::UserRepository;
use crate::state::{UserState, UsernameState};

pub struct UserViewModel {
    repository: Arc<UserRepository>,
    platform: Arc<dyn PlatformServices>,
    debounce: Duration,
    listen_users_error: String,
    fetch_user_error: String,
    user_state: watch::Sender<UserState>,
    username_state: Arc<watch::Sender<UsernameState>>,
    username_job: Mutex<Option<JoinHandle<()>>>,
}

impl UserViewModel {
    pub fn new(
        repository: Arc<UserRepository>,
        platform: Arc<dyn PlatformServices>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            repository,
            platform,
            debounce: config.username_debounce,
            listen_users_error: config.listen_users_error.clone(),
            fetch_user_error: config.fetch_user_error.clone(),
            user_state: watch::channel(UserState::default()).0,
            username_state: Arc::new(watch::channel(UsernameState::default()).0),
            username_job: Mutex::new(None),
        }
    }

    pub fn user_state(&self) -> watch::Receiver<UserState> {
        self.user_state.subscribe()
    }

    pub fn username_state(&self) -> watch::Receiver<UsernameState> {
        self.username_state.subscribe()
    }

    pub async fn get_users(&self) {
        self.user_state.send_modify(|s| s.is_loading = true);
        match self.repository.get_users().await {
            Ok(users) => self.user_state.send_modify(|s| {
                s.users = users;
                s.is_loading = false;
                s.error = None;
            }),
            Err(e) => {
                error!(error = %e, "listing users failed");
                self.user_state.send_modify(|s| {
                    s.is_loading = false;
                    s.error = Some(self.listen_users_error.clone());
                });
            }
        }
    }

    pub async fn get_user_by_id(&self, id: &UserId) {
        self.user_state.send_modify(|s| s.is_loading = true);
        let result = self.repository.get_user_by_id(id).await;
        if let Err(e) = &result {
            error!(user = %id, error = %e, "fetching user failed");
        }
        self.user_state.send_modify(|s| {
            s.is_loading = false;
            match result {
                Ok(Some(user)) => {
                    s.user = Some(user);
                    s.error = None;
                }
                Ok(None) | Err(_) => {
                    s.user = None;
                    s.error = Some(self.fetch_user_error.clone());
                }
            }
        });
    }

    pub async fn get_current_user(&self) {
        let current = match self.repository.get_current_user().await {
            Ok(user) => user,
            Err(e) => {
                error!(error = %e, "fetching current user failed");
                None
            }
        };
        self.user_state.send_modify(|s| {
            s.current_user = current;
            s.is_loading = false;
            s.is_updating = false;
        });
    }

    /// Write the profile and refresh the current user. Returns success.
    pub async fn update_profile(&self, request: UpdateProfileRequest) -> bool {
        self.user_state.send_modify(|s| s.is_updating = true);
        match self.repository.update_profile(request).await {
            Ok(()) => {
                self.get_current_user().await;
                true
            }
            Err(e) => {
                error!(error = %e, "Update user failure");
                self.user_state.send_modify(|s| s.is_updating = false);
                self.platform.show_toast("Failed to update profile");
                false
            }
        }
    }

    pub async fn update_username(&self, username: &str) -> bool {
        self.username_state.send_replace(UsernameState {
            is_loading: true,
            ..UsernameState::default()
        });
        match self.repository.update_username(username).await {
            Ok(()) => {
                self.username_state.send_modify(|s| s.is_loading = false);
                self.get_current_user().await;
                true
            }
            Err(e) => {
                error!(error = %e, "updateUsername failed");
                self.username_state.send_modify(|s| {
                    s.is_loading = false;
                    s.error = Some(e.to_string());
                });
                false
            }
        }
    }

    /// Debounced availability check. Ignores empty input and the current
    /// username; a newer call aborts the pending one. Returns whether a
    /// check was scheduled.
    pub fn check_username(&self, username: &str) -> bool {
        let unchanged = self
            .user_state
            .borrow()
            .current_user
            .as_ref()
            .map_or(false, |user| user.username == username.trim());
        if username.is_empty() || unchanged {
            return false;
        }

        let mut job = self
            .username_job
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = job.take() {
            previous.abort();
        }
        self.username_state.send_replace(UsernameState {
            is_checking: true,
            ..UsernameState::default()
        });

        let repository = self.repository.clone();
        let state = self.username_state.clone();
        let delay = self.debounce;
        let candidate = username.to_string();
        *job = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match repository.is_username_taken(&candidate).await {
                Ok(taken) => state.send_modify(|s| {
                    s.is_username_taken = taken;
                    s.is_checking = false;
                }),
                Err(e) => state.send_modify(|s| {
                    s.is_username_taken = false;
                    s.is_checking = false;
                    s.error = Some(e.to_string());
                }),
            }
        }));
        true
    }

    pub fn clear_username_state(&self) {
        self.username_state.send_replace(UsernameState::default());
    }

    pub fn clear(&self) {
        self.user_state.send_replace(UserState::default());
    }
}

impl Drop for UserViewModel {
    fn drop(&mut self) {
        if let Some(job) = self
            .username_job
            .get_mut()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            job.abort();
        }
    }
}
