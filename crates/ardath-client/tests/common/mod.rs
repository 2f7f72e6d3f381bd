#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ardath_client::{
    ActiveChat, ChatRepository, ClientConfig, LoggingDispatcher, NoopPlatform, Session,
    UserRepository,
};
use ardath_store::{MemoryStore, RemoteStore};
use serde_json::Value;
use tokio::sync::watch;

pub const WAIT: Duration = Duration::from_secs(2);

/// Two signed-in users, `u1` (Alice) and `u2` (Bob), sharing one store.
pub struct Fixture {
    pub store: MemoryStore,
    pub config: ClientConfig,
    pub alice: Arc<ChatRepository>,
    pub bob: Arc<ChatRepository>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_data(Value::Null)
    }

    pub fn with_data(root: Value) -> Self {
        let store = MemoryStore::with_data(root);
        let config = ClientConfig {
            username_debounce: Duration::from_millis(20),
            ..ClientConfig::default()
        };
        let alice = Arc::new(chat_repository(&store, &config, alice()));
        let bob = Arc::new(chat_repository(&store, &config, bob()));
        Self {
            store,
            config,
            alice,
            bob,
        }
    }

    pub fn remote(&self) -> Arc<dyn RemoteStore> {
        Arc::new(self.store.clone())
    }

    pub fn users(&self, session: Session) -> Arc<UserRepository> {
        Arc::new(UserRepository::new(
            self.remote(),
            session,
            self.config.clone(),
        ))
    }

    pub fn chat_view_model(&self) -> (ardath_client::ChatViewModel, ActiveChat) {
        let active = ActiveChat::new();
        let vm = ardath_client::ChatViewModel::new(
            self.alice.clone(),
            Arc::new(NoopPlatform),
            active.clone(),
        );
        (vm, active)
    }
}

pub fn alice() -> Session {
    Session::new("u1").with_display_name("Alice")
}

pub fn bob() -> Session {
    Session::new("u2").with_display_name("Bob")
}

fn chat_repository(store: &MemoryStore, config: &ClientConfig, session: Session) -> ChatRepository {
    ChatRepository::new(
        Arc::new(store.clone()),
        session,
        config.clone(),
        Arc::new(LoggingDispatcher),
    )
}

/// Wait until the watched state satisfies `pred`, failing the test on timeout.
pub async fn wait_until<T, F>(rx: &mut watch::Receiver<T>, pred: F) -> T
where
    T: Clone,
    F: FnMut(&T) -> bool,
{
    let state = tokio::time::timeout(WAIT, rx.wait_for(pred))
        .await
        .expect("timed out waiting for state")
        .expect("state sender dropped");
    state.clone()
}

/// Poll `check` until it holds, failing the test on timeout.
pub async fn eventually<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(WAIT, async {
        while !check().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition never held");
}
