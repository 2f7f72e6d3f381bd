//! Chat list and open-thread view model.

use std::sync::{Arc, Mutex, MutexGuard};

use ardath_shared::models::{Chat, Message};
use ardath_shared::{ChatId, UserId};
use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};
use crate::fanout::OutgoingMessage;
use crate::listeners::{ChatFeed, FeedUpdate};
use crate::pagination::PageCursor;
use crate::platform::{ActiveChat, PlatformServices};
use crate::repository::ChatRepository;
use crate::resource::{ChannelStream, Resource};
use crate::state::{ChatState, MessageState};
use crate::timeline::build_timeline;

/// Everything tied to the lifetime of the loaded chat list.
#[derive(Default)]
struct ChatList {
    cursor: PageCursor,
    feed: Option<ChatFeed>,
    consumer: Option<JoinHandle<()>>,
    selection: Vec<Chat>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

pub struct ChatViewModel {
    repository: Arc<ChatRepository>,
    platform: Arc<dyn PlatformServices>,
    active_chat: ActiveChat,
    chat_state: Arc<watch::Sender<ChatState>>,
    message_state: Arc<watch::Sender<MessageState>>,
    list: Arc<Mutex<ChatList>>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl ChatViewModel {
    pub fn new(
        repository: Arc<ChatRepository>,
        platform: Arc<dyn PlatformServices>,
        active_chat: ActiveChat,
    ) -> Self {
        Self {
            repository,
            platform,
            active_chat,
            chat_state: Arc::new(watch::channel(ChatState::default()).0),
            message_state: Arc::new(watch::channel(MessageState::default()).0),
            list: Arc::new(Mutex::new(ChatList::default())),
            thread: Mutex::new(None),
        }
    }

    pub fn chat_state(&self) -> watch::Receiver<ChatState> {
        self.chat_state.subscribe()
    }

    pub fn message_state(&self) -> watch::Receiver<MessageState> {
        self.message_state.subscribe()
    }

    // -- Chat list --

    /// Attach the next page of chats. Returns `false` without touching the
    /// backend while a load is in flight or after the end was reached.
    pub fn load_chats(&self, page_size: usize) -> bool {
        if self.chat_state.borrow().end_reached {
            return false;
        }
        let mut list = lock(&self.list);
        let Some(start_after) = list.cursor.begin() else {
            debug!("chat page already loading");
            return false;
        };
        self.chat_state.send_modify(|s| {
            s.is_loading = true;
            s.error = None;
        });

        if list.feed.is_none() {
            let (feed, updates) = self.repository.open_chat_feed();
            list.consumer = Some(self.spawn_feed_consumer(updates));
            list.feed = Some(feed);
        }
        let attached = match list.feed.as_mut() {
            Some(feed) => feed.listen(page_size, start_after.as_ref()),
            None => return false,
        };

        match attached {
            Ok(page) => {
                list.cursor.started(page);
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to attach chat page");
                list.cursor.abort();
                self.chat_state.send_modify(|s| {
                    s.is_loading = false;
                    s.error = Some(e.to_string());
                });
                false
            }
        }
    }

    fn spawn_feed_consumer(&self, mut updates: ChannelStream<FeedUpdate>) -> JoinHandle<()> {
        let list = self.list.clone();
        let state = self.chat_state.clone();
        tokio::spawn(async move {
            while let Some(update) = updates.next().await {
                let finished = update.completes_load()
                    && lock(&list)
                        .cursor
                        .finish(update.page, update.page_end.as_ref());
                let FeedUpdate { result, .. } = update;
                state.send_modify(|s| {
                    match result {
                        Resource::Success(chats) => {
                            s.chats = chats;
                            s.error = None;
                            s.end_reached = false;
                        }
                        Resource::Empty => {
                            if finished {
                                s.end_reached = true;
                            }
                        }
                        Resource::Error(message) => s.error = Some(message),
                    }
                    if finished {
                        s.is_loading = false;
                    }
                });
            }
            debug!("chat feed consumer finished");
        })
    }

    /// Select `chat`, or a freshly generated chat id when `None`.
    pub fn set_selected_chat_id(&self, chat: Option<ChatId>) -> ChatId {
        let chat = chat.unwrap_or_else(|| self.repository.get_chat_id());
        self.chat_state
            .send_modify(|s| s.selected_chat_id = Some(chat.clone()));
        chat
    }

    /// Toggle the chat at `index` in the multi-selection. Returns whether
    /// multi-select is active afterwards.
    pub fn toggle_selection(&self, index: usize) -> bool {
        let item = self.chat_state.borrow().chats.get(index).cloned();
        let mut list = lock(&self.list);
        if let Some(item) = item {
            match list.selection.iter().position(|c| c.id == item.id) {
                Some(i) => {
                    list.selection.remove(i);
                }
                None => list.selection.push(item),
            }
        }
        !list.selection.is_empty()
    }

    pub fn clear_selection(&self) {
        lock(&self.list).selection.clear();
    }

    pub fn selected_chats(&self) -> Vec<Chat> {
        lock(&self.list).selection.clone()
    }

    pub fn is_multi_select(&self) -> bool {
        !lock(&self.list).selection.is_empty()
    }

    pub async fn has_chat(&self, other: &UserId) -> Result<Option<ChatId>> {
        self.repository.has_chat(other).await
    }

    /// Delete the owner's copies of `chats`. Returns whether the write
    /// succeeded; removals reach the list through the feed.
    pub async fn delete_chat(&self, chats: &[Chat]) -> bool {
        let ok = self.repository.delete_chat(chats).await.is_ok();
        if !ok {
            self.platform.show_toast("Failed to delete chat");
        }
        self.clear_selection();
        ok
    }

    // -- Thread --

    pub async fn send_message(&self, outgoing: OutgoingMessage) -> Result<Message> {
        match self.repository.send_message(outgoing).await {
            Err(ClientError::EmptyMessage) => Err(ClientError::EmptyMessage),
            Err(e) => {
                self.platform.show_toast("Failed to send message");
                Err(e)
            }
            Ok(message) => Ok(message),
        }
    }

    /// Switch the open thread to `chat`. Any previous thread listener is
    /// released first.
    pub fn listen_for_messages(&self, chat: &ChatId) -> Result<()> {
        self.release_thread();
        self.message_state.send_replace(MessageState {
            is_loading: true,
            ..MessageState::default()
        });

        let mut stream = match self.repository.listen_for_messages(chat) {
            Ok(stream) => stream,
            Err(e) => {
                self.message_state.send_modify(|s| {
                    s.is_loading = false;
                    s.error = Some(e.to_string());
                });
                return Err(e);
            }
        };
        self.active_chat.set(chat.clone());

        let state = self.message_state.clone();
        let task = tokio::spawn(async move {
            while let Some(resource) = stream.next().await {
                state.send_modify(|s| {
                    match resource {
                        Resource::Success(messages) => {
                            s.items = build_timeline(&messages, &chrono::Local::now());
                            s.messages = messages;
                            s.error = None;
                        }
                        Resource::Empty => {
                            s.messages.clear();
                            s.items.clear();
                        }
                        Resource::Error(message) => s.error = Some(message),
                    }
                    s.is_loading = false;
                });
            }
        });
        *lock(&self.thread) = Some(task);
        Ok(())
    }

    /// Release the open thread and reset its state.
    pub fn stop_listening(&self) {
        self.release_thread();
        self.message_state.send_replace(MessageState::default());
    }

    fn release_thread(&self) {
        if let Some(task) = lock(&self.thread).take() {
            task.abort();
        }
        self.active_chat.clear();
    }

    /// The thread is on screen: mark its incoming messages READ.
    pub async fn mark_chat_read(&self, chat: &ChatId) -> Result<usize> {
        self.repository.mark_chat_read(chat).await
    }

    // -- Teardown --

    /// Release every subscription and reset all state and the cursor.
    pub fn clear(&self) {
        self.release_list();
        self.chat_state.send_replace(ChatState::default());
        self.stop_listening();
    }

    fn release_list(&self) {
        let mut list = lock(&self.list);
        if let Some(consumer) = list.consumer.take() {
            consumer.abort();
        }
        list.feed = None;
        list.cursor.reset();
        list.selection.clear();
    }
}

impl Drop for ChatViewModel {
    fn drop(&mut self) {
        self.release_list();
        self.release_thread();
    }
}
