//! Paginated chat list listener.
//!
//! A [`ChatFeed`] owns one reducer task and any number of page tasks. Each
//! page task holds a child subscription on `chats/{owner}` ordered by key,
//! starting after a cursor and limited to a page size, and forwards typed
//! deltas to the reducer over one bounded queue. The reducer is the only
//! writer of the accumulated list and publishes it after every delta.
//!
//! A page's initial load completes once every child of its opening window
//! has been delivered; that update carries the key of the page's last child.

use std::sync::Arc;

use ardath_shared::models::Chat;
use ardath_shared::{paths, ChatId, UserId};
use ardath_store::{DbPath, Listener, Query, RemoteEvent, RemoteStore};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::pagination::PageId;
use crate::reducer::{Delta, KeyedList};
use crate::resource::{ChannelStream, Resource};

use super::to_delta;

/// One emission of the accumulated list, tagged with the page that caused it.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedUpdate {
    pub page: PageId,
    pub result: Resource<Vec<Chat>>,
    /// Last key of the page's opening window, set on the update that
    /// delivers the window's final child.
    pub page_end: Option<ChatId>,
}

impl FeedUpdate {
    /// Whether this update ends the initial load of `self.page`.
    pub fn completes_load(&self) -> bool {
        self.page_end.is_some() || !self.result.is_success()
    }
}

#[derive(Debug)]
enum PageEvent {
    Delta(Delta<Chat>),
    /// Every child of the opening window has been forwarded.
    Loaded(ChatId),
    /// The page's window was empty when it was opened.
    Empty,
    Failed(String),
}

#[derive(Debug)]
struct PageMessage {
    page: PageId,
    event: PageEvent,
}

pub struct ChatFeed {
    store: Arc<dyn RemoteStore>,
    owner: UserId,
    config: ClientConfig,
    pages_tx: mpsc::Sender<PageMessage>,
    pages: Vec<JoinHandle<()>>,
    reducer: JoinHandle<()>,
    next_page: PageId,
}

impl ChatFeed {
    /// Start an empty feed for `owner`. The returned stream ends when the
    /// feed is dropped.
    pub fn open(
        store: Arc<dyn RemoteStore>,
        owner: UserId,
        config: &ClientConfig,
    ) -> (Self, ChannelStream<FeedUpdate>) {
        let (pages_tx, pages_rx) = mpsc::channel(config.channel_capacity);
        let (updates_tx, updates_rx) = mpsc::channel(config.channel_capacity);
        let reducer = tokio::spawn(reduce(pages_rx, updates_tx));

        debug!(owner = %owner, "chat feed opened");
        let feed = Self {
            store,
            owner,
            config: config.clone(),
            pages_tx,
            pages: Vec::new(),
            reducer,
            next_page: 0,
        };
        (feed, ChannelStream::new(updates_rx))
    }

    /// Attach the next page. A `page_size` of 0 uses the configured default.
    pub fn listen(&mut self, page_size: usize, start_after: Option<&ChatId>) -> Result<PageId> {
        let limit = self.config.effective_page_size(page_size);
        let mut query = Query::at(DbPath::parse(&paths::chats_of(&self.owner))?)
            .order_by_key()
            .limit_to_first(limit);
        if let Some(key) = start_after {
            query = query.start_after(key.as_str());
        }

        let listener = self.store.listen_children(query.clone())?;
        let page = self.next_page;
        self.next_page += 1;

        info!(owner = %self.owner, page, limit, after = ?start_after, "chat page attached");
        let task = tokio::spawn(run_page(
            page,
            self.store.clone(),
            query,
            listener,
            self.pages_tx.clone(),
        ));
        self.pages.push(task);
        Ok(page)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

impl Drop for ChatFeed {
    fn drop(&mut self) {
        for page in self.pages.drain(..) {
            page.abort();
        }
        self.reducer.abort();
        debug!(owner = %self.owner, "chat feed closed");
    }
}

async fn run_page(
    page: PageId,
    store: Arc<dyn RemoteStore>,
    query: Query,
    mut listener: Listener,
    tx: mpsc::Sender<PageMessage>,
) {
    // Children still to arrive before the opening window is complete.
    let mut loading: Option<(usize, ChatId)> = None;
    let initial = match store.get(&query).await {
        Ok(snapshot) => match snapshot.keys().last() {
            Some(last) => {
                loading = Some((snapshot.children_count(), ChatId::from(last)));
                None
            }
            None => Some(PageEvent::Empty),
        },
        Err(e) => {
            warn!(page, error = %e, "initial chat page read failed");
            Some(PageEvent::Failed(e.to_string()))
        }
    };
    if let Some(event) = initial {
        if tx.send(PageMessage { page, event }).await.is_err() {
            return;
        }
    }

    while let Some(event) = listener.next().await {
        if matches!(event, RemoteEvent::ChildAdded { .. }) {
            if let Some((remaining, _)) = loading.as_mut() {
                *remaining = remaining.saturating_sub(1);
            }
        }
        let forwarded = match event {
            RemoteEvent::Cancelled(e) => {
                warn!(page, error = %e, "chat page listener cancelled");
                let _ = tx
                    .send(PageMessage {
                        page,
                        event: PageEvent::Failed(e.to_string()),
                    })
                    .await;
                break;
            }
            other => to_delta::<Chat>(other).map(PageEvent::Delta),
        };
        if let Some(event) = forwarded {
            if tx.send(PageMessage { page, event }).await.is_err() {
                break;
            }
        }

        if !matches!(loading, Some((0, _))) {
            continue;
        }
        if let Some((_, last)) = loading.take() {
            debug!(page, last = %last, "chat page loaded");
            let loaded = PageMessage {
                page,
                event: PageEvent::Loaded(last),
            };
            if tx.send(loaded).await.is_err() {
                break;
            }
        }
    }
    debug!(page, "chat page listener finished");
}

async fn reduce(mut rx: mpsc::Receiver<PageMessage>, tx: mpsc::Sender<FeedUpdate>) {
    let mut chats = KeyedList::<Chat>::new();
    while let Some(PageMessage { page, event }) = rx.recv().await {
        let mut page_end = None;
        let result = match event {
            PageEvent::Delta(delta) => {
                trace!(page, key = delta.key(), "chat delta");
                if !chats.apply(delta) {
                    continue;
                }
                Resource::Success(chats.to_vec())
            }
            PageEvent::Loaded(last) => {
                page_end = Some(last);
                Resource::Success(chats.to_vec())
            }
            PageEvent::Empty => Resource::Empty,
            PageEvent::Failed(message) => Resource::Error(message),
        };
        let update = FeedUpdate {
            page,
            result,
            page_end,
        };
        if tx.send(update).await.is_err() {
            break;
        }
    }
}
