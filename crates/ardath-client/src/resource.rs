//! Items carried by result channels, and the channel-backed stream type.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Outcome of one emission on a result channel.
///
/// `Empty` is a confirmed "no data" answer from the backend, distinct from a
/// load that has not produced anything yet and from a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource<T> {
    Success(T),
    Empty,
    /// User-facing error text.
    Error(String),
}

impl<T> Resource<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Resource::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            Resource::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resource<U> {
        match self {
            Resource::Success(data) => Resource::Success(f(data)),
            Resource::Empty => Resource::Empty,
            Resource::Error(message) => Resource::Error(message),
        }
    }
}

/// A bounded channel receiver exposed as a [`Stream`].
///
/// When a producer task is attached it is aborted as soon as the stream is
/// dropped, which in turn releases whatever backend listener it owned.
#[derive(Debug)]
pub struct ChannelStream<T> {
    rx: mpsc::Receiver<T>,
    producer: Option<JoinHandle<()>>,
}

impl<T> ChannelStream<T> {
    pub fn new(rx: mpsc::Receiver<T>) -> Self {
        Self { rx, producer: None }
    }

    pub fn with_producer(rx: mpsc::Receiver<T>, producer: JoinHandle<()>) -> Self {
        Self {
            rx,
            producer: Some(producer),
        }
    }
}

impl<T> Stream for ChannelStream<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl<T> Drop for ChannelStream<T> {
    fn drop(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}
