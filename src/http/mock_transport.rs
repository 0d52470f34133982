//! # Mock Transport for Testing
//!
//! Provides a `MockTransport` that implements `Transport` with scripted
//! replies. Routes match on a substring of the request URL; each route hands
//! out its queued replies in order and keeps repeating the last one. Every
//! request is recorded so tests can assert which URLs were (or were not) hit.

use crate::error::{Error, Result};
use crate::http::{RawResponse, Transport};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

#[derive(Debug, Clone)]
enum Reply {
    Respond(RawResponse),
    Fail(String),
}

#[derive(Debug)]
struct Route {
    pattern: String,
    replies: VecDeque<Reply>,
}

/// A scripted transport. Clones share routes and the request log.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    routes: Arc<Mutex<Vec<Route>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockTransport {
    /// Creates a transport that answers 404 to everything until routes are added.
    pub fn new() -> Self {
        Self::default()
    }

    async fn push(&self, pattern: &str, reply: Reply) {
        let mut routes = self.routes.lock().await;
        match routes.iter_mut().find(|r| r.pattern == pattern) {
            Some(route) => route.replies.push_back(reply),
            None => routes.push(Route {
                pattern: pattern.to_string(),
                replies: VecDeque::from([reply]),
            }),
        }
    }

    /// Queue a response for URLs containing `pattern`.
    pub async fn respond(&self, pattern: &str, status: u16, body: impl Into<Vec<u8>>) {
        self.push(pattern, Reply::Respond(RawResponse::new(status, body)))
            .await;
    }

    /// Queue a transport failure for URLs containing `pattern`.
    pub async fn fail(&self, pattern: &str, message: &str) {
        self.push(pattern, Reply::Fail(message.to_string())).await;
    }

    /// All request URLs in the order they were issued.
    pub async fn requests(&self) -> Vec<String> {
        self.requests.lock().await.clone()
    }

    /// Number of requests whose URL contains `pattern`.
    pub async fn count(&self, pattern: &str) -> usize {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|url| url.contains(pattern))
            .count()
    }
}

impl Transport for MockTransport {
    async fn get(&self, url: &Url) -> Result<RawResponse> {
        self.requests.lock().await.push(url.to_string());

        let reply = {
            let mut routes = self.routes.lock().await;
            routes
                .iter_mut()
                .find(|r| url.as_str().contains(&r.pattern))
                .and_then(|route| {
                    if route.replies.len() > 1 {
                        route.replies.pop_front()
                    } else {
                        route.replies.front().cloned()
                    }
                })
        };

        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(Error::Other(message)),
            None => Ok(RawResponse::new(404, Vec::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order_then_repeat_last() {
        let mock = MockTransport::new();
        mock.respond("page=", 200, "first").await;
        mock.respond("page=", 200, "second").await;

        let url = Url::parse("http://test/search?page=1").unwrap();
        assert_eq!(mock.get(&url).await.unwrap().text(), "first");
        assert_eq!(mock.get(&url).await.unwrap().text(), "second");
        assert_eq!(mock.get(&url).await.unwrap().text(), "second");
        assert_eq!(mock.count("page=").await, 3);
    }

    #[tokio::test]
    async fn test_unmatched_and_failures() {
        let mock = MockTransport::new();
        mock.fail("broken", "connection reset").await;

        let missing = Url::parse("http://test/missing").unwrap();
        assert_eq!(mock.get(&missing).await.unwrap().status, 404);

        let broken = Url::parse("http://test/broken").unwrap();
        assert!(mock.get(&broken).await.is_err());
        assert_eq!(mock.requests().await.len(), 2);
    }
}
