//! A scripted, in-memory [`Exchange`] for tests.
//!
//! Responses are queued per `(method, path)`. Each request pops the next
//! queued entry; the last entry for a route stays in place and answers
//! every later request, so a single `respond` covers repeated loads.
//! Every request is recorded for later assertions.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::{Value, json};

use crate::{Exchange, HttpRequest, HttpResponse, Method, TransportError};

#[derive(Debug, Clone)]
enum Scripted {
    Respond {
        response: HttpResponse,
        delay: Option<Duration>,
    },
    Fail(String),
}

#[derive(Debug, Default)]
struct ScriptState {
    routes: HashMap<(Method, String), VecDeque<Scripted>>,
    requests: Vec<HttpRequest>,
}

/// An [`Exchange`] that replays canned responses and records requests.
#[derive(Debug, Clone, Default)]
pub struct ScriptedExchange {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedExchange {
    /// Creates an exchange with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, method: Method, path: &str, entry: Scripted) {
        self.lock()
            .routes
            .entry((method, path.to_string()))
            .or_default()
            .push_back(entry);
    }

    /// Queues a response for `method path`.
    pub fn respond(
        &self,
        method: Method,
        path: &str,
        status: u16,
        body: Value,
    ) -> &Self {
        self.push(
            method,
            path,
            Scripted::Respond {
                response: HttpResponse::new(status, body),
                delay: None,
            },
        );
        self
    }

    /// Queues a response that is delivered after `delay`.
    pub fn respond_after(
        &self,
        method: Method,
        path: &str,
        delay: Duration,
        status: u16,
        body: Value,
    ) -> &Self {
        self.push(
            method,
            path,
            Scripted::Respond {
                response: HttpResponse::new(status, body),
                delay: Some(delay),
            },
        );
        self
    }

    /// Queues a network failure for `method path`.
    pub fn fail(&self, method: Method, path: &str, message: &str) -> &Self {
        self.push(method, path, Scripted::Fail(message.to_string()));
        self
    }

    /// Drops every queued entry for `method path`.
    pub fn clear(&self, method: Method, path: &str) -> &Self {
        self.lock().routes.remove(&(method, path.to_string()));
        self
    }

    /// Returns every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    /// Counts the requests received for `method path`.
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Returns the most recent request for `method path`.
    pub fn last_request(&self, method: Method, path: &str) -> Option<HttpRequest> {
        self.lock()
            .requests
            .iter()
            .rev()
            .find(|r| r.method == method && r.path == path)
            .cloned()
    }

    fn next_entry(&self, request: &HttpRequest) -> Option<Scripted> {
        let mut state = self.lock();
        state.requests.push(request.clone());
        let queue = state
            .routes
            .get_mut(&(request.method, request.path.clone()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Exchange for ScriptedExchange {
    async fn execute(
        &self,
        request: HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        match self.next_entry(&request) {
            Some(Scripted::Respond { response, delay }) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(response)
            }
            Some(Scripted::Fail(message)) => Err(TransportError::Network(message)),
            None => Ok(HttpResponse::new(
                404,
                json!({ "error": format!("no route for {} {}", request.method, request.path) }),
            )),
        }
    }
}
