//! Scripted gateway for unit tests: replies are queued up front and every
//! call is recorded together with the bearer attached at call time.

use std::collections::VecDeque;
use std::sync::Mutex;

use reqwest::Method;
use serde_json::Value;
use tokio::sync::oneshot;

use super::{Gateway, GatewayError, GatewayResponse};

pub(crate) type Reply = Result<GatewayResponse, GatewayError>;

enum Scripted {
    Ready(Reply),
    Wait(oneshot::Receiver<Reply>),
}

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

#[derive(Default)]
pub(crate) struct MockGateway {
    replies: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<Call>>,
    bearer: Mutex<Option<String>>,
}

impl MockGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn ok(self, status: u16, data: Value) -> Self {
        self.push(Scripted::Ready(Ok(GatewayResponse::new(status, data))))
    }

    pub(crate) fn fail(self, err: GatewayError) -> Self {
        self.push(Scripted::Ready(Err(err)))
    }

    /// Reply only once the paired sender fires.
    pub(crate) fn wait(self, rx: oneshot::Receiver<Reply>) -> Self {
        self.push(Scripted::Wait(rx))
    }

    fn push(self, reply: Scripted) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn paths(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.path).collect()
    }
}

#[async_trait::async_trait]
impl Gateway for MockGateway {
    async fn request_with_bearer(&self, method: Method, path: &str, body: Option<Value>, bearer: Option<&str>) -> Reply {
        let bearer = bearer.map(str::to_owned);
        self.calls
            .lock()
            .unwrap()
            .push(Call { method, path: path.to_owned(), body, bearer });
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Ready(reply)) => reply,
            Some(Scripted::Wait(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(GatewayError::Transport("reply dropped".into()))),
            None => Err(GatewayError::Transport("no scripted reply".into())),
        }
    }

    fn set_bearer(&self, token: Option<&str>) {
        *self.bearer.lock().unwrap() = token.map(str::to_owned);
    }

    fn bearer(&self) -> Option<String> {
        self.bearer.lock().unwrap().clone()
    }
}
