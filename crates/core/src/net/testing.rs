//! Scripted transport double shared by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{HttpRequest, HttpResponse, HttpTransport, TransportError};

/// Replays queued results in order; once the script runs out, the last
/// entry repeats.
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    last: Mutex<Option<Result<HttpResponse, TransportError>>>,
    calls: Mutex<Vec<(Instant, HttpRequest)>>,
}

impl ScriptedTransport {
    pub(crate) fn new(script: Vec<Result<HttpResponse, TransportError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn always(result: Result<HttpResponse, TransportError>) -> Self {
        Self::new(vec![result])
    }

    pub(crate) fn calls(&self) -> Vec<(Instant, HttpRequest)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.lock().unwrap().push((Instant::now(), request));
        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(result) => {
                *last = Some(result.clone());
                result
            }
            None => last
                .clone()
                .unwrap_or_else(|| Err(TransportError::timeout())),
        }
    }
}
