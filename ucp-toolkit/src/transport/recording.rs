//! In-memory transport that replays canned merchant responses and records
//! every request it receives.

use std::{collections::VecDeque, sync::Mutex};

use serde_json::Value;

use crate::{
    error::{Result, ToolkitError},
    transport::{HttpMethod, RequestContext, Transport, TransportResponse, sealed},
};

/// Request as seen by [`RecordingTransport`].
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: HttpMethod,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingTransport {
    responses: Mutex<VecDeque<TransportResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl sealed::Sealed for RecordingTransport {}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a JSON response.
    pub fn push_json(&self, status: u16, body: &Value) {
        let body = serde_json::to_vec(body).expect("fixture serializes");
        self.push_raw(status, body);
    }

    pub fn push_raw(&self, status: u16, body: Vec<u8>) {
        self.responses.lock().expect("lock").push_back(TransportResponse { status, body });
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("lock").clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests.lock().expect("lock").last().cloned().expect("at least one request")
    }

    fn record(
        &self,
        method: HttpMethod,
        ctx: &RequestContext<'_>,
        body: Option<&[u8]>,
    ) -> Result<TransportResponse> {
        let body = match body {
            Some(bytes) if !bytes.is_empty() => Some(serde_json::from_slice(bytes)?),
            _ => None,
        };
        self.requests.lock().expect("lock").push(RecordedRequest {
            method,
            path: ctx.path.to_owned(),
            headers: ctx.headers.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect(),
            body,
        });

        self.responses.lock().expect("lock").pop_front().ok_or_else(|| {
            ToolkitError::InvalidResponse(format!("no canned response for {method} {}", ctx.path))
        })
    }
}

impl Transport for RecordingTransport {
    async fn get<'a>(&'a self, ctx: RequestContext<'a>) -> Result<TransportResponse> {
        self.record(HttpMethod::Get, &ctx, None)
    }

    async fn post<'a>(&'a self, ctx: RequestContext<'a>, body: &'a [u8]) -> Result<TransportResponse> {
        self.record(HttpMethod::Post, &ctx, Some(body))
    }

    async fn put<'a>(&'a self, ctx: RequestContext<'a>, body: &'a [u8]) -> Result<TransportResponse> {
        self.record(HttpMethod::Put, &ctx, Some(body))
    }

    fn protocol_name(&self) -> &'static str {
        "recording"
    }
}
