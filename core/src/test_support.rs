use std::collections::VecDeque;

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::types::Todo;

/// Replays queued responses in order and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    pub requests: Vec<HttpRequest>,
    responses: VecDeque<Result<HttpResponse, ApiError>>,
}

impl ScriptedTransport {
    pub fn respond(&mut self, status: u16, body: impl Into<String>) {
        self.responses.push_back(Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.into(),
        }));
    }

    pub fn fail(&mut self, reason: &str) {
        self.responses
            .push_back(Err(ApiError::Transport(reason.to_string())));
    }
}

impl Transport for ScriptedTransport {
    fn execute(&mut self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.push(request);
        self.responses
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("no scripted response".into())))
    }
}

pub fn todo(n: u128, title: &str) -> Todo {
    Todo {
        id: Uuid::from_u128(n),
        title: title.to_string(),
        completed: false,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    }
}

pub fn todo_json(n: u128, title: &str) -> String {
    serde_json::to_string(&todo(n, title)).unwrap()
}
