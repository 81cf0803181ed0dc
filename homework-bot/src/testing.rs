//! Fakes shared by the bot's unit tests

use async_trait::async_trait;
use homework_client::{ClientError, HomeworkSource, MessageSender};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Serves queued responses in order, then empty payloads
pub(crate) struct ScriptedSource {
    responses: Mutex<VecDeque<homework_client::Result<Value>>>,
    from_dates: Mutex<Vec<i64>>,
}

impl ScriptedSource {
    pub(crate) fn new(responses: Vec<homework_client::Result<Value>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            from_dates: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn from_dates(&self) -> Vec<i64> {
        self.from_dates.lock().unwrap().clone()
    }
}

#[async_trait]
impl HomeworkSource for ScriptedSource {
    async fn fetch(&self, from_date: i64) -> homework_client::Result<Value> {
        self.from_dates.lock().unwrap().push(from_date);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({ "homeworks": [] })))
    }
}

/// Records every send; fails the calls whose index is in `fail_on`
#[derive(Default)]
pub(crate) struct FlakySender {
    pub(crate) sent: Mutex<Vec<String>>,
    pub(crate) fail_on: Vec<usize>,
    pub(crate) fail_all: bool,
}

impl FlakySender {
    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageSender for FlakySender {
    async fn send_message(&self, _chat_id: &str, text: &str) -> homework_client::Result<()> {
        let mut sent = self.sent.lock().unwrap();
        let index = sent.len();
        sent.push(text.to_string());
        if self.fail_all || self.fail_on.contains(&index) {
            Err(ClientError::api_error(502, "Bad Gateway"))
        } else {
            Ok(())
        }
    }
}
