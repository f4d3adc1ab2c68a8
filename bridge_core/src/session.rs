use bridge_runtime::{Outcome, Response, EVENT_RESPONSE_ID};

use crate::intents::StandingIntents;
use crate::queue::ResponseQueue;

/// State that survives between calls: the response queue, the standing
/// intents and the command id counter. One per bridge, created with it and
/// torn down with it.
#[derive(Debug, Clone)]
pub struct Session {
    pub queue: ResponseQueue,
    pub intents: StandingIntents,
    next_id: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            queue: ResponseQueue::new(),
            intents: StandingIntents::default(),
            next_id: EVENT_RESPONSE_ID + 1,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next command id. Ids start at 1 and are never reused.
    pub fn issue_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Id that the next dispatched command will receive.
    pub fn peek_id(&self) -> u64 {
        self.next_id
    }

    pub fn record(&mut self, id: u64, step: u64, outcome: Outcome) -> &Response {
        self.queue.push(Response::from_outcome(id, step, outcome));
        self.queue
            .last()
            .expect("queue cannot be empty right after a push")
    }

    pub fn record_event(&mut self, step: u64, outcome: Outcome) -> &Response {
        self.record(EVENT_RESPONSE_ID, step, outcome)
    }
}
