use bridge_runtime::Response;

/// Ordered, append-only buffer of responses awaiting emission.
///
/// Entries leave only through [`ResponseQueue::clear_through`], which the
/// emit paths call after a successful write, so nothing is delivered twice
/// and nothing queued during a failed write is lost.
#[derive(Debug, Default, Clone)]
pub struct ResponseQueue {
    entries: Vec<Response>,
}

impl ResponseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, response: Response) {
        self.entries.push(response);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Response] {
        &self.entries
    }

    pub fn last(&self) -> Option<&Response> {
        self.entries.last()
    }

    /// Drop the first `count` entries (those that were written out).
    pub fn clear_through(&mut self, count: usize) {
        let count = count.min(self.entries.len());
        self.entries.drain(..count);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
