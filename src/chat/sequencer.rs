use std::collections::BTreeMap;

/// Releases assistant outcomes in the order their requests were issued.
///
/// Replies that finish early wait here until every earlier request has
/// resolved, so overlapping requests cannot reorder the transcript.
#[derive(Debug)]
pub struct ReplySequencer<T> {
    next_issue: u64,
    next_release: u64,
    ready: BTreeMap<u64, T>,
}

impl<T> Default for ReplySequencer<T> {
    fn default() -> Self {
        Self {
            next_issue: 0,
            next_release: 0,
            ready: BTreeMap::new(),
        }
    }
}

impl<T> ReplySequencer<T> {
    pub fn issue(&mut self) -> u64 {
        let id = self.next_issue;
        self.next_issue += 1;
        id
    }

    /// Records a finished request and returns every outcome now releasable.
    pub fn complete(&mut self, request_id: u64, outcome: T) -> Vec<T> {
        if request_id < self.next_release || request_id >= self.next_issue {
            tracing::warn!(request_id, "ignoring reply for unknown or released request");
            return Vec::new();
        }
        self.ready.insert(request_id, outcome);

        let mut released = Vec::new();
        while let Some(outcome) = self.ready.remove(&self.next_release) {
            released.push(outcome);
            self.next_release += 1;
        }
        released
    }

    pub fn in_flight(&self) -> usize {
        (self.next_issue - self.next_release) as usize - self.ready.len()
    }

    pub fn is_idle(&self) -> bool {
        self.next_issue == self.next_release
    }
}
