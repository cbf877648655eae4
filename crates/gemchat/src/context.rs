// Rolling conversation window sent with every request.

/// Bounded, ordered buffer of prior conversation entries.
///
/// Each entry is one turn string: a user prompt (carrying its instruction
/// prefix) or a prior answer. The buffer never holds more than `limit`
/// entries; when an append pushes past the bound, the oldest half of the
/// window is dropped in one bulk operation so trimming does not run on
/// every turn.
#[derive(Debug, Clone)]
pub struct ContextBuffer {
    entries: Vec<String>,
    limit: usize,
}

impl ContextBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit,
        }
    }

    /// Add `entry` as the newest item, trimming the oldest excess in bulk.
    pub fn append(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
        if self.entries.len() > self.limit {
            // At least half the window goes at once; the `max` keeps the
            // bound holding for degenerate limits below 2.
            let cut = (self.entries.len() - self.limit).max(self.limit / 2);
            self.entries.drain(..cut);
        }
    }

    /// Swap the most recently appended entry for a differently-formatted one.
    ///
    /// Primitive for the accumulation variant that re-tags the last user
    /// entry once the answer arrives. Appends on an empty buffer.
    pub fn replace_last(&mut self, entry: impl Into<String>) {
        self.entries.pop();
        self.append(entry);
    }

    /// The full retained context, entries joined by newline in insertion
    /// order. Pure: no internal state changes.
    pub fn render(&self) -> String {
        self.entries.join("\n")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
