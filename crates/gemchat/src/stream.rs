// Streamed response parsing: framed record extraction and answer assembly.

use std::time::Duration;

use futures::StreamExt;

use crate::error::Error;
use crate::wire::GenerateResponse;

/// Length of the fixed framing prefix (`data:`) on each streamed record.
///
/// The prefix is stripped blindly, so an alternate SSE-style framing is a
/// one-constant change.
pub const FRAME_PREFIX_LEN: usize = 5;

/// Incremental line framer for the streamed response body.
///
/// Feed raw chunks as they arrive; complete framed lines are returned as
/// record payloads ready for JSON decoding. Partial lines are buffered
/// across chunk boundaries. Handles `\n` and `\r\n` endings; lines that are
/// empty after trimming carry no record and are skipped.
#[derive(Debug, Default)]
pub struct FrameParser {
    buffer: String,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of text. Returns the payload of every line completed by
    /// this chunk, in arrival order.
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);
        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line_end = if pos > 0 && self.buffer.as_bytes()[pos - 1] == b'\r' {
                pos - 1
            } else {
                pos
            };
            let line = self.buffer[..line_end].to_string();
            self.buffer.drain(..=pos);
            if let Some(payload) = frame_payload(&line) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Flush a trailing line left unterminated when the body ends.
    pub fn finish(&mut self) -> Option<String> {
        let mut line = std::mem::take(&mut self.buffer);
        if line.ends_with('\r') {
            line.pop();
        }
        frame_payload(&line)
    }
}

/// Strip the framing prefix from one line, or skip it.
fn frame_payload(line: &str) -> Option<String> {
    if line.trim().is_empty() {
        return None;
    }
    match line.get(FRAME_PREFIX_LEN..) {
        Some(payload) => Some(payload.to_string()),
        None => {
            tracing::warn!(line, "skipping line shorter than the framing prefix");
            None
        }
    }
}

/// Reassembles streamed text fragments into the final answer.
///
/// Each decoded record contributes its first candidate's first text part,
/// followed by a single space, in strict arrival order. Undecodable
/// payloads are skipped without aborting the stream; records with no
/// candidates or no parts contribute nothing.
#[derive(Debug, Default)]
pub struct AnswerAccumulator {
    answer: String,
    records: u64,
    skipped: u64,
}

impl AnswerAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one record payload and fold its fragment into the answer.
    pub fn push_payload(&mut self, payload: &str) {
        let record: GenerateResponse = match serde_json::from_str(payload) {
            Ok(record) => record,
            Err(err) => {
                self.skipped += 1;
                let err = Error::decode("undecodable stream record", err);
                tracing::warn!(%err, "skipping record");
                return;
            }
        };
        self.records += 1;

        if let Some(reason) = record
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
        {
            tracing::debug!(reason, "completion reason reported");
        }
        if let Some(usage) = record.usage_metadata {
            tracing::debug!(
                prompt = usage.prompt_token_count,
                candidates = usage.candidates_token_count,
                total = usage.total_token_count,
                "token usage reported"
            );
        }

        if let Some(text) = record.first_text() {
            self.answer.push_str(text);
            self.answer.push(' ');
        }
    }

    /// Records decoded so far.
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Undecodable payloads skipped so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// The assembled answer, finalized.
    pub fn into_answer(self) -> String {
        self.answer
    }
}

/// Consume a streamed response body into the assembled answer.
///
/// Reads the body chunk by chunk, bounding each read by `read_timeout`.
/// Parsing ends when the body is exhausted; there is no done sentinel.
pub async fn collect_answer(
    response: reqwest::Response,
    read_timeout: Duration,
) -> Result<String, Error> {
    let mut byte_stream = response.bytes_stream();
    let mut parser = FrameParser::new();
    let mut accumulator = AnswerAccumulator::new();
    let mut utf8_remainder: Vec<u8> = Vec::new();

    loop {
        let next = match tokio::time::timeout(read_timeout, byte_stream.next()).await {
            Ok(Some(result)) => result,
            Ok(None) => break,
            Err(_elapsed) => {
                return Err(Error::timeout(format!(
                    "stream read timed out after {read_timeout:?}"
                )));
            }
        };
        let chunk = next.map_err(|e| Error::stream(format!("stream read error: {e}"), e))?;

        // Buffer partial UTF-8 sequences across chunks instead of dropping them.
        let full_chunk = if utf8_remainder.is_empty() {
            chunk.to_vec()
        } else {
            let mut combined = std::mem::take(&mut utf8_remainder);
            combined.extend_from_slice(&chunk);
            combined
        };
        let chunk = match std::str::from_utf8(&full_chunk) {
            Ok(text) => text,
            Err(err) => {
                let valid_up_to = err.valid_up_to();
                utf8_remainder = full_chunk[valid_up_to..].to_vec();
                std::str::from_utf8(&full_chunk[..valid_up_to]).unwrap_or("")
            }
        };
        for payload in parser.feed(chunk) {
            accumulator.push_payload(&payload);
        }
    }
    if let Some(payload) = parser.finish() {
        accumulator.push_payload(&payload);
    }

    tracing::debug!(
        records = accumulator.records(),
        skipped = accumulator.skipped(),
        "stream consumed"
    );
    Ok(accumulator.into_answer())
}
