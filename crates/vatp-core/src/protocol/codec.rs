//! Text codec for encoding and decoding VATP/1.0 messages.
//!
//! Wire format:
//! ```text
//! VATP/1.0 <METHOD> <seq>\r\n
//! <Name>: <Value>\r\n
//! ...
//! \r\n
//! ```
//!
//! The protocol is framed by the blank-line sentinel, not by length
//! prefixing, so decoding is a stateful line accumulator rather than a
//! fixed-size reader. Decoding is deliberately tolerant: lines without a
//! colon are kept as raw text but ignored as headers, an unparseable start
//! line is treated like any other line, and a block truncated by
//! end-of-stream still yields whatever was collected. There is no decode
//! error type.

use crate::protocol::messages::{Method, VatpMessage, PROTOCOL_VERSION};

// ── Encoding ──────────────────────────────────────────────────────────────────

/// Renders an outgoing message in wire format, including the terminating
/// blank line. Pure function; well-formed input cannot fail.
pub fn encode(message: &VatpMessage) -> String {
    let mut out = format!(
        "{} {} {}\r\n",
        PROTOCOL_VERSION,
        message.method.wire_name(),
        message.sequence
    );
    for (name, value) in message.headers() {
        out.push_str(name);
        out.push_str(": ");
        out.push_str(value);
        out.push_str("\r\n");
    }
    out.push_str("\r\n");
    out
}

// ── Decoding ──────────────────────────────────────────────────────────────────

/// Accumulates lines until a blank line completes a block.
///
/// Feed stripped lines (no `\r\n`) through [`BlockDecoder::push_line`]; when
/// the line source is exhausted, [`BlockDecoder::flush`] recovers a partially
/// received block, if any.
#[derive(Debug, Default)]
pub struct BlockDecoder {
    lines: Vec<String>,
}

impl BlockDecoder {
    pub fn new() -> BlockDecoder {
        BlockDecoder::default()
    }

    /// Consumes one line. Returns the completed message when `line` is the
    /// blank terminator of a non-empty block; a stray blank line between
    /// blocks is skipped.
    pub fn push_line(&mut self, line: &str) -> Option<VatpMessage> {
        if line.trim().is_empty() {
            if self.lines.is_empty() {
                return None;
            }
            return Some(parse_block(std::mem::take(&mut self.lines)));
        }
        self.lines.push(line.to_string());
        None
    }

    /// Yields the partially accumulated block at end-of-stream, or `None`
    /// when the source ended cleanly on a block boundary.
    pub fn flush(&mut self) -> Option<VatpMessage> {
        if self.lines.is_empty() {
            return None;
        }
        Some(parse_block(std::mem::take(&mut self.lines)))
    }
}

/// Decodes one block from an in-memory line source.
///
/// Returns `None` when the source is exhausted before any content
/// (end-of-stream); a source that ends after partial content yields the
/// headers collected so far.
pub fn decode_block<'a, I>(lines: I) -> Option<VatpMessage>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut decoder = BlockDecoder::new();
    for line in lines {
        if let Some(message) = decoder.push_line(line) {
            return Some(message);
        }
    }
    decoder.flush()
}

fn parse_block(raw: Vec<String>) -> VatpMessage {
    let mut method = Method::Other(String::new());
    let mut sequence = 0;
    let mut headers = Vec::new();

    for (index, line) in raw.iter().enumerate() {
        if index == 0 {
            if let Some((parsed_method, parsed_seq)) = parse_start_line(line) {
                method = parsed_method;
                sequence = parsed_seq;
                continue;
            }
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
        // No colon: tolerated, retained only in the raw block text.
    }

    VatpMessage::decoded(method, sequence, headers, raw)
}

/// Parses `VATP/... <METHOD> <seq>`. A missing or non-numeric sequence token
/// decodes as 0.
fn parse_start_line(line: &str) -> Option<(Method, u32)> {
    let mut tokens = line.split_whitespace();
    let version = tokens.next()?;
    if !version.starts_with("VATP/") {
        return None;
    }
    let method = Method::from_wire(tokens.next()?);
    let sequence = tokens.next().and_then(|t| t.parse().ok()).unwrap_or(0);
    Some((method, sequence))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
