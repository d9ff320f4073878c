//! STOMP 1.2 frames carried over the bus connection.
//!
//! One frame per WebSocket message. A message holding only end-of-line
//! characters is a heart-beat.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use orderfeed_core::error::AppError;
use orderfeed_core::result::AppResult;

/// STOMP commands used by the live feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StompCommand {
    /// Client handshake.
    Connect,
    /// Server handshake reply.
    Connected,
    /// Start receiving from a destination.
    Subscribe,
    /// Stop receiving from a destination.
    Unsubscribe,
    /// Server-delivered message.
    Message,
    /// Server acknowledgement of a receipt request.
    Receipt,
    /// Server-reported failure; the server closes the connection after it.
    Error,
    /// Client goodbye.
    Disconnect,
}

impl StompCommand {
    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Connected => "CONNECTED",
            Self::Subscribe => "SUBSCRIBE",
            Self::Unsubscribe => "UNSUBSCRIBE",
            Self::Message => "MESSAGE",
            Self::Receipt => "RECEIPT",
            Self::Error => "ERROR",
            Self::Disconnect => "DISCONNECT",
        }
    }

    /// Handshake frames carry headers verbatim, without escaping.
    fn escapes_headers(self) -> bool {
        !matches!(self, Self::Connect | Self::Connected)
    }
}

impl fmt::Display for StompCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StompCommand {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CONNECT" | "STOMP" => Ok(Self::Connect),
            "CONNECTED" => Ok(Self::Connected),
            "SUBSCRIBE" => Ok(Self::Subscribe),
            "UNSUBSCRIBE" => Ok(Self::Unsubscribe),
            "MESSAGE" => Ok(Self::Message),
            "RECEIPT" => Ok(Self::Receipt),
            "ERROR" => Ok(Self::Error),
            "DISCONNECT" => Ok(Self::Disconnect),
            other => Err(AppError::malformed_payload(format!(
                "Unknown STOMP command: {other}"
            ))),
        }
    }
}

/// A single STOMP frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StompFrame {
    /// Frame command.
    pub command: StompCommand,
    /// Headers in wire order. Repeated names keep the first value.
    pub headers: Vec<(String, String)>,
    /// Frame body.
    pub body: String,
}

impl StompFrame {
    /// Create a frame without headers or body.
    pub fn new(command: StompCommand) -> Self {
        Self {
            command,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    /// Append a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Value of the first header called `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// CONNECT frame for `host`, asking the server for heart-beats every
    /// `heartbeat_ms` and sending none.
    pub fn connect(host: &str, heartbeat_ms: u64) -> Self {
        Self::new(StompCommand::Connect)
            .with_header("accept-version", "1.2")
            .with_header("host", host)
            .with_header("heart-beat", format!("0,{heartbeat_ms}"))
    }

    /// Heart-beat interval the server agreed to send, given the `wanted_ms`
    /// asked for in CONNECT. `None` when either side opted out.
    pub fn incoming_heartbeat(&self, wanted_ms: u64) -> Option<Duration> {
        let (sx, _) = self.header("heart-beat")?.split_once(',')?;
        let sx: u64 = sx.trim().parse().ok()?;
        if sx == 0 || wanted_ms == 0 {
            return None;
        }
        Some(Duration::from_millis(sx.max(wanted_ms)))
    }

    /// SUBSCRIBE frame.
    pub fn subscribe(id: &str, destination: &str) -> Self {
        Self::new(StompCommand::Subscribe)
            .with_header("id", id)
            .with_header("destination", destination)
            .with_header("ack", "auto")
    }

    /// UNSUBSCRIBE frame.
    pub fn unsubscribe(id: &str) -> Self {
        Self::new(StompCommand::Unsubscribe).with_header("id", id)
    }

    /// DISCONNECT frame.
    pub fn disconnect() -> Self {
        Self::new(StompCommand::Disconnect)
    }

    /// Serialize to wire text, NUL-terminated.
    pub fn encode(&self) -> String {
        let escape = self.command.escapes_headers();
        let mut out = String::with_capacity(32 + self.body.len());
        out.push_str(self.command.as_str());
        out.push('\n');
        for (name, value) in &self.headers {
            if escape {
                out.push_str(&escape_header(name));
                out.push(':');
                out.push_str(&escape_header(value));
            } else {
                out.push_str(name);
                out.push(':');
                out.push_str(value);
            }
            out.push('\n');
        }
        if !self.body.is_empty() {
            out.push_str(&format!("content-length:{}\n", self.body.len()));
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    /// Parse wire text. Heart-beats decode to `None`.
    pub fn decode(text: &str) -> AppResult<Option<Self>> {
        let text = text.trim_start_matches(['\r', '\n']);
        if text.is_empty() {
            return Ok(None);
        }

        let (head, rest) = split_head(text)
            .ok_or_else(|| AppError::malformed_payload("STOMP frame has no header terminator"))?;
        let mut lines = head.lines();
        let command: StompCommand = lines
            .next()
            .map(str::trim_end)
            .unwrap_or_default()
            .parse()?;

        let unescape = command.escapes_headers();
        let mut headers = Vec::new();
        for line in lines {
            let line = line.trim_end_matches('\r');
            let (name, value) = line.split_once(':').ok_or_else(|| {
                AppError::malformed_payload(format!("Malformed STOMP header: {line}"))
            })?;
            if unescape {
                headers.push((unescape_header(name)?, unescape_header(value)?));
            } else {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        let frame = Self {
            command,
            headers,
            body: String::new(),
        };
        let body = match frame.header("content-length") {
            Some(len) => {
                let len: usize = len.trim().parse().map_err(|_| {
                    AppError::malformed_payload(format!("Invalid content-length: {len}"))
                })?;
                rest.get(..len).ok_or_else(|| {
                    AppError::malformed_payload("STOMP body shorter than content-length")
                })?
            }
            None => rest.split('\0').next().unwrap_or_default(),
        };

        Ok(Some(Self {
            body: body.to_string(),
            ..frame
        }))
    }
}

/// Split at the blank line ending the headers.
fn split_head(text: &str) -> Option<(&str, &str)> {
    if let Some(i) = text.find("\r\n\r\n") {
        return Some((&text[..i], &text[i + 4..]));
    }
    text.find("\n\n").map(|i| (&text[..i], &text[i + 2..]))
}

fn escape_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ':' => out.push_str("\\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape_header(raw: &str) -> AppResult<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('c') => out.push(':'),
            other => {
                return Err(AppError::malformed_payload(format!(
                    "Invalid STOMP header escape: \\{}",
                    other.map(String::from).unwrap_or_default()
                )));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderfeed_core::error::ErrorKind;

    #[test]
    fn test_connect_encoding() {
        let text = StompFrame::connect("localhost", 10000).encode();
        assert_eq!(
            text,
            "CONNECT\naccept-version:1.2\nhost:localhost\nheart-beat:0,10000\n\n\0"
        );
    }

    #[test]
    fn test_incoming_heartbeat_negotiation() {
        let connected = |value: &str| {
            StompFrame::new(StompCommand::Connected).with_header("heart-beat", value)
        };

        assert_eq!(
            connected("10000,0").incoming_heartbeat(5000),
            Some(Duration::from_millis(10000))
        );
        assert_eq!(
            connected("2000,0").incoming_heartbeat(5000),
            Some(Duration::from_millis(5000))
        );
        assert_eq!(connected("0,0").incoming_heartbeat(5000), None);
        assert_eq!(connected("10000,0").incoming_heartbeat(0), None);
        assert_eq!(connected("garbage").incoming_heartbeat(5000), None);
        assert_eq!(
            StompFrame::new(StompCommand::Connected).incoming_heartbeat(5000),
            None
        );
    }

    #[test]
    fn test_decode_message_with_content_length() {
        let body = r#"{"orderId":1}"#;
        let text = format!(
            "MESSAGE\ndestination:/topic/orders/restaurant/7\nsubscription:sub-0\nmessage-id:1\ncontent-length:{}\n\n{body}\0\n",
            body.len()
        );

        let frame = StompFrame::decode(&text).unwrap().unwrap();

        assert_eq!(frame.command, StompCommand::Message);
        assert_eq!(frame.header("destination"), Some("/topic/orders/restaurant/7"));
        assert_eq!(frame.body, body);
    }

    #[test]
    fn test_decode_body_without_content_length_stops_at_nul() {
        let frame = StompFrame::decode("MESSAGE\ndestination:/x\n\nhello\0").unwrap().unwrap();
        assert_eq!(frame.body, "hello");
    }

    #[test]
    fn test_heartbeat_decodes_to_none() {
        assert_eq!(StompFrame::decode("\n").unwrap(), None);
        assert_eq!(StompFrame::decode("\r\n").unwrap(), None);
    }

    #[test]
    fn test_header_escaping_round_trip() {
        let frame = StompFrame::new(StompCommand::Subscribe)
            .with_header("destination", "a:b\\c\nd")
            .with_header("id", "sub-0");
        let text = frame.encode();
        assert!(text.contains("destination:a\\cb\\\\c\\nd\n"));

        let decoded = StompFrame::decode(&text).unwrap().unwrap();
        assert_eq!(decoded.header("destination"), Some("a:b\\c\nd"));
    }

    #[test]
    fn test_repeated_header_keeps_first() {
        let frame = StompFrame::decode("MESSAGE\nfoo:first\nfoo:second\n\n\0").unwrap().unwrap();
        assert_eq!(frame.header("foo"), Some("first"));
    }

    #[test]
    fn test_connected_headers_are_not_unescaped() {
        let frame = StompFrame::decode("CONNECTED\nversion:1.2\nserver:x\\y\n\n\0").unwrap().unwrap();
        assert_eq!(frame.header("server"), Some("x\\y"));
    }

    #[test]
    fn test_malformed_frames() {
        assert_eq!(
            StompFrame::decode("BOGUS\n\n\0").unwrap_err().kind,
            ErrorKind::MalformedPayload
        );
        assert_eq!(
            StompFrame::decode("MESSAGE\nno-colon\n\n\0").unwrap_err().kind,
            ErrorKind::MalformedPayload
        );
        assert_eq!(
            StompFrame::decode("MESSAGE\nfoo:bar").unwrap_err().kind,
            ErrorKind::MalformedPayload
        );
    }
}
