//! SOAP messages and faults.

use std::borrow::Cow;
use std::fmt;

use quick_xml::escape::{escape, unescape};
use quick_xml::events::Event;
use quick_xml::Reader;

/// SOAP 1.1 envelope namespace.
pub const ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// A fully materialized SOAP message.
///
/// The envelope text is the message: nothing is streamed, and rendering a
/// message (`Display`) always yields the same text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    action: Option<String>,
    envelope: String,
    fault: bool,
}

impl Message {
    pub fn new(envelope: impl Into<String>) -> Self {
        Self { action: None, envelope: envelope.into(), fault: false }
    }

    /// Wraps `body` (the contents of `<s:Body>`) in a SOAP 1.1 envelope.
    pub fn from_body(body: &str) -> Self {
        Self::new(format!(
            r#"<s:Envelope xmlns:s="{ENVELOPE_NS}"><s:Body>{body}</s:Body></s:Envelope>"#
        ))
    }

    /// Sets the action, as carried by the `SOAPAction` header. Surrounding
    /// quotes are removed; an empty action is treated as none.
    pub fn with_action(mut self, action: Option<&str>) -> Self {
        self.action = action
            .map(|a| a.trim().trim_matches('"'))
            .filter(|a| !a.is_empty())
            .map(str::to_owned);
        self
    }

    pub fn action(&self) -> Option<&str> { self.action.as_deref() }
    pub fn envelope(&self) -> &str { &self.envelope }
    pub fn is_fault(&self) -> bool { self.fault }

    pub fn into_envelope(self) -> String {
        self.envelope
    }

    /// Text of the first element whose local name is `name`, whatever its
    /// prefix or attributes, with entities decoded.
    ///
    /// Returns `None` when there is no such element or the envelope is
    /// malformed before it closes.
    pub fn element_text(&self, name: &str) -> Option<String> {
        let mut reader = Reader::from_str(&self.envelope);
        let mut opened = None;
        let mut depth = 0usize;
        loop {
            let before = reader.buffer_position();
            match reader.read_event().ok()? {
                Event::Start(e) if opened.is_none() && e.local_name().as_ref() == name.as_bytes() => {
                    opened = Some(reader.buffer_position());
                }
                Event::Empty(e) if opened.is_none() && e.local_name().as_ref() == name.as_bytes() => {
                    return Some(String::new());
                }
                Event::Start(_) if opened.is_some() => depth += 1,
                Event::End(_) if opened.is_some() => {
                    if depth == 0 {
                        let start = opened? as usize;
                        let raw = self.envelope.get(start..before as usize)?;
                        return unescape(raw).ok().map(Cow::into_owned);
                    }
                    depth -= 1;
                }
                Event::Eof => return None,
                _ => {}
            }
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.envelope)
    }
}

/// Who is to blame for a fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultCode {
    Client,
    Server,
}

impl FaultCode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Client => "s:Client",
            Self::Server => "s:Server",
        }
    }
}

/// A SOAP fault raised by an operation or by the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fault {
    pub code: FaultCode,
    pub reason: String,
}

impl Fault {
    pub fn client(reason: impl Into<String>) -> Self {
        Self { code: FaultCode::Client, reason: reason.into() }
    }

    pub fn server(reason: impl Into<String>) -> Self {
        Self { code: FaultCode::Server, reason: reason.into() }
    }

    /// Renders the fault as a reply message.
    pub fn to_message(&self) -> Message {
        let body = format!(
            r#"<s:Fault><faultcode>{}</faultcode><faultstring xml:lang="en-US">{}</faultstring></s:Fault>"#,
            self.code.as_str(),
            escape(&self.reason),
        );
        let mut message = Message::from_body(&body);
        message.fault = true;
        message
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.reason)
    }
}

impl std::error::Error for Fault {}
