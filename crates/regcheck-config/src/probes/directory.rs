// crates/regcheck-config/src/probes/directory.rs
// ============================================================================
// Module: Directory Probe
// Description: Minimal LDAPv3 client: simple bind, one subtree search, unbind.
// Purpose: Prove the admin DN can bind and the user search finds entries.
// Dependencies: regcheck-core, url
// ============================================================================

//! ## Overview
//! Only the three operations the probe needs are encoded, using BER definite
//! lengths. Search filters are parsed from their RFC 4515 string form. The
//! search asks for no attributes (`1.1`) and a size limit of one entry, so a
//! `sizeLimitExceeded` result still proves users exist.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::io::Write;

use async_trait::async_trait;
use regcheck_core::DirectoryProbe;
use regcheck_core::DirectoryRequest;
use regcheck_core::ProbeError;
use regcheck_core::ProbeTimeouts;
use url::Url;

use crate::probes::transport::ProbeStream;
use crate::probes::transport::run_blocking;
use crate::probes::transport::tls_config;
use crate::probes::transport::transport;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Largest response message accepted.
const MAX_MESSAGE_BYTES: usize = 1024 * 1024;
/// `success` result code.
const RESULT_SUCCESS: u8 = 0;
/// `sizeLimitExceeded` result code.
const RESULT_SIZE_LIMIT_EXCEEDED: u8 = 4;
/// `invalidCredentials` result code.
const RESULT_INVALID_CREDENTIALS: u8 = 49;

/// Universal and application tags used by the probe.
mod tag {
    /// BOOLEAN.
    pub const BOOLEAN: u8 = 0x01;
    /// INTEGER.
    pub const INTEGER: u8 = 0x02;
    /// OCTET STRING.
    pub const OCTET_STRING: u8 = 0x04;
    /// ENUMERATED.
    pub const ENUMERATED: u8 = 0x0a;
    /// SEQUENCE.
    pub const SEQUENCE: u8 = 0x30;
    /// BindRequest.
    pub const BIND_REQUEST: u8 = 0x60;
    /// BindResponse.
    pub const BIND_RESPONSE: u8 = 0x61;
    /// UnbindRequest.
    pub const UNBIND_REQUEST: u8 = 0x42;
    /// SearchRequest.
    pub const SEARCH_REQUEST: u8 = 0x63;
    /// SearchResultEntry.
    pub const SEARCH_ENTRY: u8 = 0x64;
    /// SearchResultDone.
    pub const SEARCH_DONE: u8 = 0x65;
    /// Simple authentication choice.
    pub const AUTH_SIMPLE: u8 = 0x80;
}

// ============================================================================
// SECTION: Probe
// ============================================================================

/// Directory probe speaking LDAPv3 over TCP or TLS.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveDirectory {
    /// Connect and socket deadlines.
    timeouts: ProbeTimeouts,
}

impl LiveDirectory {
    /// Creates a probe with the given deadlines.
    #[must_use]
    pub const fn new(timeouts: ProbeTimeouts) -> Self {
        Self {
            timeouts,
        }
    }
}

#[async_trait]
impl DirectoryProbe for LiveDirectory {
    async fn bind_and_search(&self, request: &DirectoryRequest) -> Result<usize, ProbeError> {
        let request = request.clone();
        let timeouts = self.timeouts;
        run_blocking(move || bind_and_search(&request, timeouts)).await
    }
}

/// Connects, binds, searches and unbinds.
fn bind_and_search(request: &DirectoryRequest, timeouts: ProbeTimeouts) -> Result<usize, ProbeError> {
    let uri = Url::parse(&request.uri).map_err(|err| ProbeError::Transport(format!("invalid LDAP_URI: {err}")))?;
    let secure = match uri.scheme() {
        "ldaps" => true,
        "ldap" => false,
        other => return Err(ProbeError::Transport(format!("unsupported LDAP scheme {other}"))),
    };
    let host = uri.host_str().ok_or_else(|| ProbeError::Transport("LDAP_URI has no host".to_string()))?;
    let port = uri.port().unwrap_or(if secure { 636 } else { 389 });
    let mut stream = ProbeStream::connect(host, port, timeouts)?;
    if secure {
        stream = stream.upgrade(host, tls_config(request.ca_pem.as_deref())?)?;
    }

    stream.write_all(&bind_request(1, &request.bind_dn, &request.password)).map_err(transport)?;
    let (op, body) = read_operation(&mut stream)?;
    if op != tag::BIND_RESPONSE {
        return Err(ProbeError::Transport(format!("unexpected LDAP response tag {op:#04x} to bind")));
    }
    match result_code(&body)? {
        (RESULT_SUCCESS, _) => {}
        (RESULT_INVALID_CREDENTIALS, _) => {
            return Err(ProbeError::Rejected("invalid credentials for LDAP_ADMIN_DN".to_string()));
        }
        (code, message) => return Err(ProbeError::Rejected(format!("bind failed with result {code}: {message}"))),
    }

    let filter = encode_filter(&request.filter)?;
    stream.write_all(&search_request(2, &request.base_dn, &filter)).map_err(transport)?;
    let mut entries = 0;
    loop {
        let (op, body) = read_operation(&mut stream)?;
        match op {
            tag::SEARCH_ENTRY => entries += 1,
            tag::SEARCH_DONE => match result_code(&body)? {
                (RESULT_SUCCESS | RESULT_SIZE_LIMIT_EXCEEDED, _) => break,
                (code, message) => {
                    return Err(ProbeError::Rejected(format!("search failed with result {code}: {message}")));
                }
            },
            _ => {}
        }
    }
    let _ = stream.write_all(&unbind_request(3));
    Ok(entries)
}

// ============================================================================
// SECTION: Encoding
// ============================================================================

/// Encodes one TLV with a definite length.
fn tlv(kind: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![kind];
    let len = content.len();
    if len < 0x80 {
        out.push(u8::try_from(len).unwrap_or(0));
    } else {
        let bytes = len.to_be_bytes();
        let skip = bytes.iter().take_while(|byte| **byte == 0).count();
        let significant = &bytes[skip..];
        out.push(0x80 | u8::try_from(significant.len()).unwrap_or(0));
        out.extend_from_slice(significant);
    }
    out.extend_from_slice(content);
    out
}

/// Encodes a small non-negative INTEGER or ENUMERATED.
fn small_int(kind: u8, value: u32) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut skip = bytes.iter().take_while(|byte| **byte == 0).count().min(3);
    if bytes[skip] & 0x80 != 0 && skip > 0 {
        skip -= 1;
    }
    tlv(kind, &bytes[skip..])
}

/// Wraps a protocol operation into an LDAPMessage.
fn message(id: u32, operation: &[u8]) -> Vec<u8> {
    let mut content = small_int(tag::INTEGER, id);
    content.extend_from_slice(operation);
    tlv(tag::SEQUENCE, &content)
}

/// Simple bind request, LDAPv3.
pub fn bind_request(id: u32, dn: &str, password: &str) -> Vec<u8> {
    let mut content = small_int(tag::INTEGER, 3);
    content.extend(tlv(tag::OCTET_STRING, dn.as_bytes()));
    content.extend(tlv(tag::AUTH_SIMPLE, password.as_bytes()));
    message(id, &tlv(tag::BIND_REQUEST, &content))
}

/// Subtree search returning no attributes, at most one entry.
pub fn search_request(id: u32, base_dn: &str, filter: &[u8]) -> Vec<u8> {
    let mut content = tlv(tag::OCTET_STRING, base_dn.as_bytes());
    content.extend(small_int(tag::ENUMERATED, 2));
    content.extend(small_int(tag::ENUMERATED, 0));
    content.extend(small_int(tag::INTEGER, 1));
    content.extend(small_int(tag::INTEGER, 10));
    content.extend(tlv(tag::BOOLEAN, &[0x00]));
    content.extend_from_slice(filter);
    content.extend(tlv(tag::SEQUENCE, &tlv(tag::OCTET_STRING, b"1.1")));
    message(id, &tlv(tag::SEARCH_REQUEST, &content))
}

/// Unbind request.
fn unbind_request(id: u32) -> Vec<u8> {
    message(id, &tlv(tag::UNBIND_REQUEST, &[]))
}

// ============================================================================
// SECTION: Filters
// ============================================================================

/// Encodes an RFC 4515 filter string.
///
/// # Errors
///
/// Returns [`ProbeError::Transport`] when the filter is malformed.
pub fn encode_filter(filter: &str) -> Result<Vec<u8>, ProbeError> {
    let mut parser = FilterParser {
        input: filter.trim().as_bytes(),
        pos: 0,
    };
    let encoded = parser.filter()?;
    if parser.pos != parser.input.len() {
        return Err(malformed_filter(filter));
    }
    Ok(encoded)
}

/// Error for an unparseable filter.
fn malformed_filter(filter: &str) -> ProbeError {
    ProbeError::Transport(format!("malformed LDAP filter {filter}"))
}

/// Recursive-descent parser over filter bytes.
struct FilterParser<'a> {
    /// Filter text.
    input: &'a [u8],
    /// Cursor.
    pos: usize,
}

impl FilterParser<'_> {
    /// Error at the current position.
    fn error(&self) -> ProbeError {
        malformed_filter(&String::from_utf8_lossy(self.input))
    }

    /// Consumes one expected byte.
    fn expect(&mut self, byte: u8) -> Result<(), ProbeError> {
        if self.input.get(self.pos) == Some(&byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error())
        }
    }

    /// `filter = "(" filtercomp ")"`.
    fn filter(&mut self) -> Result<Vec<u8>, ProbeError> {
        self.expect(b'(')?;
        let encoded = match self.input.get(self.pos) {
            Some(b'&') => {
                self.pos += 1;
                tlv(0xa0, &self.filter_list()?)
            }
            Some(b'|') => {
                self.pos += 1;
                tlv(0xa1, &self.filter_list()?)
            }
            Some(b'!') => {
                self.pos += 1;
                tlv(0xa2, &self.filter()?)
            }
            Some(_) => self.item()?,
            None => return Err(self.error()),
        };
        self.expect(b')')?;
        Ok(encoded)
    }

    /// One or more nested filters.
    fn filter_list(&mut self) -> Result<Vec<u8>, ProbeError> {
        let mut out = Vec::new();
        while self.input.get(self.pos) == Some(&b'(') {
            out.extend(self.filter()?);
        }
        if out.is_empty() {
            return Err(self.error());
        }
        Ok(out)
    }

    /// Simple, present or substring item.
    fn item(&mut self) -> Result<Vec<u8>, ProbeError> {
        let start = self.pos;
        while let Some(byte) = self.input.get(self.pos) {
            if matches!(byte, b'=' | b'~' | b'>' | b'<' | b'(' | b')') {
                break;
            }
            self.pos += 1;
        }
        let attribute = self.input[start..self.pos].to_vec();
        if attribute.is_empty() {
            return Err(self.error());
        }
        let choice = match (self.input.get(self.pos), self.input.get(self.pos + 1)) {
            (Some(b'='), _) => {
                self.pos += 1;
                None
            }
            (Some(b'~'), Some(b'=')) => {
                self.pos += 2;
                Some(0xa8)
            }
            (Some(b'>'), Some(b'=')) => {
                self.pos += 2;
                Some(0xa5)
            }
            (Some(b'<'), Some(b'=')) => {
                self.pos += 2;
                Some(0xa6)
            }
            _ => return Err(self.error()),
        };
        let start = self.pos;
        while let Some(byte) = self.input.get(self.pos) {
            if *byte == b')' {
                break;
            }
            self.pos += 1;
        }
        let raw_value = &self.input[start..self.pos];
        if let Some(choice) = choice {
            let mut content = tlv(tag::OCTET_STRING, &attribute);
            content.extend(tlv(tag::OCTET_STRING, &unescape(raw_value)));
            return Ok(tlv(choice, &content));
        }
        if raw_value == b"*" {
            return Ok(tlv(0x87, &attribute));
        }
        if raw_value.contains(&b'*') {
            return Ok(substrings(&attribute, raw_value));
        }
        let mut content = tlv(tag::OCTET_STRING, &attribute);
        content.extend(tlv(tag::OCTET_STRING, &unescape(raw_value)));
        Ok(tlv(0xa3, &content))
    }
}

/// Encodes `attr=ini*any*fin`.
fn substrings(attribute: &[u8], value: &[u8]) -> Vec<u8> {
    let parts: Vec<&[u8]> = value.split(|byte| *byte == b'*').collect();
    let last = parts.len().saturating_sub(1);
    let mut items = Vec::new();
    for (index, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        let choice = if index == 0 {
            0x80
        } else if index == last {
            0x82
        } else {
            0x81
        };
        items.extend(tlv(choice, &unescape(part)));
    }
    let mut content = tlv(tag::OCTET_STRING, attribute);
    content.extend(tlv(tag::SEQUENCE, &items));
    tlv(0xa4, &content)
}

/// Decodes `\XX` hex escapes; other bytes pass through.
fn unescape(value: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.len());
    let mut index = 0;
    while index < value.len() {
        if value[index] == b'\\'
            && let Some(hex) = value.get(index + 1..index + 3)
            && let Ok(text) = std::str::from_utf8(hex)
            && let Ok(byte) = u8::from_str_radix(text, 16)
        {
            out.push(byte);
            index += 3;
            continue;
        }
        out.push(value[index]);
        index += 1;
    }
    out
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Splits one TLV off the front of `input`.
fn split_tlv(input: &[u8]) -> Result<(u8, &[u8], &[u8]), ProbeError> {
    let malformed = || ProbeError::Transport("malformed LDAP response".to_string());
    let (&kind, rest) = input.split_first().ok_or_else(malformed)?;
    let (&first, rest) = rest.split_first().ok_or_else(malformed)?;
    let (len, rest) = if first & 0x80 == 0 {
        (usize::from(first), rest)
    } else {
        let count = usize::from(first & 0x7f);
        if count == 0 || count > 4 || rest.len() < count {
            return Err(malformed());
        }
        let len = rest[..count].iter().fold(0usize, |acc, byte| (acc << 8) | usize::from(*byte));
        (len, &rest[count..])
    };
    if rest.len() < len {
        return Err(malformed());
    }
    Ok((kind, &rest[..len], &rest[len..]))
}

/// Reads one LDAPMessage and returns its operation tag and body.
fn read_operation<S: Read>(stream: &mut S) -> Result<(u8, Vec<u8>), ProbeError> {
    let mut header = [0u8; 2];
    stream.read_exact(&mut header).map_err(transport)?;
    let len = if header[1] & 0x80 == 0 {
        usize::from(header[1])
    } else {
        let count = usize::from(header[1] & 0x7f);
        if count == 0 || count > 4 {
            return Err(ProbeError::Transport("unsupported LDAP length encoding".to_string()));
        }
        let mut bytes = vec![0u8; count];
        stream.read_exact(&mut bytes).map_err(transport)?;
        bytes.iter().fold(0usize, |acc, byte| (acc << 8) | usize::from(*byte))
    };
    if len > MAX_MESSAGE_BYTES {
        return Err(ProbeError::Transport("LDAP response exceeds size limit".to_string()));
    }
    let mut content = vec![0u8; len];
    stream.read_exact(&mut content).map_err(transport)?;
    parse_message(header[0], &content)
}

/// Extracts the operation from an LDAPMessage body.
fn parse_message(outer: u8, content: &[u8]) -> Result<(u8, Vec<u8>), ProbeError> {
    if outer != tag::SEQUENCE {
        return Err(ProbeError::Transport("LDAP response is not a message".to_string()));
    }
    let (_, _id, rest) = split_tlv(content)?;
    let (op, body, _) = split_tlv(rest)?;
    Ok((op, body.to_vec()))
}

/// Reads `resultCode` and `diagnosticMessage` from an LDAPResult body.
pub fn result_code(body: &[u8]) -> Result<(u8, String), ProbeError> {
    let (kind, code, rest) = split_tlv(body)?;
    if kind != tag::ENUMERATED || code.is_empty() {
        return Err(ProbeError::Transport("LDAP result has no result code".to_string()));
    }
    let code = code[code.len() - 1];
    let message = split_tlv(rest)
        .and_then(|(_, _, rest)| split_tlv(rest))
        .map(|(_, message, _)| String::from_utf8_lossy(message).into_owned())
        .unwrap_or_default();
    Ok((code, message))
}
