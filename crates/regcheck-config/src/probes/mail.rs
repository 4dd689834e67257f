// crates/regcheck-config/src/probes/mail.rs
// ============================================================================
// Module: Mail Probe
// Description: SMTP greeting, EHLO, STARTTLS and AUTH PLAIN.
// Purpose: Prove the relay accepts connections and the configured login.
// Dependencies: base64, regcheck-core
// ============================================================================

//! Blocking SMTP dialogue run on a blocking thread: greeting, `EHLO`, then
//! `STARTTLS` and `AUTH PLAIN` when configured. Replies are parsed until the
//! final line of a multi-line response.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::io::Write;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use regcheck_core::MailProbe;
use regcheck_core::MailRequest;
use regcheck_core::ProbeError;
use regcheck_core::ProbeTimeouts;

use crate::probes::transport::ProbeStream;
use crate::probes::transport::run_blocking;
use crate::probes::transport::tls_config;
use crate::probes::transport::transport;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Name announced in EHLO.
const CLIENT_NAME: &str = "regcheck.local";
/// Largest reply accepted.
const MAX_REPLY_BYTES: usize = 64 * 1024;

// ============================================================================
// SECTION: Probe
// ============================================================================

/// SMTP relay probe.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveMail {
    /// Connect and socket deadlines.
    timeouts: ProbeTimeouts,
}

impl LiveMail {
    /// Creates a probe with the given deadlines.
    #[must_use]
    pub const fn new(timeouts: ProbeTimeouts) -> Self {
        Self {
            timeouts,
        }
    }
}

#[async_trait]
impl MailProbe for LiveMail {
    async fn handshake(&self, request: &MailRequest) -> Result<(), ProbeError> {
        let request = request.clone();
        let timeouts = self.timeouts;
        run_blocking(move || handshake(&request, timeouts)).await
    }
}

/// Runs the SMTP dialogue, ending with QUIT.
fn handshake(request: &MailRequest, timeouts: ProbeTimeouts) -> Result<(), ProbeError> {
    let mut stream = ProbeStream::connect(&request.host, request.port, timeouts)?;
    expect(&mut stream, 220, "greeting")?;
    let capabilities = command(&mut stream, &format!("EHLO {CLIENT_NAME}"), 250, "EHLO")?;
    if request.starttls {
        if !capabilities.to_ascii_uppercase().contains("STARTTLS") {
            return Err(ProbeError::Rejected("mail server does not offer STARTTLS".to_string()));
        }
        command(&mut stream, "STARTTLS", 220, "STARTTLS")?;
        stream = stream.upgrade(&request.host, tls_config(None)?)?;
        command(&mut stream, &format!("EHLO {CLIENT_NAME}"), 250, "EHLO")?;
    }
    if let Some((username, password)) = &request.credentials {
        let token = STANDARD.encode(format!("\0{username}\0{password}"));
        let (code, text) = send(&mut stream, &format!("AUTH PLAIN {token}"))?;
        match code {
            235 => {}
            535 => return Err(ProbeError::Rejected(format!("mail server rejected the credentials: {text}"))),
            _ => return Err(ProbeError::Rejected(format!("AUTH answered {code}: {text}"))),
        }
    }
    let _ = send(&mut stream, "QUIT");
    Ok(())
}

// ============================================================================
// SECTION: Dialogue
// ============================================================================

/// Sends a command and requires the given reply code.
fn command<S: Read + Write>(stream: &mut S, line: &str, code: u16, step: &str) -> Result<String, ProbeError> {
    stream.write_all(format!("{line}\r\n").as_bytes()).map_err(transport)?;
    stream.flush().map_err(transport)?;
    expect(stream, code, step)
}

/// Sends a command and returns whatever reply arrives.
fn send<S: Read + Write>(stream: &mut S, line: &str) -> Result<(u16, String), ProbeError> {
    stream.write_all(format!("{line}\r\n").as_bytes()).map_err(transport)?;
    stream.flush().map_err(transport)?;
    read_reply(stream)
}

/// Reads a reply and requires the given code.
fn expect<S: Read>(stream: &mut S, code: u16, step: &str) -> Result<String, ProbeError> {
    let (received, text) = read_reply(stream)?;
    if received == code {
        Ok(text)
    } else {
        Err(ProbeError::Rejected(format!("{step} answered {received}: {text}")))
    }
}

/// Reads until a complete, possibly multi-line, reply is buffered.
fn read_reply<S: Read>(stream: &mut S) -> Result<(u16, String), ProbeError> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 512];
    loop {
        let read = stream.read(&mut chunk).map_err(transport)?;
        if read == 0 {
            return Err(ProbeError::Transport("mail server closed the connection".to_string()));
        }
        buffer.extend_from_slice(&chunk[..read]);
        if buffer.len() > MAX_REPLY_BYTES {
            return Err(ProbeError::Transport("mail server reply exceeds size limit".to_string()));
        }
        if let Some(reply) = parse_reply(&String::from_utf8_lossy(&buffer)) {
            return Ok(reply);
        }
    }
}

/// Parses a complete reply: the last line carries `NNN ` or is bare `NNN`.
///
/// Returns `None` while the reply is still incomplete.
#[must_use]
pub fn parse_reply(text: &str) -> Option<(u16, String)> {
    if !text.ends_with('\n') {
        return None;
    }
    let last = text.lines().rev().find(|line| !line.is_empty())?;
    let code = last.get(..3)?.parse::<u16>().ok()?;
    match last.as_bytes().get(3) {
        None | Some(b' ') => {}
        Some(_) => return None,
    }
    let message = text
        .lines()
        .filter_map(|line| line.get(4..))
        .map(str::trim)
        .collect::<Vec<_>>()
        .join(" ");
    Some((code, message))
}
