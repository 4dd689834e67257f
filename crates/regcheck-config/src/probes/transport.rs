// crates/regcheck-config/src/probes/transport.rs
// ============================================================================
// Module: Probe Transport
// Description: Blocking TCP and rustls streams for line and BER protocols.
// Purpose: Give the directory and mail probes one bounded socket type.
// Dependencies: rustls, rustls-pki-types, webpki-roots
// ============================================================================

//! ## Overview
//! Sockets carry both the connect deadline and read/write deadlines, so a
//! stalled peer surfaces as an I/O error instead of blocking the worker.
//! TLS trusts the bundled web roots plus any CA supplied by the bundle.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Read;
use std::io::Write;
use std::net::TcpStream;
use std::net::ToSocketAddrs;
use std::sync::Arc;

use regcheck_core::ProbeError;
use regcheck_core::ProbeTimeouts;
use rustls::ClientConfig;
use rustls::ClientConnection;
use rustls::RootCertStore;
use rustls::StreamOwned;
use rustls_pki_types::CertificateDer;
use rustls_pki_types::ServerName;
use rustls_pki_types::pem::PemObject;

// ============================================================================
// SECTION: TLS Configuration
// ============================================================================

/// Client TLS configuration trusting web roots and an optional bundle CA.
///
/// # Errors
///
/// Returns [`ProbeError::Transport`] when the CA does not decode.
pub fn tls_config(ca_pem: Option<&[u8]>) -> Result<Arc<ClientConfig>, ProbeError> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    if let Some(pem) = ca_pem {
        for certificate in CertificateDer::pem_slice_iter(pem) {
            let certificate =
                certificate.map_err(|err| ProbeError::Transport(format!("invalid CA certificate: {err}")))?;
            roots
                .add(certificate)
                .map_err(|err| ProbeError::Transport(format!("untrusted CA certificate: {err}")))?;
        }
    }
    let config = ClientConfig::builder_with_provider(Arc::new(rustls::crypto::aws_lc_rs::default_provider()))
        .with_safe_default_protocol_versions()
        .map_err(|err| ProbeError::Transport(format!("tls configuration: {err}")))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(Arc::new(config))
}

// ============================================================================
// SECTION: Stream
// ============================================================================

/// Plain or TLS-wrapped TCP stream.
pub enum ProbeStream {
    /// Cleartext socket.
    Plain(TcpStream),
    /// TLS session over a socket.
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl ProbeStream {
    /// Connects to `host:port` under the connect deadline.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Transport`] when no address accepts the connection.
    pub fn connect(host: &str, port: u16, timeouts: ProbeTimeouts) -> Result<Self, ProbeError> {
        let addrs = (host, port)
            .to_socket_addrs()
            .map_err(|err| ProbeError::Transport(format!("cannot resolve {host}: {err}")))?;
        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeouts.connect) {
                Ok(socket) => {
                    socket.set_read_timeout(Some(timeouts.request)).map_err(transport)?;
                    socket.set_write_timeout(Some(timeouts.request)).map_err(transport)?;
                    return Ok(Self::Plain(socket));
                }
                Err(err) => last_error = Some(err),
            }
        }
        Err(ProbeError::Transport(match last_error {
            Some(err) => format!("cannot connect to {host}:{port}: {err}"),
            None => format!("{host} resolved to no addresses"),
        }))
    }

    /// Wraps a plain stream in TLS; already-secure streams are returned as is.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Transport`] when the name or handshake fails.
    pub fn upgrade(self, host: &str, config: Arc<ClientConfig>) -> Result<Self, ProbeError> {
        let socket = match self {
            Self::Plain(socket) => socket,
            tls @ Self::Tls(_) => return Ok(tls),
        };
        let name = ServerName::try_from(host.to_string())
            .map_err(|err| ProbeError::Transport(format!("invalid tls server name {host}: {err}")))?;
        let connection = ClientConnection::new(config, name)
            .map_err(|err| ProbeError::Transport(format!("tls session: {err}")))?;
        let mut stream = StreamOwned::new(connection, socket);
        while stream.conn.is_handshaking() {
            stream
                .conn
                .complete_io(&mut stream.sock)
                .map_err(|err| ProbeError::Transport(format!("tls handshake with {host}: {err}")))?;
        }
        Ok(Self::Tls(Box::new(stream)))
    }
}

impl Read for ProbeStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(socket) => socket.read(buf),
            Self::Tls(stream) => stream.read(buf),
        }
    }
}

impl Write for ProbeStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(socket) => socket.write(buf),
            Self::Tls(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(socket) => socket.flush(),
            Self::Tls(stream) => stream.flush(),
        }
    }
}

/// Maps an I/O error onto a transport failure.
pub fn transport(err: io::Error) -> ProbeError {
    match err.kind() {
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ProbeError::Transport("socket timed out".to_string()),
        _ => ProbeError::Transport(err.to_string()),
    }
}

/// Runs blocking probe work on the blocking pool.
///
/// # Errors
///
/// Returns the work's error, or [`ProbeError::Unavailable`] if the worker died.
pub async fn run_blocking<T, F>(work: F) -> Result<T, ProbeError>
where
    F: FnOnce() -> Result<T, ProbeError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ProbeError::Unavailable(format!("probe worker failed: {err}")))?
}
