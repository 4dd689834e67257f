// crates/regcheck-config/tests/probes.rs
// ============================================================================
// Module: Live Probe Tests
// Description: Wire encodings and local fake servers for each live probe.
// Purpose: Prove probes speak their protocols without real dependencies.
// ============================================================================

//! Live probe tests.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::io::Write;
use std::net::TcpListener;
use std::net::TcpStream;
use std::sync::mpsc;
use std::thread;

use regcheck_config::probes::LiveDatabase;
use regcheck_config::probes::LiveDirectory;
use regcheck_config::probes::LiveHttp;
use regcheck_config::probes::LiveIdentityProvider;
use regcheck_config::probes::LiveMail;
use regcheck_config::probes::cache::connection_url;
use regcheck_config::probes::database::sqlite_path;
use regcheck_config::probes::directory;
use regcheck_config::probes::http::discovery_url;
use regcheck_config::probes::mail::parse_reply;
use regcheck_core::CacheRequest;
use regcheck_core::DatabaseEngine;
use regcheck_core::DatabaseProbe;
use regcheck_core::DatabaseRequest;
use regcheck_core::DirectoryProbe;
use regcheck_core::DirectoryRequest;
use regcheck_core::HttpProbe;
use regcheck_core::HttpRequest;
use regcheck_core::IdentityProviderProbe;
use regcheck_core::MailProbe;
use regcheck_core::MailRequest;
use regcheck_core::ProbeError;
use regcheck_core::ProbeTimeouts;
use regcheck_core::TokenExchangeRequest;
use tempfile::TempDir;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Serves `count` requests, answering each with `respond(index, port)`.
fn serve<F>(count: usize, respond: F) -> (u16, mpsc::Receiver<(String, String)>)
where
    F: Fn(usize, u16) -> Response<std::io::Cursor<Vec<u8>>> + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().to_ip().unwrap().port();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for index in 0..count {
            let mut request = server.recv().unwrap();
            let mut body = String::new();
            request.as_reader().read_to_string(&mut body).unwrap();
            tx.send((format!("{} {}", request.method(), request.url()), body)).unwrap();
            request.respond(respond(index, port)).unwrap();
        }
    });
    (port, rx)
}

fn json_header() -> Header {
    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap()
}

/// Runs `script` against the first accepted TCP connection.
fn tcp_server<F>(script: F) -> u16
where
    F: FnOnce(TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        script(stream);
    });
    port
}

/// Reads one short-form LDAP message.
fn read_ldap(stream: &mut TcpStream) -> Vec<u8> {
    let mut header = [0u8; 2];
    stream.read_exact(&mut header).unwrap();
    let mut content = vec![0u8; usize::from(header[1])];
    stream.read_exact(&mut content).unwrap();
    let mut message = header.to_vec();
    message.extend(content);
    message
}

// ============================================================================
// SECTION: Directory
// ============================================================================

#[test]
fn bind_request_encodes_simple_auth() {
    let encoded = directory::bind_request(1, "cn=a", "p");
    assert_eq!(encoded, vec![
        0x30, 0x11, 0x02, 0x01, 0x01, 0x60, 0x0c, 0x02, 0x01, 0x03, 0x04, 0x04, b'c', b'n', b'=', b'a', 0x80, 0x01,
        b'p',
    ]);
}

#[test]
fn filters_encode_to_ber_choices() {
    assert_eq!(directory::encode_filter("(uid=*)").unwrap(), vec![0x87, 0x03, b'u', b'i', b'd']);
    assert_eq!(directory::encode_filter("(cn=a)").unwrap(), vec![0xa3, 0x07, 0x04, 0x02, b'c', b'n', 0x04, 0x01, b'a']);
    assert_eq!(directory::encode_filter("(cn=a*b)").unwrap(), vec![
        0xa4, 0x0c, 0x04, 0x02, b'c', b'n', 0x30, 0x06, 0x80, 0x01, b'a', 0x82, 0x01, b'b',
    ]);
    let and = directory::encode_filter("(&(uid=*)(cn=a))").unwrap();
    assert_eq!(&and[..2], &[0xa0, 0x0e]);
    let escaped = directory::encode_filter(r"(cn=a\2ab)").unwrap();
    assert_eq!(&escaped[6..], &[0x04, 0x03, b'a', b'*', b'b']);
}

#[test]
fn malformed_filters_are_rejected() {
    for bad in ["uid=*", "(uid=*", "(&)", "(=a)", "(uid=*))"] {
        assert!(matches!(directory::encode_filter(bad), Err(ProbeError::Transport(_))), "{bad}");
    }
}

#[test]
fn result_code_reads_enumerated_and_message() {
    let body = [0x0a, 0x01, 0x31, 0x04, 0x00, 0x04, 0x03, b'b', b'a', b'd'];
    assert_eq!(directory::result_code(&body).unwrap(), (49, "bad".to_string()));
    assert!(directory::result_code(&[0x04, 0x00]).is_err());
}

#[tokio::test(flavor = "multi_thread")]
async fn directory_probe_binds_and_counts_entries() {
    let port = tcp_server(|mut stream| {
        let bind = read_ldap(&mut stream);
        assert_eq!(bind[5], 0x60);
        stream.write_all(&[0x30, 0x0c, 0x02, 0x01, 0x01, 0x61, 0x07, 0x0a, 0x01, 0x00, 0x04, 0x00, 0x04, 0x00]).unwrap();
        let search = read_ldap(&mut stream);
        assert_eq!(search[5], 0x63);
        stream.write_all(&[0x30, 0x0a, 0x02, 0x01, 0x02, 0x64, 0x05, 0x04, 0x01, b'a', 0x30, 0x00]).unwrap();
        stream.write_all(&[0x30, 0x0c, 0x02, 0x01, 0x02, 0x65, 0x07, 0x0a, 0x01, 0x00, 0x04, 0x00, 0x04, 0x00]).unwrap();
        let _ = read_ldap(&mut stream);
    });
    let probe = LiveDirectory::new(ProbeTimeouts::default());
    let request = DirectoryRequest {
        uri: format!("ldap://127.0.0.1:{port}"),
        bind_dn: "cn=admin,dc=example,dc=com".to_string(),
        password: "secret".to_string(),
        base_dn: "dc=example,dc=com".to_string(),
        filter: "(&(uid=*)(objectClass=person))".to_string(),
        ca_pem: None,
    };
    assert_eq!(probe.bind_and_search(&request).await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn directory_probe_maps_invalid_credentials() {
    let port = tcp_server(|mut stream| {
        let _ = read_ldap(&mut stream);
        stream.write_all(&[0x30, 0x0c, 0x02, 0x01, 0x01, 0x61, 0x07, 0x0a, 0x01, 0x31, 0x04, 0x00, 0x04, 0x00]).unwrap();
    });
    let probe = LiveDirectory::new(ProbeTimeouts::default());
    let request = DirectoryRequest {
        uri: format!("ldap://127.0.0.1:{port}"),
        bind_dn: "cn=admin".to_string(),
        password: "wrong".to_string(),
        base_dn: "dc=example".to_string(),
        filter: "(uid=*)".to_string(),
        ca_pem: None,
    };
    let err = probe.bind_and_search(&request).await.unwrap_err();
    assert_eq!(err, ProbeError::Rejected("invalid credentials for LDAP_ADMIN_DN".to_string()));
}

// ============================================================================
// SECTION: Mail
// ============================================================================

#[test]
fn smtp_replies_parse_when_complete() {
    assert_eq!(parse_reply("250-mail.example\r\n250 AUTH PLAIN\r\n"), Some((250, "mail.example AUTH PLAIN".to_string())));
    assert_eq!(parse_reply("220 ready\r\n"), Some((220, "ready".to_string())));
    assert_eq!(parse_reply("221\n"), Some((221, String::new())));
    assert_eq!(parse_reply("250-mail.example\r\n"), None);
    assert_eq!(parse_reply("250 partial"), None);
    assert_eq!(parse_reply("hello\r\n"), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn mail_probe_reports_rejected_login() {
    let (tx, rx) = mpsc::channel();
    let port = tcp_server(move |stream| {
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);
        writer.write_all(b"220 mail.example ESMTP\r\n").unwrap();
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        tx.send(line.clone()).unwrap();
        writer.write_all(b"250-mail.example\r\n250 AUTH PLAIN\r\n").unwrap();
        line.clear();
        reader.read_line(&mut line).unwrap();
        tx.send(line.clone()).unwrap();
        writer.write_all(b"535 5.7.8 authentication failed\r\n").unwrap();
    });
    let probe = LiveMail::new(ProbeTimeouts::default());
    let request = MailRequest {
        host: "127.0.0.1".to_string(),
        port,
        starttls: false,
        credentials: Some(("quay".to_string(), "secret".to_string())),
    };
    let err = probe.handshake(&request).await.unwrap_err();
    assert!(matches!(err, ProbeError::Rejected(ref message) if message.contains("rejected the credentials")), "{err}");
    assert_eq!(rx.recv().unwrap(), "EHLO regcheck.local\r\n");
    assert_eq!(rx.recv().unwrap(), "AUTH PLAIN AHF1YXkAc2VjcmV0\r\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn mail_probe_requires_advertised_starttls() {
    let port = tcp_server(|stream| {
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);
        writer.write_all(b"220 ready\r\n").unwrap();
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        writer.write_all(b"250 mail.example\r\n").unwrap();
    });
    let probe = LiveMail::new(ProbeTimeouts::default());
    let request = MailRequest {
        host: "127.0.0.1".to_string(),
        port,
        starttls: true,
        credentials: None,
    };
    let err = probe.handshake(&request).await.unwrap_err();
    assert_eq!(err, ProbeError::Rejected("mail server does not offer STARTTLS".to_string()));
}

// ============================================================================
// SECTION: Cache And Database
// ============================================================================

#[test]
fn cache_url_carries_credentials_and_tls() {
    let request = CacheRequest {
        host: "redis.example.com".to_string(),
        port: 6380,
        username: Some("quay".to_string()),
        password: Some("p@ss".to_string()),
        tls: true,
    };
    let url = connection_url(&request).unwrap();
    assert_eq!(url.scheme(), "rediss");
    assert_eq!(url.username(), "quay");
    assert_eq!(url.password(), Some("p%40ss"));
    assert_eq!(url.port(), Some(6380));
}

#[test]
fn sqlite_paths_strip_scheme() {
    assert_eq!(sqlite_path("sqlite:///var/lib/quay.db"), "var/lib/quay.db");
    assert_eq!(sqlite_path("sqlite://quay.db"), "quay.db");
    assert_eq!(sqlite_path("/abs/quay.db"), "/abs/quay.db");
}

#[tokio::test(flavor = "multi_thread")]
async fn sqlite_probe_reads_library_version() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("quay.db");
    rusqlite::Connection::open(&path).unwrap().execute_batch("CREATE TABLE t (id INTEGER);").unwrap();
    let request = DatabaseRequest {
        engine: DatabaseEngine::Sqlite,
        url: format!("sqlite:///{}", path.display()),
        ssl_mode: None,
        ca_pem: None,
    };
    let facts = LiveDatabase.connect(&request).await.unwrap();
    assert!(facts.server_version.starts_with('3'), "{}", facts.server_version);
    assert!(facts.extensions.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn sqlite_probe_never_creates_files() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.db");
    let request = DatabaseRequest {
        engine: DatabaseEngine::Sqlite,
        url: format!("sqlite:///{}", path.display()),
        ssl_mode: None,
        ca_pem: None,
    };
    assert!(LiveDatabase.connect(&request).await.is_err());
    assert!(!path.exists());
}

// ============================================================================
// SECTION: HTTP And Identity
// ============================================================================

#[test]
fn discovery_url_tolerates_trailing_slash() {
    assert_eq!(discovery_url("https://sso.example.com/"), "https://sso.example.com/.well-known/openid-configuration");
    assert_eq!(discovery_url("https://sso.example.com"), "https://sso.example.com/.well-known/openid-configuration");
}

#[tokio::test(flavor = "multi_thread")]
async fn http_probe_returns_status() {
    let (port, seen) = serve(1, |_, _| Response::from_string("").with_status_code(503));
    let probe = LiveHttp::new(ProbeTimeouts::default());
    let request = HttpRequest {
        url: format!("http://127.0.0.1:{port}/indexer/api/v1/index_state"),
        ca_pem: None,
    };
    assert_eq!(probe.get(&request).await.unwrap(), 503);
    assert_eq!(seen.recv().unwrap().0, "GET /indexer/api/v1/index_state");
}

#[tokio::test(flavor = "multi_thread")]
async fn identity_probe_exchanges_code_at_discovered_endpoint() {
    let (port, seen) = serve(2, |index, port| match index {
        0 => Response::from_string(format!(r#"{{"token_endpoint": "http://127.0.0.1:{port}/token"}}"#))
            .with_header(json_header()),
        _ => Response::from_string(r#"{"error": "invalid_grant"}"#).with_status_code(400).with_header(json_header()),
    });
    let probe = LiveIdentityProvider::new(ProbeTimeouts::default());
    let request = TokenExchangeRequest {
        server: format!("http://127.0.0.1:{port}/realms/quay/"),
        client_id: "quay".to_string(),
        client_secret: "secret".to_string(),
        code: "badcode".to_string(),
    };
    let response = probe.exchange_code(&request).await.unwrap();
    assert_eq!(response.status, 400);
    assert_eq!(response.error.as_deref(), Some("invalid_grant"));
    assert_eq!(seen.recv().unwrap().0, "GET /realms/quay/.well-known/openid-configuration");
    let (line, body) = seen.recv().unwrap();
    assert_eq!(line, "POST /token");
    assert!(body.contains("grant_type=authorization_code"));
    assert!(body.contains("code=badcode"));
    assert!(body.contains("client_id=quay"));
}

#[tokio::test(flavor = "multi_thread")]
async fn identity_probe_reports_missing_discovery() {
    let (port, _seen) = serve(1, |_, _| Response::from_string("").with_status_code(404));
    let probe = LiveIdentityProvider::new(ProbeTimeouts::default());
    let request = TokenExchangeRequest {
        server: format!("http://127.0.0.1:{port}/"),
        client_id: "quay".to_string(),
        client_secret: "secret".to_string(),
        code: "badcode".to_string(),
    };
    assert!(matches!(probe.exchange_code(&request).await, Err(ProbeError::NotFound(_))));
}
