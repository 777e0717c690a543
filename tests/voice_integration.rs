//! Integration tests for the voice path
//!
//! Tests the HTTP oracle against a local mock server: JSON reply, text
//! fallback, failures and timeouts

use pretty_assertions::assert_eq;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use stressline::config::OracleSettings;
use stressline::core::{fuse, HttpOracle, VoiceStressEstimator};
use stressline::types::{ReasonCode, StressSource};

/// One-shot HTTP server; returns the URL and a handle yielding the raw request
fn mock_server(status_line: &str, body: &str, delay: Duration) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    );

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        thread::sleep(delay);
        // Client may have given up already
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();
        request
    });
    (format!("http://{}/v1/generate", addr), handle)
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match stream.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let headers = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
            let body_len = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= pos + 4 + body_len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn estimator(url: &str, timeout: Duration) -> VoiceStressEstimator {
    VoiceStressEstimator::new(Box::new(HttpOracle::new(url, None, timeout)))
}

/// `{"stress_score": 0.73}` is taken exactly
#[test]
fn test_json_reply() {
    let (url, server) = mock_server("200 OK", r#"{"stress_score": 0.73}"#, Duration::ZERO);
    let estimate = estimator(&url, Duration::from_secs(5)).estimate(true, "I can't sleep before the exam");

    assert_eq!(estimate.stress, 0.73);
    assert_eq!(estimate.reason, ReasonCode::V001_ORACLE_JSON);

    let request = server.join().unwrap();
    assert!(request.starts_with("POST /v1/generate"));
    assert!(request.contains("\"contents\""));
    assert!(request.contains("I can't sleep before the exam"));
    assert!(request.contains("stress_score"));
}

/// Text of a generateContent-style envelope is unwrapped first
#[test]
fn test_candidate_envelope_reply() {
    let body = r#"{"candidates":[{"content":{"parts":[{"text":"Sure. {\"stress_score\": 0.42} based on the wording."}]}}]}"#;
    let (url, _server) = mock_server("200 OK", body, Duration::ZERO);
    let estimate = estimator(&url, Duration::from_secs(5)).estimate(true, "hello");

    assert_eq!(estimate.stress, 0.42);
    assert_eq!(estimate.reason, ReasonCode::V001_ORACLE_JSON);
}

/// No braces: first `0.<digits>` in the text
#[test]
fn test_plain_text_reply_falls_back_to_number() {
    let body = "The speaker sounds tense, a score around 0.55 is likely for this transcript.";
    let (url, _server) = mock_server("200 OK", body, Duration::ZERO);
    let estimate = estimator(&url, Duration::from_secs(5)).estimate(true, "hello");

    assert_eq!(estimate.stress, 0.55);
    assert_eq!(estimate.reason, ReasonCode::V001_ORACLE_TEXT_FALLBACK);
}

/// Nothing usable in the reply: default
#[test]
fn test_unparseable_reply_uses_default() {
    let (url, _server) = mock_server("200 OK", "I cannot help with that.", Duration::ZERO);
    let estimate = estimator(&url, Duration::from_secs(5)).estimate(true, "hello");

    assert_eq!(estimate.stress, 0.5);
    assert_eq!(estimate.reason, ReasonCode::V001_ORACLE_UNPARSEABLE);
}

/// Non-2xx: default
#[test]
fn test_error_status_uses_default() {
    let (url, _server) = mock_server("500 Internal Server Error", r#"{"stress_score": 0.9}"#, Duration::ZERO);
    let estimate = estimator(&url, Duration::from_secs(5)).estimate(true, "hello");

    assert_eq!(estimate.stress, 0.5);
    assert_eq!(estimate.reason, ReasonCode::V001_ORACLE_FAILED);
}

/// Oracle that never answers in time: default, bounded by the timeout
#[test]
fn test_timeout_uses_default() {
    let (url, _server) = mock_server("200 OK", r#"{"stress_score": 0.9}"#, Duration::from_secs(3));
    let started = Instant::now();
    let estimate = estimator(&url, Duration::from_millis(300)).estimate(true, "hello");

    assert_eq!(estimate.stress, 0.5);
    assert_eq!(estimate.reason, ReasonCode::V001_ORACLE_FAILED);
    assert!(started.elapsed() < Duration::from_secs(3));
}

/// Connection refused: default
#[test]
fn test_unreachable_oracle_uses_default() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let url = format!("http://127.0.0.1:{}/v1/generate", port);
    let estimate = estimator(&url, Duration::from_secs(2)).estimate(true, "hello");

    assert_eq!(estimate.stress, 0.5);
}

/// No speech: no request, voice stress 0
#[test]
fn test_no_speech_skips_oracle() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/v1/generate", listener.local_addr().unwrap());
    let estimate = estimator(&url, Duration::from_secs(2)).estimate(false, "hello");

    assert_eq!(estimate.stress, 0.0);
    assert_eq!(estimate.reason, ReasonCode::V001_NO_SPEECH);
}

/// API key goes in the query string
#[test]
fn test_api_key_query_parameter() {
    let (url, server) = mock_server("200 OK", r#"{"stress_score": 0.2}"#, Duration::ZERO);
    let settings = OracleSettings {
        url: Some(url),
        api_key: Some("secret".to_string()),
        ..OracleSettings::default()
    };
    let estimate = VoiceStressEstimator::from_settings(&settings).estimate(true, "hello");
    assert_eq!(estimate.stress, 0.2);

    let request = server.join().unwrap();
    assert!(request.starts_with("POST /v1/generate?key=secret"));
}

/// Oracle score flows into the fused label
#[test]
fn test_oracle_score_fuses_with_facial() {
    let (url, _server) = mock_server("200 OK", r#"{"stress_score": 0.73}"#, Duration::ZERO);
    let voice = estimator(&url, Duration::from_secs(5)).estimate(true, "hello");

    let fused = fuse(0.3, voice.stress, true);
    assert!((fused.combined - (0.3 * 0.6 + 0.73 * 0.4)).abs() < 1e-12);
    assert_eq!(fused.source, StressSource::FacialAndVoice);
    assert_eq!(fused.label, "High Stress (facial expression and voice)");
}
