//! Newline-delimited JSON over the daemon's Unix socket.
//!
//! One request per line, one response per line:
//! `{"cmd":"sync"}` → `{"ok":true,"data":{...}}`.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{io_err, DaemonError};
use crate::paths::socket_path;

const STARTUP_RETRIES: u32 = 5;
const STARTUP_BACKOFF: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum DaemonRequest {
    Status,
    /// Queue a pass and wait for its summary.
    Sync,
    /// Delete every tracked thread and wait for the report.
    Clear,
    Stop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DaemonResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }

    fn into_data(self) -> Result<Value, DaemonError> {
        if self.ok {
            return Ok(self.data.unwrap_or(Value::Null));
        }
        Err(DaemonError::Protocol(
            self.error.unwrap_or_else(|| "unknown daemon error".to_string()),
        ))
    }
}

/// Send one request and read one response.
pub fn send_request(home: &Path, request: DaemonRequest) -> Result<DaemonResponse, DaemonError> {
    let socket = socket_path(home);
    let not_running = || DaemonError::DaemonNotRunning {
        socket: socket.clone(),
    };

    let mut stream = UnixStream::connect(&socket).map_err(|err| match err.kind() {
        ErrorKind::NotFound | ErrorKind::ConnectionRefused | ErrorKind::ConnectionReset => {
            not_running()
        }
        _ => io_err(&socket, err),
    })?;

    let mut payload = serde_json::to_string(&request)?;
    payload.push('\n');
    stream
        .write_all(payload.as_bytes())
        .map_err(|e| io_err(&socket, e))?;

    let mut line = String::new();
    let read = BufReader::new(stream)
        .read_line(&mut line)
        .map_err(|e| io_err(&socket, e))?;
    if read == 0 {
        return Err(DaemonError::Protocol(
            "daemon closed connection before responding".to_string(),
        ));
    }
    Ok(serde_json::from_str(line.trim_end())?)
}

fn call(home: &Path, request: DaemonRequest) -> Result<Value, DaemonError> {
    send_request(home, request)?.into_data()
}

/// Status of a running daemon. Retries briefly so a freshly started daemon
/// has time to bind its socket.
pub fn request_status(home: &Path) -> Result<Value, DaemonError> {
    let mut attempt = 1;
    loop {
        match call(home, DaemonRequest::Status) {
            Err(DaemonError::DaemonNotRunning { .. }) if attempt < STARTUP_RETRIES => {
                attempt += 1;
                sleep(STARTUP_BACKOFF);
            }
            result => return result,
        }
    }
}

pub fn request_stop(home: &Path) -> Result<(), DaemonError> {
    call(home, DaemonRequest::Stop).map(|_| ())
}

pub fn request_sync(home: &Path) -> Result<Value, DaemonError> {
    call(home, DaemonRequest::Sync)
}

pub fn request_clear(home: &Path) -> Result<Value, DaemonError> {
    call(home, DaemonRequest::Clear)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn requests_carry_the_command_name() {
        assert_eq!(
            serde_json::to_value(DaemonRequest::Clear).unwrap(),
            json!({"cmd": "clear"})
        );
        let parsed: DaemonRequest = serde_json::from_str(r#"{"cmd":"sync"}"#).unwrap();
        assert_eq!(parsed, DaemonRequest::Sync);
        assert!(serde_json::from_str::<DaemonRequest>(r#"{"cmd":"reboot"}"#).is_err());
    }

    #[test]
    fn missing_socket_means_not_running() {
        let home = TempDir::new().unwrap();
        assert!(matches!(
            request_sync(home.path()),
            Err(DaemonError::DaemonNotRunning { .. })
        ));
    }

    #[test]
    fn error_response_becomes_protocol_error() {
        let err = DaemonResponse::error("boom").into_data().unwrap_err();
        assert!(matches!(err, DaemonError::Protocol(message) if message == "boom"));
    }
}
