//! OBS WebSocket API client.
//!
//! Talks to OBS Studio via the obs-websocket 5.x protocol (built into
//! OBS 28+) at ws://{host}:{port}. Each client owns one authenticated
//! socket for the lifetime of the connection; a failed request triggers a
//! single reconnect-and-retry before the error surfaces to the caller.
//!
//! All socket operations are bounded: the TCP connect, reads and writes
//! all carry the handshake timeout, so a dead OBS instance can never stall
//! the poll loop for longer than that.

use anyhow::{Context, Result};
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tungstenite::{Message, WebSocket};

/// Wire format of video settings reported by OBS.
#[derive(Debug, Clone, Copy)]
pub struct VideoSettings {
    pub base_width: u32,
    pub base_height: u32,
    pub fps_numerator: u32,
    pub fps_denominator: u32,
}

impl VideoSettings {
    /// Effective frame rate, e.g. 60000/1001 -> 59.94.
    pub fn fps(&self) -> f64 {
        if self.fps_denominator == 0 {
            0.0
        } else {
            f64::from(self.fps_numerator) / f64::from(self.fps_denominator)
        }
    }
}

/// Recording status reported by `GetRecordStatus`.
#[derive(Debug, Clone)]
pub struct ObsRecordStatus {
    pub active: bool,
    pub paused: bool,
    pub timecode: Option<String>,
}

/// OBS WebSocket Hello message (server -> client)
#[derive(Debug, Deserialize)]
struct Hello {
    authentication: Option<AuthChallenge>,
}

/// Authentication challenge from server
#[derive(Debug, Deserialize)]
struct AuthChallenge {
    challenge: String,
    salt: String,
}

/// OBS WebSocket message wrapper
#[derive(Debug, Deserialize)]
struct ObsMessage {
    op: u32,
    d: Value,
}

/// OBS WebSocket op codes
mod op {
    pub const HELLO: u32 = 0;
    pub const IDENTIFY: u32 = 1;
    pub const IDENTIFIED: u32 = 2;
    pub const REQUEST: u32 = 6;
    pub const REQUEST_RESPONSE: u32 = 7;
}

/// Response status from OBS
#[derive(Debug, Deserialize)]
struct RequestStatus {
    result: bool,
    code: u32,
    #[serde(default)]
    comment: Option<String>,
}

/// Generate authentication string per obs-websocket protocol
fn generate_auth_string(password: &str, challenge: &str, salt: &str) -> String {
    // Step 1: Concatenate password + salt, then SHA256
    let secret_string = format!("{}{}", password, salt);
    let secret_hash = Sha256::digest(secret_string.as_bytes());
    let secret_base64 = base64::engine::general_purpose::STANDARD.encode(secret_hash);

    // Step 2: Concatenate secret_base64 + challenge, then SHA256
    let auth_string = format!("{}{}", secret_base64, challenge);
    let auth_hash = Sha256::digest(auth_string.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(auth_hash)
}

type ObsSocket = WebSocket<TcpStream>;

/// Persistent, authenticated connection to one OBS instance.
pub struct ObsClient {
    host: String,
    port: u16,
    password: Option<String>,
    timeout: Duration,
    socket: ObsSocket,
    next_request_id: u64,
}

impl ObsClient {
    /// Connect and complete the Hello/Identify handshake within `timeout`.
    pub fn connect(
        host: &str,
        port: u16,
        password: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let socket = open_socket(host, port, password.as_deref(), timeout)?;
        Ok(Self {
            host: host.to_string(),
            port,
            password,
            timeout,
            socket,
            next_request_id: 1,
        })
    }

    /// Endpoint label, e.g. "192.168.1.50:4455".
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn reconnect(&mut self) -> Result<()> {
        let _ = self.socket.close(None);
        self.socket = open_socket(&self.host, self.port, self.password.as_deref(), self.timeout)?;
        Ok(())
    }

    /// Execute a request, reconnecting once if the socket has gone stale.
    ///
    /// Only transport failures trigger the reconnect; a request that OBS
    /// answers with a failed `requestStatus` surfaces as an error without
    /// tearing the socket down.
    fn request(&mut self, request_type: &str, request_data: Option<Value>) -> Result<Value> {
        let response = match self.request_once(request_type, request_data.as_ref()) {
            Ok(response) => response,
            Err(_) => {
                self.reconnect()
                    .with_context(|| format!("Reconnect to OBS at {} failed", self.endpoint()))?;
                self.request_once(request_type, request_data.as_ref())?
            }
        };
        check_response(&response)?;
        Ok(response)
    }

    fn request_once(&mut self, request_type: &str, request_data: Option<&Value>) -> Result<Value> {
        let request_id = self.next_request_id.to_string();
        self.next_request_id += 1;

        let mut d = json!({
            "requestType": request_type,
            "requestId": request_id,
        });
        if let Some(data) = request_data {
            d["requestData"] = data.clone();
        }
        let request = json!({ "op": op::REQUEST, "d": d });

        self.socket
            .send(Message::Text(request.to_string()))
            .context("Failed to send request to OBS")?;

        let response_msg = self.socket.read().context("Failed to read response from OBS")?;
        let response: ObsMessage = serde_json::from_str(response_msg.to_text()?)
            .context("Failed to parse response message")?;

        if response.op != op::REQUEST_RESPONSE {
            anyhow::bail!("Expected RequestResponse, got op {}", response.op);
        }

        Ok(response.d)
    }

    /// `GetRecordStatus` -> active/paused/timecode, as one atomic fetch.
    pub fn get_record_status(&mut self) -> Result<ObsRecordStatus> {
        let response = self.request("GetRecordStatus", None)?;
        parse_record_status(&response)
    }

    pub fn toggle_record(&mut self) -> Result<()> {
        self.request("ToggleRecord", None).map(|_| ())
    }

    pub fn toggle_record_pause(&mut self) -> Result<()> {
        self.request("ToggleRecordPause", None).map(|_| ())
    }

    pub fn start_record(&mut self) -> Result<()> {
        self.request("StartRecord", None).map(|_| ())
    }

    pub fn stop_record(&mut self) -> Result<()> {
        self.request("StopRecord", None).map(|_| ())
    }

    /// Canvas resolution and frame rate. Treated as static per connection.
    pub fn get_video_settings(&mut self) -> Result<VideoSettings> {
        let response = self.request("GetVideoSettings", None)?;
        parse_video_settings(&response)
    }

    /// Name of the current program scene.
    pub fn get_current_program_scene(&mut self) -> Result<String> {
        let response = self.request("GetCurrentProgramScene", None)?;
        response
            .get("responseData")
            .and_then(|d| d.get("currentProgramSceneName"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .context("Failed to get current scene name")
    }

    /// Fetch a screenshot of `source_name` as a base64 data URI string.
    pub fn get_source_screenshot(
        &mut self,
        source_name: &str,
        width: u32,
        height: u32,
        quality: i32,
    ) -> Result<String> {
        let response = self.request(
            "GetSourceScreenshot",
            Some(json!({
                "sourceName": source_name,
                "imageFormat": "jpg",
                "imageWidth": width,
                "imageHeight": height,
                "imageCompressionQuality": quality,
            })),
        )?;
        response
            .get("responseData")
            .and_then(|d| d.get("imageData"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .context("Failed to get screenshot data")
    }

    /// Point OBS at a new recording output directory.
    pub fn set_record_directory(&mut self, directory: &str) -> Result<()> {
        self.request(
            "SetRecordDirectory",
            Some(json!({ "recordDirectory": directory })),
        )
        .map(|_| ())
    }
}

/// Open a TCP connection and complete the obs-websocket handshake.
fn open_socket(
    host: &str,
    port: u16,
    password: Option<&str>,
    timeout: Duration,
) -> Result<ObsSocket> {
    let addr = (host, port)
        .to_socket_addrs()
        .with_context(|| format!("Failed to resolve {}:{}", host, port))?
        .next()
        .with_context(|| format!("No address found for {}:{}", host, port))?;

    let stream = TcpStream::connect_timeout(&addr, timeout)
        .with_context(|| format!("Failed to connect to OBS at {}:{}", host, port))?;
    stream
        .set_read_timeout(Some(timeout))
        .context("Failed to set read timeout")?;
    stream
        .set_write_timeout(Some(timeout))
        .context("Failed to set write timeout")?;

    let url = format!("ws://{}:{}", host, port);
    let (mut socket, _response) = tungstenite::client::client(&url, stream)
        .map_err(|e| anyhow::anyhow!("WebSocket handshake with {} failed: {}", url, e))?;

    // Step 1: Receive Hello
    let hello_msg = socket.read().context("Failed to read Hello from OBS")?;
    let hello: ObsMessage =
        serde_json::from_str(hello_msg.to_text()?).context("Failed to parse Hello message")?;

    if hello.op != op::HELLO {
        anyhow::bail!("Expected Hello message, got op {}", hello.op);
    }

    let hello_data: Hello = serde_json::from_value(hello.d).context("Failed to parse Hello data")?;

    // Step 2: Send Identify (with optional auth). Event subscriptions are
    // disabled so request/response pairs stay strictly interleaved.
    let identify_data = if let Some(auth) = hello_data.authentication {
        let password = password
            .context("OBS requires authentication but no password was configured")?;
        let auth_string = generate_auth_string(password, &auth.challenge, &auth.salt);
        json!({
            "rpcVersion": 1,
            "eventSubscriptions": 0,
            "authentication": auth_string,
        })
    } else {
        json!({
            "rpcVersion": 1,
            "eventSubscriptions": 0,
        })
    };

    socket
        .send(Message::Text(
            json!({ "op": op::IDENTIFY, "d": identify_data }).to_string(),
        ))
        .context("Failed to send Identify")?;

    // Step 3: Receive Identified
    let identified_msg = socket.read().context("Failed to read Identified from OBS")?;
    let identified: ObsMessage = serde_json::from_str(identified_msg.to_text()?)
        .context("Failed to parse Identified message")?;

    if identified.op != op::IDENTIFIED {
        anyhow::bail!(
            "Authentication failed or unexpected message (op {})",
            identified.op
        );
    }

    Ok(socket)
}

/// Parse response and check for success
fn check_response(response: &Value) -> Result<()> {
    if let Some(status) = response.get("requestStatus") {
        let status: RequestStatus =
            serde_json::from_value(status.clone()).context("Failed to parse request status")?;

        if !status.result {
            let msg = status
                .comment
                .unwrap_or_else(|| format!("Error code {}", status.code));
            anyhow::bail!("OBS request failed: {}", msg);
        }
    }
    Ok(())
}

fn parse_record_status(response: &Value) -> Result<ObsRecordStatus> {
    let data = response.get("responseData").context("Missing responseData")?;

    Ok(ObsRecordStatus {
        active: data
            .get("outputActive")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        paused: data
            .get("outputPaused")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        timecode: data
            .get("outputTimecode")
            .and_then(|v| v.as_str())
            .map(str::to_string),
    })
}

fn parse_video_settings(response: &Value) -> Result<VideoSettings> {
    let data = response.get("responseData").context("Missing responseData")?;

    Ok(VideoSettings {
        base_width: data
            .get("baseWidth")
            .and_then(|v| v.as_u64())
            .context("Missing baseWidth")? as u32,
        base_height: data
            .get("baseHeight")
            .and_then(|v| v.as_u64())
            .context("Missing baseHeight")? as u32,
        fps_numerator: data
            .get("fpsNumerator")
            .and_then(|v| v.as_u64())
            .context("Missing fpsNumerator")? as u32,
        fps_denominator: data
            .get("fpsDenominator")
            .and_then(|v| v.as_u64())
            .context("Missing fpsDenominator")? as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_string_follows_protocol() {
        // 1. secret = base64(sha256(password + salt))
        // 2. auth = base64(sha256(secret + challenge))
        let password = "supersecretpassword";
        let challenge = "ztTBnnuqrqaKDzRM3xcVdbYm";
        let salt = "PZVbYpvAnZut2SS6JNJytDm9";

        let auth = generate_auth_string(password, challenge, salt);

        // SHA256 = 32 bytes = 44 chars base64
        assert_eq!(auth.len(), 44);
        assert!(base64::engine::general_purpose::STANDARD.decode(&auth).is_ok());

        // Deterministic for identical inputs
        assert_eq!(auth, generate_auth_string(password, challenge, salt));
    }

    #[test]
    fn parse_record_status_recording() {
        let response = serde_json::json!({
            "requestType": "GetRecordStatus",
            "responseData": {
                "outputActive": true,
                "outputPaused": false,
                "outputTimecode": "00:01:23.456",
            }
        });

        let status = parse_record_status(&response).unwrap();
        assert!(status.active);
        assert!(!status.paused);
        assert_eq!(status.timecode.as_deref(), Some("00:01:23.456"));
    }

    #[test]
    fn parse_record_status_defaults_when_fields_missing() {
        let response = serde_json::json!({ "responseData": {} });
        let status = parse_record_status(&response).unwrap();
        assert!(!status.active);
        assert!(!status.paused);
        assert!(status.timecode.is_none());
    }

    #[test]
    fn parse_video_settings_fps() {
        let response = serde_json::json!({
            "responseData": {
                "baseWidth": 1920,
                "baseHeight": 1080,
                "fpsNumerator": 60000,
                "fpsDenominator": 1001,
            }
        });

        let settings = parse_video_settings(&response).unwrap();
        assert_eq!(settings.base_width, 1920);
        assert_eq!(settings.base_height, 1080);
        assert!((settings.fps() - 59.94).abs() < 0.01);
    }

    #[test]
    fn fps_zero_denominator_is_zero() {
        let settings = VideoSettings {
            base_width: 1280,
            base_height: 720,
            fps_numerator: 30,
            fps_denominator: 0,
        };
        assert_eq!(settings.fps(), 0.0);
    }

    #[test]
    fn check_response_rejects_failed_status() {
        let response = serde_json::json!({
            "requestStatus": { "result": false, "code": 204, "comment": "output not running" }
        });
        let err = check_response(&response).unwrap_err();
        assert!(err.to_string().contains("output not running"));
    }

    #[test]
    fn check_response_accepts_success() {
        let response = serde_json::json!({
            "requestStatus": { "result": true, "code": 100 }
        });
        assert!(check_response(&response).is_ok());
    }
}
