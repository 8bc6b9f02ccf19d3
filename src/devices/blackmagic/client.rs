//! BlackMagic REST API client.
//!
//! Controls BlackMagic recorders (HyperDeck and friends) via their HTTP
//! control API under http://{host}/control/api/v1.
//!
//! Every request goes through a shared pooled client with an explicit
//! timeout, so an unreachable deck stalls the poll loop for at most one
//! timeout rather than hanging it indefinitely.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;

/// Request timeout for all BlackMagic HTTP calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// Shared HTTP client with connection pooling.
static HTTP_CLIENT: LazyLock<reqwest::blocking::Client> = LazyLock::new(|| {
    reqwest::blocking::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .pool_max_idle_per_host(4)
        .build()
        .expect("Failed to create HTTP client")
});

/// Transport record state, GET/PUT body of transports/0/record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportRecord {
    pub recording: bool,
}

/// Response of transports/0/timecode.
#[derive(Debug, Clone, Deserialize)]
pub struct TransportTimecode {
    /// Timecode of the material being recorded right now.
    pub display: Option<String>,
    /// Timecode of the timeline position, shown while idle.
    pub timeline: Option<String>,
}

impl TransportTimecode {
    /// Pick the value matching the transport state: `display` while
    /// recording, `timeline` otherwise.
    pub fn select(&self, recording: bool) -> Option<&str> {
        if recording {
            self.display.as_deref()
        } else {
            self.timeline.as_deref()
        }
    }
}

/// Response of transports/0/clip. Decks without input report no clip, so
/// everything below the top level is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransportClip {
    pub clip: Option<ClipInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipInfo {
    pub video_format: Option<VideoFormat>,
    pub codec_format: Option<CodecFormat>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFormat {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// The API reports this as a number on some firmware and a string on
    /// others, so it is kept raw and converted on access.
    pub frame_rate: Option<Value>,
}

impl VideoFormat {
    pub fn resolution(&self) -> Option<String> {
        Some(format!("{}x{}", self.width?, self.height?))
    }

    pub fn frame_rate_fps(&self) -> Option<f64> {
        match self.frame_rate.as_ref()? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CodecFormat {
    pub codec: Option<String>,
}

/// Response of transports/0/inputVideoSource.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputVideoSource {
    pub input_video_source: Option<String>,
}

/// Client for one BlackMagic device.
#[derive(Debug, Clone)]
pub struct BlackMagicClient {
    base_url: String,
}

impl BlackMagicClient {
    /// `port` of 80 keeps the URL bare, matching how the devices are
    /// usually addressed.
    pub fn new(host: &str, port: u16) -> Self {
        let base_url = if port == 80 {
            format!("http://{}/control/api/v1", host)
        } else {
            format!("http://{}:{}/control/api/v1", host, port)
        };
        Self { base_url }
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource)
    }

    /// Current record state of transport 0.
    pub fn get_record(&self) -> Result<bool> {
        let record: TransportRecord = HTTP_CLIENT
            .get(self.url("transports/0/record"))
            .send()
            .context("Failed to connect to BlackMagic device")?
            .error_for_status()
            .context("BlackMagic record query rejected")?
            .json()
            .context("Failed to parse record state")?;
        Ok(record.recording)
    }

    /// Set the record state of transport 0.
    pub fn set_record(&self, recording: bool) -> Result<()> {
        HTTP_CLIENT
            .put(self.url("transports/0/record"))
            .json(&TransportRecord { recording })
            .send()
            .context("Failed to send record command to BlackMagic device")?
            .error_for_status()
            .context("BlackMagic record command rejected")?;
        Ok(())
    }

    /// Read-then-write toggle. Not atomic: an external change landing
    /// between the GET and the PUT is lost. The devices expose no
    /// compare-and-set, so the race is accepted.
    pub fn toggle_record(&self) -> Result<bool> {
        let recording = self.get_record()?;
        self.set_record(!recording)?;
        Ok(!recording)
    }

    /// Current timecode pair of transport 0.
    pub fn get_timecode(&self) -> Result<TransportTimecode> {
        HTTP_CLIENT
            .get(self.url("transports/0/timecode"))
            .send()
            .context("Failed to connect to BlackMagic device")?
            .error_for_status()
            .context("BlackMagic timecode query rejected")?
            .json()
            .context("Failed to parse timecode")
    }

    /// Loaded clip description (format, codec). Empty without input.
    pub fn get_clip(&self) -> Result<TransportClip> {
        HTTP_CLIENT
            .get(self.url("transports/0/clip"))
            .send()
            .context("Failed to connect to BlackMagic device")?
            .error_for_status()
            .context("BlackMagic clip query rejected")?
            .json()
            .context("Failed to parse clip info")
    }

    /// Currently selected input video source.
    pub fn get_input_video_source(&self) -> Result<Option<String>> {
        let source: InputVideoSource = HTTP_CLIENT
            .get(self.url("transports/0/inputVideoSource"))
            .send()
            .context("Failed to connect to BlackMagic device")?
            .error_for_status()
            .context("BlackMagic input source query rejected")?
            .json()
            .context("Failed to parse input source")?;
        Ok(source.input_video_source)
    }

    /// Flash the device's front-panel identify indicator.
    pub fn identify(&self) -> Result<()> {
        HTTP_CLIENT
            .put(self.url("system/identify"))
            .json(&serde_json::json!({ "enabled": true }))
            .send()
            .context("Failed to send identify to BlackMagic device")?
            .error_for_status()
            .context("BlackMagic identify rejected")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_omits_default_port() {
        let client = BlackMagicClient::new("192.168.1.20", 80);
        assert_eq!(
            client.url("transports/0/record"),
            "http://192.168.1.20/control/api/v1/transports/0/record"
        );
    }

    #[test]
    fn base_url_keeps_custom_port() {
        let client = BlackMagicClient::new("192.168.1.20", 8080);
        assert_eq!(
            client.url("system/identify"),
            "http://192.168.1.20:8080/control/api/v1/system/identify"
        );
    }

    #[test]
    fn parse_record_state() {
        let record: TransportRecord = serde_json::from_str(r#"{"recording": true}"#).unwrap();
        assert!(record.recording);
    }

    #[test]
    fn timecode_selection_tracks_record_state() {
        let tc: TransportTimecode = serde_json::from_str(
            r#"{"display": "00:00:12:05", "timeline": "01:00:00:00"}"#,
        )
        .unwrap();
        assert_eq!(tc.select(true), Some("00:00:12:05"));
        assert_eq!(tc.select(false), Some("01:00:00:00"));
    }

    #[test]
    fn parse_clip_with_string_frame_rate() {
        let clip: TransportClip = serde_json::from_str(
            r#"{
                "clip": {
                    "videoFormat": {"width": 1920, "height": 1080, "frameRate": "50"},
                    "codecFormat": {"codec": "ProRes:HQ"}
                }
            }"#,
        )
        .unwrap();

        let info = clip.clip.unwrap();
        let format = info.video_format.unwrap();
        assert_eq!(format.resolution().as_deref(), Some("1920x1080"));
        assert_eq!(format.frame_rate_fps(), Some(50.0));
        assert_eq!(info.codec_format.unwrap().codec.as_deref(), Some("ProRes:HQ"));
    }

    #[test]
    fn parse_clip_with_numeric_frame_rate() {
        let clip: TransportClip = serde_json::from_str(
            r#"{"clip": {"videoFormat": {"width": 3840, "height": 2160, "frameRate": 29.97}}}"#,
        )
        .unwrap();

        let format = clip.clip.unwrap().video_format.unwrap();
        assert_eq!(format.frame_rate_fps(), Some(29.97));
    }

    #[test]
    fn parse_clip_without_input() {
        // A deck with no signal reports a null clip; nothing should error.
        let clip: TransportClip = serde_json::from_str(r#"{"clip": null}"#).unwrap();
        assert!(clip.clip.is_none());
    }

    #[test]
    fn parse_input_video_source() {
        let source: InputVideoSource =
            serde_json::from_str(r#"{"inputVideoSource": "SDI"}"#).unwrap();
        assert_eq!(source.input_video_source.as_deref(), Some("SDI"));
    }
}
