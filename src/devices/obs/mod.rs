//! OBS Studio device adapter.

pub mod client;

use super::{Device, DeviceKind, MediaInfo, RecordStatus};
use crate::config::ConnectionConfig;
use anyhow::Result;
use client::ObsClient;
use std::time::Duration;

/// JPEG quality requested for screenshot previews.
const SCREENSHOT_QUALITY: i32 = 10;

/// An OBS Studio instance reachable over obs-websocket.
pub struct ObsDevice {
    client: ObsClient,
}

impl ObsDevice {
    /// Connect to the instance described by `config` with a bounded
    /// handshake.
    pub fn connect(config: &ConnectionConfig, timeout: Duration) -> Result<Self> {
        let client = ObsClient::connect(
            &config.host,
            config.obs_port(),
            config.password.clone(),
            timeout,
        )?;
        Ok(Self { client })
    }
}

impl Device for ObsDevice {
    fn kind(&self) -> DeviceKind {
        DeviceKind::Obs
    }

    fn record_status(&mut self) -> Result<RecordStatus> {
        let status = self.client.get_record_status()?;
        Ok(RecordStatus {
            recording: status.active,
            paused: Some(status.paused),
            timecode: status.timecode,
        })
    }

    fn toggle_record(&mut self) -> Result<()> {
        self.client.toggle_record()
    }

    fn toggle_pause(&mut self) -> Result<()> {
        self.client.toggle_record_pause()
    }

    fn start_record(&mut self) -> Result<()> {
        self.client.start_record()
    }

    fn stop_record(&mut self) -> Result<()> {
        self.client.stop_record()
    }

    fn media_info(&mut self) -> Result<MediaInfo> {
        // One RPC backs both fields, so they fill or stay empty together.
        let mut info = MediaInfo::default();
        if let Ok(settings) = self.client.get_video_settings() {
            info.resolution = Some(format!("{}x{}", settings.base_width, settings.base_height));
            info.frame_rate = Some(settings.fps());
        }
        Ok(info)
    }

    fn set_record_directory(&mut self, directory: &str) -> Result<()> {
        self.client.set_record_directory(directory)
    }

    /// Screenshot of the current program scene at base resolution.
    fn screenshot(&mut self) -> Result<(String, u32, u32)> {
        let settings = self.client.get_video_settings()?;
        let scene = self.client.get_current_program_scene()?;
        let data = self.client.get_source_screenshot(
            &scene,
            settings.base_width,
            settings.base_height,
            SCREENSHOT_QUALITY,
        )?;
        Ok((data, settings.base_width, settings.base_height))
    }
}
