//! BlackMagic device adapter.

pub mod client;

use super::{Device, DeviceKind, MediaInfo, RecordStatus};
use crate::config::ConnectionConfig;
use anyhow::Result;
use client::BlackMagicClient;

/// A BlackMagic recorder reachable over its REST control API.
pub struct BlackMagicDevice {
    client: BlackMagicClient,
}

impl BlackMagicDevice {
    /// Probe the device with a record-state query; only a device that
    /// answers it is considered connected.
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        let client = BlackMagicClient::new(&config.host, config.blackmagic_port());
        client.get_record()?;
        Ok(Self { client })
    }
}

impl Device for BlackMagicDevice {
    fn kind(&self) -> DeviceKind {
        DeviceKind::BlackMagic
    }

    fn record_status(&mut self) -> Result<RecordStatus> {
        // Record state and timecode are one atomic status fetch: if the
        // timecode query fails the whole tick counts as errored for this
        // connection.
        let recording = self.client.get_record()?;
        let timecode = self.client.get_timecode()?;
        Ok(RecordStatus {
            recording,
            paused: None,
            timecode: timecode.select(recording).map(str::to_string),
        })
    }

    fn toggle_record(&mut self) -> Result<()> {
        self.client.toggle_record().map(|_| ())
    }

    fn toggle_pause(&mut self) -> Result<()> {
        anyhow::bail!("BlackMagic devices do not expose a pause control")
    }

    fn start_record(&mut self) -> Result<()> {
        self.client.set_record(true)
    }

    fn stop_record(&mut self) -> Result<()> {
        self.client.set_record(false)
    }

    fn media_info(&mut self) -> Result<MediaInfo> {
        // Each sub-fetch fails independently; a deck without input still
        // registers, it just shows empty format fields.
        let mut info = MediaInfo::default();

        if let Ok(clip) = self.client.get_clip() {
            if let Some(clip) = clip.clip {
                if let Some(format) = clip.video_format {
                    info.resolution = format.resolution();
                    info.frame_rate = format.frame_rate_fps();
                }
                if let Some(codec) = clip.codec_format {
                    info.codec = codec.codec;
                }
            }
        }
        if let Ok(source) = self.client.get_input_video_source() {
            info.input_source = source;
        }

        Ok(info)
    }

    fn identify(&mut self) -> Result<()> {
        self.client.identify()
    }
}
