//! The control-panel GUI.
//!
//! One `update` is one tick: poll every connection, refresh the aggregate
//! line if it changed, rebuild the widgets from the snapshots, then hand
//! the remaining frame budget to the repaint scheduler. State flows one
//! way per tick (registry -> snapshots -> widgets); commands flow back
//! through the buttons.

use crate::commands::{self, CommandFailure};
use crate::pacing::{FramePacer, MAX_TARGET_HZ, MIN_TARGET_HZ};
use crate::poller::{poll_tick, AggregateTracker, RecordState};
use crate::preview;
use crate::registry::Registry;
use eframe::egui;
use std::collections::HashMap;
use tracing::warn;

const WHITE: egui::Color32 = egui::Color32::from_rgb(255, 255, 255);
const RED: egui::Color32 = egui::Color32::from_rgb(255, 0, 0);
const YELLOW: egui::Color32 = egui::Color32::from_rgb(255, 255, 0);
const GREEN: egui::Color32 = egui::Color32::from_rgb(0, 200, 0);

/// Display width of one preview image.
const PREVIEW_WIDTH: f32 = 400.0;

fn state_color(state: RecordState) -> egui::Color32 {
    match state {
        RecordState::Recording => GREEN,
        RecordState::Paused => YELLOW,
        RecordState::NotRecording => RED,
        RecordState::Error => RED,
    }
}

/// Panel behavior toggles, straight from the CLI.
#[derive(Debug, Clone)]
pub struct PanelOptions {
    pub show_fps: bool,
    pub show_previews: bool,
    pub show_record_directory: bool,
    pub target_framerate: u32,
}

pub struct MultiRecorderApp {
    registry: Registry,
    aggregate: AggregateTracker,
    pacer: FramePacer,
    options: PanelOptions,
    /// Aggregate line, rebuilt only when the counts change.
    aggregate_text: String,
    show_failed_modal: bool,
    /// Preview textures keyed by connection index.
    previews: HashMap<usize, egui::TextureHandle>,
    record_dir_input: String,
    record_dir_hint: String,
    /// Names from the most recent failed batch command, if any.
    command_errors: Option<String>,
}

impl MultiRecorderApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        mut registry: Registry,
        options: PanelOptions,
    ) -> Self {
        let previews = if options.show_previews {
            fetch_previews(&cc.egui_ctx, &mut registry)
        } else {
            HashMap::new()
        };

        let show_failed_modal = registry.any_failed();
        let aggregate = AggregateTracker::new(registry.active_count());

        Self {
            registry,
            aggregate,
            pacer: FramePacer::new(options.target_framerate),
            options,
            aggregate_text: String::new(),
            show_failed_modal,
            previews,
            record_dir_input: String::new(),
            record_dir_hint: "Record Directory".to_string(),
            command_errors: None,
        }
    }

    fn note_failures(&mut self, failures: Vec<CommandFailure>) {
        if failures.is_empty() {
            self.command_errors = None;
        } else {
            let names: Vec<&str> = failures.iter().map(|f| f.name.as_str()).collect();
            self.command_errors = Some(format!("Command failed for: {}", names.join(", ")));
        }
    }

    fn failed_modal(&mut self, ctx: &egui::Context) {
        if !self.show_failed_modal {
            return;
        }
        let mut open = true;
        egui::Window::new("Connections Failed")
            .collapsible(false)
            .resizable(false)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label("The following failed to connect:");
                for failed in &self.registry.failed {
                    ui.label(format!(
                        " - {} - {}",
                        failed.config.name,
                        failed.endpoint()
                    ));
                }
                ui.separator();
                ui.label("Make sure the config file is correct.");
                ui.label("OBS: Make sure WebSocket is configured.");
                ui.label("BlackMagic: Make sure remote is enabled.");
                ui.label("BlackMagic: Check input is working.");
            });
        self.show_failed_modal = open;
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Record All").clicked() {
                let failures = commands::record_all(&mut self.registry.connections);
                self.note_failures(failures);
            }
            if ui.button("Stop All").clicked() {
                let failures = commands::stop_all(&mut self.registry.connections);
                self.note_failures(failures);
            }
            ui.label(&self.aggregate_text);
        });
        if let Some(errors) = &self.command_errors {
            ui.colored_label(RED, errors);
        }
    }

    fn connection_sections(&mut self, ui: &mut egui::Ui) {
        use crate::devices::DeviceKind;

        for kind in [DeviceKind::Obs, DeviceKind::BlackMagic] {
            // A kind with zero active connections gets no section at all.
            if self.registry.kind_count(kind) == 0 {
                continue;
            }
            egui::CollapsingHeader::new(kind.to_string())
                .default_open(true)
                .show(ui, |ui| {
                    for idx in 0..self.registry.connections.len() {
                        if self.registry.connections[idx].kind != kind {
                            continue;
                        }
                        self.connection_table(ui, idx);
                        if let Some(texture) = self.previews.get(&idx) {
                            let size = texture.size_vec2();
                            let scaled =
                                egui::vec2(PREVIEW_WIDTH, PREVIEW_WIDTH * size.y / size.x);
                            ui.add(egui::Image::new(texture).fit_to_exact_size(scaled));
                        }
                        ui.add_space(8.0);
                    }
                });
        }
    }

    fn connection_table(&mut self, ui: &mut egui::Ui, idx: usize) {
        let conn = &mut self.registry.connections[idx];
        let snapshot = conn.snapshot.clone();
        let state = snapshot.state();
        let endpoint = conn.endpoint();

        egui::Grid::new(format!("conn_{idx}"))
            .num_columns(2)
            .min_col_width(180.0)
            .striped(true)
            .show(ui, |ui| {
                ui.strong(&conn.config.name);
                ui.strong(endpoint);
                ui.end_row();

                let resolution = conn.media.resolution.clone().unwrap_or_else(|| "Error!".into());
                let fps = conn
                    .media
                    .frame_rate
                    .map(|f| format!("{f} FPS"))
                    .unwrap_or_else(|| "Error!".into());
                ui.label(resolution);
                ui.label(fps);
                ui.end_row();

                if conn.kind == crate::devices::DeviceKind::BlackMagic {
                    let input = conn.media.input_source.clone().unwrap_or_else(|| "Error!".into());
                    let codec = conn.media.codec.clone().unwrap_or_else(|| "Error!".into());
                    ui.label(input);
                    ui.label(codec);
                    ui.end_row();
                }

                ui.colored_label(state_color(state), state.label());
                if ui.button("Toggle Recording").clicked() {
                    if let Err(e) = commands::toggle_record(conn) {
                        warn!("Toggle recording for {} failed: {:#}", conn.config.name, e);
                    }
                }
                ui.end_row();

                if conn.device.supports_pause() {
                    let pause_color = if snapshot.errored { RED } else { state_color(state) };
                    ui.colored_label(pause_color, snapshot.pause_label());
                    if ui.button("Pause/Resume").clicked() {
                        if let Err(e) = commands::toggle_pause(conn) {
                            warn!("Toggle pause for {} failed: {:#}", conn.config.name, e);
                        }
                    }
                    ui.end_row();
                }

                ui.label("Recording Length:");
                if snapshot.errored {
                    ui.colored_label(RED, "Error!");
                } else {
                    let timecode = snapshot.timecode.as_deref().unwrap_or("00:00:00");
                    ui.colored_label(WHITE, timecode);
                }
                ui.end_row();

                if conn.kind == crate::devices::DeviceKind::BlackMagic {
                    ui.label("");
                    if ui.button("Identify").clicked() {
                        if let Err(e) = commands::identify(conn) {
                            warn!("Identify for {} failed: {:#}", conn.config.name, e);
                        }
                    }
                    ui.end_row();
                }
            });
    }

    fn settings_section(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("Status & Settings")
            .default_open(true)
            .show(ui, |ui| {
                let mut hz = self.pacer.target_hz();
                ui.add(
                    egui::Slider::new(&mut hz, MIN_TARGET_HZ..=MAX_TARGET_HZ)
                        .text("GUI Target Framerate"),
                );
                self.pacer.set_target_hz(hz);

                if self.options.show_record_directory {
                    ui.horizontal(|ui| {
                        ui.add(
                            egui::TextEdit::singleline(&mut self.record_dir_input)
                                .hint_text(&self.record_dir_hint),
                        );
                        if ui.button("Enter").clicked() && !self.record_dir_input.is_empty() {
                            let base = std::path::PathBuf::from(&self.record_dir_input);
                            let failures = commands::set_record_directory_all(
                                &mut self.registry.connections,
                                &base,
                            );
                            if failures.is_empty() {
                                self.record_dir_hint = self.record_dir_input.clone();
                                self.record_dir_input.clear();
                            }
                            self.note_failures(failures);
                        }
                    });
                }
            });
    }
}

impl eframe::App for MultiRecorderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.pacer.begin_tick();

        // Poll phase: one status fetch per connection, failures isolated.
        poll_tick(&mut self.registry.connections);
        if let Some(counts) = self
            .aggregate
            .update(self.registry.connections.iter().map(|c| &c.snapshot))
        {
            self.aggregate_text = counts.to_string();
        }

        if self.options.show_fps {
            let fps = 1.0 / ctx.input(|i| i.stable_dt).max(f32::EPSILON);
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(format!(
                "MultiRecorder - {fps:.0} fps"
            )));
        }

        self.failed_modal(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.toolbar(ui);
                ui.separator();
                self.connection_sections(ui);
                self.settings_section(ui);
            });
        });

        // Render is done; sleep out the rest of the frame budget.
        ctx.request_repaint_after(self.pacer.remaining_budget());
    }
}

/// Fetch one startup screenshot per OBS connection. Failures skip that
/// preview only.
fn fetch_previews(
    ctx: &egui::Context,
    registry: &mut Registry,
) -> HashMap<usize, egui::TextureHandle> {
    let mut previews = HashMap::new();

    for (idx, conn) in registry.connections.iter_mut().enumerate() {
        if conn.kind != crate::devices::DeviceKind::Obs {
            continue;
        }
        let decoded = conn
            .device
            .screenshot()
            .and_then(|(data, _, _)| preview::decode_data_uri(&data));
        match decoded {
            Ok(image) => {
                let color_image = egui::ColorImage::from_rgba_unmultiplied(
                    [image.width as usize, image.height as usize],
                    &image.rgba,
                );
                let texture = ctx.load_texture(
                    format!("preview_{idx}"),
                    color_image,
                    egui::TextureOptions::LINEAR,
                );
                previews.insert(idx, texture);
            }
            Err(e) => {
                warn!("Preview for {} unavailable: {:#}", conn.config.name, e);
            }
        }
    }

    previews
}
