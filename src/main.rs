use anyhow::{anyhow, Context, Result};
use clap::Parser;
use multirecorder::app::{MultiRecorderApp, PanelOptions};
use multirecorder::config::Config;
use multirecorder::pacing::DEFAULT_TARGET_HZ;
use multirecorder::registry::Registry;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "multirecorder", about = "Control panel for OBS and BlackMagic recorders")]
struct Cli {
    /// Path to the connections config file
    #[arg(short = 'c', long = "config-file", default_value = "config.toml")]
    config_file: String,

    /// Fetch a startup preview screenshot for each OBS connection
    #[arg(short = 'p', long = "show-previews")]
    show_previews: bool,

    /// Show the measured frame rate in the window title
    #[arg(short = 'f', long = "show-fps")]
    show_fps: bool,

    /// Target GUI frame rate (also the poll rate)
    #[arg(long = "target-framerate", default_value_t = DEFAULT_TARGET_HZ)]
    target_framerate: u32,

    /// Show the record directory input for OBS connections
    #[arg(short = 'd', long = "record-directory")]
    record_directory: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let config = Config::load(std::path::Path::new(&cli.config_file))
        .with_context(|| format!("Failed to load config from {}", cli.config_file))?;
    info!(
        "Loaded config with {} configured connection(s)",
        config.total_connections()
    );

    let registry = Registry::connect_all(&config);
    info!("{} connection(s) active", registry.active_count());

    let options = PanelOptions {
        show_fps: cli.show_fps,
        show_previews: cli.show_previews,
        show_record_directory: cli.record_directory,
        target_framerate: cli.target_framerate,
    };

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([900.0, 700.0]),
        ..Default::default()
    };

    eframe::run_native(
        "MultiRecorder",
        native_options,
        Box::new(move |cc| Ok(Box::new(MultiRecorderApp::new(cc, registry, options)))),
    )
    .map_err(|e| anyhow!("GUI error: {e}"))
}
