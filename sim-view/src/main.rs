//! Application entry point for the wobbling tree viewer.
//!
//! This binary sets up eframe/egui and delegates all interactive
//! logic and rendering to [`Viewer`] from the `viewer` module. Natively it
//! opens a window; on `wasm32` it attaches to an existing `<canvas>`.

mod viewer;

use sim_core::Config;
use viewer::Viewer;

// ============================================================================
// Native entry point
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
#[derive(clap::Parser)]
#[command(name = "wobble-tree")]
#[command(about = "Physics-driven tree graph that wobbles on springs")]
#[command(version)]
struct Cli {
    /// JSON config preset; missing fields use defaults
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Seed for layout jitter and leaf placement
    #[arg(long)]
    seed: Option<u64>,
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    use anyhow::Context;
    use clap::Parser;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,sim_core=debug")),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            Config::from_json(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => Config::default(),
    };
    if cli.seed.is_some() {
        cfg.seed = cli.seed;
    }

    let viewer = Viewer::new(cfg)?;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_title("Wobble Tree"),
        ..Default::default()
    };

    eframe::run_native("Wobble Tree", options, Box::new(|_cc| Ok(Box::new(viewer))))
        .map_err(|e| anyhow::anyhow!("eframe: {e}"))
}

// ============================================================================
// WASM entry point
// ============================================================================

#[cfg(target_arch = "wasm32")]
const CANVAS_ID: &str = "wobble-tree-canvas";

#[cfg(target_arch = "wasm32")]
fn main() {
    use wasm_bindgen::JsCast;

    // Redirect panic messages to console.error
    console_error_panic_hook::set_once();
    eframe::WebLogger::init(log::LevelFilter::Debug).ok();

    wasm_bindgen_futures::spawn_local(async {
        let document = web_sys::window()
            .expect("No window")
            .document()
            .expect("No document");

        let canvas = document
            .get_element_by_id(CANVAS_ID)
            .expect("No canvas element with id 'wobble-tree-canvas'")
            .dyn_into::<web_sys::HtmlCanvasElement>()
            .expect("Element is not a canvas");

        let viewer = match Viewer::new(Config::default()) {
            Ok(v) => v,
            Err(e) => {
                log::error!("failed to build tree: {e}");
                return;
            }
        };

        eframe::WebRunner::new()
            .start(
                canvas,
                eframe::WebOptions::default(),
                Box::new(|_cc| Ok(Box::new(viewer))),
            )
            .await
            .expect("Failed to start eframe");
    });
}
