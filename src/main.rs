use clap::Parser;
use dusk_ngin::{
    config::{RenderPath, Settings},
    flow,
    scene::DemoScene,
};

#[derive(Parser, Debug)]
#[command(name = "dusk", about = "Day/night renderer demo with forward and deferred lighting")]
struct Cli {
    /// Start on the deferred path instead of the forward one
    #[arg(long)]
    deferred: bool,

    /// Clock units per real second, a full day is 24000 units
    #[arg(long)]
    time_scale: Option<f32>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Keep the cursor free; hold the right mouse button to look around
    #[arg(long)]
    no_capture: bool,

    /// OBJ model to load, relative to the asset root
    #[arg(long)]
    model: Option<String>,
}

impl Cli {
    fn into_settings(self) -> Settings {
        let mut settings = Settings::default();
        if self.deferred {
            settings.render_path = RenderPath::Deferred;
        }
        if let Some(time_scale) = self.time_scale {
            settings.time_scale = time_scale;
        }
        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if self.no_capture {
            settings.capture_cursor = false;
        }
        if let Some(model) = self.model {
            settings.model = model;
        }
        settings
    }
}

fn main() -> anyhow::Result<()> {
    let settings = Cli::parse().into_settings();
    flow::run(settings, vec![DemoScene::constructor()])
}
