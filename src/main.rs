use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use leafcrop::geometry::{DisplayRect, Size};
use leafcrop::CropRequest;

/// Cut one product out of a leaflet image and add it to the stored session.
#[derive(Parser)]
#[command(name = "leafcrop", version)]
struct Cli {
    /// Leaflet image (any format the image crate decodes)
    image: PathBuf,
    /// Selection origin and size in display pixels
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    /// Display width of the image; defaults to its native width
    css_width: Option<f64>,
    /// Display height of the image; defaults to its native height
    css_height: Option<f64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let source = image::open(&cli.image)
        .with_context(|| format!("failed to open {}", cli.image.display()))?
        .to_rgba8();
    let css_size = match (cli.css_width, cli.css_height) {
        (None, None) => None,
        (width, height) => Some(Size::new(
            width.unwrap_or(f64::from(source.width())),
            height.unwrap_or(f64::from(source.height())),
        )),
    };

    let outcome = leafcrop::run(CropRequest {
        source,
        selection: DisplayRect::new(cli.x, cli.y, cli.width, cli.height),
        css_size,
    })?;
    println!("{}\t{}", outcome.product_id, outcome.image_path.display());
    Ok(())
}
