use std::path::{Path, PathBuf};

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use reel_harvest_assets::{MipmapOptions, generate_mipmaps, resize_banner};

use crate::error::CliError;

fn log_written(paths: &[PathBuf]) {
    for path in paths {
        log::info!(
            "  {} {}",
            "\u{2714}".if_supports_color(Stdout, |t| t.green()),
            path.display()
        );
    }
}

pub(crate) fn run_mipmaps(logo: &Path, name: &str, out: &Path) -> Result<(), CliError> {
    log::info!(
        "{} {}",
        "Launcher icons from".if_supports_color(Stdout, |t| t.bold()),
        logo.display()
    );
    let written = generate_mipmaps(logo, name, out, &MipmapOptions::default())
        .map_err(|e| CliError::asset(e.to_string()))?;
    log_written(&written);
    Ok(())
}

pub(crate) fn run_banner(image: &Path, name: &str, out: &Path) -> Result<(), CliError> {
    log::info!(
        "{} {}",
        "Banner from".if_supports_color(Stdout, |t| t.bold()),
        image.display()
    );
    let written = resize_banner(image, name, out).map_err(|e| CliError::asset(e.to_string()))?;
    log_written(&written);
    Ok(())
}
