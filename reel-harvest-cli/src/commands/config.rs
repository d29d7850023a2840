use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use reel_harvest_lib::{load_settings_string, settings_path};

use super::Session;

/// Show the resolved settings and the file they were read from.
pub(crate) fn run_config_show(session: &Session) {
    let path = settings_path();

    log::info!(
        "{}",
        "Harvest Configuration".if_supports_color(Stdout, |t| t.bold()),
    );
    crate::log_blank();

    if path.exists() {
        log::info!(
            "  Settings file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(exists)".if_supports_color(Stdout, |t| t.green()),
        );
    } else {
        log::info!(
            "  Settings file: {} {}",
            path.display().if_supports_color(Stdout, |t| t.cyan()),
            "(not found, using defaults)".if_supports_color(Stdout, |t| t.dimmed()),
        );
    }
    crate::log_blank();

    let harvest = &session.settings.harvest;
    let paths = &session.settings.paths;
    let in_flight = harvest
        .max_in_flight
        .map_or_else(|| "serial".to_string(), |n| n.to_string());
    let fields: [(&str, String); 11] = [
        ("site", harvest.site.clone()),
        ("workers", harvest.workers.to_string()),
        ("flush_every", harvest.flush_every.to_string()),
        ("verify_threshold", harvest.verify_threshold.to_string()),
        (
            "min_request_interval_ms",
            harvest.min_request_interval_ms.to_string(),
        ),
        ("max_in_flight", in_flight),
        ("request_timeout_secs", harvest.request_timeout_secs.to_string()),
        ("task_timeout_secs", harvest.task_timeout_secs.to_string()),
        ("user_agent", harvest.user_agent.clone()),
        ("checkpoint", paths.checkpoint.display().to_string()),
        ("log_dir", paths.log_dir.display().to_string()),
    ];
    for (key, value) in fields {
        log::info!("  {:<24} {}", key, value);
    }

    if let Some(contents) = load_settings_string() {
        crate::log_blank();
        log::info!("{}", "File contents".if_supports_color(Stdout, |t| t.bold()));
        for line in contents.lines() {
            log::info!("  {}", line.if_supports_color(Stdout, |t| t.dimmed()));
        }
    }
}

/// Print the settings file path (for scripting).
pub(crate) fn run_config_path() {
    log::info!("{}", settings_path().display());
}
