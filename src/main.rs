use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use croptag::config::{load_settings, TagConfig};
use croptag::replay::{parse_script, replay};

fn main() -> anyhow::Result<()> {
    let settings = load_settings();
    croptag::logging::init(settings.debug_logging);

    let mut args = std::env::args_os().skip(1);
    let Some(script_path) = args.next().map(PathBuf::from) else {
        bail!("usage: croptag <script.json>");
    };

    let contents = std::fs::read_to_string(&script_path)
        .with_context(|| format!("failed to read {}", script_path.display()))?;
    let script = parse_script(&contents)
        .with_context(|| format!("failed to parse {}", script_path.display()))?;
    let config = TagConfig::from_settings(&settings).context("invalid settings in config.json")?;
    let base_dir = script_path.parent().unwrap_or_else(|| Path::new("."));

    tracing::info!(
        script = %script_path.display(),
        images = script.images.len(),
        events = script.events.len(),
        "replaying gesture script"
    );
    let report = replay(&script, config, base_dir).context("gesture replay failed")?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
