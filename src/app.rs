//! Command line driver standing in for the overlay host.
//!
//! Host events arrive on stdin as JSON lines; every `frame` event produces
//! one JSON line on stdout with the alert lines for that frame. Logs go to
//! stderr.

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::core::{
    alerts::{
        engine::{AlertEngine, AlertLine},
        loader::{AlertTables, RulesHandle},
    },
    audio::{RodioPlayer, SoundPlayer},
    config::{ConfigManager, Settings},
    model::{EntityId, EntityKind, EntitySnapshot},
};

/// Messages the host sends to the plugin.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    EntityAdded { entity: EntitySnapshot },
    Frame { entities: Vec<EntitySnapshot> },
    AreaChange,
    Reload,
    CopyDefaults,
    /// New plugin toggles from the host menu. Applied and saved.
    Settings { settings: Settings },
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    lines: &'a [AlertLine],
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Optional plugin folder from the command line (first argument).
fn plugin_dir_arg<I: IntoIterator<Item = String>>(args: I) -> Option<PathBuf> {
    args.into_iter()
        .nth(1)
        .filter(|arg| !arg.trim().is_empty())
        .map(PathBuf::from)
}

/// Saved settings from `config_dir`, with the plugin folder overridden
/// when one was given on the command line.
fn resolve_settings(config_dir: PathBuf, plugin_dir: Option<PathBuf>) -> (Settings, ConfigManager) {
    let config = ConfigManager::new(config_dir.clone());
    let mut settings = config.load();
    settings.config_dir = config_dir;
    if let Some(plugin_dir) = plugin_dir {
        settings.plugin_dir = plugin_dir;
    }
    (settings, config)
}

/// Entry point: `proximity-alert [PLUGIN_DIR]`.
pub fn run() -> io::Result<()> {
    init_logging();

    let (settings, config) = resolve_settings(Settings::default().config_dir, plugin_dir_arg(std::env::args()));

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(drive(settings, config))
}

async fn drive(settings: Settings, config: ConfigManager) -> io::Result<()> {
    let player: Arc<dyn SoundPlayer> = Arc::new(RodioPlayer::spawn()?);
    let rules = RulesHandle::new(AlertTables::load(&settings.alert_paths(), None));
    log::info!(
        "Proximity alerts started. Rules from {:?}, overrides in {:?}",
        settings.plugin_dir,
        settings.config_dir
    );
    let mut engine = AlertEngine::new(settings, rules, player);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let event: HostEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                log::warn!("Ignoring malformed host event: {}", e);
                continue;
            }
        };
        engine = handle_event(engine, &config, event).await?;
    }

    Ok(())
}

async fn handle_event(mut engine: AlertEngine, config: &ConfigManager, event: HostEvent) -> io::Result<AlertEngine> {
    match event {
        HostEvent::Settings { settings } => {
            if let Err(e) = config.save(&settings) {
                log::error!("Unable to save settings: {}", e);
            }
            engine.update_settings(settings);
        }
        HostEvent::EntityAdded { entity } => engine.entity_added(entity),
        HostEvent::AreaChange => engine.area_change(),
        HostEvent::Reload => engine.reload(),
        HostEvent::CopyDefaults => match engine.copy_default_configs() {
            Ok(copied) => log::info!("Copied {} default config(s): {:?}", copied.len(), copied),
            Err(e) => log::error!("Unable to copy default configs: {}", e),
        },
        HostEvent::Frame { entities } => {
            let monsters: Vec<EntitySnapshot> = entities
                .iter()
                .filter(|e| e.kind == EntityKind::Monster)
                .cloned()
                .collect();

            engine = if engine.settings().enable_multithreading {
                tokio::task::spawn_blocking(move || {
                    engine.tick(&monsters);
                    engine
                })
                .await
                .map_err(io::Error::other)?
            } else {
                engine.tick(&monsters);
                engine
            };

            let alert_lines = engine.render_pass(&entities);
            let live: HashSet<EntityId> = entities.iter().map(|e| e.id).collect();
            engine.retain_entities(&live);
            write_frame(&alert_lines).await?;
        }
    }
    Ok(engine)
}

async fn write_frame(lines: &[AlertLine]) -> io::Result<()> {
    let mut bytes = serde_json::to_vec(&FrameOutput { lines })?;
    bytes.push(b'\n');
    let mut stdout = tokio::io::stdout();
    stdout.write_all(&bytes).await?;
    stdout.flush().await
}
