//! Process entry point. Wires `ClipRegistry`/`UidRegistry`/`SliceManager`/
//! `OutputManager`/`SequenceEngine`/`SessionStore` together, spawns the
//! tick thread that owns the `Player`, and runs a line-oriented command
//! loop on the main thread, in the shape of `daw-backend/src/main.rs`'s
//! REPL (a controller issuing commands to an engine that owns playback on
//! its own thread).

mod commands;
mod engine_thread;
mod generators;

use commands::AppCommand;
use engine_thread::EngineThread;
use mve_control::{ControlPlane, CreateClipRequest};
use mve_playback::{BlendMode, EffectChainRunner, Player};
use mve_registry::{ClipRegistry, UidRegistry};
use mve_routing::{OutputManager, SliceManager};
use mve_sequencer::SequenceEngine;
use std::io::{self, Write};
use std::sync::Arc;

const DEFAULT_WIDTH: u32 = 1920;
const DEFAULT_HEIGHT: u32 = 1080;
const DEFAULT_FPS: f64 = 30.0;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let session_path = args.get(1).cloned().unwrap_or_else(|| "session.json".to_string());

    let uids = Arc::new(UidRegistry::new());
    let catalog: Arc<dyn mve_registry::EffectPluginCatalog> = Arc::new(EffectChainRunner::new());
    let clips = Arc::new(ClipRegistry::new(catalog, uids.clone()));
    let slices = Arc::new(SliceManager::new(DEFAULT_WIDTH, DEFAULT_HEIGHT));
    let outputs = Arc::new(OutputManager::new(slices.clone()));
    let sequences = Arc::new(SequenceEngine::new(clips.clone(), uids.clone()));
    let session = mve_session::SessionStore::open(&session_path);
    let control = ControlPlane::new(clips.clone(), outputs.clone(), slices.clone(), sequences.clone());

    log::info!("session file: {session_path}");

    let (tx, rx) = crossbeam_channel::unbounded::<AppCommand>();
    let engine_thread = EngineThread {
        player: Player::new(DEFAULT_WIDTH, DEFAULT_HEIGHT, DEFAULT_FPS),
        sequences: sequences.clone(),
        outputs: outputs.clone(),
        commands: rx,
        target_fps: DEFAULT_FPS,
    };
    let handle = std::thread::spawn(move || engine_thread.run());

    print_help();
    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush().ok();
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break; // EOF (e.g. piped input exhausted)
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match run_command(line, &control, &tx) {
            Ok(true) => break,
            Ok(false) => {}
            Err(e) => println!("error: {e}"),
        }
    }

    tx.send(AppCommand::Quit).ok();
    handle.join().ok();
    session.persist_now();
    println!("goodbye");
    Ok(())
}

/// Returns `Ok(true)` when the command loop should exit.
fn run_command(line: &str, control: &ControlPlane, tx: &crossbeam_channel::Sender<AppCommand>) -> anyhow::Result<bool> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        ["quit"] | ["q"] => return Ok(true),
        ["help"] | ["h"] => print_help(),
        ["create", generator, duration] => {
            let duration: u64 = duration.parse()?;
            let clip_id = control.create_clip(CreateClipRequest {
                path: None,
                generator_id: Some(generator.to_string()),
                duration,
            })?;
            println!("created clip {clip_id}");
        }
        ["addlayer", clip_id, blend, opacity] => {
            let clip_id = parse_clip_id(clip_id)?;
            let snapshot = control.get_clip(clip_id)?;
            let decoder = generators::build_decoder(&snapshot.source, snapshot.duration, DEFAULT_WIDTH, DEFAULT_HEIGHT)?;
            let blend_mode = parse_blend_mode(blend)?;
            let opacity: f32 = opacity.parse()?;
            tx.send(AppCommand::AddLayer {
                clip_id,
                blend_mode,
                opacity,
                decoder,
                trim: snapshot.trim,
            })?;
            println!("queued layer for clip {clip_id}");
        }
        ["play", clip_id] => tx.send(AppCommand::Play(parse_clip_id(clip_id)?))?,
        ["pause", clip_id] => tx.send(AppCommand::Pause(parse_clip_id(clip_id)?))?,
        ["seek", clip_id, pos] => tx.send(AppCommand::Seek(parse_clip_id(clip_id)?, pos.parse()?))?,
        ["outputs"] => {
            for summary in control.list_outputs() {
                println!(
                    "{}  enabled={}  source={}  slice={}  fps_cap={}",
                    summary.id, summary.enabled, summary.source, summary.slice_id, summary.fps_cap
                );
            }
        }
        ["register-display", id, monitor, w, h] => {
            control.outputs.register(mve_routing::OutputDef {
                id: mve_core::OutputId::new(*id),
                enabled: false,
                source: mve_routing::SourceSelector::Canvas,
                slice_id: mve_core::SliceId::full(),
                fps_cap: DEFAULT_FPS,
            });
            control
                .outputs
                .enable(&mve_core::OutputId::new(*id), Box::new(mve_routing::DisplayOutput::new(monitor.parse()?, (w.parse()?, h.parse()?))))?;
            println!("registered and enabled display output {id}");
        }
        ["register-artnet", id, ip, universe] => {
            control.outputs.register(mve_routing::OutputDef {
                id: mve_core::OutputId::new(*id),
                enabled: false,
                source: mve_routing::SourceSelector::Canvas,
                slice_id: mve_core::SliceId::full(),
                fps_cap: 40.0,
            });
            let config = mve_artnet::ArtNetConfig {
                target_ip: ip.parse()?,
                start_universe: universe.parse()?,
                channel_layout: Vec::new(),
                channel_order: mve_artnet::ChannelOrder::Rgb,
                correction: mve_artnet::ColorCorrection::default(),
                delta_enabled: true,
                delta_threshold: 2,
                full_frame_interval: 100,
            };
            control
                .outputs
                .enable(&mve_core::OutputId::new(*id), Box::new(mve_artnet::ArtNetOutput::new(config)))?;
            println!("registered and enabled artnet output {id}");
        }
        ["disable", id] => {
            control.outputs.disable(&mve_core::OutputId::new(*id))?;
            println!("disabled output {id}");
        }
        other => {
            println!("unknown command: {}. Type 'help' for commands.", other.join(" "));
        }
    }
    Ok(false)
}

fn parse_clip_id(s: &str) -> anyhow::Result<mve_core::ClipId> {
    Ok(mve_core::ClipId(uuid::Uuid::parse_str(s)?))
}

fn parse_blend_mode(s: &str) -> anyhow::Result<BlendMode> {
    Ok(match s {
        "normal" => BlendMode::Normal,
        "add" => BlendMode::Add,
        "multiply" => BlendMode::Multiply,
        "screen" => BlendMode::Screen,
        "overlay" => BlendMode::Overlay,
        "difference" => BlendMode::Difference,
        other => anyhow::bail!("unknown blend mode '{other}'"),
    })
}

fn print_help() {
    println!();
    println!("Clip commands:");
    println!("  create <generator> <duration>   - register a generator-backed clip (e.g. 'create solid:255,0,0,255 300')");
    println!("  addlayer <clip> <blend> <op>     - add the clip as a layer (blend: normal/add/multiply/screen/overlay/difference)");
    println!("  play <clip>                      - start the layer's transport");
    println!("  pause <clip>                     - pause the layer's transport");
    println!("  seek <clip> <frame>               - seek the layer's transport");
    println!("Output commands:");
    println!("  outputs                          - list registered outputs");
    println!("  register-display <id> <monitor> <w> <h>   - register and enable a display output");
    println!("  register-artnet <id> <ip> <universe>      - register and enable an Art-Net output");
    println!("  disable <id>                      - disable an output");
    println!("Other:");
    println!("  h, help                           - show this help");
    println!("  q, quit                           - persist the session and exit");
    println!();
}
