//! Offline placement tool: probes or commits a structure template into a
//! virtual world and prints the result as JSON.
//!
//! Usage: cargo run --bin place_structure -- --template <PATH> [OPTIONS]
//!
//! Options:
//!   --template <PATH>   Structure template JSON (required)
//!   --config <PATH>     Engine config JSON (default: built-in defaults)
//!   --at <X,Y,Z>        Lower corner (default: 0,0,0)
//!   --rotate <DEG>      0, 90, 180 or 270 (default: 0)
//!   --mirror            Mirror along x before rotating
//!   --seed <SEED>       Number or phrase (default: random)
//!   --suggest           Probe only, do not write

use std::process::ExitCode;

use serde_json::json;

use rkforge::core::logging;
use rkforge::core::types::{IVec3, SessionId};
use rkforge::core::EngineConfig;
use rkforge::dispatch::{Dispatched, Dispatcher, GenerateCommand, WorldTarget};
use rkforge::generation::Placement;
use rkforge::math::{Rotation, Transform};
use rkforge::selection::SelectionStore;
use rkforge::structure::{Structure, StructureRegistry};
use rkforge::operation::OperationQueue;
use rkforge::voxel::{VirtualWorld, WorldId};

const TEMPLATE_ID: &str = "template";

fn main() -> ExitCode {
    logging::init();

    let args: Vec<String> = std::env::args().collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            log::error!("{}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let template_path = parse_str_arg(args, "--template").ok_or("--template <PATH> is required")?;
    let config = match parse_str_arg(args, "--config") {
        Some(path) => EngineConfig::load(&path).map_err(|e| format!("config {}: {}", path, e))?,
        None => EngineConfig::default(),
    };

    let text = std::fs::read_to_string(&template_path).map_err(|e| format!("{}: {}", template_path, e))?;
    let structure = Structure::from_json(&text).map_err(|e| format!("{}: {}", template_path, e))?;

    let lower = parse_ivec3_arg(args, "--at").unwrap_or(IVec3::ZERO);
    let degrees = parse_i32_arg(args, "--rotate").unwrap_or(0);
    let rotation = Rotation::from_degrees(degrees).ok_or_else(|| format!("unsupported rotation {}", degrees))?;
    let transform = Transform::new(rotation, args.iter().any(|a| a == "--mirror"));

    let registry = StructureRegistry::new();
    registry.register(TEMPLATE_ID, structure).map_err(|e| e.to_string())?;

    let (min_y, max_y) = config.height_range();
    let dispatcher = Dispatcher::new(
        registry.into(),
        SelectionStore::new().into(),
        OperationQueue::new(),
        config,
    );

    let session = SessionId(0);
    let mut command = GenerateCommand::new(TEMPLATE_ID, Placement::At(lower)).with_transform(transform);
    if let Some(seed) = parse_str_arg(args, "--seed") {
        command = command.with_seed(seed);
    }
    if args.iter().any(|a| a == "--suggest") {
        command = command.suggest_only();
    }

    let mut world = VirtualWorld::new(WorldId(0), min_y, max_y);
    let dispatched = dispatcher
        .generate(session, &command, WorldTarget::Offline(&mut world))
        .map_err(|e| e.to_string())?;

    let report = match dispatched {
        Dispatched::Applied(result) | Dispatched::Suggested(result) => json!({
            "status": format!("{:?}", result.maturity).to_lowercase(),
            "transform": result.transform.to_string(),
            "min": result.bounds.min().to_array(),
            "max": result.bounds.max().to_array(),
            "instance": result.instance,
            "voxels_written": result.voxels_written,
            "blocks": world
                .blocks_in(&result.bounds)
                .iter()
                .map(|(pos, state)| json!({ "pos": pos.to_array(), "state": state.to_string() }))
                .collect::<Vec<_>>(),
        }),
        Dispatched::Infeasible(reason) => json!({
            "status": "infeasible",
            "reason": reason.to_string(),
        }),
        Dispatched::Queued { .. } => return Err("offline placement was queued".to_string()),
    };

    let pretty = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
    println!("{}", pretty);
    Ok(())
}

fn parse_i32_arg(args: &[String], flag: &str) -> Option<i32> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn parse_ivec3_arg(args: &[String], flag: &str) -> Option<IVec3> {
    let text = parse_str_arg(args, flag)?;
    let parts: Vec<i32> = text.split(',').map(|p| p.trim().parse().ok()).collect::<Option<_>>()?;
    match parts.as_slice() {
        &[x, y, z] => Some(IVec3::new(x, y, z)),
        _ => None,
    }
}
