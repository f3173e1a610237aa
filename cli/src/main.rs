use std::path::PathBuf;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use gemdig_core::*;
use rand::prelude::*;

use crate::settings::{JsonProgress, Settings};

mod render;
mod settings;

/// Headless driver for the gem digging engine.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,

    /// Seed for every random choice, taken from the clock when omitted
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Stage catalog as JSON, the built-in stages when omitted
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Engine settings as TOML
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Progress file, created on first save
    #[arg(long, global = true)]
    progress: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the stages of the catalog
    Stages,
    /// Print the catalog as JSON
    Catalog,
    /// Pack every gem of a stage up front and print the layout
    Pack {
        #[arg(long)]
        stage: StageId,
    },
    /// Dig through a stage in random order
    Play {
        /// Stage to play, the furthest reached one when omitted
        #[arg(long)]
        stage: Option<StageId>,
        /// Stop after this many accepted digs
        #[arg(long)]
        digs: Option<usize>,
        /// Go on with the next stage after each clear
        #[arg(long)]
        all: bool,
        /// Show covered gems and dynamite on the final board
        #[arg(long)]
        peek: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .parse_default_env()
        .init();

    let seed = cli.seed.unwrap_or_else(clock_seed);
    log::info!("Seed {seed}");
    let catalog = settings::load_catalog(cli.catalog.as_deref())?;
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Command::Stages => {
            list_stages(&catalog)?;
            Ok(())
        }
        Command::Catalog => {
            println!("{}", catalog.to_json_string()?);
            Ok(())
        }
        Command::Pack { stage } => pack(&catalog, &settings, stage, seed),
        Command::Play {
            stage,
            digs,
            all,
            peek,
        } => {
            let progress = JsonProgress::open(cli.progress)?;
            play(catalog, &settings, progress, seed, stage, digs, all, peek)
        }
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

fn list_stages(catalog: &Catalog) -> anyhow::Result<()> {
    for stage in catalog.stages() {
        let mut gems = Vec::with_capacity(stage.gems.len());
        for request in &stage.gems {
            let shape = catalog.gem_shape(request.shape)?;
            gems.push(format!(
                "{}x{} x{} {:?}",
                shape.width, shape.height, request.count, request.orientation
            ));
        }
        let reward = catalog
            .reward(stage.id)
            .map_or_else(|| "none".to_owned(), |reward| format!("{} pickaxes", reward.amount));
        println!(
            "stage {}: {}x{}, {} dynamite, gems [{}], reward {reward}",
            stage.id,
            stage.width,
            stage.height,
            stage.dynamite,
            gems.join(", ")
        );
    }
    Ok(())
}

fn pack(catalog: &Catalog, settings: &Settings, id: StageId, seed: u64) -> anyhow::Result<()> {
    let engine = settings.engine.with_placement(PlacementMode::Upfront);
    let mut rng = SmallRng::seed_from_u64(seed);
    let stage = Stage::load(catalog, id, &engine, &mut rng)
        .with_context(|| format!("Stage {id} cannot be packed"))?;

    print!("{}", render::board(stage.board(), true));
    for gem in stage.pool().gems() {
        if let Some(rect) = gem.placement() {
            let footprint = gem.footprint();
            println!(
                "gem {}: shape {} at {:?}, {}x{}{}",
                gem.id(),
                gem.shape().id,
                rect.origin,
                footprint.width,
                footprint.height,
                if footprint.rotated { " rotated" } else { "" }
            );
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn play(
    catalog: Catalog,
    settings: &Settings,
    progress: JsonProgress,
    seed: u64,
    stage: Option<StageId>,
    digs: Option<usize>,
    all: bool,
    peek: bool,
) -> anyhow::Result<()> {
    let ledger = PickaxeLedger::new(settings.pickaxes);
    let mut session = StageSession::new(catalog, ledger, progress, settings.engine, seed);
    // dig order comes from its own stream, the session rng stays the engine's
    let mut picker = SmallRng::seed_from_u64(seed.rotate_left(32));
    let mut clock = Instant::now();
    let mut budget = digs.unwrap_or(usize::MAX);

    match stage {
        Some(id) => session.load_stage(id)?,
        None => session.resume()?,
    };

    loop {
        let cleared = dig_stage(&mut session, &mut picker, &mut clock, &mut budget);
        print_events(&mut session);
        if let Some(stage) = session.stage() {
            print!("{}", render::board(stage.board(), peek));
            println!(
                "{}/{} gem(s) collected, {} pickaxe(s) left",
                stage.pool().collected_count(),
                stage.pool().total(),
                session.ledger().balance()
            );
        }
        let Some(id) = session.current_stage_id().filter(|_| cleared) else {
            break;
        };

        if session.is_reward_available(id) {
            session.claim_reward(id)?;
        }
        if !all || session.load_next_stage()?.is_none() {
            print_events(&mut session);
            break;
        }
    }

    let (_, _, mut progress) = session.into_parts();
    progress.save()
}

/// Digs covered cells in random order. Returns `true` once the stage is cleared.
fn dig_stage(
    session: &mut StageSession<Catalog, PickaxeLedger, JsonProgress>,
    picker: &mut SmallRng,
    clock: &mut Instant,
    budget: &mut usize,
) -> bool {
    let Some(stage) = session.stage() else {
        return false;
    };
    let mut covered: Vec<Coord2> = stage
        .board()
        .iter()
        .filter(|(_, cell)| !cell.is_revealed())
        .map(|(coords, _)| coords)
        .collect();
    covered.shuffle(picker);
    let cooldown = session.config().dig_cooldown();

    for coords in covered {
        if *budget == 0 {
            println!("Dig budget used up");
            return false;
        }
        *clock += cooldown;
        match session.dig_cell_at(coords, *clock) {
            DigOutcome::Dug(report) => {
                *budget -= 1;
                if report.stage_completed {
                    return true;
                }
            }
            DigOutcome::Rejected(DigRejection::AlreadyRevealed) => {}
            DigOutcome::Rejected(DigRejection::NotEnoughPickaxes { needed, available }) => {
                println!("Out of pickaxes: need {needed}, have {available}");
                return false;
            }
            DigOutcome::Rejected(reason) => {
                log::warn!("Dig at {coords:?} rejected: {reason:?}");
                return false;
            }
        }
        print_events(session);
    }
    false
}

fn print_events<C, L, P>(session: &mut StageSession<C, L, P>)
where
    C: StageCatalog,
    L: ResourceLedger,
    P: ProgressStore,
{
    for event in session.drain_events() {
        match event {
            GameEvent::StageChanged(id) => println!("== stage {id} =="),
            GameEvent::GemSpawned { placement, rung } if rung.is_fallback() => println!(
                "gem {} appeared at {:?} ({rung:?})",
                placement.gem, placement.rect.origin
            ),
            GameEvent::GemSpawned { .. } => {}
            GameEvent::GemCollected(gem) => println!("gem {gem} collected"),
            GameEvent::DynamiteExploded(coords) => println!("dynamite exploded at {coords:?}"),
            GameEvent::NeedMorePickaxes { .. } => {}
            GameEvent::StageCompleted(id) => println!("stage {id} cleared"),
            GameEvent::AllStagesCompleted => println!("all stages completed"),
            GameEvent::RewardClaimed(reward) => {
                println!("claimed {} pickaxe(s) for stage {}", reward.amount, reward.stage)
            }
        }
    }
}
