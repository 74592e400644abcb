#![deny(warnings)]

//! Headless driver: load a save, replay a command script and/or run the live
//! ticker for a while, then save.

mod script;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use persistence::{FileStore, SqliteStore};
use sim_core::{EconomyState, SimConfig};
use sim_econ::{animal_listings, harvest_preview, plant_listings, Catalog, Listing};
use sim_runtime::{Commit, SharedSimulation, Simulation, Ticker};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    catalog: Option<PathBuf>,
    save_dir: Option<PathBuf>,
    db: Option<String>,
    seed: Option<u64>,
    script: Option<String>,
    live: Option<u64>,
    version: bool,
}

fn parse_args(argv: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    let mut it = argv.into_iter();
    while let Some(arg) = it.next() {
        let mut value = || it.next().with_context(|| format!("{arg} expects a value"));
        match arg.as_str() {
            "--config" => args.config = Some(value()?.into()),
            "--catalog" => args.catalog = Some(value()?.into()),
            "--save-dir" => args.save_dir = Some(value()?.into()),
            "--db" => args.db = Some(value()?),
            "--seed" => args.seed = Some(value()?.parse().context("--seed")?),
            "--script" => args.script = Some(value()?),
            "--live" => args.live = Some(value()?.parse().context("--live")?),
            "--version" => args.version = true,
            other => bail!("unknown argument `{other}`"),
        }
    }
    if args.save_dir.is_some() && args.db.is_some() {
        bail!("--save-dir and --db are mutually exclusive");
    }
    Ok(args)
}

enum Backend {
    Files(FileStore),
    Db(SqliteStore),
}

impl Backend {
    async fn open(args: &Args) -> Result<Self> {
        Ok(match (&args.db, &args.save_dir) {
            (Some(url), _) => Backend::Db(SqliteStore::connect(url).await?),
            (None, Some(dir)) => Backend::Files(FileStore::new(dir)),
            (None, None) => Backend::Files(FileStore::new(FileStore::default_dir())),
        })
    }

    async fn load(&self, key: &str) -> EconomyState {
        match self {
            Backend::Files(store) => persistence::load_state(store, key),
            Backend::Db(store) => store.load_state(key).await,
        }
    }

    async fn save(&mut self, key: &str, state: &EconomyState) -> Result<()> {
        match self {
            Backend::Files(store) => persistence::save_state(store, key, state)?,
            Backend::Db(store) => store.save_state(key, state).await?,
        }
        Ok(())
    }
}

fn load_config(args: &Args) -> Result<SimConfig> {
    let mut cfg = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        cfg.rng_seed = seed;
    }
    Ok(cfg)
}

fn announce_level_ups(sim: &SharedSimulation) {
    for up in sim.with(|s| s.drain_level_ups()) {
        info!(from = up.from, to = up.to, "Level up! You reached level {}", up.to);
    }
}

fn print_status(sim: &SharedSimulation) {
    let (state, stats) = sim.with(|s| (s.state().clone(), s.stats()));
    let p = &state.progression;
    println!(
        "Level {} | exp {}/{} | coins {} | plants {} | animals {} | harvest pays {} | ticks {} | passive {}",
        p.level,
        p.experience,
        p.experience_to_next(),
        state.currency,
        state.plants.len(),
        state.animals.len(),
        harvest_preview(&state),
        stats.ticks,
        stats.passive_income,
    );
    for plant in &state.plants {
        println!(
            "  plant {} {} | {} | water {}%",
            plant.id,
            plant.kind,
            plant.stage.label(),
            plant.water_level
        );
    }
    for animal in &state.animals {
        println!(
            "  animal {} {} | hunger {:.1} | happiness {:.1}",
            animal.id, animal.kind, animal.hunger, animal.happiness
        );
    }
}

fn print_listings(title: &str, listings: &[Listing]) {
    println!("{title}:");
    for l in listings {
        let state = if l.affordable { "Buy" } else { "Not enough coins" };
        println!("  [{}] {} - {} coins ({state})", l.index, l.label, l.price);
    }
}

fn print_shop(sim: &SharedSimulation) {
    let (plants, animals) = sim.with(|s| {
        (
            plant_listings(s.catalog(), s.state()),
            animal_listings(s.catalog(), s.state()),
        )
    });
    print_listings("Seeds", &plants);
    print_listings("Animals", &animals);
}

async fn run_script(
    text: &str,
    sim: &SharedSimulation,
    backend: &mut Backend,
    key: &str,
) -> Result<()> {
    for (n, raw) in text.lines().enumerate() {
        let line = match script::parse_line(raw) {
            Ok(Some(line)) => line,
            Ok(None) => continue,
            Err(e) => {
                warn!(line = n + 1, error = %e, "skipping script line");
                continue;
            }
        };
        match line {
            script::Line::Status => print_status(sim),
            script::Line::Shop => print_shop(sim),
            script::Line::Run(command, times) => {
                for _ in 0..times {
                    let committed = match sim.submit(command, Utc::now()) {
                        Commit::Action(outcome) => outcome.is_applied(),
                        Commit::Tick(_) => true,
                    };
                    if committed {
                        backend.save(key, &sim.snapshot()).await?;
                    }
                }
                announce_level_ups(sim);
            }
        }
    }
    Ok(())
}

/// Tick in the background for `length`, saving after every tick. Ctrl-C ends
/// the session early; the final state is saved either way.
async fn run_live(
    sim: &SharedSimulation,
    backend: &mut Backend,
    key: &str,
    every: Duration,
    length: Duration,
) -> Result<u64> {
    let ticker = Ticker::start(sim.clone(), every);
    let mut committed = ticker.subscribe();
    let deadline = tokio::time::sleep(length);
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(deadline, interrupted);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = &mut interrupted => {
                info!("interrupted, stopping live session");
                break;
            }
            changed = committed.changed() => {
                if changed.is_err() {
                    break;
                }
                backend.save(key, &sim.snapshot()).await?;
                announce_level_ups(sim);
            }
        }
    }
    let ticks = ticker.stop().await;
    announce_level_ups(sim);
    backend.save(key, &sim.snapshot()).await?;
    Ok(ticks)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging setup; stdout is reserved for status output
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    if args.version {
        println!(
            "garden-cli {} ({} built {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }

    let cfg = load_config(&args)?;
    let catalog = match &args.catalog {
        Some(path) => Catalog::from_path(path)?,
        None => Catalog::builtin(),
    };
    let mut backend = Backend::open(&args).await?;
    let state = backend.load(&cfg.storage_key).await;
    info!(
        key = %cfg.storage_key,
        level = state.progression.level,
        currency = state.currency,
        "save loaded"
    );
    let sim = SharedSimulation::new(Simulation::new(state, catalog, &cfg));

    if let Some(source) = &args.script {
        let text = if source == "-" {
            std::io::read_to_string(std::io::stdin())?
        } else {
            std::fs::read_to_string(source).with_context(|| format!("reading {source}"))?
        };
        run_script(&text, &sim, &mut backend, &cfg.storage_key).await?;
    }

    if let Some(secs) = args.live {
        let ticks = run_live(
            &sim,
            &mut backend,
            &cfg.storage_key,
            cfg.tick_interval(),
            Duration::from_secs(secs),
        )
        .await?;
        info!(ticks, "live session over");
    }

    print_status(&sim);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use persistence::{decode_state, KeyValueStore};
    use sim_core::{Animal, AnimalKind};
    use tempfile::TempDir;

    const KEY: &str = "gardenGame";

    fn simulation(state: EconomyState) -> SharedSimulation {
        SharedSimulation::new(Simulation::new(
            state,
            Catalog::builtin(),
            &SimConfig::default(),
        ))
    }

    fn saved(backend: &Backend) -> Option<EconomyState> {
        match backend {
            Backend::Files(store) => store.get(KEY).unwrap().map(|blob| decode_state(&blob)),
            Backend::Db(_) => unreachable!("tests use file saves"),
        }
    }

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn flags_are_parsed_strictly() {
        let args = parse_args(argv(&["--save-dir", "s", "--seed", "7", "--live", "30"])).unwrap();
        assert_eq!(args.save_dir, Some(PathBuf::from("s")));
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.live, Some(30));

        let typo = parse_args(argv(&["--save-dri", "s"])).unwrap_err();
        assert!(typo.to_string().contains("--save-dri"));
        assert!(parse_args(argv(&["--seed"])).is_err());
        assert!(parse_args(argv(&["--seed", "x"])).is_err());
        assert!(parse_args(argv(&["--save-dir", "s", "--db", "sqlite::memory:"])).is_err());
    }

    #[tokio::test]
    async fn ignored_actions_are_not_saved() {
        let dir = TempDir::new().unwrap();
        let mut backend = Backend::Files(FileStore::new(dir.path()));
        let sim = simulation(EconomyState::default());
        // rabbits cost 50, a fresh garden has 15
        run_script("buy-animal 0\n", &sim, &mut backend, KEY)
            .await
            .unwrap();
        assert_eq!(saved(&backend), None);

        run_script("dig 3\n# comment\nbuy-plant 0\n", &sim, &mut backend, KEY)
            .await
            .unwrap();
        let state = saved(&backend).unwrap();
        assert_eq!(state.currency, 5);
        assert_eq!(state.plants.len(), 1);
    }

    #[tokio::test]
    async fn every_tick_is_saved_and_level_ups_drained() {
        let dir = TempDir::new().unwrap();
        let mut backend = Backend::Files(FileStore::new(dir.path()));
        let mut start = EconomyState::default();
        start.currency = 100;
        start.progression.experience = 95;
        let sim = simulation(start);
        run_script("buy-animal 3\nfeed 1\ntick 2\n", &sim, &mut backend, KEY)
            .await
            .unwrap();
        let state = saved(&backend).unwrap();
        assert_eq!(state.currency, 60);
        assert_eq!(state.progression.level, 2);
        // fed to 30 hunger, then two ticks
        assert_eq!(state.animals[0].hunger, 32.0);
        assert!(sim.with(|s| s.drain_level_ups()).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn live_session_saves_each_tick() {
        let dir = TempDir::new().unwrap();
        let mut backend = Backend::Files(FileStore::new(dir.path()));
        let mut start = EconomyState::default();
        let id = start.allocate_id();
        start.animals.push(Animal {
            id,
            kind: AnimalKind::Chicken,
            hunger: 50.0,
            happiness: 50.0,
        });
        let sim = simulation(start);
        let ticks = run_live(
            &sim,
            &mut backend,
            KEY,
            Duration::from_secs(10),
            Duration::from_secs(35),
        )
        .await
        .unwrap();
        assert_eq!(ticks, 3);
        let state = saved(&backend).unwrap();
        assert_eq!(state.animals[0].hunger, 53.0);
        assert_eq!(state.animals[0].happiness, 48.5);
    }
}
