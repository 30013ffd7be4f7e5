use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use twixt_core::engine::patterns::PatternLibrary;
use twixt_core::logic::board::BoardState;
use twixt_core::worker::spawn_compute;
use twixt_core::{EngineConfig, Match, MatchStatus, Player, SearchLimit};

/// Let the engine play both sides of a TwixT match.
#[derive(Parser, Debug)]
#[command(name = "twixt", version)]
struct Cli {
    /// Number of columns
    #[arg(long, default_value_t = 24)]
    xsize: i32,

    /// Number of rows
    #[arg(long, default_value_t = 24)]
    ysize: i32,

    /// Fixed search depth in plies (overrides --time-ms)
    #[arg(long)]
    depth: Option<u8>,

    /// Thinking time per move
    #[arg(long, default_value_t = 1000)]
    time_ms: u64,

    #[arg(long, default_value_t = 200)]
    max_moves: usize,

    /// Engine settings as JSON; missing keys keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Pattern file replacing the built-in library
    #[arg(long)]
    patterns: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            EngineConfig::load_from_json(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => EngineConfig::default(),
    };
    config.random_seed = cli.seed.or(config.random_seed);
    Ok(config)
}

/// A broken pattern file only costs the patterns, not the match.
fn load_patterns(cli: &Cli) -> PatternLibrary {
    cli.patterns
        .as_ref()
        .map_or_else(PatternLibrary::builtin, PatternLibrary::load_or_empty)
}

fn play(
    game: &mut Match,
    config: &EngineConfig,
    patterns: &Arc<PatternLibrary>,
    limit: SearchLimit,
    max_moves: usize,
) -> Result<()> {
    let mut player = Player::Y;
    while game.status() == MatchStatus::Playing && game.move_count() < max_moves {
        let handle = spawn_compute(
            game.record(),
            player,
            limit,
            config.clone(),
            Arc::clone(patterns),
        );
        let found = handle
            .join()
            .map_err(|_| anyhow!("search thread panicked"))?;
        let Some((mv, stats)) = found else {
            warn!("{player:?} has no move");
            break;
        };

        game.make_move(mv, player)
            .with_context(|| format!("{player:?} chose illegal move {mv}"))?;
        info!(
            depth = stats.depth,
            nodes = stats.nodes,
            value = stats.value,
            time_ms = stats.time_ms,
            "{player:?} {mv}"
        );
        player = player.opposite();
    }
    Ok(())
}

fn render(board: &BoardState) -> String {
    let mut out = String::new();
    for y in 0..board.ysize() {
        let row: String = (0..board.xsize())
            .map(|x| match board.get_pin(x, y) {
                Some(Player::Y) => 'Y',
                Some(Player::X) => 'X',
                None => '.',
            })
            .collect();
        let _ = writeln!(out, "{:>3} {row}", y + 1);
    }
    out
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let patterns = Arc::new(load_patterns(&cli));
    info!("{} patterns loaded", patterns.len());

    let mut game = Match::new(cli.xsize, cli.ysize)?;
    game.configure(&config);
    let limit = cli
        .depth
        .map_or(SearchLimit::Time(cli.time_ms), SearchLimit::Depth);

    play(&mut game, &config, &patterns, limit, cli.max_moves)?;

    game.sync_display();
    print!("{}", render(game.display()));
    match game.status() {
        MatchStatus::Won(winner) => {
            println!("{winner:?} wins after {} moves", game.move_count());
        }
        MatchStatus::Playing => println!("no winner after {} moves", game.move_count()),
    }
    Ok(())
}
