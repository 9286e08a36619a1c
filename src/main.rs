use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uno_tally::api::{build_router, state::AppState};
use uno_tally::calculate::{
    compute_leaderboard, filter_games_by_date, game_summary, player_summary, sort_stats,
    DateFilter, SortKey,
};
use uno_tally::config::AppConfig;
use uno_tally::models::{GameId, Player, PlayerId, Score};
use uno_tally::storage::{GameStore, StorageConfig};

#[derive(Parser)]
#[command(name = "uno-tally")]
#[command(about = "UNO score tracker with a cross-game leaderboard")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cross-game leaderboard
    Leaderboard {
        /// Date window: all, today, week, 30days, custom
        #[arg(long, default_value = "all")]
        date: String,

        /// Custom range start (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Custom range end (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Sort: rating, games, avg, total, name
        #[arg(long, default_value = "rating")]
        sort: String,

        /// Also list players without any counted rounds
        #[arg(long)]
        include_zero: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show career totals for a player
    PlayerStats {
        player: String,
    },

    /// Show standings and progression for a game
    GameStats {
        game: String,
    },

    /// Start the API server
    Serve {
        /// Bind address (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port number (overrides the config file)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Register a player or update their profile
    AddPlayer {
        id: String,
        name: String,

        #[arg(long, default_value = "")]
        avatar: String,
    },

    /// Start a new game
    NewGame {
        /// Hosting player
        #[arg(long)]
        host: String,

        /// Participants (comma-separated)
        #[arg(long, value_delimiter = ',')]
        players: Vec<String>,
    },

    /// Record a round, e.g. `add-round <game> alice=0 bob=23`
    AddRound {
        game: String,
        scores: Vec<String>,
    },

    /// Add a player to an ongoing game
    Join {
        game: String,
        player: String,
    },

    /// Remove a player from an ongoing game
    Leave {
        game: String,
        player: String,
    },

    /// Finish a game
    Finish {
        game: String,

        /// Winner; defaults to the lowest total
        #[arg(long)]
        winner: Option<String>,
    },

    /// Delete a game
    Discard {
        game: String,
    },

    /// Delete every game
    ClearGames {
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn parse_score(raw: &str) -> Result<Score> {
    let (player, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected <player>=<score>, got {:?}", raw))?;
    let value: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("invalid score in {:?}", raw))?;
    if !value.is_finite() {
        return Err(anyhow!("score in {:?} must be a finite number", raw));
    }
    Ok(Score::new(player.trim(), value))
}

fn parse_date_filter(date: &str, from: Option<&str>, to: Option<&str>) -> Result<DateFilter> {
    let parse = |s: &str| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date {:?}", s))
    };
    match date.parse::<DateFilter>().map_err(|e| anyhow!(e))? {
        DateFilter::Custom { .. } => Ok(DateFilter::Custom {
            from: from.map(parse).transpose()?,
            to: to.map(parse).transpose()?,
        }),
        other => Ok(other),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&PathBuf::from(&cli.config))
        .with_context(|| format!("loading {}", cli.config))?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = PathBuf::from(dir);
    }

    let level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    init_tracing(&level, cli.json_logs);

    tracing::info!("Starting uno-tally v{}", env!("CARGO_PKG_VERSION"));

    let store = GameStore::new(StorageConfig::new(config.data_dir.clone()));

    match cli.command {
        Commands::Leaderboard {
            date,
            from,
            to,
            sort,
            include_zero,
            json,
        } => {
            let filter = parse_date_filter(&date, from.as_deref(), to.as_deref())?;
            let sort: SortKey = sort.parse().map_err(|e: String| anyhow!(e))?;
            let options = config.leaderboard.clone().with_zero_round_players(
                include_zero || config.leaderboard.include_zero_round_players,
            );

            let players = store.list_players()?;
            let games = filter_games_by_date(&store.list_games()?, filter, Utc::now());
            let mut rows = compute_leaderboard(&players, &games, &options);
            if sort != SortKey::Rating {
                sort_stats(&mut rows, sort);
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if rows.is_empty() {
                println!("No stats available.");
            } else {
                println!(
                    "{:>4}  {:<20} {:>5} {:>6} {:>8} {:>7} {:>7} {:>8}",
                    "#", "Player", "Games", "Rounds", "Total", "Avg", "Adj", "Rating"
                );
                for (i, row) in rows.iter().enumerate() {
                    println!(
                        "{:>4}  {:<20} {:>5} {:>6} {:>8.0} {:>7.2} {:>7.2} {:>8.4}{}",
                        i + 1,
                        row.player.name,
                        row.games_played,
                        row.rounds_played,
                        row.total_score,
                        row.avg_per_round,
                        row.adj_avg_per_round,
                        row.rating,
                        if row.provisional { "  (provisional)" } else { "" }
                    );
                }
            }
        }
        Commands::PlayerStats { player } => {
            let id = PlayerId::from(player);
            let profile = store.get_player(&id)?;
            let summary = player_summary(&id, &store.list_games()?);
            println!("{} ({})", profile.name, profile.id);
            println!("  games:           {}", summary.games_played);
            println!("  wins:            {}", summary.wins);
            println!("  rounds:          {}", summary.rounds_played);
            println!("  total score:     {:.0}", summary.total_score);
            println!("  avg per game:    {:.1}", summary.avg_score_per_game);
            println!("  avg per round:   {:.1}", summary.avg_score_per_round);
        }
        Commands::GameStats { game } => {
            let game = store.get_game(&GameId::from(game))?;
            match game_summary(&game, &store.list_players()?) {
                None => println!("No rounds played in this game."),
                Some(summary) => {
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                }
            }
        }
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let state = AppState::new(store, config.leaderboard.clone())
                .with_cors_origin(config.server.cors_origin.clone());
            let app = build_router(state);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::AddPlayer { id, name, avatar } => {
            let player = store.upsert_player(Player::new(id, name).with_avatar(avatar))?;
            println!("{} ({})", player.name, player.id);
        }
        Commands::NewGame { host, players } => {
            let game = store.create_game(
                PlayerId::from(host),
                players.into_iter().map(PlayerId::from).collect(),
            )?;
            println!("{}", game.id);
        }
        Commands::AddRound { game, scores } => {
            let scores = scores
                .iter()
                .map(|s| parse_score(s))
                .collect::<Result<Vec<_>>>()?;
            let game = store.add_round(&GameId::from(game), scores)?;
            println!("Recorded round {} of game {}", game.rounds.len(), game.id);
        }
        Commands::Join { game, player } => {
            let game = store.add_player(&GameId::from(game), PlayerId::from(player))?;
            println!("{} players in game {}", game.player_ids.len(), game.id);
        }
        Commands::Leave { game, player } => {
            let game = store.remove_player(&GameId::from(game), &PlayerId::from(player))?;
            println!("{} players in game {}", game.player_ids.len(), game.id);
        }
        Commands::Finish { game, winner } => {
            let game = store.finish_game(&GameId::from(game), winner.map(PlayerId::from))?;
            match &game.winner_id {
                Some(winner) => println!("Game {} finished, winner {}", game.id, winner),
                None => println!("Game {} finished", game.id),
            }
        }
        Commands::Discard { game } => {
            store.delete_game(&GameId::from(game))?;
        }
        Commands::ClearGames { yes } => {
            if !yes {
                eprintln!("Refusing to delete every game without --yes");
            } else {
                let count = store.clear_games()?;
                println!("Deleted {} games", count);
            }
        }
    }

    Ok(())
}
