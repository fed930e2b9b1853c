use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use brawl_insight::agents::{ComparisonAgent, OpenAiBackend};
use brawl_insight::api::{build_router, state::AppState};
use brawl_insight::config::{AppConfig, Secrets};
use brawl_insight::dashboard::{
    BattleReport, ClubOverview, ComparisonView, Dashboard, PlayerPanel, Section,
};
use brawl_insight::fetch::ApiClient;

#[derive(Parser)]
#[command(name = "brawl-insight")]
#[command(about = "Brawl Stars player, club and brawler dashboard")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./brawl-insight.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Print views as JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a player's profile, club, brawlers and recent battles
    Player {
        /// Player tag, e.g. #2YJQ8LRCG
        tag: String,

        /// Bypass the response cache
        #[arg(long)]
        refresh: bool,
    },

    /// Show a player's battle log
    Battles {
        tag: String,
    },

    /// Show a club, or list the featured clubs when no tag is given
    Club {
        tag: Option<String>,
    },

    /// List a club's members
    Members {
        tag: String,
    },

    /// Compare two players side by side
    Compare {
        first: String,
        second: String,

        /// Ask the AI backend for a written comparison
        #[arg(long)]
        ai: bool,
    },

    /// List all brawlers
    Brawlers,

    /// Show one brawler and its global top players
    Brawler {
        /// Numeric brawler id
        id: String,
    },

    /// Start the API server
    Serve {
        /// Bind address (defaults to the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port number (defaults to the config file)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    // Initialize tracing
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(cli.json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!cli.json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    tracing::info!("Starting brawl-insight v{}", env!("CARGO_PKG_VERSION"));

    let secrets = Secrets::from_env()?;
    let dashboard = build_dashboard(&config, &secrets)?;

    match cli.command {
        Commands::Player { tag, refresh } => {
            let panel = if refresh {
                dashboard.refresh_player(&tag).await?
            } else {
                dashboard.player(&tag).await?
            };
            output(cli.json, &panel, print_player)?;
        }
        Commands::Battles { tag } => {
            let report = dashboard.battle_report(&tag).await?;
            output(cli.json, &report, print_battles)?;
        }
        Commands::Club { tag: Some(tag) } => {
            let overview = dashboard.club_overview(&tag).await?;
            output(cli.json, &overview, print_club)?;
        }
        Commands::Club { tag: None } => {
            output(cli.json, dashboard.featured_clubs(), |clubs| {
                for club in clubs {
                    println!("{:<20} {}", club.name, club.tag);
                }
            })?;
        }
        Commands::Members { tag } => {
            let members = dashboard.club_members(&tag).await?;
            output(cli.json, &members, |members| {
                for m in members {
                    println!("{:<20} {:<15} {:>6}  {}", m.name, m.tag, m.trophies, m.role);
                }
            })?;
        }
        Commands::Compare { first, second, ai } => {
            let view = dashboard.compare(&first, &second, ai).await;
            output(cli.json, &view, print_comparison)?;
        }
        Commands::Brawlers => {
            let brawlers = dashboard.api().brawlers().await?;
            output(cli.json, &brawlers, |brawlers| {
                for b in brawlers {
                    println!(
                        "{:>10}  {:<16} {} star powers, {} gadgets",
                        b.id,
                        b.name,
                        b.star_powers.len(),
                        b.gadgets.len()
                    );
                }
            })?;
        }
        Commands::Brawler { id } => {
            let overview = dashboard.brawler_overview(&id).await?;
            output(cli.json, &overview, |overview| {
                println!("{} (id {})", overview.brawler.name, overview.brawler.id);
                match &overview.rankings {
                    Section::Ready { data } => {
                        println!("\n=== Global Top {} ===", data.len());
                        for entry in data {
                            println!(
                                "{:>3}. {:<20} {:>6}  {}",
                                entry.rank,
                                entry.name,
                                entry.trophies,
                                entry.club_name().unwrap_or("-")
                            );
                        }
                    }
                    Section::Unavailable { message, .. } => println!("\nRankings: {}", message),
                }
            })?;
        }
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let app = build_router(AppState::new(dashboard), &config.server.cors_origin);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Dashboard API: http://{}/api/health", addr);
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

fn build_dashboard(config: &AppConfig, secrets: &Secrets) -> Result<Dashboard> {
    let api = ApiClient::from_config(&config.api, &secrets.game_api_key)?;
    let dashboard = Dashboard::new(Arc::new(api)).with_featured_clubs(config.clubs.clone());

    if !config.ai.enabled {
        tracing::info!("AI summaries disabled");
        return Ok(dashboard);
    }

    tracing::info!(
        "Using OpenAI-compatible backend ({} at {})",
        config.ai.model,
        config.ai.base_url
    );
    let backend = OpenAiBackend::from_config(&config.ai, &secrets.ai_api_key)?;
    Ok(dashboard.with_comparison_agent(ComparisonAgent::from_config(
        Arc::new(backend),
        &config.ai,
    )))
}

fn output<T: Serialize + ?Sized>(json: bool, value: &T, text: impl FnOnce(&T)) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        text(value);
    }
    Ok(())
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn print_player(panel: &PlayerPanel) {
    let o = &panel.overview;
    println!("\n=== {} ({}) ===", o.name, o.tag);
    println!("Trophies:         {} (highest {})", o.trophies, o.highest_trophies);
    println!("Level:            {}", o.exp_level);
    println!(
        "Victories:        3v3 {} / solo {} / duo {}",
        o.victories.trio, o.victories.solo, o.victories.duo
    );

    match &panel.club {
        None => println!("Club:             -"),
        Some(Section::Ready { data }) => println!(
            "Club:             {} ({}), {}",
            data.name,
            data.tag,
            or_dash(data.player_role)
        ),
        Some(Section::Unavailable { message, .. }) => println!("Club:             {}", message),
    }

    let s = &panel.brawler_stats;
    println!("\n=== Brawlers ===");
    println!("Unlocked:         {}", s.total_brawlers);
    println!("Power {}+:         {}", s.power_threshold, s.high_level_brawlers);
    println!("Max power:        {}", s.max_level_brawlers);
    println!(
        "Accessories:      {} gears, {} star powers, {} gadgets",
        s.total_gears, s.total_star_powers, s.total_gadgets
    );
    println!(
        "Average trophies: {}",
        or_dash(s.average_trophies.map(|a| format!("{:.1}", a)))
    );
    if let Some(best) = &s.highest_trophy_brawler {
        println!("Best brawler:     {} ({})", best.name, best.trophies);
    }

    match &panel.battles {
        Section::Ready { data } => print_battles(data),
        Section::Unavailable { message, .. } => println!("\nBattle log: {}", message),
    }
}

fn print_battles(report: &BattleReport) {
    let stats = &report.stats;
    println!("\n=== Recent Battles ===");
    println!(
        "Record:           {}W {}L {}D ({} undecided)",
        stats.overall.victories, stats.overall.defeats, stats.overall.draws, stats.overall.unknown
    );
    println!(
        "Win rate:         {}",
        or_dash(stats.win_rate.map(|w| format!("{:.1}%", w)))
    );
    println!("Star player:      {}", stats.star_player_count);
    println!("Trophy change:    {:+}", stats.net_trophy_change);

    for row in &report.rows {
        println!(
            "{}  {:<14} {:<24} {:<8} {:>4}",
            row.time,
            row.mode,
            row.brawler,
            row.result,
            or_dash(row.trophy_change.map(|c| format!("{:+}", c)))
        );
    }
}

fn print_club(overview: &ClubOverview) {
    let s = &overview.summary;
    println!("\n=== {} ({}) ===", s.name, s.tag);
    if let Some(description) = &s.description {
        println!("{}", description);
    }
    println!("Type:             {}", s.club_type);
    println!("Required:         {}", s.required_trophies);
    println!("Trophies:         {}", s.trophies);
    println!("Members:          {}", overview.stats.member_count);
    println!("Mean trophies:    {}", or_dash(overview.stats.mean_trophies));
    if let Some(range) = &overview.stats.trophy_range {
        println!("Range:            {} - {}", range.min, range.max);
    }
    for (role, count) in &overview.stats.role_histogram {
        println!("  {:<16}{}", role.to_string(), count);
    }

    println!("\n=== Members ===");
    for m in &overview.members {
        println!("{:<20} {:<15} {:>6}  {}", m.name, m.tag, m.trophies, m.role);
    }
}

fn print_comparison(view: &ComparisonView) {
    for section in [&view.first, &view.second] {
        match section {
            Section::Ready { data } => print_player(data),
            Section::Unavailable { message, .. } => println!("\nPlayer unavailable: {}", message),
        }
    }

    if let Some([a, b]) = &view.head_to_head {
        println!("\n=== Head to Head ===");
        println!("{:<18} {:>12} {:>12}", "", a.name, b.name);
        println!("{:<18} {:>12} {:>12}", "Trophies", a.trophies, b.trophies);
        println!("{:<18} {:>12} {:>12}", "Highest", a.highest_trophies, b.highest_trophies);
        println!("{:<18} {:>12} {:>12}", "3v3 victories", a.victories.trio, b.victories.trio);
        println!("{:<18} {:>12} {:>12}", "Solo victories", a.victories.solo, b.victories.solo);
        println!("{:<18} {:>12} {:>12}", "Duo victories", a.victories.duo, b.victories.duo);
    }

    match &view.summary {
        None => {}
        Some(Section::Ready { data }) => println!("\n=== AI Summary ===\n{}", data),
        Some(Section::Unavailable { message, .. }) => println!("\nAI summary: {}", message),
    }
}
