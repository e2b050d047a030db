//! Youthroll - kommandorad
//!
//! Synk och översikt utan gränssnitt.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};

use youthroll::models::{AppSettings, AttendanceField, PersonRef};
use youthroll::services::stats::{attendance_trend, leaderboard, retention_rate, weekly_stats};
use youthroll::services::{DirtyTracker, EventBus, HttpRemoteStore, LocalStore, Registry, Session, SyncEngine};
use youthroll::utils::date::{active_friday, format_date, parse_date_key, recent_fridays};
use youthroll::Database;

#[derive(Parser)]
#[command(name = "youthroll", version, about = "Närvaroregister med synk mot servern")]
struct Cli {
    /// Inställningsfil (standard: settings.toml i konfigurationskatalogen)
    #[arg(long, env = "YOUTHROLL_SETTINGS")]
    settings: Option<PathBuf>,

    /// Ersätter remote_endpoint från inställningarna
    #[arg(long, env = "YOUTHROLL_ENDPOINT")]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Visa lokal status och veckans siffror
    Status,
    /// Skicka lokala data till servern
    Push,
    /// Hämta serverns data
    Pull {
        /// Skriv över även osynkade lokala ändringar
        #[arg(long)]
        force: bool,
    },
    /// Räkna om automatiska poäng för ett maraton
    Recompute { marathon: String },
    /// Visa maratonställning (standard: aktivt maraton)
    Leaderboard { marathon: Option<String> },
    /// Närvaro per vecka
    Trend {
        #[arg(long, default_value_t = 6)]
        weeks: usize,
    },
    /// Registrera närvaro via personens kod
    Mark {
        code: String,
        /// t.ex. liturgy, meeting, bibleReading
        field: String,
        /// Mötesdatum (standard: veckans fredag)
        #[arg(long)]
        date: Option<String>,
        /// Ta bort markeringen i stället
        #[arg(long)]
        off: bool,
    },
    /// Töm servern och all lokal data
    FactoryReset {
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.settings {
        Some(path) => AppSettings::load_from(path),
        None => AppSettings::load(),
    };
    if let Some(endpoint) = cli.endpoint.clone() {
        settings.remote_endpoint = endpoint;
    }

    // Initiera logging
    tracing_subscriber::fmt()
        .with_max_level(settings.log_level())
        .with_target(false)
        .init();

    tracing::info!("Startar Youthroll v{}", env!("CARGO_PKG_VERSION"));

    let db = Database::open(&settings.database_path)
        .with_context(|| format!("Kunde inte öppna databasen {:?}", settings.database_path))?;
    db.migrate()?;

    let remote = Arc::new(HttpRemoteStore::new(
        settings.remote_endpoint.clone(),
        Duration::from_secs(settings.request_timeout_secs),
    ));
    let engine = SyncEngine::new(
        LocalStore::new(db.clone()),
        DirtyTracker::new(db),
        remote,
        EventBus::new(),
    );
    let registry = Registry::new(engine.clone());
    let today = Local::now().date_naive();

    match cli.command {
        Command::Status => {
            let store = engine.store();
            let youth = store.get_youth();
            let attendance = store.get_attendance();
            let friday = active_friday(today);
            let last4: Vec<String> = recent_fridays(today, 4, settings.system_start_date)
                .into_iter()
                .map(format_date)
                .collect();
            let stats = weekly_stats(&attendance, &youth, &format_date(friday));

            println!("{}", store.get_config().church_name);
            println!("Ungdomar: {}  Tjänare: {}", youth.len(), store.get_servants().len());
            println!("Närvaroposter: {}", attendance.len());
            println!("Osynkade ändringar: {}", if engine.is_dirty() { "ja" } else { "nej" });
            println!("Senaste synk: {}", engine.last_sync().unwrap_or_else(|| "aldrig".into()));
            println!(
                "Vecka {}: {} närvarande ({} liturgi, {} möte, {} tidiga), {} frånvarande",
                format_date(friday),
                stats.present,
                stats.liturgy,
                stats.meeting,
                stats.early_birds,
                stats.absent
            );
            println!(
                "Regelbundna: {:.0}%",
                retention_rate(&youth, &attendance, &last4) * 100.0
            );
        }
        Command::Push => {
            if !engine.push().await {
                bail!("Push misslyckades");
            }
            println!("Push klar");
        }
        Command::Pull { force } => {
            let outcome = engine.pull(force).await;
            println!("{}", serde_json::to_string(&outcome)?);
            if !outcome.success {
                std::process::exit(1);
            }
        }
        Command::Recompute { marathon } => {
            let pushed = registry.recompute_marathon_points(&marathon).await?;
            println!("Poäng omräknade{}", if pushed { "" } else { " (ej synkat)" });
        }
        Command::Leaderboard { marathon } => {
            let store = engine.store();
            let marathons = store.get_marathons();
            let selected = match &marathon {
                Some(id) => marathons.iter().find(|m| &m.id == id),
                None => marathons.iter().find(|m| m.active),
            }
            .ok_or_else(|| anyhow!("Inget maraton hittades"))?;

            println!("{} ({} - {})", selected.name, selected.start_date, selected.end_date);
            let board = leaderboard(
                selected,
                &store.get_marathon_groups(),
                &store.get_marathon_points(),
                today,
            );
            for (place, standing) in board.iter().enumerate() {
                println!(
                    "{}. {} - {} poäng ({}%){}",
                    place + 1,
                    standing.name,
                    standing.total,
                    standing.level_percentage,
                    if standing.is_winner { " vinnare" } else { "" }
                );
            }
        }
        Command::Trend { weeks } => {
            let dates: Vec<String> = recent_fridays(today, weeks, settings.system_start_date)
                .into_iter()
                .map(format_date)
                .collect();
            for point in attendance_trend(&engine.store().get_attendance(), &dates) {
                println!("{}  {:>3}  {}", point.date, point.count, "#".repeat(point.count));
            }
        }
        Command::Mark { code, field, date, off } => {
            let field = AttendanceField::from_key(&field).ok_or_else(|| anyhow!("Okänt fält: {}", field))?;
            let date = match date {
                Some(d) => parse_date_key(&d).ok_or_else(|| anyhow!("Ogiltigt datum: {}", d))?,
                None => active_friday(today),
            };

            let session = Session::new(engine.store());
            let person = if let Some(y) = session.find_youth_by_code(&code) {
                PersonRef::Youth(y.id)
            } else if let Some(s) = session.find_servant_by_code(&code) {
                PersonRef::Servant(s.id)
            } else {
                bail!("Ingen person med kod {}", code);
            };

            let pushed = registry
                .set_attendance_field(&person, &format_date(date), field, !off)
                .await?;
            println!("Sparat{}", if pushed { "" } else { " lokalt (ej synkat)" });
        }
        Command::FactoryReset { yes } => {
            if !yes {
                bail!("Bekräfta med --yes");
            }
            if !engine.factory_reset().await {
                bail!("Fabriksåterställning misslyckades");
            }
            println!("All data raderad");
        }
    }

    Ok(())
}
