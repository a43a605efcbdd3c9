use std::{error::Error, io::Write};

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::Engine;
use migration::{Migrator, MigratorTrait};
use uuid::Uuid;

mod session_store;
mod settings;

use settings::Database;

#[derive(Parser, Debug)]
#[command(name = "gofit")]
#[command(about = "GoFit: community sports events and GoPoints")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new account.
    Register(RegisterArgs),
    /// Log in and persist the session.
    Login(LoginArgs),
    /// Log out and clear the session.
    Logout,
    /// Browse and manage events.
    Events(Events),
    /// Complete today's recommended exercise (+5 GoPoints).
    Exercise,
    /// Spend GoPoints.
    Shop(Shop),
    /// Show the current user's profile.
    Profile,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct Events {
    #[command(subcommand)]
    command: EventsCommand,
}

#[derive(Subcommand, Debug)]
enum EventsCommand {
    /// List all events in insertion order.
    List,
    Create(EventCreateArgs),
    Join(EventIdArg),
    Delete(EventIdArg),
}

#[derive(Args, Debug)]
struct EventCreateArgs {
    #[arg(long)]
    address: String,
    #[arg(long)]
    sports: String,
    #[arg(long)]
    cost: String,
    /// Event date, RFC 3339 (e.g. 2026-09-01T18:00:00Z).
    #[arg(long, value_parser = parse_date)]
    date: DateTime<Utc>,
    #[arg(long)]
    duration: String,
}

#[derive(Args, Debug)]
struct EventIdArg {
    id: Uuid,
}

#[derive(Args, Debug)]
struct Shop {
    #[command(subcommand)]
    command: ShopCommand,
}

#[derive(Subcommand, Debug)]
enum ShopCommand {
    /// List the catalog.
    List,
    /// Buy an item by its catalog number.
    Buy { number: usize },
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|date| date.with_timezone(&Utc))
        .map_err(|err| format!("invalid date, want RFC 3339: {err}"))
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let db = sea_orm::Database::connect(url).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

fn print_events(engine: &Engine) {
    if engine.events().is_empty() {
        println!("no events yet");
        return;
    }
    for event in engine.events() {
        let mut markers = String::new();
        if engine.joined_events().contains(&event.id) {
            markers.push_str(" [joined]");
        }
        if engine.created_events().contains(&event.id) {
            markers.push_str(" [yours]");
        }
        println!(
            "{}  {}  {} @ {} ({}, {}) - {} participants{}",
            event.id,
            event.date.format("%Y-%m-%d %H:%M"),
            event.sports,
            event.address,
            event.cost,
            event.duration,
            event.participants_count,
            markers
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "gofit={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = connect_db(&settings.database).await?;
    tracing::debug!("database ready");
    let session = session_store::load(&settings.app.session_path)?;
    let mut engine = Engine::builder().database(db).session(session).build().await?;

    match cli.command {
        Command::Register(args) => {
            let password = prompt_password_twice()?;
            let user = engine
                .register_user(&args.username, &args.email, &password, None)
                .await?;
            println!("registered {} ({}), log in with `gofit login`", user.username, user.id);
        }
        Command::Login(args) => {
            let password = prompt_password("Password: ")?;
            let session = engine.login(&args.email, &password).await?;
            session_store::save(&settings.app.session_path, &session)?;
            match engine.current_user() {
                Some(user) => println!("welcome back, {}", user.username),
                None => println!("logged in"),
            }
        }
        Command::Logout => {
            let session = engine.logout();
            session_store::save(&settings.app.session_path, &session)?;
            println!("logged out");
        }
        Command::Events(Events { command }) => match command {
            EventsCommand::List => print_events(&engine),
            EventsCommand::Create(args) => {
                let event_id = engine
                    .create_event(
                        &args.address,
                        &args.sports,
                        &args.cost,
                        args.date,
                        &args.duration,
                    )
                    .await?;
                println!("created event {event_id}");
            }
            EventsCommand::Join(args) => {
                engine.join_event(args.id).await?;
                match engine.current_user() {
                    Some(user) => println!("joined, {} GoPoints", user.go_points),
                    None => println!("joined (log in to earn GoPoints)"),
                }
            }
            EventsCommand::Delete(args) => {
                engine.delete_event(args.id).await?;
                println!("deleted event {}", args.id);
            }
        },
        Command::Exercise => {
            let balance = engine.complete_exercise().await?;
            println!("exercise completed, {balance} GoPoints");
        }
        Command::Shop(Shop { command }) => match command {
            ShopCommand::List => {
                for (number, item) in engine::shop::catalog().iter().enumerate() {
                    println!("{}. {} - {} GoPoints", number + 1, item.name, item.cost);
                }
            }
            ShopCommand::Buy { number } => {
                let catalog = engine::shop::catalog();
                let item = number
                    .checked_sub(1)
                    .and_then(|index| catalog.get(index))
                    .ok_or("no such catalog item")?;
                let balance = engine.purchase_item(item).await?;
                println!("bought {}, {} GoPoints left", item.name, balance);
            }
        },
        Command::Profile => match engine.current_user() {
            Some(user) => {
                println!("{} <{}>", user.username, user.email);
                println!("events joined: {}", user.events_count);
                println!("GoPoints: {}", user.go_points);
                println!("pro: {}", user.is_pro_user);
            }
            None => println!("not logged in"),
        },
    }

    Ok(())
}
