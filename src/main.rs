// nextapp - guesses which app you want to open next
//
// This is the main entry point. Parses CLI args and dispatches to handlers.

use nextapp_lib::{
    core::{Recorder, Retriever},
    intelligence::{
        Activity, Analyzer, ContextSnapshot, GeoPoint, Predictor, PredictorConfig,
        DEFAULT_NOTIFY_THRESHOLD, DEFAULT_WATCHED_APP,
    },
    Database, PredictorError, Result,
};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

/// Environment variable that overrides the database location
const DB_PATH_ENV: &str = "NEXTAPP_DB";

#[tokio::main]
async fn main() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e.user_message());
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    let command = &args[1];
    let rest = &args[2..];

    match command.as_str() {
        "record" => handle_record(rest).await,
        "predict" => handle_predict(rest).await,
        "rank" => handle_rank(rest).await,
        "probability" => handle_probability(rest).await,
        "activity-probability" => handle_activity_probability(rest).await,
        "analyze" => handle_analyze(rest).await,
        "recent" => handle_recent(rest).await,
        "status" => handle_status().await,
        "config" => handle_config(rest).await,
        "prune" => handle_prune(rest).await,
        "wipe" => handle_wipe(rest).await,
        "version" | "-v" | "--version" => {
            println!("nextapp v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "-h" | "--help" => {
            print_usage();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            Ok(())
        }
    }
}

/// Context flags shared by every command that scores
struct ParsedArgs {
    context: ContextSnapshot,
    positional: Vec<String>,
    watched: Vec<String>,
    threshold: Option<f64>,
}

fn parse_args(args: &[String]) -> Result<ParsedArgs> {
    let mut context = ContextSnapshot::now();
    let mut positional = Vec::new();
    let mut watched = Vec::new();
    let mut threshold = None;
    let mut latitude: Option<f64> = None;
    let mut longitude: Option<f64> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--headphones" => context = context.with_headphones(true),
            flag @ ("--hour" | "--activity" | "--lat" | "--lon" | "--wifi" | "--day"
            | "--watch" | "--threshold") => {
                i += 1;
                let value = args.get(i).ok_or_else(|| {
                    PredictorError::Generic(format!("{} needs a value", flag))
                })?;

                match flag {
                    "--hour" => {
                        let hour: u32 = parse_number(flag, value)?;
                        if hour > 23 {
                            return Err(PredictorError::Generic(
                                "--hour must be 0-23".to_string(),
                            ));
                        }
                        context.hour = hour;
                    }
                    "--activity" => context = context.with_activity(Activity::parse(value)),
                    "--lat" => latitude = Some(parse_number(flag, value)?),
                    "--lon" => longitude = Some(parse_number(flag, value)?),
                    "--wifi" => context = context.with_wifi(value),
                    "--day" => {
                        let day: u32 = parse_number(flag, value)?;
                        if !(1..=7).contains(&day) {
                            return Err(PredictorError::Generic(
                                "--day must be 1-7 (Sunday = 1)".to_string(),
                            ));
                        }
                        context = context.with_day_of_week(day);
                    }
                    "--watch" => watched.push(value.clone()),
                    _ => threshold = Some(parse_number(flag, value)?),
                }
            }
            arg => positional.push(arg.to_string()),
        }
        i += 1;
    }

    match (latitude, longitude) {
        (Some(lat), Some(lon)) => context = context.with_location(GeoPoint::new(lat, lon)),
        (None, None) => {}
        _ => {
            return Err(PredictorError::Generic(
                "--lat and --lon must be given together".to_string(),
            ))
        }
    }

    Ok(ParsedArgs {
        context,
        positional,
        watched,
        threshold,
    })
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| PredictorError::Generic(format!("{}: '{}' is not a number", flag, value)))
}

async fn handle_record(args: &[String]) -> Result<()> {
    let parsed = parse_args(args)?;

    let Some(package) = parsed.positional.first() else {
        eprintln!("Error: No package name provided");
        return Ok(());
    };

    let db = Arc::new(get_database().await?);
    let recorder = Recorder::new(db);

    recorder.record_now(package, &parsed.context).await?;

    Ok(())
}

async fn handle_predict(args: &[String]) -> Result<()> {
    let parsed = parse_args(args)?;
    let db = Arc::new(get_database().await?);
    let config = db.load_config().await?;
    let predictor = Predictor::new(db, config);

    match predictor.predict_top_app(&parsed.context).await? {
        Some(top) => println!("{}", top.package),
        None => println!("No Prediction"),
    }

    Ok(())
}

async fn handle_rank(args: &[String]) -> Result<()> {
    let parsed = parse_args(args)?;
    let limit = parsed
        .positional
        .first()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10);

    let db = Arc::new(get_database().await?);
    let config = db.load_config().await?;
    let predictor = Predictor::new(db, config);

    let ranking = predictor.rank_apps(&parsed.context).await?;

    if ranking.is_empty() {
        println!("No Prediction");
        return Ok(());
    }

    println!("\nRanking for {:02}:00:", parsed.context.hour);
    println!("{}", "=".repeat(60));
    for (i, app) in ranking.iter().take(limit).enumerate() {
        println!(
            "{:3}. {:<40} {:>8.3} ({} events)",
            i + 1,
            app.package,
            app.score,
            app.events
        );
    }
    println!("{}", "=".repeat(60));

    Ok(())
}

async fn handle_probability(args: &[String]) -> Result<()> {
    let parsed = parse_args(args)?;

    let Some(package) = parsed.positional.first() else {
        eprintln!("Error: No package name provided");
        return Ok(());
    };

    let db = Arc::new(get_database().await?);
    let config = db.load_config().await?;
    let predictor = Predictor::new(db, config);

    let p = predictor
        .app_probability_at_time(package, parsed.context.hour)
        .await?;

    println!(
        "P({}) around {:02}:00 = {:.0}%",
        package,
        parsed.context.hour,
        p * 100.0
    );

    Ok(())
}

async fn handle_activity_probability(args: &[String]) -> Result<()> {
    let parsed = parse_args(args)?;

    let Some(label) = parsed.positional.first() else {
        eprintln!("Error: No activity provided");
        return Ok(());
    };

    let db = Arc::new(get_database().await?);
    let config = db.load_config().await?;
    let predictor = Predictor::new(db, config);

    let activity = Activity::parse(label);
    let p = predictor
        .activity_probability_at_time(activity, parsed.context.hour)
        .await?;

    println!(
        "P({}) around {:02}:00 = {:.0}%",
        activity,
        parsed.context.hour,
        p * 100.0
    );

    Ok(())
}

async fn handle_analyze(args: &[String]) -> Result<()> {
    let parsed = parse_args(args)?;
    let watched = if parsed.watched.is_empty() {
        vec![DEFAULT_WATCHED_APP.to_string()]
    } else {
        parsed.watched
    };
    let threshold = parsed.threshold.unwrap_or(DEFAULT_NOTIFY_THRESHOLD);

    let db = Arc::new(get_database().await?);
    let config = db.load_config().await?;
    let analyzer = Analyzer::new(db, config);

    let report = analyzer.analyze(&parsed.context, &watched, threshold).await?;

    println!("{}", "=".repeat(60));
    println!("Analysis for {:02}:00 ({} events)", report.hour, report.history_size);
    println!("{}", "=".repeat(60));

    match &report.prediction {
        Some(top) => println!("\nPredicted app: {} (score {:.3})", top.package, top.score),
        None => println!("\nPredicted app: No Prediction"),
    }

    println!("\nWatched apps (threshold {:.0}%):", threshold * 100.0);
    for app in &report.watched {
        println!(
            "  {:<40} {:>5.1}% ({}/{} nearby events){}",
            app.package,
            app.probability * 100.0,
            app.counts.matches,
            app.counts.total,
            if app.surface { "  -> surface" } else { "" }
        );
    }

    println!("\n{}", "=".repeat(60));

    Ok(())
}

async fn handle_recent(args: &[String]) -> Result<()> {
    let limit = args
        .first()
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(10);

    let db = Arc::new(get_database().await?);
    let retriever = Retriever::new(db);
    let events = retriever.latest(limit).await?;

    if events.is_empty() {
        println!("No events found.");
    } else {
        println!("\nRecent events:");
        println!("{}", "=".repeat(60));
        for (i, event) in events.iter().enumerate() {
            println!(
                "{:3}. day {} {:02}:{:02}  {:<8} {} {}",
                i + 1,
                event.day_of_week,
                event.hour_of_day,
                event.minute,
                event.activity_type,
                if event.is_headphones_connected { "[hp]" } else { "    " },
                event.app_package_name
            );
        }
        println!("{}", "=".repeat(60));
    }

    Ok(())
}

async fn handle_status() -> Result<()> {
    let db = get_database().await?;
    let stats = db.stats().await?;
    let config = db.load_config().await?;

    println!("\nnextapp Status");
    println!("{}", "=".repeat(60));
    println!("\nEvent Store: {}", db.path().display());
    println!("  Events:        {}", stats.total_events);
    println!("  Distinct apps: {}", stats.distinct_apps);
    if let (Some(oldest), Some(newest)) = (stats.oldest_timestamp, stats.newest_timestamp) {
        println!("  Oldest:        {}", format_timestamp(oldest));
        println!("  Newest:        {}", format_timestamp(newest));
    }

    println!("\nPredictor:");
    println!("  Location signal: {}", config.location_signal);
    println!("  History window:  {} days", config.history_window_days);
    println!("  Excluded apps:   {}", config.excluded_packages.len());
    println!("{}", "=".repeat(60));

    Ok(())
}

async fn handle_config(args: &[String]) -> Result<()> {
    let db = get_database().await?;

    match args.first().map(|s| s.as_str()) {
        None | Some("show") => {
            let config = db.load_config().await?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Some("reset") => {
            db.save_config(&PredictorConfig::default()).await?;
            println!("Predictor config reset to defaults.");
        }
        Some("set") => {
            let (Some(key), Some(value)) = (args.get(1), args.get(2)) else {
                eprintln!("Usage: nextapp config set <key> <value>");
                return Ok(());
            };

            let mut config = db.load_config().await?;
            config.set(key, value)?;
            db.save_config(&config).await?;
            println!("Set {} = {}", key, value);
        }
        Some(other) => eprintln!("Unknown config action: {}", other),
    }

    Ok(())
}

async fn handle_prune(args: &[String]) -> Result<()> {
    let db = Arc::new(get_database().await?);
    let days = match args.first() {
        Some(value) => parse_number("prune", value)?,
        None => db.load_config().await?.history_window_days,
    };

    let recorder = Recorder::new(db);
    let removed = recorder.prune(days).await?;
    println!("Removed {} events older than {} days.", removed, days);

    Ok(())
}

async fn handle_wipe(args: &[String]) -> Result<()> {
    if !args.iter().any(|arg| arg == "--yes") {
        println!("This deletes every logged event. Run 'nextapp wipe --yes' to confirm.");
        return Ok(());
    }

    let db = get_database().await?;
    let removed = db.wipe_events().await?;
    log::info!("Wiped event store ({} events)", removed);
    println!("Removed {} events.", removed);

    Ok(())
}

fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|at| {
            at.with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M")
                .to_string()
        })
        .unwrap_or_else(|| millis.to_string())
}

fn database_path() -> Result<PathBuf> {
    if let Ok(path) = env::var(DB_PATH_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    let home = dirs::home_dir().ok_or_else(|| {
        PredictorError::Config(format!(
            "Could not determine home directory; set {} instead",
            DB_PATH_ENV
        ))
    })?;

    Ok(home.join(".nextapp").join("events.db"))
}

async fn get_database() -> Result<Database> {
    Database::new(database_path()?).await
}

fn print_usage() {
    println!(
        r#"nextapp v{} - guesses which app you want next

USAGE:
    nextapp <COMMAND> [OPTIONS]

COMMANDS:
    record <package>                  Log that <package> is in use right now
                                      (--hour/--day override the stored time)
    predict                           Print the most likely app
    rank [limit]                      Show the full ranking (default: 10)
    probability <package>             Chance of <package> around this hour
    activity-probability <activity>   Chance of an activity around this hour
    analyze [--watch <package>]...    Predict and decide what to surface
    recent [limit]                    Show recent events (default: 10)
    status                            Show store and predictor status
    config [show|reset|set <k> <v>]   Inspect or tune the predictor
    prune [days]                      Delete events older than the window
    wipe --yes                        Delete every event
    version                           Show version
    help                              Show this help

CONTEXT OPTIONS:
    --hour <0-23>          Pretend it's this hour
    --day <1-7>            Pretend it's this weekday (Sunday = 1)
    --activity <label>     STILL, WALKING, RUNNING, DRIVING, CYCLING
    --headphones           Headphones are connected
    --lat <deg> --lon <deg>
    --wifi <ssid>
    --threshold <0-1>      Surfacing threshold for analyze (default: 0.4)

ENVIRONMENT:
    NEXTAPP_DB             Database path (default: ~/.nextapp/events.db)
    RUST_LOG               Log level (default: info)

EXAMPLES:
    nextapp record com.spotify.music --headphones --activity WALKING
    nextapp predict --hour 8 --lat 52.52 --lon 13.405
    nextapp probability com.google.android.apps.maps --hour 17
    nextapp config set location_signal wifi
"#,
        env!("CARGO_PKG_VERSION")
    );
}
