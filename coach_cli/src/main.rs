use clap::{Args, Parser, Subcommand};
use coach_core::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "coachgen")]
#[command(about = "Workout session generator for coaches", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new session (default)
    Generate {
        #[command(flatten)]
        request: RequestArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Regenerate a saved snapshot, keeping some of its blocks
    Regenerate {
        /// Session snapshot written by `generate --out`
        #[arg(long)]
        from: PathBuf,

        /// Block number to keep (1-based, repeatable)
        #[arg(long, value_delimiter = ',')]
        lock: Vec<usize>,

        #[command(flatten)]
        request: RequestArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show a stored session
    Show {
        id: Uuid,

        /// Print the session as JSON
        #[arg(long)]
        json: bool,
    },

    /// List available templates
    Templates,

    /// List the exercise catalog
    Exercises,

    /// Export stored sessions to CSV
    Export {
        /// Destination file (defaults to sessions.csv in the data directory)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

/// Request parameters shared by generate and regenerate
#[derive(Args, Clone, Debug, Default)]
struct RequestArgs {
    /// Template name (see `coachgen templates`)
    #[arg(long, short)]
    template: Option<String>,

    /// Session length in minutes
    #[arg(long, short, conflicts_with = "seconds")]
    minutes: Option<u32>,

    /// Session length in seconds
    #[arg(long)]
    seconds: Option<u32>,

    /// individual or collective
    #[arg(long)]
    mode: Option<SessionMode>,

    /// Focus tag (upper, lower, core, conditioning, strength, ...)
    #[arg(long)]
    focus: Option<String>,

    /// Available equipment, overrides the configured list
    #[arg(long, short, value_delimiter = ',')]
    equipment: Vec<String>,

    /// Bodyweight only, ignoring the configured equipment
    #[arg(long, conflicts_with = "equipment")]
    bodyweight: bool,

    /// Exercise id to exclude (repeatable)
    #[arg(long, short = 'x', value_delimiter = ',')]
    exclude: Vec<String>,

    /// Client id; also loads the client's exclusions
    #[arg(long)]
    client: Option<String>,

    #[arg(long)]
    label: Option<String>,

    /// low, moderate, high or max
    #[arg(long)]
    intensity: Option<Intensity>,
}

#[derive(Args, Clone, Debug, Default)]
struct OutputArgs {
    /// Dry run - show the session without storing it
    #[arg(long)]
    dry_run: bool,

    /// Print the session as JSON
    #[arg(long)]
    json: bool,

    /// Also write the session snapshot to this file
    #[arg(long)]
    out: Option<PathBuf>,
}

/// Everything a command needs from config and catalogs
struct Context {
    config: Config,
    catalog: ExerciseCatalog,
    templates: TemplateCatalog,
}

impl Context {
    fn load(cli: &Cli) -> Result<Self> {
        let mut config = match cli.config {
            Some(ref path) => Config::load_from(path)?,
            None => Config::load()?,
        };
        if let Some(ref data_dir) = cli.data_dir {
            config.data.data_dir = data_dir.clone();
        }

        let catalog = config.exercise_catalog()?;
        let templates = config.template_catalog()?;

        Ok(Self {
            config,
            catalog,
            templates,
        })
    }

    fn store(&self) -> JsonlSessionStore {
        JsonlSessionStore::new(self.config.sessions_path())
    }
}

fn main() -> Result<()> {
    coach_core::logging::init();

    let cli = Cli::parse();
    let ctx = Context::load(&cli)?;

    match cli.command {
        Some(Commands::Generate { request, output }) => cmd_generate(&ctx, &request, &output),
        Some(Commands::Regenerate {
            from,
            lock,
            request,
            output,
        }) => cmd_regenerate(&ctx, &from, &lock, &request, &output),
        Some(Commands::Show { id, json }) => cmd_show(&ctx, id, json),
        Some(Commands::Templates) => cmd_templates(&ctx),
        Some(Commands::Exercises) => cmd_exercises(&ctx),
        Some(Commands::Export { output }) => cmd_export(&ctx, output),
        None => {
            // Default to "generate" with configured defaults
            cmd_generate(&ctx, &RequestArgs::default(), &OutputArgs::default())
        }
    }
}

/// Build a request from arguments, falling back to `base` then to config
fn build_request(ctx: &Context, args: &RequestArgs, base: Option<&GeneratedSession>) -> Result<SessionRequest> {
    let generation = &ctx.config.generation;

    let template = args
        .template
        .clone()
        .or_else(|| base.map(|s| s.template.clone()))
        .unwrap_or_else(|| generation.default_template.clone());

    let duration_sec = match (args.seconds, args.minutes) {
        (Some(seconds), _) => seconds,
        (None, Some(minutes)) => minutes
            .checked_mul(60)
            .ok_or_else(|| Error::InvalidRequest(format!("{} minutes is too long", minutes)))?,
        (None, None) => base
            .map(|s| s.requested_duration_sec)
            .unwrap_or(generation.default_duration_sec),
    };

    let mut request = SessionRequest::new(template, duration_sec);
    request.mode = args
        .mode
        .or_else(|| base.map(|s| s.mode))
        .unwrap_or(generation.default_mode);
    request.intensity = args.intensity.unwrap_or(generation.default_intensity);
    request.focus = args.focus.clone();
    request.label = args.label.clone();
    request.client_id = args
        .client
        .clone()
        .or_else(|| base.and_then(|s| s.client_id.clone()));

    request.equipment = if args.bodyweight {
        BTreeSet::new()
    } else if !args.equipment.is_empty() {
        args.equipment.iter().map(|e| e.trim().to_lowercase()).collect()
    } else {
        ctx.config.equipment_set()
    };

    request.exclusions = args.exclude.iter().map(|e| e.trim().to_string()).collect();
    if let Some(ref client_id) = request.client_id {
        let client_exclusions = load_client_exclusions(&ctx.config.exclusions_path(), client_id)?;
        request.exclusions.extend(client_exclusions);
    }

    Ok(request)
}

fn run_generation(ctx: &Context, request: &SessionRequest, output: &OutputArgs) -> Result<()> {
    let session = generate_session_with_limit(
        request,
        &ctx.catalog,
        &ctx.templates,
        ctx.config.generation.max_duration_sec,
    )?;

    if output.json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        display_session(&session, &ctx.catalog);
    }

    if let Some(ref path) = output.out {
        save_session(&session, path)?;
        if !output.json {
            println!("✓ Snapshot written to {}", path.display());
        }
    }

    if output.dry_run {
        if !output.json {
            println!("\n[Dry run - not storing session]");
        }
        return Ok(());
    }

    let id = ctx.store().save(&session)?;
    if !output.json {
        println!("✓ Session saved: {}", id);
    }

    Ok(())
}

fn cmd_generate(ctx: &Context, args: &RequestArgs, output: &OutputArgs) -> Result<()> {
    let request = build_request(ctx, args, None)?;
    run_generation(ctx, &request, output)
}

fn cmd_regenerate(
    ctx: &Context,
    from: &Path,
    lock: &[usize],
    args: &RequestArgs,
    output: &OutputArgs,
) -> Result<()> {
    let previous = load_session(from)?;

    if let Some(bad) = lock.iter().find(|&&n| n == 0 || n > previous.blocks.len()) {
        return Err(Error::InvalidRequest(format!(
            "Block {} does not exist (session has {} blocks)",
            bad,
            previous.blocks.len()
        )));
    }

    // Blocks locked in the snapshot stay locked
    let locked_blocks: Vec<SessionBlock> = previous
        .blocks
        .iter()
        .enumerate()
        .filter(|(idx, block)| block.locked || lock.contains(&(idx + 1)))
        .map(|(_, block)| SessionBlock {
            locked: true,
            ..block.clone()
        })
        .collect();

    tracing::info!(
        "Regenerating session {} keeping {} of {} blocks",
        previous.id,
        locked_blocks.len(),
        previous.blocks.len()
    );

    let mut request = build_request(ctx, args, Some(&previous))?;
    request.locked_blocks = locked_blocks;

    run_generation(ctx, &request, output)
}

fn cmd_show(ctx: &Context, id: Uuid, json: bool) -> Result<()> {
    let session = ctx
        .store()
        .load(id)?
        .ok_or_else(|| Error::NotFound(format!("Session {}", id)))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&session)?);
    } else {
        display_session(&session, &ctx.catalog);
    }
    Ok(())
}

fn cmd_templates(ctx: &Context) -> Result<()> {
    for template in ctx.templates.sorted() {
        let shape: Vec<String> = template
            .slots
            .iter()
            .map(|slot| format!("{} ({})", slot.kind, slot.format))
            .collect();
        println!("{:<16} {:<16} {}", template.name, template.label, shape.join(" → "));
    }
    Ok(())
}

fn cmd_exercises(ctx: &Context) -> Result<()> {
    for exercise in ctx.catalog.sorted() {
        let equipment = if exercise.is_bodyweight() {
            "bodyweight".to_string()
        } else {
            exercise.equipment.join(", ")
        };
        println!(
            "{:<24} {:<28} {:<10} {}",
            exercise.id, exercise.name, exercise.movement_pattern, equipment
        );
    }
    Ok(())
}

fn cmd_export(ctx: &Context, output: Option<PathBuf>) -> Result<()> {
    let sessions_path = ctx.config.sessions_path();
    if !sessions_path.exists() {
        println!("No stored sessions - nothing to export.");
        return Ok(());
    }

    let sessions = ctx.store().list()?;
    let csv_path = output.unwrap_or_else(|| ctx.config.data.data_dir.join("sessions.csv"));
    let rows = sessions_to_csv(&sessions, &ctx.catalog, &csv_path)?;

    println!("✓ Exported {} sessions ({} rows)", sessions.len(), rows);
    println!("  CSV: {}", csv_path.display());
    Ok(())
}

fn fmt_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn display_session(session: &GeneratedSession, catalog: &ExerciseCatalog) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", session.label);
    println!("╰─────────────────────────────────────────╯");
    println!();
    println!(
        "  Template: {}   Mode: {}",
        session.template, session.mode
    );
    println!(
        "  Duration: {} requested, {} realized ({:+}s)",
        fmt_duration(session.requested_duration_sec),
        fmt_duration(session.realized_duration_sec),
        session.variance_sec()
    );

    for (idx, block) in session.blocks.iter().enumerate() {
        println!();
        let lock = if block.locked { " [locked]" } else { "" };
        println!(
            "  {}. {} ({}){}",
            idx + 1,
            block.title,
            fmt_duration(block.duration_sec),
            lock
        );
        if block.format.is_interval() {
            println!(
                "     {} rounds of {}s work / {}s rest",
                block.rounds, block.work_sec, block.rest_sec
            );
        }
        if let Some(reason) = block.skip_reason {
            println!("     (skipped: {})", reason);
        }

        for item in &block.items {
            let name = catalog
                .get(&item.exercise_id)
                .map(|e| e.name.as_str())
                .unwrap_or(item.exercise_id.as_str());
            println!("     → {}: {}", name, item.prescription);
        }
        if let Some(note) = block.items.first().and_then(|i| i.notes.as_deref()) {
            println!("     ℹ {}", note);
        }
    }

    if !session.warnings.is_empty() {
        println!();
        for warning in &session.warnings {
            println!("  ⚠ {}", warning);
        }
    }

    println!();
    println!("  ID: {}", session.id);
    println!();
}
