use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use rfcard::rendering::LayoutSnapshot;
use rfcard::{CardConfig, CardExporter, CardState, CardTemplate, FetchSource, FontConfig};
use std::path::PathBuf;

/// rfcard: render a personalized greeting card and export it as PNG
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a card and print its text
    Show(LoadArgs),
    /// Load a card, lay it out and export it as PNG
    Render(RenderArgs),
}

#[derive(Args, Debug)]
struct LoadArgs {
    /// Card key (case-insensitive)
    #[arg(short, long, conflicts_with = "url")]
    card: Option<String>,

    /// Page URL carrying the key as `?card=...`
    #[arg(short, long)]
    url: Option<String>,

    /// Card data JSON, relative to --base
    #[arg(short, long, default_value = "data.json")]
    data: String,

    /// Base URL or directory relative sources resolve against
    #[arg(long)]
    base: Option<String>,

    /// Timeout for remote fetches in milliseconds
    #[arg(long, default_value_t = 30000)]
    timeout_ms: u64,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    load: LoadArgs,

    /// Card markup to read the template from
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Use a layout snapshot (JSON) instead of computing one
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Write the layout snapshot used for the export as JSON
    #[arg(long)]
    dump_layout: Option<PathBuf>,

    /// Background image, relative to --base
    #[arg(long, default_value = "assets/bg.png")]
    background: String,

    /// Device pixel ratio
    #[arg(short, long, default_value_t = 1.0)]
    scale: f32,

    /// Card width in CSS pixels (overrides the template)
    #[arg(short, long)]
    width: Option<f32>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Extra font directory (repeatable)
    #[arg(long)]
    font_dir: Vec<PathBuf>,

    /// Do not load system fonts
    #[arg(long)]
    no_system_fonts: bool,
}

impl LoadArgs {
    fn key(&self) -> anyhow::Result<Option<String>> {
        match (&self.card, &self.url) {
            (Some(card), _) => Ok(rfcard::normalize_key(card)),
            (None, Some(url)) => Ok(rfcard::key_from_url(url)?),
            (None, None) => Ok(None),
        }
    }

    fn config(&self) -> CardConfig {
        CardConfig {
            data_source: self.data.clone(),
            base: self.base.clone(),
            timeout_ms: self.timeout_ms,
            ..Default::default()
        }
    }
}

/// Load the card; prints the error and returns `None` when one is shown.
async fn load(
    args: &LoadArgs,
    config: &CardConfig,
    source: &FetchSource,
) -> anyhow::Result<Option<CardState>> {
    let key = args.key()?;
    let mut card = CardState::new();
    if rfcard::load_card(&mut card, source, &config.data_source, key.as_deref())
        .await
        .is_err()
    {
        eprintln!("{}", card.error().unwrap_or("Card not found."));
        return Ok(None);
    }
    Ok(Some(card))
}

async fn show(args: LoadArgs) -> anyhow::Result<bool> {
    let config = args.config();
    let source = FetchSource::new(&config)?;
    let Some(card) = load(&args, &config, &source).await? else {
        return Ok(false);
    };
    println!("{}", card.greeting);
    println!("{}", card.message);
    if !card.footer.is_empty() {
        println!("{}", card.footer);
    }
    Ok(true)
}

async fn render(args: RenderArgs) -> anyhow::Result<bool> {
    let config = CardConfig {
        background: args.background.clone(),
        device_pixel_ratio: args.scale,
        fonts: FontConfig {
            load_system_fonts: !args.no_system_fonts,
            font_dirs: args.font_dir.clone(),
            ..Default::default()
        },
        ..args.load.config()
    };
    config.validate()?;
    let source = FetchSource::new(&config)?;
    let Some(mut card) = load(&args.load, &config, &source).await? else {
        return Ok(false);
    };

    let mut exporter = CardExporter::new(&config)?;
    let snapshot = match &args.layout {
        Some(path) => {
            let raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_slice::<LayoutSnapshot>(&raw)
                .with_context(|| format!("parsing layout {}", path.display()))?
        }
        None => {
            let mut template = match &args.template {
                Some(path) => {
                    let html = std::fs::read_to_string(path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    CardTemplate::from_html(&html)?
                }
                None => CardTemplate::default(),
            };
            if let Some(width) = args.width {
                template.width = width;
            }
            exporter.snapshot(&template, &card)
        }
    };
    if let Some(path) = &args.dump_layout {
        std::fs::write(path, serde_json::to_vec_pretty(&snapshot)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    match rfcard::download_card(
        &mut card,
        &mut exporter,
        &snapshot,
        &source,
        &args.out_dir,
        &config.output_name,
    )
    .await
    {
        Ok(path) => {
            println!("{}", path.display());
            Ok(true)
        }
        Err(err) => {
            log::error!("{}", err);
            eprintln!("{}", card.error().unwrap_or(rfcard::error::EXPORT_ERROR_MESSAGE));
            Ok(false)
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Show(args) => show(args).await,
        Command::Render(args) => render(args).await,
    };
    match outcome {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("rfcard: {:#}", e);
            std::process::exit(2);
        }
    }
}
