mod logging;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use card_layout::{
    confetti_bursts, load_or_placeholder, reveal_overlay, Action, AspectRatio, CardConfig,
    CardRenderer, CardState, ConvergeSpawner, Effect, FileImage, Geometry, ImageSource,
    LayoutLimits, Orientation, Reveal, Settings, Stage, TextRenderer, Transition,
};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "gif", "bmp", "webp", "tiff"];

/// Largest base size or frame height accepted from the command line.
const MAX_DIMENSION: u32 = 8192;

#[derive(Parser, Debug)]
#[command(author, version, about = "Lay out and compose greeting cards")]
struct Cli {
    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Decrease log verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    quiet: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the preview geometry for a layout
    Geometry(GeometryArgs),
    /// Compose a card from an image and write it as PNG
    Compose(ComposeArgs),
    /// Compose a card for every image in a directory
    Batch(BatchArgs),
    /// Apply the reveal-page footer, QR code and label to an image
    Overlay(OverlayArgs),
    /// Simulate the blind-box reveal timeline
    Reveal(RevealArgs),
}

#[derive(Parser, Debug)]
struct GeometryArgs {
    #[command(flatten)]
    layout: LayoutArgs,
    /// Print the geometry as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Source image placed in the card's image box
    input: PathBuf,
    /// Output PNG path
    #[arg(short, long)]
    output: PathBuf,
    #[command(flatten)]
    layout: LayoutArgs,
    #[command(flatten)]
    decorations: DecorationArgs,
    /// Use a flat placeholder when the input image cannot be read
    #[arg(long, default_value_t = false)]
    placeholder_on_error: bool,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Directory searched recursively for images
    input: PathBuf,
    /// Output directory for composed cards
    #[arg(short, long)]
    out_dir: PathBuf,
    #[command(flatten)]
    layout: LayoutArgs,
    #[command(flatten)]
    decorations: DecorationArgs,
}

#[derive(Parser, Debug)]
struct OverlayArgs {
    /// Generated image to decorate
    input: PathBuf,
    /// Output PNG path
    #[arg(short, long)]
    output: PathBuf,
    /// Settings file providing the QR payload
    #[arg(long)]
    config: Option<PathBuf>,
    /// QR code payload, overriding the settings file
    #[arg(long)]
    qr_url: Option<String>,
    /// Font for the label, overriding the settings file
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RevealArgs {
    /// Milliseconds after start at which the image arrives
    #[arg(long, default_value_t = 1500)]
    image_after_ms: u64,
    /// Treat the image request as failed and use the fallback image
    #[arg(long, default_value_t = false)]
    fail: bool,
    /// Width of the arriving image
    #[arg(long, default_value_t = 720)]
    image_width: u32,
    /// Height of the arriving image
    #[arg(long, default_value_t = 1280)]
    image_height: u32,
    /// Simulation step in milliseconds
    #[arg(long, default_value_t = 16)]
    step_ms: u64,
    /// Seed for the particle spawner
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

#[derive(Parser, Debug, Clone)]
struct LayoutArgs {
    /// Settings file (TOML); flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Aspect ratio: 16:9, 1:1 or 4:3
    #[arg(long, value_parser = parse_ratio)]
    ratio: Option<AspectRatio>,
    /// Card orientation
    #[arg(long, value_enum)]
    orientation: Option<OrientationChoice>,
    /// Drop the white frame around the image
    #[arg(long, default_value_t = false)]
    no_border: bool,
    /// Short side of the image box in pixels
    #[arg(long)]
    base: Option<u32>,
    /// Maximum frame height in pixels
    #[arg(long)]
    max_height: Option<u32>,
}

#[derive(Parser, Debug, Clone)]
struct DecorationArgs {
    /// Hide the logo badge
    #[arg(long, default_value_t = false)]
    no_logo: bool,
    /// Hide the QR code
    #[arg(long, default_value_t = false)]
    no_qr: bool,
    /// Organization shown in the footer tag
    #[arg(long)]
    organization: Option<String>,
    /// Blessing printed under the image
    #[arg(long)]
    blessing: Option<String>,
    /// Font for the card text, overriding the settings file
    #[arg(long)]
    font: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OrientationChoice {
    Horizontal,
    Vertical,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::initialize(logging::level_from_flags(cli.verbose, cli.quiet))
        .context("failed to install logger")?;

    match cli.command {
        Commands::Geometry(args) => geometry(args),
        Commands::Compose(args) => compose(args),
        Commands::Batch(args) => batch(args),
        Commands::Overlay(args) => overlay(args),
        Commands::Reveal(args) => reveal(args),
    }
}

fn geometry(args: GeometryArgs) -> Result<()> {
    let (_, config, limits) = args.layout.resolve()?;
    let geometry = config.layout().geometry(limits);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&geometry)?);
    } else {
        print_geometry(&config, &geometry);
    }
    Ok(())
}

fn print_geometry(config: &CardConfig, geometry: &Geometry) {
    println!("{} {} border={}", config.aspect_ratio, config.orientation, config.show_border);
    println!("image   {}x{}", geometry.image.width, geometry.image.height);
    println!("frame   {}x{}", geometry.frame.width, geometry.frame.height);
    println!("padding top={} sides={}", geometry.padding.top, geometry.padding.sides);
    println!("caption {}", geometry.caption_band());
}

fn compose(args: ComposeArgs) -> Result<()> {
    let (settings, config, limits) = args.layout.resolve()?;
    let (renderer, state) = args.decorations.apply(settings, config)?;

    let mut source = FileImage::new(&args.input);
    let image = if args.placeholder_on_error {
        load_or_placeholder(&mut source).0
    } else {
        source.load().with_context(|| format!("failed to open image {:?}", args.input))?
    };
    let output = renderer
        .render(&state, Some(&image), limits)
        .with_context(|| format!("failed to compose {:?}", args.input))?;
    output.image.save(&args.output).with_context(|| format!("failed to write {:?}", args.output))?;

    info!(
        "wrote {}x{} card to {}",
        output.geometry.frame.width,
        output.geometry.frame.height,
        args.output.display()
    );
    Ok(())
}

fn batch(args: BatchArgs) -> Result<()> {
    let (settings, config, limits) = args.layout.resolve()?;
    let (renderer, state) = args.decorations.apply(settings, config)?;
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create output directory {:?}", args.out_dir))?;

    let inputs = collect_images(&args.input)?;
    let progress = ProgressBar::new(inputs.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} cards",
        )?
        .progress_chars("=> "),
    );

    let mut failed = 0;
    for (index, input) in inputs.iter().enumerate() {
        let stem = input.file_stem().and_then(|stem| stem.to_str()).unwrap_or("card");
        let target = args.out_dir.join(format!("{index:04}_{stem}.png"));

        let result = image::open(input)
            .map_err(anyhow::Error::from)
            .and_then(|image| Ok(renderer.render(&state, Some(&image), limits)?))
            .and_then(|output| output.image.save(&target).map_err(anyhow::Error::from));
        if let Err(err) = result {
            warn!("skipping {}: {err}", input.display());
            failed += 1;
        }
        progress.inc(1);
    }

    progress.finish_with_message(format!("Cards written to {:?} ({failed} failed)", args.out_dir));
    if failed == inputs.len() {
        anyhow::bail!("no card could be composed from {:?}", args.input);
    }
    Ok(())
}

fn collect_images(path: &Path) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path().to_path_buf())
        .filter(|path| has_image_extension(path))
        .collect();
    entries.sort();
    if entries.is_empty() {
        anyhow::bail!("no image files found in {:?}", path);
    }
    Ok(entries)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn overlay(args: OverlayArgs) -> Result<()> {
    let settings = load_settings(args.config.as_deref())?;
    let text = load_text(args.font.as_deref().or(settings.content.font.as_deref()))?;
    let qr_url = args.qr_url.unwrap_or(settings.content.qr_url);

    let image = image::open(&args.input)
        .with_context(|| format!("failed to open image {:?}", args.input))?
        .into_rgba8();
    let decorated = reveal_overlay(&image, &qr_url, Some(&text))
        .with_context(|| format!("failed to decorate {:?}", args.input))?;
    decorated.save(&args.output).with_context(|| format!("failed to write {:?}", args.output))?;
    Ok(())
}

fn reveal(args: RevealArgs) -> Result<()> {
    let step = Duration::from_millis(args.step_ms.max(1));
    let image_at = Duration::from_millis(args.image_after_ms);
    let limit = image_at + Duration::from_secs(10);

    let t0 = Instant::now();
    let mut reveal = Reveal::new(t0);
    let mut spawner = ConvergeSpawner::seeded(args.seed);
    let mut spawned = 0;

    let start = reveal.start(t0);
    let run = start.run;
    print_transition(&start, t0);
    apply_effects(&start.effects, &mut spawner, t0);

    let mut elapsed = Duration::ZERO;
    let mut image_sent = false;
    while reveal.stage() != Stage::Result && elapsed <= limit {
        elapsed += step;
        let now = t0 + elapsed;

        if !image_sent && elapsed >= image_at {
            if args.fail {
                reveal.image_failed(run, t0 + image_at);
            } else {
                reveal.image_ready(run, t0 + image_at, args.image_width, args.image_height);
            }
            image_sent = true;
        }

        spawned += spawner.poll(now);
        for transition in reveal.update(now) {
            print_transition(&transition, t0);
            apply_effects(&transition.effects, &mut spawner, transition.at);
        }
    }

    if reveal.stage() != Stage::Result {
        anyhow::bail!("reveal did not finish within {} ms", limit.as_millis());
    }

    println!("particles spawned: {spawned}");
    let confetti: u32 = confetti_bursts().iter().map(|burst| burst.particle_count).sum();
    println!("confetti pieces:   {confetti}");
    if reveal.used_fallback_image() {
        println!("image:             fallback");
    }
    if let Some(placement) = reveal.placement() {
        let (envelope_y, card_offset) = placement.position(false);
        println!("card offset:       {card_offset:.1}");
        println!("envelope y:        {envelope_y:.1}");
    }
    Ok(())
}

fn print_transition(transition: &Transition, t0: Instant) {
    let at = transition.at.saturating_duration_since(t0).as_millis();
    println!(
        "{at:>6} ms  {:>9} -> {:<9}  size {:>5.1}  {:?}",
        transition.from, transition.to, transition.size, transition.effects
    );
}

fn apply_effects(effects: &[Effect], spawner: &mut ConvergeSpawner, at: Instant) {
    for effect in effects {
        match effect {
            Effect::ParticlesStart => spawner.start(at),
            Effect::ParticlesStop => spawner.stop(),
            _ => (),
        }
    }
}

fn parse_ratio(value: &str) -> Result<AspectRatio, String> {
    value.parse().map_err(|err: card_layout::CardError| err.to_string())
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(path) => {
            Settings::load(path).with_context(|| format!("failed to load settings {:?}", path))
        },
        None => Ok(Settings::default()),
    }
}

fn load_text(font: Option<&Path>) -> Result<TextRenderer> {
    match font {
        Some(path) => {
            TextRenderer::load(path).with_context(|| format!("failed to load font {:?}", path))
        },
        None => Ok(TextRenderer::bundled()?),
    }
}

impl LayoutArgs {
    fn resolve(&self) -> Result<(Settings, CardConfig, LayoutLimits)> {
        let settings = load_settings(self.config.as_deref())?;
        let mut config = settings.card;
        let mut limits = settings.limits();

        if let Some(ratio) = self.ratio {
            config.aspect_ratio = ratio;
        }
        if let Some(orientation) = self.orientation {
            config.orientation = orientation.to_orientation();
        }
        if self.no_border {
            config.show_border = false;
        }
        if let Some(base) = self.base {
            limits.base_short_side = base;
        }
        if let Some(max_height) = self.max_height {
            limits.max_frame_height = max_height;
        }
        anyhow::ensure!(
            limits.base_short_side <= MAX_DIMENSION && limits.max_frame_height <= MAX_DIMENSION,
            "base size and maximum height must not exceed {MAX_DIMENSION} px"
        );

        Ok((settings, config, limits))
    }
}

impl DecorationArgs {
    fn apply(&self, settings: Settings, config: CardConfig) -> Result<(CardRenderer, CardState)> {
        let text = load_text(self.font.as_deref().or(settings.content.font.as_deref()))?;
        let mut state = CardState::new(config, settings.content);

        if self.no_logo {
            state.apply(Action::SetShowLogo(false));
        }
        if self.no_qr {
            state.apply(Action::SetShowQrCode(false));
        }
        if let Some(organization) = &self.organization {
            state.apply(Action::SetOrganizationName(organization.clone()));
        }
        if let Some(blessing) = &self.blessing {
            state.apply(Action::SetBlessingText(blessing.clone()));
        }
        Ok((CardRenderer::new(Some(text)), state))
    }
}

impl OrientationChoice {
    fn to_orientation(self) -> Orientation {
        match self {
            OrientationChoice::Horizontal => Orientation::Horizontal,
            OrientationChoice::Vertical => Orientation::Vertical,
        }
    }
}
