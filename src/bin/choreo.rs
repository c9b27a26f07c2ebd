use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand};
use rayon::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "choreo", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build and dry-run every active scene; print durations and digests.
    Check(CheckArgs),
    /// Write each scene's property updates as JSON lines.
    Export(ExportArgs),
    /// Print resolved node states of one scene at a point in time.
    Sample(SampleArgs),
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output directory; one `<scene>.jsonl` per scene.
    #[arg(long)]
    out: PathBuf,

    /// Export only this scene.
    #[arg(long)]
    scene: Option<String>,

    /// Export scenes in parallel.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Override rayon worker threads (parallel mode only).
    #[arg(long)]
    threads: Option<usize>,

    /// Override the sampling rate, e.g. `30` or `30000/1001`.
    #[arg(long)]
    fps: Option<String>,
}

#[derive(Parser, Debug)]
struct SampleArgs {
    /// Input project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    #[arg(long)]
    scene: String,

    /// Seconds from the start of the scene.
    #[arg(long)]
    time: f64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Check(args) => cmd_check(args),
        Command::Export(args) => cmd_export(args),
        Command::Sample(args) => cmd_sample(args),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_fps(s: &str) -> anyhow::Result<choreo::Fps> {
    let (num, den) = s.split_once('/').unwrap_or((s, "1"));
    let num = num.trim().parse().with_context(|| format!("fps numerator in '{s}'"))?;
    let den = den.trim().parse().with_context(|| format!("fps denominator in '{s}'"))?;
    Ok(choreo::Fps::new(num, den)?)
}

fn cmd_check(args: CheckArgs) -> anyhow::Result<()> {
    let project = choreo::Project::from_path(&args.in_path)?;
    for name in project.active_scenes() {
        let scene = project
            .build_scene(name)
            .with_context(|| format!("build scene '{name}'"))?;
        let extent = scene.extent();
        let mut player = choreo::Player::new(scene, choreo::PlayerOpts::default());
        let mut sink = choreo::DigestSink::new();
        let stats = player
            .render(&mut sink)
            .with_context(|| format!("play scene '{name}'"))?;
        println!(
            "{name}: duration {:.3}s, settles {:.3}s, {} frames, {} updates, digest {:016x}",
            extent.duration,
            extent.settle,
            stats.frames,
            stats.updates,
            sink.digest()
        );
    }
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let project = choreo::Project::from_path(&args.in_path)?;
    let scenes: Vec<String> = match &args.scene {
        Some(s) => vec![s.clone()],
        None => project.active_scenes().into_iter().map(str::to_owned).collect(),
    };
    let fps = args.fps.as_deref().map(parse_fps).transpose()?;

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("create output dir '{}'", args.out.display()))?;

    let export_one = |name: &String| -> anyhow::Result<(String, choreo::RenderStats)> {
        let scene = project
            .build_scene(name)
            .with_context(|| format!("build scene '{name}'"))?;
        let path = args.out.join(format!("{name}.jsonl"));
        let f = File::create(&path).with_context(|| format!("create '{}'", path.display()))?;
        let mut sink = choreo::JsonLinesSink::new(BufWriter::new(f));
        let opts = choreo::PlayerOpts {
            fps,
            ..choreo::PlayerOpts::default()
        };
        let stats = choreo::Player::new(scene, opts)
            .render(&mut sink)
            .with_context(|| format!("export scene '{name}'"))?;
        Ok((path.display().to_string(), stats))
    };

    let results = if args.parallel {
        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(n) = args.threads {
            builder = builder.num_threads(n);
        }
        let pool = builder.build().context("build rayon thread pool")?;
        pool.install(|| {
            scenes
                .par_iter()
                .map(export_one)
                .collect::<anyhow::Result<Vec<_>>>()
        })?
    } else {
        scenes
            .iter()
            .map(export_one)
            .collect::<anyhow::Result<Vec<_>>>()?
    };

    for (path, stats) in results {
        eprintln!(
            "wrote {path} ({} frames, {} updates)",
            stats.frames, stats.updates
        );
    }
    Ok(())
}

fn cmd_sample(args: SampleArgs) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.time.is_finite() && args.time >= 0.0,
        "--time must be a non-negative number of seconds"
    );
    let project = choreo::Project::from_path(&args.in_path)?;
    let scene = project
        .build_scene(&args.scene)
        .with_context(|| format!("build scene '{}'", args.scene))?;
    let mut player = choreo::Player::new(scene, choreo::PlayerOpts::default());
    let state = player
        .advance_to(args.time)
        .with_context(|| format!("advance scene '{}' to {}s", args.scene, args.time))?;

    let graph = player.graph();
    let mut nodes = BTreeMap::new();
    for id in graph.node_ids() {
        let props: BTreeMap<&str, choreo::Value> = graph
            .state(id)?
            .into_iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        nodes.insert(graph.node_name(id), props);
    }
    let out = serde_json::json!({
        "scene": args.scene,
        "time": args.time,
        "complete": state == choreo::PlayState::Complete,
        "nodes": nodes,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
