use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use cloudless::acquire::{Acquirer, UreqTransport};
use cloudless::core::LogPaths;
use cloudless::dataset::Preparer;
use cloudless::eval::{run_evaluation, CommandModel};
use cloudless::raster::{import_scenes, BackendKind};
use cloudless::train::{parse_run_logs, train, LogSeries, TrainerEnv};
use cloudless::{PipelineConfig, ProviderKind};
use log::LevelFilter;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "cloudless",
    version,
    about = "Cloud detection pipeline for satellite imagery"
)]
struct Cli {
    /// Pipeline config (JSON). Flags override its fields.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// More output; repeat for trace.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    /// Only warnings and errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    /// Structured JSON logs through `tracing`.
    #[cfg(feature = "tracing")]
    #[arg(long, global = true)]
    json_logs: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Backend {
    Gdal,
    Image,
}

impl From<Backend> for BackendKind {
    fn from(b: Backend) -> Self {
        match b {
            Backend::Gdal => BackendKind::Gdal,
            Backend::Image => BackendKind::Image,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download every scene intersecting a buffer around a point.
    Download {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Buffer radius in meters.
        #[arg(long)]
        buffer: Option<f64>,
        #[arg(long)]
        provider: Option<ProviderKind>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Cut downloaded scenes into square PNG tiles.
    Chunk {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        chunk_size: Option<u32>,
        #[arg(long, value_enum)]
        backend: Option<Backend>,
        /// Remove each scene once chunked.
        #[arg(long)]
        delete_source: bool,
    },
    /// Crop, split, augment and pack annotated images.
    Prepare {
        #[arg(long)]
        metadata: Option<PathBuf>,
        #[arg(long)]
        images: Option<PathBuf>,
        #[arg(long)]
        output_images: Option<PathBuf>,
        #[arg(long)]
        output_records: Option<PathBuf>,
        #[arg(long)]
        width: Option<u32>,
        #[arg(long)]
        height: Option<u32>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        train_fraction: Option<f64>,
        /// Add three rotations of every training example.
        #[arg(long)]
        augment: bool,
        /// Stop after the image sets; do not write record stores.
        #[arg(long)]
        no_records: bool,
        #[arg(long)]
        log_dir: Option<PathBuf>,
        #[arg(long)]
        log_num: Option<u32>,
    },
    /// Fine-tune with Caffe (needs CAFFE_HOME).
    Train {
        #[arg(long)]
        solver: Option<PathBuf>,
        #[arg(long)]
        input_weight_file: Option<PathBuf>,
        #[arg(long)]
        output_weight_file: Option<PathBuf>,
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        log_dir: Option<PathBuf>,
        #[arg(long)]
        log_num: Option<u32>,
    },
    /// Summarize the parsed series of a training run.
    ParseLogs {
        #[arg(long)]
        log_dir: Option<PathBuf>,
        #[arg(long)]
        log_num: Option<u32>,
    },
    /// Score the validation store with an external predictor.
    Evaluate {
        /// Predictor program: reads image paths, answers probabilities.
        #[arg(long)]
        predictor: PathBuf,
        #[arg(long)]
        store: Option<PathBuf>,
        #[arg(long)]
        threshold: Option<f64>,
        #[arg(long)]
        log_dir: Option<PathBuf>,
        #[arg(long)]
        log_num: Option<u32>,
        /// Extra arguments for the predictor, after `--`.
        #[arg(last = true)]
        predictor_args: Vec<String>,
    },
    /// Print the effective config, or write it to a file.
    Config {
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

fn level(cli: &Cli) -> LevelFilter {
    if cli.quiet {
        return LevelFilter::Warn;
    }
    match cli.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn init_logging(cli: &Cli) -> Result<(), Box<dyn Error>> {
    #[cfg(feature = "tracing")]
    {
        if cli.json_logs {
            cloudless::core::init_tracing(true);
            return Ok(());
        }
    }
    cloudless::core::init_with_level(level(cli))?;
    Ok(())
}

fn print_series(name: &str, series: &LogSeries) {
    match series.last() {
        Some(last) => println!(
            "{name}: {} points, last iteration {} loss {:.4} accuracy {:.4}",
            series.len(),
            last.iteration,
            last.loss,
            last.accuracy
        ),
        None => println!("{name}: no points"),
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut cfg = match &cli.config {
        Some(path) => PipelineConfig::load_json(path)?,
        None => PipelineConfig::default(),
    };

    match cli.command {
        Command::Download {
            lat,
            lng,
            buffer,
            provider,
            output,
        } => {
            set(&mut cfg.acquire.buffer_meters, buffer);
            set(&mut cfg.acquire.provider, provider);
            set(&mut cfg.acquire.download_dir, output);
            let transport = UreqTransport::from_env()?;
            let scenes = Acquirer::new(cfg.acquire, transport).acquire(lat, lng)?;
            println!("downloaded {} scenes", scenes.len());
            for scene in &scenes {
                println!("{}", scene.path.display());
            }
        }
        Command::Chunk {
            input,
            output,
            chunk_size,
            backend,
            delete_source,
        } => {
            let stage = &mut cfg.chunk;
            set(&mut stage.input_dir, input);
            set(&mut stage.output_dir, output);
            set(&mut stage.params.chunk_size, chunk_size);
            set(&mut stage.params.backend, backend.map(BackendKind::from));
            stage.params.delete_source |= delete_source;
            let summary = import_scenes(&stage.input_dir, &stage.output_dir, &stage.params)?;
            println!(
                "{} scenes: {} chunks kept, {} rejected, {} scenes failed",
                summary.scenes,
                summary.chunks.len(),
                summary.rejected,
                summary.failed.len()
            );
        }
        Command::Prepare {
            metadata,
            images,
            output_images,
            output_records,
            width,
            height,
            seed,
            train_fraction,
            augment,
            no_records,
            log_dir,
            log_num,
        } => {
            let p = &mut cfg.prepare;
            set(&mut p.input_metadata, metadata);
            set(&mut p.input_images, images);
            set(&mut p.output_images, output_images);
            set(&mut p.output_records, output_records);
            set(&mut p.records.width, width);
            set(&mut p.records.height, height);
            set(&mut p.seed, seed);
            set(&mut p.train_fraction, train_fraction);
            set(&mut p.log_dir, log_dir);
            set(&mut p.log_num, log_num);
            p.do_augmentation |= augment;
            if no_records {
                p.write_records = false;
            }
            let prepared = Preparer::new(cfg.prepare).run()?;
            print!("{}", prepared.statistics);
        }
        Command::Train {
            solver,
            input_weight_file,
            output_weight_file,
            note,
            log_dir,
            log_num,
        } => {
            let env = TrainerEnv::from_env()?;
            let t = &mut cfg.train;
            set(&mut t.solver, solver);
            set(&mut t.input_weight_file, input_weight_file);
            set(&mut t.output_weight_file, output_weight_file);
            set(&mut t.log_dir, log_dir);
            set(&mut t.log_num, log_num);
            if note.is_some() {
                t.note = note;
            }
            let outcome = train(&env, &cfg.train)?;
            print_series("training", &outcome.training);
            print_series("validation", &outcome.validation);
            println!("weights: {}", outcome.output_weight_file.display());
        }
        Command::ParseLogs { log_dir, log_num } => {
            let t = &mut cfg.train;
            set(&mut t.log_dir, log_dir);
            set(&mut t.log_num, log_num);
            let paths = LogPaths::new(&t.log_dir, t.log_num);
            let (training, validation) = parse_run_logs(&paths)?;
            print_series("training", &training);
            print_series("validation", &validation);
        }
        Command::Evaluate {
            predictor,
            store,
            threshold,
            log_dir,
            log_num,
            predictor_args,
        } => {
            let e = &mut cfg.eval;
            set(&mut e.validation_store, store);
            set(&mut e.threshold, threshold);
            set(&mut e.log_dir, log_dir);
            set(&mut e.log_num, log_num);
            let model = CommandModel::spawn(&predictor, &predictor_args)?;
            let report = run_evaluation(&cfg.eval, model)?;
            print!("{report}");
        }
        Command::Config { output } => match output {
            Some(path) => cfg.write_json(path)?,
            None => println!("{}", cfg.to_json()?),
        },
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(&cli) {
        eprintln!("cannot initialize logging: {e}");
    }
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
