use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use metabin_rs::progress::ProgressListener;
use metabin_rs::{
    analyze, AnalysisConfig, AssignmentMethod, CancelToken, ClassificationScheme,
    FileArchive, SchemeConfig,
};

/// Classify archived reads against one or more hierarchical schemes and
/// commit the assignment table next to the input.
#[derive(Parser)]
#[command(name = "metabin", version, about)]
struct Args {
    /// Read/match archive (.tsv, optionally .gz)
    #[arg(long)]
    input: PathBuf,

    /// Scheme hierarchy as NAME=PATH (repeatable). A PATH.disabled sidecar
    /// file with one id per line marks administratively disabled ids.
    #[arg(long = "scheme", required = true)]
    schemes: Vec<String>,

    /// Assignment method for the Taxonomy scheme: lca, best-hit,
    /// weighted-lca or long-read. Other schemes always use best-hit.
    #[arg(long, default_value = "lca")]
    method: String,

    /// Combine mated reads into one consensus taxon (plain files only)
    #[arg(long)]
    paired: bool,

    #[arg(long, default_value_t = 50.0)]
    min_score: f32,

    #[arg(long, default_value_t = 10.0)]
    top_percent: f32,

    #[arg(long, default_value_t = 0.01)]
    max_expected: f64,

    #[arg(long, default_value_t = 0.0)]
    min_percent_identity: f32,

    /// Reads below this complexity score go to the low-complexity bin
    #[arg(long, default_value_t = 0.0)]
    min_complexity: f32,

    #[arg(long, default_value_t = 1)]
    min_support: u64,

    /// Derive the min-support count from the reads with hits
    #[arg(long, default_value_t = 0.0)]
    min_support_percent: f32,

    /// Weight coverage for the weighted-lca method
    #[arg(long, default_value_t = 80.0)]
    weighted_percent: f32,

    /// Write per-scheme summary reports as REPORT.<scheme>.txt
    #[arg(long)]
    report: Option<PathBuf>,
}

struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .tick_strings(&[
                    "⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏",
                ])
                .template("{spinner:.green} {msg} {pos}/{len}")
                .expect("Invalid spinner template"),
        );
        Self { bar }
    }
}

impl ProgressListener for BarProgress {
    fn set_subtask(&self, subtask: &str) {
        self.bar.set_message(subtask.to_string());
    }

    fn set_maximum(&self, maximum: u64) {
        self.bar.set_length(maximum);
    }

    fn set_progress(&self, progress: u64) {
        self.bar.set_position(progress);
    }
}

fn parse_method(method: &str, weighted_percent: f32) -> AssignmentMethod {
    match method {
        "lca" => AssignmentMethod::Lca,
        "best-hit" => AssignmentMethod::BestHit,
        "weighted-lca" => AssignmentMethod::WeightedLca {
            percent: weighted_percent,
        },
        "long-read" => AssignmentMethod::LongReadLca,
        other => {
            eprintln!("Unknown method '{}', expected lca|best-hit|weighted-lca|long-read", other);
            std::process::exit(2);
        }
    }
}

fn read_disabled_ids(hierarchy_path: &str) -> Vec<i32> {
    let sidecar = format!("{}.disabled", hierarchy_path);
    match fs::read_to_string(&sidecar) {
        Ok(text) => text
            .lines()
            .filter_map(|line| line.trim().parse().ok())
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    // 1. Load the scheme hierarchies
    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Loading classification schemes...");

    let mut scheme_configs = Vec::new();
    let mut schemes = Vec::new();
    for entry in &args.schemes {
        let (name, path) = entry
            .split_once('=')
            .unwrap_or_else(|| {
                eprintln!("--scheme expects NAME=PATH, got '{}'", entry);
                std::process::exit(2);
            });
        let scheme = ClassificationScheme::from_path(name, path)
            .expect("Could not load scheme hierarchy");
        let method = if name == "Taxonomy" {
            parse_method(&args.method, args.weighted_percent)
        } else {
            AssignmentMethod::BestHit
        };
        scheme_configs.push(SchemeConfig {
            name: name.to_string(),
            method,
            disabled_ids: read_disabled_ids(path),
        });
        schemes.push(Arc::new(scheme));
    }
    spinner.finish_with_message(format!("Loaded {} scheme(s).", schemes.len()));

    // 2. Open the archive and run the pipeline
    let archive = FileArchive::open(&args.input).expect("Could not open read archive");

    let config = AnalysisConfig {
        min_score: args.min_score,
        top_percent: args.top_percent,
        max_expected: args.max_expected,
        min_percent_identity: args.min_percent_identity,
        min_complexity: args.min_complexity,
        min_support: args.min_support,
        min_support_percent: args.min_support_percent,
        use_mate_pairs: args.paired,
        schemes: scheme_configs,
    };

    let progress = BarProgress::new();
    let cancel = CancelToken::new();
    let results = analyze(&config, schemes, &archive, &progress, &cancel)
        .expect("Classification failed");
    progress.bar.finish_with_message("Classification finished.");

    // 3. Write reports if requested
    if let Some(report_base) = &args.report {
        for scheme in &config.schemes {
            if let Some(text) = results.get_report(&scheme.name) {
                let path = format!("{}.{}.txt", report_base.display(), scheme.name);
                fs::write(&path, text).expect("Could not write report");
                println!("Report written to {}", path);
            }
        }
    }

    println!("{}", results.get_status_text());
}
