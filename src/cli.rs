use crate::align::ReferenceEdit;
use crate::utils::{GenomicRegion, Result};
use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    )
});

#[derive(Parser)]
#[command(name="strainalign",
          version=&**FULL_VERSION,
          about="Strain consensus from reads aligned to a reference window",
          long_about = None,
          disable_help_subcommand = true,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Build per-strain consensus sequences")]
    Consensus(ConsensusArgs),
    #[clap(about = "Report read, pair and strain statistics")]
    Stats(StatsArgs),
}

/// Inputs shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    #[clap(required = true)]
    #[clap(short = 'g')]
    #[clap(long = "genome")]
    #[clap(help = "Path to reference genome FASTA")]
    #[clap(value_name = "FASTA")]
    #[arg(value_parser = check_file_exists)]
    pub genome_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'r')]
    #[clap(long = "reads")]
    #[clap(help = "Indexed BAM file with aligned reads")]
    #[clap(value_name = "READS")]
    #[arg(value_parser = check_file_exists)]
    pub reads_path: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'w')]
    #[clap(long = "region")]
    #[clap(help = "Reference window to load (chr:start-end, 0-based half-open)")]
    #[clap(value_name = "REGION")]
    #[arg(value_parser = GenomicRegion::from_string)]
    pub region: GenomicRegion,

    #[clap(short = 's')]
    #[clap(long = "strains")]
    #[clap(help = "Two-column TSV assigning reads or pairs to strains; defaults to the HP tag")]
    #[clap(value_name = "STRAINS")]
    #[arg(value_parser = check_file_exists)]
    pub strains_path: Option<PathBuf>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "min-mapq")]
    #[clap(value_name = "MAPQ")]
    #[clap(help = "Minimum mapping quality of imported reads")]
    #[clap(default_value = "10")]
    pub min_mapq: u8,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "min-base-qual")]
    #[clap(value_name = "QUAL")]
    #[clap(help = "Calls below this base quality count as unknown bases")]
    #[clap(default_value = "0")]
    #[arg(value_parser = check_phred)]
    pub min_base_qual: u8,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("consensus")))]
#[command(arg_required_else_help(true))]
pub struct ConsensusArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "output-prefix")]
    #[clap(help = "Prefix for output files")]
    #[clap(value_name = "OUTPUT_PREFIX")]
    #[arg(value_parser = check_prefix_path)]
    pub output_prefix: String,

    #[clap(long = "edit")]
    #[clap(value_name = "POS:OLD>NEW")]
    #[clap(help = "Reference edit in window coordinates, applied in order; '-' denotes a gap")]
    #[clap(action = ArgAction::Append)]
    #[arg(value_parser = ReferenceEdit::from_string)]
    pub edits: Vec<ReferenceEdit>,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "adopt-edits")]
    #[clap(help = "Reads take on edited reference bases instead of keeping their own")]
    pub adopt_edits: bool,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "fill-uncovered")]
    #[clap(help = "Render uncovered consensus columns with the reference base")]
    pub fill_uncovered: bool,
}

#[derive(Parser, Debug)]
#[command(group(ArgGroup::new("stats")))]
#[command(arg_required_else_help(true))]
pub struct StatsArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn check_prefix_path(s: &str) -> Result<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(s.to_string())
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn check_phred(s: &str) -> Result<u8> {
    let value: u8 = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid base quality", s))?;
    if value > 93 {
        Err(format!("Base quality must be at most 93, got: {}", value))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_consensus_arguments() {
        let genome = tempfile::Builder::new().suffix(".fa").tempfile().unwrap();
        let reads = tempfile::Builder::new().suffix(".bam").tempfile().unwrap();
        let genome_path = genome.path().to_str().unwrap();
        let reads_path = reads.path().to_str().unwrap();
        let cli = Cli::try_parse_from([
            "strainalign",
            "-vv",
            "consensus",
            "-g",
            genome_path,
            "-r",
            reads_path,
            "-w",
            "chr1:1,000-2,000",
            "-o",
            "sample",
            "--edit",
            "10:A>G",
            "--edit",
            "20:->T",
        ])
        .unwrap();
        assert_eq!(cli.verbosity, 2);

        let Command::Consensus(args) = cli.command else {
            panic!("expected consensus");
        };
        assert_eq!(args.input.region.start, 1000);
        assert_eq!(args.input.min_mapq, 10);
        assert!(args.input.strains_path.is_none());
        assert_eq!(
            args.edits,
            vec![
                ReferenceEdit::from_string("10:A>G").unwrap(),
                ReferenceEdit::Insert {
                    position: 20,
                    base: b'T'
                },
            ]
        );
        assert!(!args.fill_uncovered);
    }

    #[test]
    fn rejects_malformed_edit() {
        let genome = tempfile::Builder::new().suffix(".fa").tempfile().unwrap();
        let path = genome.path().to_str().unwrap();
        let result = Cli::try_parse_from([
            "strainalign", "consensus", "-g", path, "-r", path, "-w", "chr1:0-10", "-o", "out",
            "--edit", "10:A",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn phred_bounds() {
        assert_eq!(check_phred("20"), Ok(20));
        assert!(check_phred("94").is_err());
        assert!(check_phred("-1").is_err());
    }

    #[test]
    fn missing_prefix_directory_is_rejected() {
        assert!(check_prefix_path("no/such/dir/prefix").is_err());
        assert_eq!(check_prefix_path("prefix"), Ok("prefix".to_string()));
    }
}
