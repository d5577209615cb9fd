mod bam_utils;
mod io_utils;
mod readers;
mod region;
mod stats;
mod util;

pub use bam_utils::{is_bam_mapped, open_bam_reader};
pub use io_utils::{create_writer, open_output_file};
pub use readers::{open_genome_reader, open_text_reader};
pub use region::GenomicRegion;
pub use stats::{calculate_stats, Stats};
pub use util::{handle_error_and_exit, Result};
