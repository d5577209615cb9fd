mod bam_import;
mod cigar;
mod export;
mod strain_table;

pub use bam_import::{build_project, import_region, load_reference, ImportParams, ImportedRecord};
pub use cigar::{Cigar, CigarOp, CigarOpExt, WindowedRead};
pub use export::{write_consensus_fasta, write_strain_summaries, STRAIN_TABLE_HEADER};
pub use strain_table::StrainTable;
