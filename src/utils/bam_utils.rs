use crate::utils::Result;
use rust_htslib::bam::{self, Read};
use std::path::Path;

pub fn open_bam_reader(bam_path: &Path) -> Result<bam::IndexedReader> {
    bam::IndexedReader::from_path(bam_path)
        .map_err(|e| format!("Failed to create bam reader for {}: {}", bam_path.display(), e))
}

pub fn is_bam_mapped(reader: &bam::IndexedReader) -> bool {
    // The index needs @SQ lines to fetch anything
    reader.header().target_count() > 0
}
