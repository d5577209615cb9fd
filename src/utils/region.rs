use crate::utils::Result;
use std::fmt;

/// Reference window in BED convention: 0-based start, exclusive end.
#[derive(Debug, PartialEq, Clone)]
pub struct GenomicRegion {
    pub contig: String,
    pub start: u32,
    pub end: u32,
}

impl GenomicRegion {
    pub fn new(contig: impl Into<String>, start: u32, end: u32) -> Result<Self> {
        if start >= end {
            return Err(format!("Invalid region: start {} >= end {}", start, end));
        }

        Ok(Self {
            contig: contig.into(),
            start,
            end,
        })
    }

    pub fn from_string(encoding: &str) -> Result<Self> {
        let error_msg = || format!("Invalid region encoding: {}", encoding);
        let (contig, interval) = encoding.rsplit_once(':').ok_or_else(error_msg)?;
        let (start, end) = interval.split_once('-').ok_or_else(error_msg)?;

        if contig.is_empty() {
            return Err(error_msg());
        }

        let start: u32 = start.replace(',', "").parse().map_err(|_| error_msg())?;
        let end: u32 = end.replace(',', "").parse().map_err(|_| error_msg())?;

        Self::new(contig, start, end)
    }

    pub fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts a 0-based genome coordinate into the 1-based window
    /// coordinate used by the alignment engine, if it lies inside the window.
    pub fn window_position(&self, genome_pos: i64) -> Option<usize> {
        if genome_pos < self.start as i64 || genome_pos >= self.end as i64 {
            return None;
        }
        Some((genome_pos - self.start as i64) as usize + 1)
    }
}

impl fmt::Display for GenomicRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start, self.end)
    }
}
