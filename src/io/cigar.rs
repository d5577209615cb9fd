use crate::align::{Difference, Segment, GAP};
use crate::utils::GenomicRegion;

pub type CigarOp = rust_htslib::bam::record::Cigar;

/// htslib stores 0xff when a record carries no base qualities.
const MISSING_QUALITY: u8 = 255;

pub trait CigarOpExt {
    fn ref_len(&self) -> usize;
    fn query_len(&self) -> usize;
}

impl CigarOpExt for CigarOp {
    fn ref_len(&self) -> usize {
        match self {
            CigarOp::Match(len)
            | CigarOp::RefSkip(len)
            | CigarOp::Del(len)
            | CigarOp::Equal(len)
            | CigarOp::Diff(len) => *len as usize,
            CigarOp::Ins(_) | CigarOp::SoftClip(_) | CigarOp::HardClip(_) | CigarOp::Pad(_) => 0,
        }
    }

    fn query_len(&self) -> usize {
        match self {
            CigarOp::Match(len)
            | CigarOp::Equal(len)
            | CigarOp::Diff(len)
            | CigarOp::Ins(len)
            | CigarOp::SoftClip(len) => *len as usize,
            CigarOp::RefSkip(_) | CigarOp::Del(_) | CigarOp::HardClip(_) | CigarOp::Pad(_) => 0,
        }
    }
}

/// A read alignment restated in 1-based window coordinates.
#[derive(Debug, PartialEq, Clone)]
pub struct WindowedRead {
    /// Reference columns from the first to the last aligned read base in the window.
    pub span: Segment,
    /// Query position (1-based, soft clips included) aligned to `span.start`.
    pub query_start: usize,
    pub diffs: Vec<Difference>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Cigar {
    /// 0-based genome position of the first reference-consuming operation.
    pub ref_pos: i64,
    pub ops: Vec<CigarOp>,
}

impl Cigar {
    pub fn query_len(&self) -> usize {
        self.ops.iter().map(|op| op.query_len()).sum()
    }

    pub fn ref_len(&self) -> usize {
        self.ops.iter().map(|op| op.ref_len()).sum()
    }

    /// Walks the operations and records every disagreement with `window`
    /// (the reference bases of `region`) that falls inside the region.
    ///
    /// Indels are kept only between two aligned read bases inside the window,
    /// so the alignment never starts or ends on a gap. Returns `None` when no
    /// read base is aligned inside the window.
    ///
    /// # Arguments
    /// * `bases` - Read bases, soft clips included.
    /// * `quals` - Phred qualities matching `bases`; may be empty.
    /// * `window` - Reference bases of `region`.
    /// * `region` - The window; `window[0]` is the base at `region.start`.
    pub fn clip_to_window(
        &self,
        bases: &[u8],
        quals: &[u8],
        window: &[u8],
        region: &GenomicRegion,
    ) -> Option<WindowedRead> {
        let quality_at = |query_pos: usize| {
            quals
                .get(query_pos)
                .copied()
                .filter(|&q| q != MISSING_QUALITY)
        };
        let call = |column: usize, ref_base: u8, query_pos: usize, base: u8| {
            match quality_at(query_pos) {
                Some(q) => Difference::with_quality(column, ref_base, query_pos + 1, base, q),
                None => Difference::new(column, ref_base, query_pos + 1, base),
            }
        };

        let mut first: Option<(usize, usize)> = None;
        let mut last = 0;
        let mut diffs = Vec::new();
        let mut ref_pos = self.ref_pos;
        let mut query_pos = 0;

        for op in &self.ops {
            match op {
                CigarOp::Match(len) | CigarOp::Equal(len) | CigarOp::Diff(len) => {
                    for offset in 0..*len as usize {
                        let Some(column) = region.window_position(ref_pos + offset as i64) else {
                            continue;
                        };
                        let q = query_pos + offset;
                        let ref_base = window[column - 1].to_ascii_uppercase();
                        let base = bases[q].to_ascii_uppercase();
                        first.get_or_insert((column, q + 1));
                        last = column;
                        if base != ref_base {
                            diffs.push(call(column, ref_base, q, base));
                        }
                    }
                }
                CigarOp::Ins(len) => {
                    if let (Some(_), Some(column)) = (first, region.window_position(ref_pos)) {
                        for offset in 0..*len as usize {
                            let q = query_pos + offset;
                            diffs.push(call(column, GAP, q, bases[q].to_ascii_uppercase()));
                        }
                    }
                }
                CigarOp::Del(len) | CigarOp::RefSkip(len) => {
                    if first.is_some() {
                        for offset in 0..*len as usize {
                            if let Some(column) = region.window_position(ref_pos + offset as i64) {
                                let ref_base = window[column - 1].to_ascii_uppercase();
                                // Position of the read base following the gap
                                diffs.push(Difference::new(column, ref_base, query_pos + 1, GAP));
                            }
                        }
                    }
                }
                CigarOp::SoftClip(_) | CigarOp::HardClip(_) | CigarOp::Pad(_) => {}
            }
            ref_pos += op.ref_len() as i64;
            query_pos += op.query_len();
        }

        let (start, query_start) = first?;
        // Indels past the last aligned base are not anchored on the right
        diffs.retain(|d| d.position1 <= last);
        Some(WindowedRead {
            span: Segment::on_reference(start, last),
            query_start,
            diffs,
        })
    }
}
