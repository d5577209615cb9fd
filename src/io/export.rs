//! Writers for strain consensus sequences and strain summaries.

use crate::project::{Project, StrainSummary};
use crate::utils::Result;
use itertools::Itertools;
use std::io::Write;

const FASTA_LINE_WIDTH: usize = 80;

/// Writes one FASTA record per non-empty strain.
///
/// # Arguments
/// * `writer` - Destination of the records.
/// * `project` - Project holding the strains.
/// * `fill_from_consensus` - Render uncovered reference columns with the
///   reference base instead of the filler base.
///
/// # Returns
/// The number of records written.
pub fn write_consensus_fasta<W: Write>(
    writer: &mut W,
    project: &Project,
    fill_from_consensus: bool,
) -> Result<usize> {
    let mut n_written = 0;
    for strain in project.strain_ids() {
        let Some(sequence) = project.strain_consensus(strain, fill_from_consensus) else {
            log::debug!("Strain {} has no members, skipping", project.strain(strain).name);
            continue;
        };
        let summary = project.strain_summary(strain);
        let span = summary
            .span
            .map(|s| format!("{}-{}", s.start, s.end))
            .unwrap_or_default();
        writeln!(
            writer,
            ">{} {}:{} members={}",
            summary.name,
            project.reference().name(),
            span,
            summary.members
        )
        .map_err(|e| e.to_string())?;
        for line in sequence.chunks(FASTA_LINE_WIDTH) {
            writer.write_all(line).map_err(|e| e.to_string())?;
            writer.write_all(b"\n").map_err(|e| e.to_string())?;
        }
        n_written += 1;
    }
    writer.flush().map_err(|e| e.to_string())?;
    Ok(n_written)
}

pub const STRAIN_TABLE_HEADER: [&str; 8] = [
    "name",
    "members",
    "reads",
    "start",
    "end",
    "identity",
    "diffs",
    "unknown_bases",
];

fn format_summary(summary: &StrainSummary) -> String {
    let (start, end) = summary
        .span
        .map(|s| (s.start.to_string(), s.end.to_string()))
        .unwrap_or_else(|| (".".to_string(), ".".to_string()));
    let identity = summary
        .identity
        .map(|i| format!("{:.4}", i))
        .unwrap_or_else(|| ".".to_string());
    [
        summary.name.clone(),
        summary.members.to_string(),
        summary.reads.to_string(),
        start,
        end,
        identity,
        summary.diffs.to_string(),
        summary.unknown_bases.to_string(),
    ]
    .iter()
    .join("\t")
}

/// Writes a tab-separated summary line per strain, empty strains included.
pub fn write_strain_summaries<W: Write>(writer: &mut W, project: &Project) -> Result<()> {
    writeln!(writer, "{}", STRAIN_TABLE_HEADER.iter().join("\t")).map_err(|e| e.to_string())?;
    for strain in project.strain_ids() {
        let summary = project.strain_summary(strain);
        writeln!(writer, "{}", format_summary(&summary)).map_err(|e| e.to_string())?;
    }
    writer.flush().map_err(|e| e.to_string())
}
