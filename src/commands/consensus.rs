use super::load::load_project;
use crate::cli::ConsensusArgs;
use crate::io::{write_consensus_fasta, write_strain_summaries};
use crate::project::{EditScope, Project};
use crate::utils::{create_writer, open_output_file, Result};

pub fn consensus(args: ConsensusArgs) -> Result<()> {
    let mut project = load_project(&args.input)?;
    apply_edits(&mut project, &args)?;

    let n_records = create_writer(&args.output_prefix, "consensus.fasta", |path| {
        let mut writer = open_output_file(path)?;
        write_consensus_fasta(&mut writer, &project, args.fill_uncovered)
    })?;
    create_writer(&args.output_prefix, "strains.tsv", |path| {
        let mut writer = open_output_file(path)?;
        write_strain_summaries(&mut writer, &project)
    })?;

    log::info!(
        "Wrote {} consensus sequences for {} strains",
        n_records,
        project.strain_count()
    );
    Ok(())
}

fn apply_edits(project: &mut Project, args: &ConsensusArgs) -> Result<()> {
    if args.edits.is_empty() {
        return Ok(());
    }
    let scope = if args.adopt_edits {
        project.scope_for(&[])
    } else {
        EditScope::All
    };
    for &edit in &args.edits {
        let summary = project.edit_reference(edit, &scope)?;
        log::debug!(
            "Edit {}: {} reads, {} pairs, {} strains updated",
            summary.edit,
            summary.reads.len(),
            summary.pairs.len(),
            summary.strains.len()
        );
    }
    Ok(())
}
