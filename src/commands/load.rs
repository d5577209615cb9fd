use crate::cli::InputArgs;
use crate::io::{import_region, load_reference, ImportParams, StrainTable};
use crate::project::Project;
use crate::utils::{is_bam_mapped, open_bam_reader, open_genome_reader, Result};

/// Imports the reads of the requested window and assigns strains.
pub fn load_project(input: &InputArgs) -> Result<Project> {
    let mut bam = open_bam_reader(&input.reads_path)?;
    if !is_bam_mapped(&bam) {
        return Err("Input BAM is not mapped".into());
    }

    let genome = open_genome_reader(&input.genome_path)?;
    let reference = load_reference(&genome, &input.region)?;
    log::debug!(
        "Loaded {} reference bases for {}",
        reference.len(),
        input.region
    );

    // A strain table replaces haplotype tags as the source of strains
    let strain_table = input
        .strains_path
        .as_deref()
        .map(StrainTable::from_path)
        .transpose()?;
    let params = ImportParams {
        min_mapq: input.min_mapq,
        strains_from_hp: strain_table.is_none(),
    };
    let mut project = import_region(&mut bam, reference, &input.region, &params)?;
    project.set_quality_threshold(input.min_base_qual);

    if let Some(table) = strain_table {
        let n_assigned = table.assign(&mut project)?;
        log::info!(
            "Assigned {} of {} strain table entries to {} strains",
            n_assigned,
            table.len(),
            project.strain_count()
        );
    }
    Ok(project)
}
