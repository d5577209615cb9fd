use super::load::load_project;
use crate::cli::StatsArgs;
use crate::project::Project;
use crate::utils::{calculate_stats, Result};

pub fn stats(args: StatsArgs) -> Result<()> {
    let project = load_project(&args.input)?;
    log_stats(&project);
    Ok(())
}

fn log_stats(project: &Project) {
    let unpaired = project
        .read_ids()
        .filter(|&id| project.read(id).pair.is_none())
        .count();
    log::info!(
        "Reads: {} ({} unpaired), pairs: {}, strains: {}",
        project.read_count(),
        unpaired,
        project.pair_count(),
        project.strain_count()
    );

    let identities: Vec<f64> = project
        .read_ids()
        .map(|id| project.read(id).alignment.identity(project))
        .collect();
    match calculate_stats(&identities) {
        Some(stats) => log::info!(
            "Read identity - Range: [{:.4},{:.4}], Median: {:.4}, Mean: {:.4}, StdDev: {:.4}",
            stats.min,
            stats.max,
            stats.median,
            stats.mean,
            stats.std_dev
        ),
        None => log::warn!("No reads aligned to {}", project.reference().name()),
    }

    for strain in project.strain_ids() {
        let summary = project.strain_summary(strain);
        match summary.span {
            Some(span) => log::info!(
                "Strain {}: {} members, {} reads, span {}-{}, {} diffs, {} unknown bases",
                summary.name,
                summary.members,
                summary.reads,
                span.start,
                span.end,
                summary.diffs,
                summary.unknown_bases
            ),
            None => log::info!("Strain {}: empty", summary.name),
        }
    }
}
