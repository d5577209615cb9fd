//! Loads the reads of one genomic window from an indexed BAM into a `Project`.

use super::cigar::{Cigar, WindowedRead};
use crate::align::ReadId;
use crate::project::{Project, Readable, Reference};
use crate::utils::{GenomicRegion, Result};
use rust_htslib::bam::{self, record::Aux, Read, Record};
use rust_htslib::faidx;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
pub struct ImportParams {
    pub min_mapq: u8,
    /// Group reads into strains `HP1`, `HP2`, ... by their `HP` tag.
    pub strains_from_hp: bool,
}

/// A primary record restated in window coordinates.
#[derive(Debug, Clone)]
pub struct ImportedRecord {
    pub qname: String,
    pub is_first_mate: bool,
    pub is_forward: bool,
    pub haplotype: Option<u8>,
    pub read: WindowedRead,
}

/// Fetches the reference bases of `region`, uppercased.
pub fn load_reference(genome: &faidx::Reader, region: &GenomicRegion) -> Result<Reference> {
    let bases = genome
        .fetch_seq_string(
            &region.contig,
            region.start as usize,
            region.end as usize - 1,
        )
        .map_err(|e| format!("Error fetching sequence for region {}: {}", region, e))?
        .to_uppercase()
        .into_bytes();
    if bases.len() != region.len() {
        return Err(format!(
            "Region {} extends past the end of contig {} ({} bases available)",
            region,
            region.contig,
            bases.len()
        ));
    }
    Ok(Reference::new(&region.to_string(), bases))
}

/// Reads every usable record overlapping `region` and builds the project.
pub fn import_region(
    bam: &mut bam::IndexedReader,
    reference: Reference,
    region: &GenomicRegion,
    params: &ImportParams,
) -> Result<Project> {
    let records = extract_records(bam, reference.bases(), region, params.min_mapq)?;
    build_project(reference, records, params.strains_from_hp)
}

fn extract_records(
    bam: &mut bam::IndexedReader,
    window: &[u8],
    region: &GenomicRegion,
    min_mapq: u8,
) -> Result<Vec<ImportedRecord>> {
    bam.fetch((region.contig.as_str(), region.start, region.end))
        .map_err(|e| format!("Fetch error for {}: {}", region, e))?;

    let mut records = Vec::new();
    let (mut n_filt, mut n_outside) = (0, 0);
    let mut record = Record::new();
    while let Some(result) = bam.read(&mut record) {
        result.map_err(|e| e.to_string())?;
        if record.is_unmapped() || record.is_supplementary() || record.is_secondary() {
            continue;
        }
        if record.mapq() < min_mapq {
            n_filt += 1;
            continue;
        }

        let qname = String::from_utf8_lossy(record.qname()).into_owned();
        let cigar = Cigar {
            ref_pos: record.pos(),
            ops: record.cigar().take().to_vec(),
        };
        let bases = record.seq().as_bytes();
        if cigar.query_len() != bases.len() {
            log::warn!(
                "{}: CIGAR covers {} bases but the record holds {}, skipping",
                qname,
                cigar.query_len(),
                bases.len()
            );
            n_filt += 1;
            continue;
        }

        match cigar.clip_to_window(&bases, record.qual(), window, region) {
            Some(read) => records.push(ImportedRecord {
                qname,
                is_first_mate: !record.is_paired() || record.is_first_in_template(),
                is_forward: !record.is_reverse(),
                haplotype: get_hp_tag(&record),
                read,
            }),
            None => n_outside += 1,
        }
    }
    log::debug!(
        "{}: {} records kept, {} filtered, {} without aligned bases in the window",
        region,
        records.len(),
        n_filt,
        n_outside
    );
    Ok(records)
}

fn get_hp_tag(rec: &bam::Record) -> Option<u8> {
    match rec.aux(b"HP") {
        Ok(Aux::U8(value)) => Some(value),
        _ => None,
    }
}

/// Adds the records to a fresh project. Records sharing a query name become
/// the mates `{qname}/1` and `{qname}/2` of pair `{qname}`.
pub fn build_project(
    reference: Reference,
    records: Vec<ImportedRecord>,
    strains_from_hp: bool,
) -> Result<Project> {
    let mut project = Project::new(reference);
    let mut haplotypes: BTreeMap<u8, Vec<Readable>> = BTreeMap::new();

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<ImportedRecord>> = HashMap::new();
    for record in records {
        if !groups.contains_key(&record.qname) {
            order.push(record.qname.clone());
        }
        groups.entry(record.qname.clone()).or_default().push(record);
    }

    for qname in order {
        let Some(mut group) = groups.remove(&qname) else {
            continue;
        };
        if group.len() > 2 {
            log::warn!(
                "{}: {} primary records share this name, keeping the first two",
                qname,
                group.len()
            );
            group.truncate(2);
        }
        // Stable sort keeps input order for unflagged records
        group.sort_by_key(|record| !record.is_first_mate);

        let haplotype = group.iter().find_map(|record| record.haplotype);
        let readable = if group.len() == 1 {
            Readable::Read(add_record(&mut project, &qname, &group[0])?)
        } else {
            let first = add_record(&mut project, &format!("{}/1", qname), &group[0])?;
            let second = add_record(&mut project, &format!("{}/2", qname), &group[1])?;
            Readable::Pair(project.pair_reads(&qname, first, second)?)
        };
        if let Some(haplotype) = haplotype {
            haplotypes.entry(haplotype).or_default().push(readable);
        }
    }

    if strains_from_hp {
        for (haplotype, members) in haplotypes {
            let strain = project.add_strain(&format!("HP{}", haplotype))?;
            project.set_strain_members(strain, members)?;
        }
    }

    log::info!(
        "Imported {} reads ({} pairs) into {} strains",
        project.read_count(),
        project.pair_count(),
        project.strain_count()
    );
    Ok(project)
}

fn add_record(
    project: &mut Project,
    name: &str,
    record: &ImportedRecord,
) -> Result<ReadId> {
    let id = project.add_read(
        name,
        record.read.span,
        record.read.query_start,
        record.is_forward,
        record.read.diffs.clone(),
    )?;
    Ok(id)
}
