use crate::project::{NamedItem, Project, Readable};
use crate::utils::{open_text_reader, Result};
use std::{
    collections::{HashMap, HashSet},
    io::BufRead,
    path::Path,
};

/// Strain membership read from a two-column `readable<TAB>strain` table.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct StrainTable {
    /// (readable name, strain name) in file order.
    entries: Vec<(String, String)>,
}

impl StrainTable {
    pub fn from_path(path: &Path) -> Result<Self> {
        let reader = open_text_reader(path)?;
        Self::from_reader(reader).map_err(|e| format!("{}: {}", path.display(), e))
    }

    /// Parses the table. Blank lines and lines starting with `#` are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut entries = Vec::new();
        let mut seen = HashSet::new();

        for (line_number, line) in reader.lines().enumerate() {
            let line =
                line.map_err(|e| format!("Error reading line {}: {}", line_number + 1, e))?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            let (readable, strain) = match (parts.next(), parts.next(), parts.next()) {
                (Some(readable), Some(strain), None) => (readable, strain),
                _ => Err(format!(
                    "Expected readable and strain names at line {}",
                    line_number + 1
                ))?,
            };

            if !seen.insert(readable.to_string()) {
                Err(format!(
                    "Duplicate readable entry at line {}: {}",
                    line_number + 1,
                    readable
                ))?
            }
            entries.push((readable.to_string(), strain.to_string()));
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Places the listed reads and pairs into their strains, creating strains
    /// as needed. Names absent from the project are skipped with a warning;
    /// a mate name stands for its pair.
    ///
    /// # Returns
    ///
    /// The number of readables assigned.
    pub fn assign(&self, project: &mut Project) -> Result<usize> {
        let mut strain_order: Vec<&str> = Vec::new();
        let mut members: HashMap<&str, Vec<Readable>> = HashMap::new();
        let mut n_missing = 0;

        for (readable_name, strain_name) in &self.entries {
            let readable = match project.lookup(readable_name) {
                Some(NamedItem::Read(id)) => match project.read(id).pair {
                    Some(pair) => {
                        log::debug!(
                            "{} is a mate of {}, assigning the pair",
                            readable_name,
                            project.pair(pair).name
                        );
                        Readable::Pair(pair)
                    }
                    None => Readable::Read(id),
                },
                Some(NamedItem::Pair(id)) => Readable::Pair(id),
                Some(NamedItem::Strain(_)) => {
                    return Err(format!("{} names a strain, not a read", readable_name))
                }
                None => {
                    log::warn!("{} is not in the imported region, skipping", readable_name);
                    n_missing += 1;
                    continue;
                }
            };
            if !members.contains_key(strain_name.as_str()) {
                strain_order.push(strain_name);
            }
            members.entry(strain_name).or_default().push(readable);
        }

        let mut n_assigned = 0;
        for strain_name in strain_order {
            let strain = match project.lookup(strain_name) {
                Some(NamedItem::Strain(id)) => id,
                Some(_) => {
                    return Err(format!(
                        "Strain name {} is already used by a read or pair",
                        strain_name
                    ))
                }
                None => project.add_strain(strain_name)?,
            };
            let strain_members = members.remove(strain_name).unwrap_or_default();
            n_assigned += strain_members.len();
            project.set_strain_members(strain, strain_members)?;
        }

        if n_missing > 0 {
            log::warn!("{} strain table entries did not match any read", n_missing);
        }
        Ok(n_assigned)
    }
}
