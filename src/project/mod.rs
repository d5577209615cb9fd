mod records;
mod reference;
mod store;
mod summary;

pub use records::{MatePair, NamedItem, Read, Readable, Strain};
pub use reference::Reference;
pub use store::Project;
pub use summary::{EditScope, EditSummary, StrainSummary};
