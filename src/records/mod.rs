//! Catalog records and their decoders
//!
//! Every record is built from one object of the catalog's object API, shaped
//! `{ "<id>": { ...fields... } }`, and keeps the raw object for relationship
//! lookups alongside its typed fields.

pub mod decode;
mod edition;
mod issue_number;
mod result_file;
mod series;

pub use decode::{parse_envelope, PartialDate, RawRecord};
pub use edition::Edition;
pub use issue_number::IssueNumber;
pub use result_file::{FileDetails, FileState, ResultFile};
pub use series::Series;
