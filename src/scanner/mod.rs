//! Component scanner: turns declarative metadata into a routing table.

mod error;
mod scan;

pub use error::ScanError;
pub use scan::scan;
