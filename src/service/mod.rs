pub mod export;
pub mod format;
pub mod report;

pub use export::ExportFile;
pub use format::{BlankPolicy, Formatter};
pub use report::{Listing, ReportService};
