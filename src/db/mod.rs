pub mod filters;
pub mod pool;
pub mod queries;
pub mod store;

pub use filters::{receivable_filters, renegotiation_filters, FilterClause, SqlParam};
pub use pool::create_pool;
pub use queries::{count_statement, data_statement, ReportView, Statement};
pub use store::{PgReportStore, ReportStore};
