pub mod params;
pub mod record;

pub use params::{
    parse_date, present, ListingQuery, PageRequest, ReceivableFilters, RenegotiationFilters,
    RenegotiationQuery,
};
pub use record::{RowSet, SqlValue};
