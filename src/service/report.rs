use crate::db::{
    count_statement, data_statement, receivable_filters, renegotiation_filters, FilterClause,
    ReportStore, ReportView,
};
use crate::error::ReportError;
use crate::models::{PageRequest, ReceivableFilters, RenegotiationFilters, RowSet};
use crate::service::export::{
    receivables_xlsx_filename, write_csv, write_xlsx, ExportFile, CSV_CONTENT_TYPE, CSV_FILENAME,
    RECEIVABLES_SHEET, RENEGOTIATION_SHEET, RENEGOTIATION_XLSX_FILENAME, XLSX_CONTENT_TYPE,
};
use crate::service::format::{Formatter, JsonRecord};
use std::sync::Arc;

/// One page of a listing plus the size of the whole filtered set.
#[derive(Debug, Clone)]
pub struct Listing {
    pub page: PageRequest,
    pub total: i64,
    pub records: Vec<JsonRecord>,
}

/// Report service: builds the statements, runs them, shapes the output.
pub struct ReportService {
    store: Arc<dyn ReportStore>,
    formatter: Formatter,
}

impl ReportService {
    pub fn new(store: Arc<dyn ReportStore>, formatter: Formatter) -> Self {
        Self { store, formatter }
    }

    /// Paginated receivables listing.
    pub async fn list_receivables(
        &self,
        filters: &ReceivableFilters,
        page: PageRequest,
    ) -> Result<Listing, ReportError> {
        let clause = receivable_filters(filters)?;
        tracing::info!(
            "receivables listing: {} filters, page {} size {}",
            clause.predicates.len(),
            page.page,
            page.size
        );
        self.list(ReportView::Receivables, &clause, page).await
    }

    /// Paginated renegotiation listing.
    pub async fn list_renegotiation(
        &self,
        filters: &RenegotiationFilters,
        page: PageRequest,
    ) -> Result<Listing, ReportError> {
        let clause = renegotiation_filters(filters);
        tracing::info!(
            "renegotiation listing: {} filters, page {} size {}",
            clause.predicates.len(),
            page.page,
            page.size
        );
        self.list(ReportView::Renegotiation, &clause, page).await
    }

    async fn list(
        &self,
        view: ReportView,
        clause: &FilterClause,
        page: PageRequest,
    ) -> Result<Listing, ReportError> {
        let count = count_statement(clause);
        let data = data_statement(view, clause, Some(page));

        let (total, rows) = self.store.count_and_fetch(&count, &data).await?;
        let records = rows
            .iter_records()
            .map(|record| self.formatter.json_record(record))
            .collect();

        Ok(Listing {
            page,
            total,
            records,
        })
    }

    async fn fetch_all(&self, view: ReportView, clause: &FilterClause) -> Result<RowSet, ReportError> {
        let data = data_statement(view, clause, None);
        let rows = self.store.fetch(&data).await?;
        if rows.is_empty() {
            tracing::info!("export: no rows match the filters");
        } else {
            tracing::info!("export: {} rows", rows.len());
        }
        Ok(rows)
    }

    /// Full filtered receivables as a workbook named after the filters.
    pub async fn export_receivables_xlsx(
        &self,
        filters: &ReceivableFilters,
    ) -> Result<ExportFile, ReportError> {
        let clause = receivable_filters(filters)?;
        let rows = self.fetch_all(ReportView::Receivables, &clause).await?;
        Ok(ExportFile {
            filename: receivables_xlsx_filename(filters),
            content_type: XLSX_CONTENT_TYPE,
            body: write_xlsx(&rows, RECEIVABLES_SHEET, &self.formatter)?,
        })
    }

    /// Full filtered receivables as semicolon-delimited text.
    pub async fn export_receivables_csv(
        &self,
        filters: &ReceivableFilters,
    ) -> Result<ExportFile, ReportError> {
        let clause = receivable_filters(filters)?;
        let rows = self.fetch_all(ReportView::Receivables, &clause).await?;
        Ok(ExportFile {
            filename: CSV_FILENAME.to_string(),
            content_type: CSV_CONTENT_TYPE,
            body: write_csv(&rows, &self.formatter)?,
        })
    }

    /// Full renegotiation view as a workbook.
    pub async fn export_renegotiation_xlsx(
        &self,
        filters: &RenegotiationFilters,
    ) -> Result<ExportFile, ReportError> {
        let clause = renegotiation_filters(filters);
        let rows = self.fetch_all(ReportView::Renegotiation, &clause).await?;
        Ok(ExportFile {
            filename: RENEGOTIATION_XLSX_FILENAME.to_string(),
            content_type: XLSX_CONTENT_TYPE,
            body: write_xlsx(&rows, RENEGOTIATION_SHEET, &self.formatter)?,
        })
    }
}
