use crate::error::ReportError;
use crate::models::{present, ReceivableFilters, RowSet};
use crate::service::format::{Cell, Formatter, CURRENCY_NUM_FORMAT};
use rust_xlsxwriter::{Format, Workbook};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const CSV_CONTENT_TYPE: &str = "text/csv";

pub const RECEIVABLES_SHEET: &str = "COBRANCA";
pub const RENEGOTIATION_SHEET: &str = "RENEGOCIACAO";
pub const CSV_FILENAME: &str = "relatorio_cobranca.csv";
pub const RENEGOTIATION_XLSX_FILENAME: &str = "parcelas_renegociacao.xlsx";

const XLSX_BASENAME: &str = "cobranca_bonfim";

/// A finished export: bytes plus how to present them for download.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub filename: String,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl ExportFile {
    /// `Content-Disposition` value with the filename percent-encoded.
    pub fn content_disposition(&self) -> String {
        format!(
            "attachment; filename*=UTF-8''{}",
            urlencoding::encode(&self.filename)
        )
    }
}

/// Semicolon-delimited, minimally quoted, lowercase header.
pub fn write_csv(rows: &RowSet, formatter: &Formatter) -> Result<Vec<u8>, ReportError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(rows.columns.iter().map(|c| c.to_lowercase()))?;
    for record in rows.iter_records() {
        writer.write_record(record.iter().map(|(column, value)| formatter.text(column, value)))?;
    }

    Ok(writer.into_inner()?)
}

/// One worksheet, uppercase header, currency columns as formatted numbers.
pub fn write_xlsx(rows: &RowSet, sheet: &str, formatter: &Formatter) -> Result<Vec<u8>, ReportError> {
    let mut workbook = Workbook::new();
    let currency = Format::new().set_num_format(CURRENCY_NUM_FORMAT);

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet)?;

    for (col, name) in rows.columns.iter().enumerate() {
        worksheet.write_string(0, col as u16, name.to_uppercase())?;
    }

    for (idx, record) in rows.iter_records().enumerate() {
        let row = idx as u32 + 1;
        for (col, (column, value)) in record.into_iter().enumerate() {
            let col = col as u16;
            match formatter.cell(column, value) {
                Cell::Empty => {}
                Cell::Text(s) => {
                    worksheet.write_string(row, col, s)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(row, col, n)?;
                }
                Cell::Currency(n) => {
                    worksheet.write_number_with_format(row, col, n, &currency)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// `cobranca_bonfim_<filters>.xlsx`, or `cobranca_bonfim_completo.xlsx` when
/// no filter contributes a part. Date ranges count only when both ends are set.
pub fn receivables_xlsx_filename(filters: &ReceivableFilters) -> String {
    let mut parts = Vec::new();

    if let (Some(ini), Some(fim)) = (present(&filters.pagamento_ini), present(&filters.pagamento_fim)) {
        parts.push(format!("pgto_{}_a_{}", ini.replace('/', "-"), fim.replace('/', "-")));
    }
    if let (Some(ini), Some(fim)) = (present(&filters.vencimento_ini), present(&filters.vencimento_fim)) {
        parts.push(format!("vcto_{}_a_{}", ini.replace('/', "-"), fim.replace('/', "-")));
    }
    if let Some(nome) = present(&filters.nome) {
        parts.push(format!("nome_{}", nome.replace(' ', "_")));
    }

    let suffix = if parts.is_empty() {
        "completo".to_string()
    } else {
        parts.join("_")
    };
    format!("{}_{}.xlsx", XLSX_BASENAME, suffix)
}
