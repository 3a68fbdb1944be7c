use crate::error::ReportError;
use chrono::NaiveDate;
use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Optional criteria for the receivables listing and its exports.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceivableFilters {
    pub pagamento_ini: Option<String>,
    pub pagamento_fim: Option<String>,
    pub vencimento_ini: Option<String>,
    pub vencimento_fim: Option<String>,
    pub nome: Option<String>,
}

/// Identity criteria for the renegotiation view.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenegotiationFilters {
    pub cnpj: Option<String>,
    pub contrato: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    #[serde(flatten)]
    pub filters: ReceivableFilters,
    pub pagina: Option<String>,
    pub limite: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenegotiationQuery {
    #[serde(flatten)]
    pub filters: RenegotiationFilters,
    pub pagina: Option<String>,
    pub limite: Option<String>,
}

/// A validated page: `page >= 1`, `size` in `1..=1000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Result<Self, ReportError> {
        if page < 1 {
            return Err(ReportError::InvalidParameter {
                param: "pagina".into(),
                reason: "deve ser maior ou igual a 1".into(),
            });
        }
        if !(1..=MAX_PAGE_SIZE).contains(&size) {
            return Err(ReportError::InvalidParameter {
                param: "limite".into(),
                reason: format!("deve estar entre 1 e {}", MAX_PAGE_SIZE),
            });
        }
        Ok(Self { page, size })
    }

    /// Parse the raw `pagina`/`limite` query values, falling back to defaults when blank.
    pub fn from_params(pagina: Option<&str>, limite: Option<&str>) -> Result<Self, ReportError> {
        let page = parse_number("pagina", pagina)?.unwrap_or(1);
        let size = parse_number("limite", limite)?.unwrap_or(DEFAULT_PAGE_SIZE);
        Self::new(page, size)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.size)
    }
}

fn parse_number(param: &str, raw: Option<&str>) -> Result<Option<u32>, ReportError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ReportError::InvalidParameter {
                param: param.into(),
                reason: "deve ser um número inteiro".into(),
            }),
    }
}

/// Returns the trimmed value, or `None` when absent or blank.
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Accepts `DD/MM/YYYY` when a slash is present, `YYYY-MM-DD` otherwise.
pub fn parse_date(value: &str, param: &str) -> Result<NaiveDate, ReportError> {
    let format = if value.contains('/') { "%d/%m/%Y" } else { "%Y-%m-%d" };
    NaiveDate::parse_from_str(value.trim(), format).map_err(|_| ReportError::InvalidDate {
        param: param.to_string(),
    })
}
