use crate::error::ReportError;
use crate::models::{parse_date, present, ReceivableFilters, RenegotiationFilters};
use chrono::NaiveDate;

/// Account plan codes that hold renegotiated debt.
pub const RENEGOTIATION_ACCOUNTS: [i32; 2] = [306, 307];

/// A value bound to a `$n` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Date(NaiveDate),
    Text(String),
    Integer(i64),
}

/// Predicate fragments and their bound values, kept in lockstep.
///
/// Fragments reference parameters by position (`$1`, `$2`, ...), so the
/// clause can be reused verbatim by both the count and the data query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterClause {
    pub predicates: Vec<String>,
    pub params: Vec<SqlParam>,
}

impl FilterClause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment whose `{}` marks where the placeholder goes.
    pub fn push(&mut self, fragment: &str, param: SqlParam) {
        self.params.push(param);
        let placeholder = format!("${}", self.params.len());
        self.predicates.push(fragment.replacen("{}", &placeholder, 1));
    }

    /// Append a fragment that carries no parameter.
    pub fn push_fixed(&mut self, fragment: impl Into<String>) {
        self.predicates.push(fragment.into());
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// `WHERE a AND b ...`, or an empty string when there are no predicates.
    pub fn where_sql(&self) -> String {
        if self.predicates.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.predicates.join(" AND "))
        }
    }
}

/// Build the clause for the receivables listing and its exports.
///
/// Order: payment from/to, due from/to, name.
pub fn receivable_filters(filters: &ReceivableFilters) -> Result<FilterClause, ReportError> {
    let mut clause = FilterClause::new();

    let date_bounds = [
        ("pagamento_ini", &filters.pagamento_ini, "CAST(RECEBER.pagamento AS DATE) >= {}"),
        ("pagamento_fim", &filters.pagamento_fim, "CAST(RECEBER.pagamento AS DATE) <= {}"),
        ("vencimento_ini", &filters.vencimento_ini, "CAST(RECEBER.vencimento AS DATE) >= {}"),
        ("vencimento_fim", &filters.vencimento_fim, "CAST(RECEBER.vencimento AS DATE) <= {}"),
    ];
    for (param, value, fragment) in date_bounds {
        if let Some(raw) = present(value) {
            clause.push(fragment, SqlParam::Date(parse_date(raw, param)?));
        }
    }

    if let Some(name) = present(&filters.nome) {
        clause.push(
            "UPPER(TRIM(t.razao)) LIKE {}",
            SqlParam::Text(format!("%{}%", name.to_uppercase())),
        );
    }

    Ok(clause)
}

/// Build the clause for the renegotiation view: fixed account codes plus
/// optional exact CNPJ and contract matches.
pub fn renegotiation_filters(filters: &RenegotiationFilters) -> FilterClause {
    let mut clause = FilterClause::new();

    let codes: Vec<String> = RENEGOTIATION_ACCOUNTS.iter().map(i32::to_string).collect();
    clause.push_fixed(format!("RECEBER.conta IN ({})", codes.join(", ")));

    if let Some(cnpj) = present(&filters.cnpj) {
        clause.push("TRIM(t.cgc) = {}", SqlParam::Text(cnpj.to_string()));
    }
    if let Some(contrato) = present(&filters.contrato) {
        clause.push(
            "CAST(c.nr_contrato AS VARCHAR) = {}",
            SqlParam::Text(contrato.to_string()),
        );
    }

    clause
}
