//! Column formatting shared by the JSON listing, CSV and XLSX exports.
//!
//! Every column belongs to one [`ColumnClass`]; a value is first reduced to
//! a channel-neutral form and only then rendered for a channel, so a
//! record reads the same in every output.

use crate::models::SqlValue;
use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const CURRENCY_MARKER: &str = "R$";
/// Spreadsheet number format for currency cells.
pub const CURRENCY_NUM_FORMAT: &str = "R$ #,##0.00";

const DATE_COLUMNS: [&str; 4] = ["emissao", "vencimento", "pagamento", "dt_cancelado"];
const CURRENCY_COLUMNS: [&str; 3] = ["valor_nf", "valor", "valor_pago"];
const IDENTIFIER_COLUMNS: [&str; 5] = ["cgc", "cep", "nr_terreno", "conta", "nr_contrato"];
/// Columns that default to `0` under `BlankPolicy::Zero`.
const NUMERIC_COLUMNS: [&str; 4] = ["valor_nf", "valor", "valor_pago", "conta"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnClass {
    Date,
    Currency,
    /// Tax IDs, postal codes, contract/lot/account numbers: always text.
    Identifier,
    Text,
}

impl ColumnClass {
    /// Class of a column name, case-insensitively.
    pub fn of(column: &str) -> Self {
        let column = column.to_ascii_lowercase();
        let column = column.as_str();
        if DATE_COLUMNS.contains(&column) {
            ColumnClass::Date
        } else if CURRENCY_COLUMNS.contains(&column) {
            ColumnClass::Currency
        } else if IDENTIFIER_COLUMNS.contains(&column) {
            ColumnClass::Identifier
        } else {
            ColumnClass::Text
        }
    }
}

/// How null or blank values are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlankPolicy {
    /// Every blank renders as an empty string.
    #[default]
    Empty,
    /// Blank currency and account columns render as `0`; the rest stay empty.
    Zero,
}

/// Channel-neutral rendering of one value.
#[derive(Debug, Clone, PartialEq)]
enum Rendered {
    Empty,
    Zero,
    Text(String),
    Integer(i64),
    Money(BigDecimal),
}

/// A spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    /// Numeric cell shown with `CURRENCY_NUM_FORMAT`.
    Currency(f64),
}

pub type JsonRecord = IndexMap<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, Default)]
pub struct Formatter {
    policy: BlankPolicy,
}

impl Formatter {
    pub fn new(policy: BlankPolicy) -> Self {
        Self { policy }
    }

    fn render(&self, column: &str, value: &SqlValue) -> Rendered {
        if value.is_blank() {
            let numeric = NUMERIC_COLUMNS.contains(&column.to_ascii_lowercase().as_str());
            return match self.policy {
                BlankPolicy::Zero if numeric => Rendered::Zero,
                _ => Rendered::Empty,
            };
        }

        match (ColumnClass::of(column), value) {
            (ColumnClass::Currency, SqlValue::Decimal(v)) => Rendered::Money(v.clone()),
            (ColumnClass::Currency, SqlValue::Integer(i)) => Rendered::Money(BigDecimal::from(*i)),
            (ColumnClass::Currency, SqlValue::Text(s)) => match BigDecimal::from_str(s.trim()) {
                Ok(v) => Rendered::Money(v),
                Err(_) => Rendered::Text(s.trim().to_string()),
            },
            (ColumnClass::Identifier, SqlValue::Integer(i)) => Rendered::Text(i.to_string()),
            (_, SqlValue::Integer(i)) => Rendered::Integer(*i),
            (_, SqlValue::Date(d)) => Rendered::Text(format_date(*d)),
            (_, SqlValue::Decimal(v)) => Rendered::Text(v.to_string()),
            (_, SqlValue::Text(s)) => Rendered::Text(s.trim().to_string()),
            (_, SqlValue::Null) => Rendered::Empty,
        }
    }

    /// Value for the JSON listing.
    pub fn json(&self, column: &str, value: &SqlValue) -> serde_json::Value {
        match self.render(column, value) {
            Rendered::Empty => serde_json::Value::String(String::new()),
            Rendered::Zero => serde_json::Value::from(0),
            Rendered::Text(s) => serde_json::Value::String(s),
            Rendered::Integer(i) => serde_json::Value::from(i),
            Rendered::Money(v) => serde_json::Value::String(format_currency(&v)),
        }
    }

    /// Value for a delimited-text cell.
    pub fn text(&self, column: &str, value: &SqlValue) -> String {
        match self.render(column, value) {
            Rendered::Empty => String::new(),
            Rendered::Zero => "0".to_string(),
            Rendered::Text(s) => s,
            Rendered::Integer(i) => i.to_string(),
            Rendered::Money(v) => format_currency(&v),
        }
    }

    /// Value for a spreadsheet cell.
    pub fn cell(&self, column: &str, value: &SqlValue) -> Cell {
        let currency = ColumnClass::of(column) == ColumnClass::Currency;
        match self.render(column, value) {
            Rendered::Empty => Cell::Empty,
            Rendered::Zero if currency => Cell::Currency(0.0),
            Rendered::Zero => Cell::Number(0.0),
            Rendered::Text(s) => Cell::Text(s),
            Rendered::Integer(i) => Cell::Number(i as f64),
            Rendered::Money(v) => match v.to_f64() {
                Some(n) => Cell::Currency(n),
                None => Cell::Text(format_currency(&v)),
            },
        }
    }

    /// One JSON object per row, keys in projection order.
    pub fn json_record<'a>(&self, pairs: impl IntoIterator<Item = (&'a str, &'a SqlValue)>) -> JsonRecord {
        pairs
            .into_iter()
            .map(|(column, value)| (column.to_string(), self.json(column, value)))
            .collect()
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// `R$ 1.234,50`: two decimals (half away from zero), `.` grouping, `,` decimal.
pub fn format_currency(value: &BigDecimal) -> String {
    let (thousandths, _) = value.with_scale(3).as_bigint_and_exponent();
    let Some(thousandths) = thousandths.to_i128() else {
        return format!("{} {}", CURRENCY_MARKER, value);
    };
    let cents = (thousandths + thousandths.signum() * 5) / 10;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!(
        "{} {}{},{:02}",
        CURRENCY_MARKER,
        sign,
        group_thousands(cents / 100),
        cents % 100
    )
}

fn group_thousands(n: u128) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}
