use crate::db::filters::{FilterClause, SqlParam};
use crate::models::PageRequest;

/// Receivable type codes and their labels; anything else is `OTHER_KIND`.
pub const RECEIVABLE_KINDS: [(i64, &str); 5] = [
    (1, "Manutenção"),
    (2, "Venda"),
    (3, "Jazigo"),
    (4, "Outros"),
    (5, "Produtos"),
];

pub const OTHER_KIND: &str = "Outros";

/// `CASE ... END AS tipo_descricao`, generated from `RECEIVABLE_KINDS`.
pub fn kind_case_sql() -> String {
    let mut sql = String::from("CASE");
    for (code, label) in RECEIVABLE_KINDS {
        sql.push_str(&format!(" WHEN RECEBER.tipo = {} THEN '{}'", code, label));
    }
    sql.push_str(&format!(" ELSE '{}' END AS tipo_descricao", OTHER_KIND));
    sql
}

const FROM_JOINS: &str = r#"
        FROM RECEBER
        JOIN TITULAR t ON t.codigo = RECEBER.titular
        JOIN CONTRATO c ON c.nr_contrato = RECEBER.nf
        JOIN PLANO pl ON pl.codigo = RECEBER.conta
"#;

/// Projected expressions and their output column names, in order.
/// `tipo_descricao` is appended from `kind_case_sql`.
const PROJECTION: [(&str, &str); 26] = [
    ("RECEBER.numero", "numero"),
    ("SUBSTRING(t.razao FROM 1 FOR 30)", "nome"),
    ("RECEBER.valor_nf", "valor_nf"),
    ("CAST(RECEBER.emissao AS DATE)", "emissao"),
    ("CAST(RECEBER.vencimento AS DATE)", "vencimento"),
    ("RECEBER.valor", "valor"),
    ("CAST(RECEBER.pagamento AS DATE)", "pagamento"),
    ("RECEBER.valor_pago", "valor_pago"),
    ("RECEBER.referente_a", "referente_a"),
    ("CAST(c.dt_cancelado AS DATE)", "dt_cancelado"),
    ("CAST(t.cgc AS VARCHAR)", "cgc"),
    ("t.telefone", "telefone"),
    ("t.fax", "fax"),
    ("t.fone_comercial", "fone_comercial"),
    ("t.endereco", "endereco"),
    ("t.bairro", "bairro"),
    ("t.cidade", "cidade"),
    ("t.uf", "uf"),
    ("CAST(t.cep AS VARCHAR)", "cep"),
    ("t.email", "email"),
    ("t.obs", "obs"),
    ("CAST(c.nr_contrato AS VARCHAR)", "nr_contrato"),
    ("CAST(c.nr_terreno AS VARCHAR)", "nr_terreno"),
    ("CAST(RECEBER.conta AS VARCHAR)", "conta"),
    ("pl.descricao", "plano_classif"),
    ("pl.descricao", "plano_descricao"),
];

/// Output column names of the data query, in projection order.
pub fn projection_columns() -> Vec<String> {
    PROJECTION
        .iter()
        .map(|(_, alias)| alias.to_string())
        .chain(std::iter::once("tipo_descricao".to_string()))
        .collect()
}

fn select_list() -> String {
    let mut items: Vec<String> = PROJECTION
        .iter()
        .map(|(expr, alias)| format!("{} AS {}", expr, alias))
        .collect();
    items.push(kind_case_sql());
    format!("SELECT {}", items.join(",\n               "))
}

/// Which report a query belongs to; decides row order.
///
/// `numero` is not unique (installments share it), so every order ends on
/// `ctid` to keep pages stable between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportView {
    Receivables,
    Renegotiation,
}

impl ReportView {
    fn order_by(self) -> &'static str {
        match self {
            ReportView::Receivables => "ORDER BY RECEBER.numero, RECEBER.vencimento, RECEBER.ctid",
            ReportView::Renegotiation => "ORDER BY RECEBER.vencimento, RECEBER.numero, RECEBER.ctid",
        }
    }
}

/// Query text plus positional parameters, ready for the executor.
///
/// `columns` names the output columns of a data query so an empty result
/// still carries its header; it is empty for scalar queries.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlParam>,
    pub columns: Vec<String>,
}

/// `SELECT COUNT(*)` over the same joins and clause as the data query.
pub fn count_statement(clause: &FilterClause) -> Statement {
    Statement {
        sql: format!("SELECT COUNT(*){}{}", FROM_JOINS, clause.where_sql()),
        params: clause.params.clone(),
        columns: Vec::new(),
    }
}

/// Full projection; `page` adds `LIMIT`/`OFFSET` bound after the filter values.
pub fn data_statement(view: ReportView, clause: &FilterClause, page: Option<PageRequest>) -> Statement {
    let mut params = clause.params.clone();
    let mut sql = format!(
        "{}{}{}\n        {}",
        select_list(),
        FROM_JOINS,
        clause.where_sql(),
        view.order_by()
    );

    if let Some(page) = page {
        params.push(SqlParam::Integer(i64::from(page.size)));
        let limit = params.len();
        params.push(SqlParam::Integer(page.offset() as i64));
        let offset = params.len();
        sql.push_str(&format!("\n        LIMIT ${} OFFSET ${}", limit, offset));
    }

    Statement {
        sql,
        params,
        columns: projection_columns(),
    }
}
