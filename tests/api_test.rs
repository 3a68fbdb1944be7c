use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bigdecimal::BigDecimal;
use cobranca_report::config::AuthConfig;
use cobranca_report::db::queries::projection_columns;
use cobranca_report::db::{SqlParam, Statement};
use cobranca_report::models::{RowSet, SqlValue};
use cobranca_report::service::BlankPolicy;
use cobranca_report::{router, AppState, Formatter, ReportService, ReportStore};
use serde_json::Value;
use std::io::{Cursor, Read};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;

/// In-memory store: `rows` is the already-filtered result set; pagination
/// is applied from the bound LIMIT/OFFSET values.
struct FakeStore {
    rows: RowSet,
    fail: bool,
    seen: Mutex<Vec<Statement>>,
}

impl FakeStore {
    fn with_rows(rows: RowSet) -> Arc<Self> {
        Arc::new(Self {
            rows,
            fail: false,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            rows: RowSet::new(projection_columns()),
            fail: true,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn statements(&self) -> Vec<Statement> {
        self.seen.lock().unwrap().clone()
    }

    fn page(&self, data: &Statement) -> RowSet {
        let mut out = RowSet::new(self.rows.columns.clone());
        let n = data.params.len();
        let (limit, offset) = match (data.params.get(n.wrapping_sub(2)), data.params.last()) {
            (Some(SqlParam::Integer(l)), Some(SqlParam::Integer(o))) if data.sql.contains("LIMIT") => {
                (*l as usize, *o as usize)
            }
            _ => (usize::MAX, 0),
        };
        out.rows = self.rows.rows.iter().skip(offset).take(limit).cloned().collect();
        out
    }
}

#[async_trait]
impl ReportStore for FakeStore {
    async fn count_and_fetch(
        &self,
        count: &Statement,
        data: &Statement,
    ) -> Result<(i64, RowSet), sqlx::Error> {
        self.seen.lock().unwrap().extend([count.clone(), data.clone()]);
        if self.fail {
            return Err(sqlx::Error::Protocol("connection refused".into()));
        }
        Ok((self.rows.len() as i64, self.page(data)))
    }

    async fn fetch(&self, data: &Statement) -> Result<RowSet, sqlx::Error> {
        self.seen.lock().unwrap().push(data.clone());
        if self.fail {
            return Err(sqlx::Error::Protocol("connection refused".into()));
        }
        Ok(self.page(data))
    }
}

fn receivables(count: i64) -> RowSet {
    let columns = projection_columns();
    let mut rows = RowSet::new(columns.clone());
    for n in 1..=count {
        let row = columns
            .iter()
            .map(|column| match column.as_str() {
                "numero" => SqlValue::Integer(n),
                "nome" => SqlValue::Text(format!("ACME FILIAL {:02}   ", n)),
                "valor" => SqlValue::Decimal(BigDecimal::from_str("1234.5").unwrap()),
                "cgc" => SqlValue::from("12.345.678/0001-99"),
                "cep" => SqlValue::from("01310-100"),
                "conta" => SqlValue::from("0306"),
                "tipo_descricao" => SqlValue::from("Jazigo"),
                _ => SqlValue::Null,
            })
            .collect();
        rows.rows.push(row);
    }
    rows
}

fn app(store: Arc<FakeStore>, policy: BlankPolicy) -> Router {
    let reports = ReportService::new(store, Formatter::new(policy));
    let auth = AuthConfig {
        username: "rps".into(),
        password: "cobranca".into(),
    };
    router(AppState::new(reports, auth))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(
            header::AUTHORIZATION,
            format!("Basic {}", STANDARD.encode("rps:cobranca")),
        )
        .body(Body::empty())
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

fn xlsx_part(body: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(body)).unwrap();
    let mut xml = String::new();
    archive.by_name(name).unwrap().read_to_string(&mut xml).unwrap();
    xml
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn name_filtered_second_page() {
    let store = FakeStore::with_rows(receivables(25));
    let response = app(store.clone(), BlankPolicy::Empty)
        .oneshot(get("/api/cobranca/consulta?nome=ACME&pagina=2&limite=10"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["pagina"], 2);
    assert_eq!(body["limite"], 10);
    assert_eq!(body["total_registros"], 25);

    let dados = body["dados"].as_array().unwrap();
    let numbers: Vec<i64> = dados.iter().map(|r| r["numero"].as_i64().unwrap()).collect();
    assert_eq!(numbers, (11..=20).collect::<Vec<_>>());

    let seen = store.statements();
    assert_eq!(seen.len(), 2);
    let (count, data) = (&seen[0], &seen[1]);
    assert!(count.sql.contains("COUNT(*)"));
    assert_eq!(count.params, vec![SqlParam::Text("%ACME%".into())]);
    assert_eq!(
        data.params,
        vec![
            SqlParam::Text("%ACME%".into()),
            SqlParam::Integer(10),
            SqlParam::Integer(10),
        ]
    );
}

#[tokio::test]
async fn pages_partition_the_filtered_set() {
    let store = FakeStore::with_rows(receivables(25));
    let app = app(store, BlankPolicy::Empty);

    let mut collected = Vec::new();
    for page in 1..=3 {
        let response = app
            .clone()
            .oneshot(get(&format!("/api/cobranca/consulta?pagina={}&limite=10", page)))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["total_registros"], 25);
        for record in body["dados"].as_array().unwrap() {
            collected.push(record["numero"].as_i64().unwrap());
        }
    }
    assert_eq!(collected, (1..=25).collect::<Vec<_>>());
}

#[tokio::test]
async fn records_are_formatted_for_json() {
    let store = FakeStore::with_rows(receivables(1));
    let response = app(store, BlankPolicy::Empty)
        .oneshot(get("/api/cobranca/consulta"))
        .await
        .unwrap();
    let body = body_json(response).await;
    let record = &body["dados"][0];

    assert_eq!(record["valor"], "R$ 1.234,50");
    assert_eq!(record["cgc"], "12.345.678/0001-99");
    assert_eq!(record["cep"], "01310-100");
    assert_eq!(record["conta"], "0306");
    assert_eq!(record["nome"], "ACME FILIAL 01");
    assert_eq!(record["tipo_descricao"], "Jazigo");
    assert_eq!(record["valor_pago"], "");
    assert_eq!(record["vencimento"], "");

    let keys: Vec<&str> = record.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys.first(), Some(&"numero"));
    assert_eq!(keys.last(), Some(&"tipo_descricao"));
}

#[tokio::test]
async fn zero_policy_applies_to_listing() {
    let store = FakeStore::with_rows(receivables(1));
    let response = app(store, BlankPolicy::Zero)
        .oneshot(get("/api/cobranca/consulta"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["dados"][0]["valor_pago"], 0);
    assert_eq!(body["dados"][0]["pagamento"], "");
}

#[tokio::test]
async fn xlsx_without_filters_is_completo() {
    let store = FakeStore::with_rows(receivables(3));
    let response = app(store.clone(), BlankPolicy::Empty)
        .oneshot(get("/api/cobranca/consulta_xlsx"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.ends_with("_completo.xlsx"), "{disposition}");

    let body = body_bytes(response).await;
    assert!(xlsx_part(&body, "xl/workbook.xml").contains(r#"<sheet name="COBRANCA""#));
    let strings = xlsx_part(&body, "xl/sharedStrings.xml");
    assert!(strings.contains("<t>VALOR_NF</t>"));
    assert!(strings.contains("<t>TIPO_DESCRICAO</t>"));
    assert!(strings.contains("<t>0306</t>"));
    let sheet = xlsx_part(&body, "xl/worksheets/sheet1.xml");
    // valor (F), cgc (K), conta (X)
    assert!(sheet.contains(r#"<c r="F4" s="1"><v>1234.5</v></c>"#), "{sheet}");
    assert!(sheet.contains(r#"<c r="K2" t="s">"#));
    assert!(sheet.contains(r#"<c r="X3" t="s">"#));

    let seen = store.statements();
    assert_eq!(seen.len(), 1);
    assert!(!seen[0].sql.contains("LIMIT"));
    assert!(!seen[0].sql.contains("WHERE"));
}

#[tokio::test]
async fn xlsx_filename_reflects_filters() {
    let store = FakeStore::with_rows(receivables(1));
    let response = app(store, BlankPolicy::Empty)
        .oneshot(get(
            "/api/cobranca/consulta_xlsx?vencimento_ini=01/02/2024&vencimento_fim=29/02/2024&nome=acme%20sa",
        ))
        .await
        .unwrap();
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert_eq!(
        disposition,
        "attachment; filename*=UTF-8''cobranca_bonfim_vcto_01-02-2024_a_29-02-2024_nome_acme_sa.xlsx"
    );
}

#[tokio::test]
async fn csv_export() {
    let store = FakeStore::with_rows(receivables(2));
    let response = app(store, BlankPolicy::Empty)
        .oneshot(get("/api/cobranca/consulta_csv?pagamento_ini=2024-01-01"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/csv");
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .ends_with("relatorio_cobranca.csv"));

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("numero;nome;valor_nf;emissao;"));
    assert!(lines[1].starts_with("1;ACME FILIAL 01;;;;R$ 1.234,50;"));
    assert!(lines[1].contains(";12.345.678/0001-99;"));
}

#[tokio::test]
async fn renegotiation_listing_is_restricted_and_ordered() {
    let store = FakeStore::with_rows(receivables(5));
    let response = app(store.clone(), BlankPolicy::Empty)
        .oneshot(get("/api/cobranca/renegociacao?cnpj=12.345.678/0001-99&limite=2"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total_registros"], 5);
    assert_eq!(body["dados"].as_array().unwrap().len(), 2);

    let seen = store.statements();
    for statement in &seen {
        assert!(statement.sql.contains("RECEBER.conta IN (306, 307)"));
        assert_eq!(statement.params[0], SqlParam::Text("12.345.678/0001-99".into()));
    }
    assert!(seen[1].sql.contains("ORDER BY RECEBER.vencimento"));
}

#[tokio::test]
async fn renegotiation_xlsx_has_fixed_name() {
    let store = FakeStore::with_rows(receivables(2));
    let response = app(store, BlankPolicy::Empty)
        .oneshot(get("/api/cobranca/renegociacao_xlsx?contrato=00042"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename*=UTF-8''parcelas_renegociacao.xlsx"
    );
    let body = body_bytes(response).await;
    assert!(xlsx_part(&body, "xl/workbook.xml").contains(r#"<sheet name="RENEGOCIACAO""#));
}

#[tokio::test]
async fn invalid_date_is_unprocessable() {
    let store = FakeStore::with_rows(receivables(1));
    let response = app(store.clone(), BlankPolicy::Empty)
        .oneshot(get("/api/cobranca/consulta?vencimento_fim=2024/02/30"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["status"], "erro");
    assert!(body["mensagem"].as_str().unwrap().contains("vencimento_fim"));
    assert!(store.statements().is_empty());
}

#[tokio::test]
async fn page_size_out_of_range_is_unprocessable() {
    let store = FakeStore::with_rows(receivables(1));
    let app = app(store, BlankPolicy::Empty);
    for uri in [
        "/api/cobranca/consulta?limite=1001",
        "/api/cobranca/consulta?pagina=0",
        "/api/cobranca/renegociacao?limite=abc",
    ] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
    }
}

#[tokio::test]
async fn database_failure_is_reported_as_500() {
    let response = app(FakeStore::failing(), BlankPolicy::Empty)
        .oneshot(get("/api/cobranca/consulta"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["status"], "erro");
    let message = body["mensagem"].as_str().unwrap();
    assert!(message.starts_with("Erro ao executar consulta: "), "{message}");
    assert!(message.contains("connection refused"));
}

#[tokio::test]
async fn export_failure_returns_json_instead_of_file() {
    let app = app(FakeStore::failing(), BlankPolicy::Empty);
    for (uri, context) in [
        ("/api/cobranca/consulta_xlsx", "Erro ao exportar XLSX"),
        ("/api/cobranca/consulta_csv", "Erro ao exportar CSV"),
        ("/api/cobranca/renegociacao", "Erro ao executar consulta de renegociação"),
    ] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());
        let body = body_json(response).await;
        assert!(body["mensagem"].as_str().unwrap().starts_with(context));
    }
}

#[tokio::test]
async fn missing_or_wrong_credentials_are_challenged() {
    let store = FakeStore::with_rows(receivables(1));
    let app = app(store.clone(), BlankPolicy::Empty);

    let anonymous = Request::builder()
        .uri("/api/cobranca/consulta")
        .body(Body::empty())
        .unwrap();
    let wrong = Request::builder()
        .uri("/api/cobranca/consulta_csv")
        .header(
            header::AUTHORIZATION,
            format!("Basic {}", STANDARD.encode("rps:errada")),
        )
        .body(Body::empty())
        .unwrap();

    for request in [anonymous, wrong] {
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Basic");
    }
    assert!(store.statements().is_empty());
}

#[tokio::test]
async fn health_check_needs_no_credentials() {
    let store = FakeStore::with_rows(RowSet::default());
    let response = app(store, BlankPolicy::Empty)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"OK");
}
