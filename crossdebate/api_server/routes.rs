use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, DefaultBodyLimit, Multipart,
        Path, State,
    },
    routing::{get, post},
    Json, Router,
};
use crossdebate_analysis::{AnalysisConfig, AnalysisResult};
use crossdebate_data_store::{CsvTable, UploadSummary};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    config::{ConfigError, ServerConfig},
    error::ApiError,
    state::AppState,
};

const UPLOAD_FIELD: &str = "file";

/// Body of a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Confirmation naming the uploaded file.
    pub message: String,
    /// Stored table summary.
    #[serde(flatten)]
    pub summary: UploadSummary,
}

/// Assembles the application router with CORS, tracing and body-limit layers.
pub fn build_router(state: AppState, config: &ServerConfig) -> Result<Router, ConfigError> {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(config.cors_origins()?))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Ok(Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/upload-data/", post(upload_data))
        .route("/upload-data", post(upload_data))
        .route("/upload-data/:file_id", get(get_upload))
        .route("/analyze/", post(analyze))
        .route("/analyze", post(analyze))
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http()))
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": format!("Bem-vindo à API CrossDebate Engenharia v{}", env!("CARGO_PKG_VERSION"))
    }))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "status": "ok", "stored_tables": state.registry().len() }))
}

async fn upload_data(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart?;
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            let name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            upload = Some((name, bytes));
            break;
        }
    }
    let Some((file_name, bytes)) = upload else {
        return Err(ApiError::Unprocessable(format!(
            "Campo '{UPLOAD_FIELD}' ausente na requisição."
        )));
    };

    if !file_name.ends_with(".csv") {
        return Err(ApiError::BadRequest(
            "Formato de arquivo inválido. Apenas CSV é suportado.".into(),
        ));
    }

    let table = tokio::task::spawn_blocking(move || CsvTable::parse(&bytes))
        .await
        .map_err(|err| ApiError::internal("Erro inesperado ao processar o arquivo.", err))??;

    let summary = state
        .registry()
        .register(&file_name, table)
        .map_err(|err| ApiError::internal("Erro inesperado ao processar o arquivo.", err))?;
    info!(
        file_id = %summary.file_id,
        file_name = %file_name,
        rows = summary.rows_count,
        "csv upload stored"
    );

    Ok(Json(UploadResponse {
        message: format!("Arquivo '{file_name}' carregado com sucesso."),
        summary,
    }))
}

async fn get_upload(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
) -> Result<Json<UploadSummary>, ApiError> {
    state
        .registry()
        .summary(&file_id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Arquivo '{file_id}' não encontrado.")))
}

async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisConfig>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let Json(config) = payload?;
    info!(
        analysis_type = %config.analysis_type,
        model_quantization = %config.model_quantization,
        workflow_complexity = %config.workflow_complexity,
        "analysis requested"
    );
    match state.simulator().run(&config).await {
        Ok(result) => Ok(Json(result)),
        Err(err) => {
            warn!(analysis_type = %config.analysis_type, error = %err, "analysis simulation failed");
            Err(ApiError::internal(
                format!("Erro interno ao simular a análise {}.", config.analysis_type),
                err,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use crossdebate_analysis::AnalysisSimulator;
    use crossdebate_data_store::UploadRegistry;
    use tower::ServiceExt;

    const BOUNDARY: &str = "crossdebate-test-boundary";

    fn app() -> Router {
        let simulator = AnalysisSimulator::builder().latency_scale(0.0).build().unwrap();
        let state = AppState::new(UploadRegistry::new(), simulator);
        build_router(state, &ServerConfig::default()).unwrap()
    }

    fn multipart_request(field: &str, file_name: &str, contents: &str) -> Request<Body> {
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: text/csv\r\n\r\n{contents}\r\n--{BOUNDARY}--\r\n"
        );
        Request::builder()
            .method(Method::POST)
            .uri("/upload-data/")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn root_returns_welcome() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Bem-vindo à API CrossDebate Engenharia v0.1.2");
    }

    #[tokio::test]
    async fn upload_then_fetch_by_id() {
        let app = app();
        let mut csv = String::from("lote,resistencia\n");
        for i in 0..12 {
            csv.push_str(&format!("{i},{}.5\n", 10 + i));
        }
        let response = app
            .clone()
            .oneshot(multipart_request("file", "ensaio.csv", &csv))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["message"], "Arquivo 'ensaio.csv' carregado com sucesso.");
        assert_eq!(body["rows_count"], 12);
        assert_eq!(body["headers"], json!(["lote", "resistencia"]));
        assert_eq!(body["preview"].as_array().unwrap().len(), 10);
        assert_eq!(body["preview"][0], json!({ "lote": 0, "resistencia": 10.5 }));
        assert!(body.get("original_name").is_none());

        let file_id = body["file_id"].as_str().unwrap().to_string();
        let response = app
            .clone()
            .oneshot(
                Request::get(format!("/upload-data/{file_id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["rows_count"], 12);

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json_body(response).await["stored_tables"], 1);
    }

    #[tokio::test]
    async fn unknown_upload_id_is_404() {
        let response = app()
            .oneshot(
                Request::get("/upload-data/data_0_100.csv")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(json_body(response).await["detail"].is_string());
    }

    #[tokio::test]
    async fn non_csv_upload_is_rejected() {
        let response = app()
            .oneshot(multipart_request("file", "dados.xlsx", "a,b\n1,2\n"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["detail"],
            "Formato de arquivo inválido. Apenas CSV é suportado."
        );
    }

    #[tokio::test]
    async fn header_only_csv_is_rejected() {
        let response = app()
            .oneshot(multipart_request("file", "vazio.csv", "a,b,c\n"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["detail"], "Arquivo CSV está vazio.");
    }

    #[tokio::test]
    async fn malformed_csv_is_a_parse_error() {
        let response = app()
            .oneshot(multipart_request("file", "ruim.csv", "a,b\n1,2\n3,4,5\n"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let detail = json_body(response).await["detail"].as_str().unwrap().to_string();
        assert!(detail.starts_with("Erro ao parsear CSV:"));
    }

    #[tokio::test]
    async fn missing_file_field_is_422() {
        let response = app()
            .oneshot(multipart_request("arquivo", "dados.csv", "a\n1\n"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn analyze_unknown_type_completes() {
        let request = Request::post("/analyze/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"analysisType":"cluster","modelQuantization":"q4","workflowComplexity":"simple"}"#,
            ))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "completed");
        assert_eq!(body["message"], "Análise simulada (cluster) concluída.");
        assert!(body["cl_compL_metrics"]["CL_Estimate"].is_number());
        assert_eq!(body["plots"], json!([]));
    }

    #[tokio::test]
    async fn analyze_t_test_reports_p_value() {
        let request = Request::post("/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"analysisType":"t_test","dependentVar":"y","groupingVar":"g","alpha":0.1,"modelQuantization":"mix","workflowComplexity":"complex"}"#,
            ))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let p = body["numerical_results"]["Valor-p"].as_f64().unwrap();
        assert!((0.001..0.2).contains(&p));
        assert_eq!(body["plots"][0]["type"], "boxplot");
    }

    #[tokio::test]
    async fn analyze_rejects_unknown_quantization() {
        let request = Request::post("/analyze/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"analysisType":"anova","modelQuantization":"q2","workflowComplexity":"simple"}"#,
            ))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json_body(response).await["detail"].is_string());
    }

    #[tokio::test]
    async fn cors_allows_listed_origins_only() {
        let preflight = |origin: &'static str| {
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/analyze/")
                .header(header::ORIGIN, origin)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap()
        };
        let allowed = app()
            .oneshot(preflight("http://localhost:5173"))
            .await
            .unwrap();
        assert_eq!(
            allowed.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:5173"
        );
        assert_eq!(
            allowed.headers()[header::ACCESS_CONTROL_ALLOW_CREDENTIALS],
            "true"
        );

        let denied = app()
            .oneshot(preflight("http://evil.example.com"))
            .await
            .unwrap();
        assert!(denied
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}
