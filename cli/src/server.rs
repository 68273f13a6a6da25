#[cfg(feature = "server")]
pub mod http {
    use axum::{
        extract::{Path, Query, State},
        http::StatusCode,
        response::{IntoResponse, Json},
        routing::{get, post, put},
        Router,
    };
    use kennwert::store::{
        MemoryStore, ProcessingRecord, ReferenceStore, ResultKind, ResultSink, StoreError,
    };
    use kennwert::{
        summarize, BatchPurpose, Engine, ElementResult, KennwertError, ReferenceSnapshot,
        RunOutput, RunSummary, ValidatedBatch,
    };
    use serde::{Deserialize, Serialize};
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Instant;
    use tower_http::cors::CorsLayer;
    use tracing::{error, info};

    #[derive(Clone)]
    pub struct AppState {
        engine: Arc<Engine>,
        store: Arc<MemoryStore>,
    }

    impl AppState {
        pub fn new(engine: Engine, store: MemoryStore) -> Self {
            Self {
                engine: Arc::new(engine),
                store: Arc::new(store),
            }
        }
    }

    #[derive(Debug, Default, Deserialize)]
    pub struct RunParams {
        /// Pin the run to an environmental version instead of the active one
        #[serde(default)]
        version: Option<String>,
        #[serde(default)]
        project: Option<String>,
    }

    #[derive(Debug, Serialize)]
    struct ProcessResponse {
        lca: RunOutput,
        cost: RunOutput,
        combined: Vec<ElementResult>,
        summary: RunSummary,
    }

    #[derive(Debug, Serialize)]
    struct ErrorResponse {
        error: String,
    }

    type ApiError = (StatusCode, Json<ErrorResponse>);

    fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
        let message = message.into();
        error!("{}", message);
        (status, Json(ErrorResponse { error: message }))
    }

    fn store_error(err: StoreError) -> ApiError {
        let status = match err {
            StoreError::VersionNotFound(_) => StatusCode::NOT_FOUND,
            StoreError::NoActiveVersion | StoreError::DuplicateVersion(_) => StatusCode::CONFLICT,
            StoreError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        api_error(status, err.to_string())
    }

    fn validation_error(err: KennwertError) -> ApiError {
        api_error(StatusCode::BAD_REQUEST, format!("Invalid element batch: {}", err))
    }

    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .route("/versions", get(list_versions))
            .route("/versions/:version/activate", put(activate_version))
            .route("/lca", post(run_lca))
            .route("/cost", post(run_cost))
            .route("/process", post(process))
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    pub async fn start_server(engine: Engine, store: MemoryStore, host: &str, port: u16) -> anyhow::Result<()> {
        let app = router(AppState::new(engine, store));

        let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
        info!("kennwert server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    async fn health_check() -> impl IntoResponse {
        Json(serde_json::json!({
            "status": "ok",
            "service": "kennwert",
            "version": env!("CARGO_PKG_VERSION")
        }))
    }

    async fn list_versions(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
        let versions = state.store.environmental_versions().map_err(store_error)?;
        Ok(Json(versions))
    }

    async fn activate_version(
        State(state): State<AppState>,
        Path(version): Path<String>,
    ) -> Result<impl IntoResponse, ApiError> {
        state
            .store
            .set_active_environmental_version(&version)
            .map_err(store_error)?;
        Ok(Json(serde_json::json!({ "active_version": version })))
    }

    fn prepare(
        state: &AppState,
        params: &RunParams,
        document: &serde_json::Value,
        purpose: BatchPurpose,
    ) -> Result<(ValidatedBatch, ReferenceSnapshot), ApiError> {
        let snapshot = match &params.version {
            Some(version) => state.store.snapshot_for(version),
            None => state.store.snapshot(),
        }
        .map_err(store_error)?;
        let batch = state
            .engine
            .validate_document(document, "request", purpose)
            .map_err(validation_error)?;
        Ok((batch, snapshot))
    }

    async fn run_lca(
        State(state): State<AppState>,
        Query(params): Query<RunParams>,
        Json(document): Json<serde_json::Value>,
    ) -> Result<impl IntoResponse, ApiError> {
        let (batch, snapshot) = prepare(&state, &params, &document, BatchPurpose::Lca)?;
        let engine = state.engine.clone();
        let output = tokio::task::spawn_blocking(move || engine.run_lca(&batch, &snapshot))
            .await
            .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("LCA task failed: {}", e)))?;
        info!("Computed LCA for {} element(s)", output.results.len());
        Ok(Json(output))
    }

    async fn run_cost(
        State(state): State<AppState>,
        Query(params): Query<RunParams>,
        Json(document): Json<serde_json::Value>,
    ) -> Result<impl IntoResponse, ApiError> {
        let (batch, snapshot) = prepare(&state, &params, &document, BatchPurpose::Cost)?;
        let engine = state.engine.clone();
        let output = tokio::task::spawn_blocking(move || engine.run_cost(&batch, &snapshot))
            .await
            .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("Cost task failed: {}", e)))?;
        info!("Computed cost for {} element(s)", output.results.len());
        Ok(Json(output))
    }

    async fn process(
        State(state): State<AppState>,
        Query(params): Query<RunParams>,
        Json(document): Json<serde_json::Value>,
    ) -> Result<impl IntoResponse, ApiError> {
        let started = Instant::now();
        let (batch, snapshot) = prepare(&state, &params, &document, BatchPurpose::All)?;
        let batch = Arc::new(batch);
        let snapshot = Arc::new(snapshot);

        let lca_task = {
            let (engine, batch, snapshot) = (state.engine.clone(), batch.clone(), snapshot.clone());
            tokio::task::spawn_blocking(move || engine.run_lca(&batch, &snapshot))
        };
        let cost_task = {
            let (engine, batch, snapshot) = (state.engine.clone(), batch.clone(), snapshot.clone());
            tokio::task::spawn_blocking(move || engine.run_cost(&batch, &snapshot))
        };
        let (lca, cost) = tokio::join!(lca_task, cost_task);
        let lca = lca.map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("LCA task failed: {}", e)))?;
        let cost = cost.map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("Cost task failed: {}", e)))?;

        let combined = kennwert::combine_results(&lca.results, &cost.results);
        let summary = summarize(&combined);

        let project = params.project.as_deref().unwrap_or("default");
        let sink: &dyn ResultSink = state.store.as_ref();
        sink.store_results(project, ResultKind::Lca, &lca.results)
            .and_then(|_| sink.store_results(project, ResultKind::Cost, &cost.results))
            .and_then(|_| sink.store_results(project, ResultKind::Combined, &combined))
            .map_err(store_error)?;
        for entry in &summary.failures {
            sink.log_processing_error(project, entry.clone()).map_err(store_error)?;
        }
        sink.record_processing(ProcessingRecord::from_results(
            project,
            lca.environmental_version.clone(),
            &combined,
            started.elapsed().as_millis() as u64,
        ))
        .map_err(store_error)?;

        Ok(Json(ProcessResponse {
            lca,
            cost,
            combined,
            summary,
        }))
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use axum::body::{to_bytes, Body};
        use axum::http::Request;
        use kennwert::{CostReferenceRow, MaterialMapping, MaterialReferenceRow};
        use tower::ServiceExt;

        fn state() -> AppState {
            let store = MemoryStore::new();
            let rows = vec![MaterialReferenceRow {
                key: "REF".to_string(),
                name: "Beton".to_string(),
                gwp: 0.01,
                penre: 0.1,
                ubp: 100.0,
                density: 2400.0,
            }];
            store.import_environmental("2022", rows.clone(), None).unwrap();
            store.import_environmental("2024", rows, None).unwrap();
            store.set_active_environmental_version("2022").unwrap();
            store
                .set_material_mappings(vec![MaterialMapping {
                    material: "Concrete".to_string(),
                    reference_id: "REF".to_string(),
                }])
                .unwrap();
            store
                .set_cost(vec![CostReferenceRow {
                    code: "C01".to_string(),
                    unit_rate: 100.0,
                    unit: "m2".to_string(),
                }])
                .unwrap();
            AppState::new(Engine::new(), store)
        }

        fn batch() -> Body {
            Body::from(
                serde_json::json!({
                    "elements": [{
                        "id": "E1",
                        "properties": { "ebkp": "C01" },
                        "materials": ["Concrete"],
                        "material_volumes": { "Concrete": { "volume": 1.0, "density": 2400.0 } },
                        "quantities": { "area": { "net": 2.0 } }
                    }]
                })
                .to_string(),
            )
        }

        async fn body_json(response: axum::response::Response) -> serde_json::Value {
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            serde_json::from_slice(&bytes).unwrap()
        }

        #[tokio::test]
        async fn test_process_returns_combined_results() {
            let state = state();
            let store = state.store.clone();
            let request = Request::post("/process?project=p1")
                .header("content-type", "application/json")
                .body(batch())
                .unwrap();

            let response = router(state).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let body = body_json(response).await;
            assert_eq!(body["combined"][0]["shared_id"], serde_json::json!(true));
            assert_eq!(body["summary"]["totals"]["total_cost"], serde_json::json!(200.0));
            assert_eq!(store.history().unwrap().len(), 1);
            assert_eq!(store.results("p1", ResultKind::Combined).unwrap().len(), 1);
        }

        #[tokio::test]
        async fn test_activate_unknown_version() {
            let request = Request::put("/versions/1999/activate").body(Body::empty()).unwrap();
            let response = router(state()).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }

        #[tokio::test]
        async fn test_structural_error_is_bad_request() {
            let request = Request::post("/cost")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"elements": [{"id": "E1"}]}"#))
                .unwrap();
            let response = router(state()).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }
}

#[cfg(not(feature = "server"))]
pub mod http {
    pub async fn start_server(
        _engine: kennwert::Engine,
        _store: kennwert::store::MemoryStore,
        _host: &str,
        _port: u16,
    ) -> anyhow::Result<()> {
        anyhow::bail!("Server feature not enabled. Recompile with --features server")
    }
}
