//! Facturacion service: electronic tax document issuance and ledger
//! reconciliation against the SUNAT invoicing gateway.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;

use axum::middleware::from_fn;
use axum::{
    routing::{get, post},
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{metrics::metrics_middleware, tracing::request_id_middleware};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use config::Config;
use services::{
    init_metrics, Database, InvoicingApiClient, IssuanceSaga, LedgerStore, StatusPoller,
    SummaryLifecycle, TaxDocumentGateway,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub gateway: Arc<dyn TaxDocumentGateway>,
    pub issuance: Arc<IssuanceSaga>,
    pub summaries: Arc<SummaryLifecycle>,
    pub poller: Arc<StatusPoller>,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let db = Database::new(
            config.database.url.expose_secret(),
            config.database.max_connections,
            config.database.min_connections,
        )
        .await?;
        db.run_migrations().await?;

        let client = InvoicingApiClient::new(
            config.gateway.clone(),
            config.emisor.company_id,
            config.emisor.branch_id,
        );
        if client.is_configured() {
            tracing::info!("Invoicing gateway client initialized");
        } else {
            tracing::warn!(
                "Invoicing gateway token not configured - issuance calls will be rejected upstream"
            );
        }

        let gateway: Arc<dyn TaxDocumentGateway> = Arc::new(client);
        let ledger: Arc<dyn LedgerStore> = Arc::new(db.clone());

        let issuance = Arc::new(IssuanceSaga::new(
            gateway.clone(),
            ledger.clone(),
            config.emisor.clone(),
        ));
        let summaries = Arc::new(SummaryLifecycle::new(gateway.clone(), ledger.clone()));
        let poller = Arc::new(StatusPoller::new(gateway.clone(), ledger.clone()));

        init_metrics();

        let state = AppState {
            config: config.clone(),
            db,
            gateway,
            issuance,
            summaries,
            poller,
        };

        let router = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            .route("/metrics", get(handlers::metrics_endpoint))
            // Issuance (one synchronous orchestration call per user action)
            .route("/boletas", post(handlers::boletas::emitir))
            .route("/boletas/:id/pdf", post(handlers::boletas::generar_pdf))
            .route("/notas-credito", post(handlers::notas_credito::emitir))
            .route(
                "/documentos/:tipo/:serie/:numero",
                get(handlers::notas_credito::buscar_documento_afectado),
            )
            // Daily summaries
            .route(
                "/resumenes-diarios",
                post(handlers::resumenes::crear).get(handlers::resumenes::listar),
            )
            .route("/resumenes-diarios/enviar", post(handlers::resumenes::enviar))
            .route(
                "/resumenes-diarios/:id/consultar-estado",
                post(handlers::resumenes::consultar_estado),
            )
            .layer(from_fn(metrics_middleware))
            .layer(from_fn(request_id_middleware))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");

                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                    )
                }),
            )
            .with_state(state);

        // Bind the listener here so port 0 resolves to the real port.
        let addr = config.common.socket_addr()?;
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Facturacion service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }
}
