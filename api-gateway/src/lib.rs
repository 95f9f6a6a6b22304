//! HTTP gateway for the fund ledger

pub mod api;
pub mod config;
pub mod error;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use ledger_service::LedgerService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{client, fund, subscription, system};

/// App state shared across handlers
pub struct AppState {
    /// Ledger service
    pub ledger: Arc<LedgerService>,
}

/// API documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // System routes
        api::system::health,
        api::system::initialize,
        // Fund routes
        api::fund::list_funds,
        api::fund::get_fund,
        // Client routes
        api::client::create_client,
        api::client::list_clients,
        api::client::get_client,
        api::client::get_balance,
        api::client::get_subscriptions,
        api::client::get_transactions,
        api::client::audit_balance,
        api::client::deposit,
        // Subscription routes
        api::subscription::subscribe,
        api::subscription::cancel,
    ),
    components(
        schemas(
            // Requests
            api::client::CreateClientRequest,
            api::client::DepositRequest,
            api::subscription::FundRequest,

            // Payloads
            api::system::HealthPayload,
            api::fund::FundsPayload,
            api::fund::FundPayload,
            api::client::ClientCreatedPayload,
            api::client::ClientPayload,
            api::client::ClientsPayload,
            api::client::SubscriptionsPayload,
            api::client::TransactionsPayload,
            api::client::DepositPayload,
            api::subscription::SubscriptionPayload,
            api::subscription::CancellationPayload,
            ledger_service::BalanceOverview,
            ledger_service::SubscribedFund,
            ledger_service::BalanceAudit,
            ledger_service::InitializationReport,

            // Models
            common::model::Fund,
            common::model::FundType,
            common::model::RiskLevel,
            common::model::FundInfo,
            common::model::Client,
            common::model::Transaction,
            common::model::TransactionType,
            common::model::ClientFundSubscription,
            common::model::ExistingSubscription,
            common::error::FailureContext,
        )
    ),
    tags(
        (name = "system", description = "Health and setup endpoints"),
        (name = "fund", description = "Fund catalog endpoints"),
        (name = "client", description = "Client account endpoints"),
        (name = "subscription", description = "Fund subscription endpoints")
    ),
    info(
        title = "Fund Ledger API",
        version = "1.0.0",
        description = "Client accounts, investment funds and fund subscriptions"
    )
)]
pub struct ApiDoc;

/// Build the application router with tracing spans at `log_level`
pub fn router(state: Arc<AppState>, log_level: Level) -> Router {
    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // System routes
        .route("/health", get(system::health))
        .route("/initialize", post(system::initialize))

        // Fund routes
        .route("/funds", get(fund::list_funds))
        .route("/funds/:fund_id", get(fund::get_fund))

        // Client routes
        .route("/clients", get(client::list_clients))
        .route("/clients/create", post(client::create_client))
        .route("/clients/:client_id", get(client::get_client))
        .route("/clients/:client_id/balance", get(client::get_balance))
        .route("/clients/:client_id/subscriptions", get(client::get_subscriptions))
        .route("/clients/:client_id/transactions", get(client::get_transactions))
        .route("/clients/:client_id/audit", get(client::audit_balance))
        .route("/deposit", post(client::deposit))

        // Subscription routes
        .route("/subscribe", post(subscription::subscribe))
        .route("/cancel", post(subscription::cancel));

    // Set up Swagger UI
    let swagger_ui = SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi());

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(swagger_ui)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(log_level))
                .on_request(DefaultOnRequest::new().level(log_level))
                .on_response(DefaultOnResponse::new().level(log_level)),
        )
        .with_state(state)
}
