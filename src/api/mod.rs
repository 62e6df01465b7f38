use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{
    AFFORDABLE_EMI_SHARE, Affordability, EmiResult, EmiType, GoalSolveConfig, LoanProduct,
    SalaryBreakup, assess_affordability, compute_amortization, compute_salary_breakup,
    max_principal_for_emi, solve_goal,
};
use crate::errors::FieldErrors;
use crate::forms::{LoanForm, LoanRequest, SalaryForm, build_loan_request, build_salary_inputs};
use crate::share::{self, ShareMap};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<FieldErrors>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmiResponse {
    product: LoanProduct,
    product_name: String,
    bank: &'static str,
    annual_rate_percent: f64,
    tenure_months: u32,
    #[serde(flatten)]
    result: EmiResult,
    /// Reducing-balance rate equivalent to a flat-rate quote.
    #[serde(skip_serializing_if = "Option::is_none")]
    effective_annual_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    affordability: Option<Affordability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_principal_for_desired_emi: Option<f64>,
    share_query: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SalaryResponse {
    #[serde(flatten)]
    breakup: SalaryBreakup,
    share_query: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AffordabilityResponse {
    #[serde(flatten)]
    affordability: Affordability,
    max_affordable_emi: f64,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "rupeekit HTTP API listening");
    tracing::info!("local access: http://127.0.0.1:{port}/api/health");

    axum::serve(listener, router()).await
}

pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/emi", get(emi_get_handler).post(emi_post_handler))
        .route(
            "/api/salary",
            get(salary_get_handler).post(salary_post_handler),
        )
        .route("/api/affordability", get(affordability_handler))
        .fallback(not_found_handler)
}

async fn health_handler() -> Response {
    json_response(
        StatusCode::OK,
        HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn emi_get_handler(Query(params): Query<ShareMap>) -> Response {
    match share::loan_from_map(&params) {
        Ok(form) => emi_handler_impl(form),
        Err(fields) => validation_error_response(fields),
    }
}

async fn emi_post_handler(Json(form): Json<LoanForm>) -> Response {
    emi_handler_impl(form)
}

fn emi_handler_impl(form: LoanForm) -> Response {
    match emi_response_from_form(form) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(fields) => validation_error_response(fields),
    }
}

async fn salary_get_handler(Query(params): Query<ShareMap>) -> Response {
    match share::salary_from_map(&params) {
        Ok(form) => salary_handler_impl(form),
        Err(fields) => validation_error_response(fields),
    }
}

async fn salary_post_handler(Json(form): Json<SalaryForm>) -> Response {
    salary_handler_impl(form)
}

fn salary_handler_impl(form: SalaryForm) -> Response {
    match salary_response_from_form(form) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(fields) => validation_error_response(fields),
    }
}

async fn affordability_handler(Query(params): Query<ShareMap>) -> Response {
    match affordability_response_from_map(&params) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(fields) => validation_error_response(fields),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
            fields: None,
        },
    )
}

fn validation_error_response(fields: FieldErrors) -> Response {
    tracing::warn!(%fields, "rejected calculator input");
    json_response(
        StatusCode::BAD_REQUEST,
        ErrorResponse {
            error: "Invalid input".to_string(),
            fields: Some(fields),
        },
    )
}

fn share_query(map: &ShareMap) -> String {
    share::to_query_string(map).unwrap_or_else(|err| {
        tracing::warn!(error = %err, "could not encode share query");
        String::new()
    })
}

fn emi_response_from_form(form: LoanForm) -> Result<EmiResponse, FieldErrors> {
    let request = build_loan_request(form)?;
    Ok(build_emi_response(&request))
}

fn build_emi_response(request: &LoanRequest) -> EmiResponse {
    let inputs = &request.inputs;
    let result = compute_amortization(inputs);
    let rate = inputs.effective_rate_percent();
    tracing::debug!(
        principal = result.principal,
        monthly_emi = result.monthly_emi,
        tenure_months = inputs.tenure_months,
        "computed amortization"
    );

    let effective_annual_rate = match inputs.emi_type {
        EmiType::Flat if rate > 0.0 && result.principal > 0.0 => {
            let config = GoalSolveConfig::implied_rate(
                result.principal,
                result.monthly_emi,
                inputs.tenure_months,
            );
            solve_goal(config)
                .ok()
                .filter(|solved| solved.feasible)
                .and_then(|solved| solved.solved_value)
        }
        _ => None,
    };

    let affordability = request
        .salary_check
        .map(|check| assess_affordability(check.monthly_salary, result.monthly_emi));
    let max_principal_for_desired_emi = request
        .salary_check
        .and_then(|check| check.desired_emi)
        .map(|emi| max_principal_for_emi(emi, rate, inputs.tenure_months, inputs.emi_type));

    EmiResponse {
        product: request.product,
        product_name: request.product_name.clone(),
        bank: request.bank.display_name(),
        annual_rate_percent: rate,
        tenure_months: inputs.tenure_months,
        share_query: share_query(&share::loan_to_map(request)),
        result,
        effective_annual_rate,
        affordability,
        max_principal_for_desired_emi,
    }
}

fn salary_response_from_form(form: SalaryForm) -> Result<SalaryResponse, FieldErrors> {
    let inputs = build_salary_inputs(form)?;
    let breakup = compute_salary_breakup(&inputs);
    tracing::debug!(
        ctc = inputs.ctc,
        regime = %inputs.tax_regime,
        in_hand_monthly = breakup.in_hand_monthly,
        "computed salary breakup"
    );
    Ok(SalaryResponse {
        breakup,
        share_query: share_query(&share::salary_to_map(&inputs)),
    })
}

fn affordability_response_from_map(
    params: &ShareMap,
) -> Result<AffordabilityResponse, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut positive = |key: &'static str, message: &str| {
        let value = params
            .get(key)
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite() && *value > 0.0);
        if value.is_none() {
            errors.insert(key, message);
        }
        value.unwrap_or(0.0)
    };
    let salary = positive("salary", "Valid salary required");
    let emi = positive("emi", "Valid EMI required");
    errors.into_result(AffordabilityResponse {
        affordability: assess_affordability(salary, emi),
        max_affordable_emi: salary * AFFORDABLE_EMI_SHARE,
    })
}

#[cfg(test)]
fn emi_response_from_json(json: &str) -> Result<EmiResponse, FieldErrors> {
    let form = serde_json::from_str::<LoanForm>(json)
        .map_err(|e| FieldErrors::single("body", format!("Invalid JSON payload: {e}")))?;
    emi_response_from_form(form)
}
