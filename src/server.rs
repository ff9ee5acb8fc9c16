use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::balancer;
use crate::config::BalanceConfig;
use crate::data::{Player, Solution};
use crate::error::{BalanceError, InfeasibilityCause};
use crate::solver::HighsSolver;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SolveRequest {
    pub players: Vec<Player>,
    #[serde(default)]
    pub config: BalanceConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<InfeasibilityCause>,
}

fn error_response(e: BalanceError) -> (StatusCode, Json<ErrorBody>) {
    let status = match &e {
        e if e.is_input_error() => StatusCode::BAD_REQUEST,
        BalanceError::Infeasible { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let cause = match &e {
        BalanceError::Infeasible { cause } => Some(cause.clone()),
        _ => None,
    };
    (
        status,
        Json(ErrorBody {
            error: e.to_string(),
            cause,
        }),
    )
}

async fn solve_handler(
    Json(input): Json<SolveRequest>,
) -> Result<Json<Solution>, (StatusCode, Json<ErrorBody>)> {
    // the solver blocks for up to its time budget
    let joined = tokio::task::spawn_blocking(move || {
        balancer::balance(&input.players, &input.config, &HighsSolver::default())
    })
    .await;
    match joined {
        Ok(Ok(output)) => Ok(Json(output)),
        Ok(Err(e)) => Err(error_response(e)),
        Err(e) => {
            error!("solve task failed: {e}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "solve task failed".into(),
                    cause: None,
                }),
            ))
        }
    }
}

pub fn router() -> Router {
    Router::new().route("/v1/teams/solve", post(solve_handler))
}

pub async fn run_server(addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);
    axum::serve(listener, router()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_map_to_bad_request() {
        let (status, body) = error_response(BalanceError::EmptyRoster);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.0.cause.is_none());
    }

    #[test]
    fn infeasibility_carries_its_cause() {
        let (status, body) = error_response(BalanceError::Infeasible {
            cause: InfeasibilityCause::RoleCoverage,
        });
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.0.cause, Some(InfeasibilityCause::RoleCoverage));
    }

    #[test]
    fn solver_failures_are_internal() {
        let (status, _) = error_response(BalanceError::Solver("boom".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
