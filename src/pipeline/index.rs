//! Index route: a simulated multi-step operation.
//!
//! Each argument in [`ARGS`] is bound into the logging context before its
//! steps run, so every step line carries the argument being processed. With
//! `?crash=true` step two fails for the first argument and the handler
//! answers with a generic 500.

use std::fmt;

use axum::extract::Query;
use axum::Json;
use serde::{Deserialize, Deserializer};

use crate::config::parse_bool_flag;
use crate::http::response::ApiError;
use crate::observability::{context, logging};

/// Arguments processed in order by the index route.
pub const ARGS: [char; 3] = ['a', 'b', 'c'];

/// Detail returned to the client when a step fails.
pub const PROCESSING_FAILED: &str = "Internal could not process stuff";

/// Query parameters of the index route.
#[derive(Debug, Default, Deserialize)]
pub struct IndexParams {
    #[serde(default, deserialize_with = "bool_flag")]
    pub crash: bool,
}

fn bool_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_bool_flag(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid boolean value: {raw:?}")))
}

/// Failure of a simulated step.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    #[error("Kaboom")]
    Kaboom,
}

pub async fn index(Query(params): Query<IndexParams>) -> Result<Json<&'static str>, ApiError> {
    tracing::info!("Getting index");

    if let Err(err) = run_steps(params.crash) {
        logging::exception(&err);
        return Err(ApiError::internal(PROCESSING_FAILED));
    }
    Ok(Json("index"))
}

/// Run every step for every argument, stopping at the first failure.
pub fn run_steps(crash: bool) -> Result<(), StepError> {
    for arg in ARGS {
        do_stuff(arg, crash)?;
    }
    Ok(())
}

fn do_stuff(arg: char, crash: bool) -> Result<(), StepError> {
    context::bind([("arg", arg.to_string())]);
    step_one();
    step_two(crash)?;
    step_three();
    Ok(())
}

fn step_one() {
    tracing::info!("Step {}", 1);
}

fn step_two(crash: bool) -> Result<(), StepError> {
    if crash {
        return Err(StepError::Kaboom);
    }
    tracing::info!("Step {}", 2);
    Ok(())
}

fn step_three() {
    // printf-style "% d": non-negative numbers get a leading space.
    tracing::info!("Step{}", SpaceSign(3));
}

/// Integer rendered with a blank in place of a plus sign.
#[derive(Debug, Clone, Copy)]
pub struct SpaceSign(pub i64);

impl fmt::Display for SpaceSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 >= 0 {
            write!(f, " {}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}
