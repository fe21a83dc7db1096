// Copyright (c) 2025 Ronan LE MEILLAT, SCTG Development
// This file is part of the rust-modbus-bridge project and is licensed under the
// SCTG Development Non-Commercial License v1.0 (see LICENSE.md for details).

use rocket::http::Status;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::Request;
use serde_json::json;
use thiserror::Error;

use crate::gateway::GatewayError;
use crate::missions::WorkflowError;

/// Error returned by the API handlers.
///
/// Rendered as `500 {"detail": "<message>"}` whatever its cause.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A workflow aborted; the detail is the failure of the aborting step
    #[error("{}", .0.source)]
    Workflow(#[from] WorkflowError),
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        log::error!("{} {} failed: {}", request.method(), request.uri(), self);
        (
            Status::InternalServerError,
            Json(json!({ "detail": self.to_string() })),
        )
            .respond_to(request)
    }
}
