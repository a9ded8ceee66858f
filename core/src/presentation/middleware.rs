// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Local Network Gate Middleware
//!
//! Runs [`AccessGate::check`](crate::application::AccessGate::check) for
//! every request before routing. Denied requests get a 403 JSON body and
//! never reach a handler.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::api::AppState;
use super::error::ApiError;

pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Client address as text: the first `X-Forwarded-For` hop when trusted,
/// otherwise the TCP peer. Empty when neither is available.
pub fn client_ip(request: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get(FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        if let Some(forwarded) = forwarded {
            return forwarded;
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}

pub async fn local_network_only(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let raw = client_ip(&request, state.trust_forwarded_for);

    match state.gate.check(&raw) {
        Ok(_) => next.run(request).await,
        Err(e) => ApiError::from(e).into_response(),
    }
}
