//! OpenAPI document assembled from the handler annotations.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use super::dto::{
    CallerRequest, DistributionResponse, EventListResponse, LedgerStateResponse,
    ParticipantsResponse, RoundResetResponse, SendFundsRequest, StakeRequest, StakeResponse,
    VerifyStakeResponse,
};
use super::handlers::{distribution, ledger, stake, system};
use crate::error::{ErrorBody, ErrorResponse};

/// OpenAPI specification for the escrow REST API.
#[derive(Debug, OpenApi)]
#[openapi(
    modifiers(&OwnerKeyScheme),
    info(
        title = "stake-escrow",
        description = "Fixed-stake escrow ledger with owner-gated distribution"
    ),
    paths(
        stake::stake,
        stake::verify_stake,
        distribution::withdraw,
        distribution::send_funds_to,
        distribution::reset_round,
        ledger::get_ledger,
        ledger::list_participants,
        ledger::list_events,
        system::health_handler,
        system::ledger_config_handler,
    ),
    components(schemas(
        StakeRequest,
        StakeResponse,
        VerifyStakeResponse,
        CallerRequest,
        SendFundsRequest,
        DistributionResponse,
        RoundResetResponse,
        LedgerStateResponse,
        ParticipantsResponse,
        EventListResponse,
        ErrorResponse,
        ErrorBody,
        system::HealthResponse,
        system::LedgerConfigInfo,
    )),
    tags(
        (name = "Stakes", description = "Staking and stake verification"),
        (name = "Distributions", description = "Owner-gated payouts and round control"),
        (name = "Ledger", description = "Ledger state and event history"),
        (name = "System", description = "Health and configuration"),
    )
)]
pub struct ApiDoc;

/// Registers the bearer scheme used by owner-gated endpoints.
#[derive(Debug)]
struct OwnerKeyScheme;

impl Modify for OwnerKeyScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "owner_key",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_endpoint() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/v1/stakes",
            "/api/v1/stakes/{address}",
            "/api/v1/withdraw",
            "/api/v1/distributions",
            "/api/v1/rounds/reset",
            "/api/v1/ledger",
            "/api/v1/participants",
            "/api/v1/events",
            "/health",
            "/config/ledger",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn owner_key_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let registered = doc
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("owner_key"));
        assert!(registered);
    }
}
