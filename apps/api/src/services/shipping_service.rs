//! Shipping zones and cost estimates.
//!
//! The zone is looked up by the shipping address region (city when the
//! region is blank). Regions without an active zone use the configured
//! default rates.

use std::sync::Arc;

use promoweb_core::validation::validate_parcel_weight_grams;
use promoweb_core::{Money, ShippingQuote, ShippingRate, ShippingZone, ValidationError};
use promoweb_db::repository::shipping_zone;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::AppState;

/// Delivery window quoted for regions without a zone.
const DEFAULT_DELIVERY_DAYS: (i64, i64) = (3, 7);

/// Rates resolved for one region.
#[derive(Debug, Clone)]
pub struct ResolvedRate {
    pub zone: Option<ShippingZone>,
    pub rate: ShippingRate,
}

impl ResolvedRate {
    /// Label used in messages (weight limit errors, estimates).
    pub fn label(&self) -> &str {
        self.zone.as_ref().map(|z| z.name.as_str()).unwrap_or("default")
    }
}

/// Finds the rate table for `region` on the given connection.
pub async fn resolve_rate(
    conn: &mut SqliteConnection,
    config: &ApiConfig,
    region: &str,
) -> ApiResult<ResolvedRate> {
    let zone = shipping_zone::find_active_by_code(conn, region).await?;
    let rate = match &zone {
        Some(zone) => zone.rate(),
        None => {
            debug!(region, "No active zone, using default rates");
            config.default_shipping_rate()
        }
    };
    Ok(ResolvedRate { zone, rate })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    pub region: String,
    pub weight_grams: i64,
    #[serde(default)]
    pub subtotal_xaf: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingEstimate {
    pub zone_code: Option<String>,
    pub zone_name: String,
    pub weight_grams: i64,
    pub billable_kg: i64,
    pub base_rate_xaf: i64,
    pub weight_charge_xaf: i64,
    pub free_shipping: bool,
    pub cost_xaf: i64,
    pub min_delivery_days: i64,
    pub max_delivery_days: i64,
}

impl ShippingEstimate {
    fn new(resolved: &ResolvedRate, quote: ShippingQuote) -> Self {
        let (min_days, max_days) = resolved
            .zone
            .as_ref()
            .map(|z| (z.min_delivery_days, z.max_delivery_days))
            .unwrap_or(DEFAULT_DELIVERY_DAYS);

        ShippingEstimate {
            zone_code: resolved.zone.as_ref().map(|z| z.code.clone()),
            zone_name: resolved.label().to_string(),
            weight_grams: quote.weight_grams,
            billable_kg: quote.billable_kg,
            base_rate_xaf: quote.base_rate.xaf(),
            weight_charge_xaf: quote.weight_charge.xaf(),
            free_shipping: quote.free_shipping,
            cost_xaf: quote.cost.xaf(),
            min_delivery_days: min_days,
            max_delivery_days: max_days,
        }
    }
}

/// Shipping zone queries.
pub struct ShippingService {
    state: Arc<AppState>,
}

impl ShippingService {
    pub fn new(state: Arc<AppState>) -> Self {
        ShippingService { state }
    }

    pub async fn list_zones(&self) -> ApiResult<Vec<ShippingZone>> {
        Ok(self.state.db.shipping_zones().list_active().await?)
    }

    pub async fn estimate(&self, req: EstimateRequest) -> ApiResult<ShippingEstimate> {
        validate_parcel_weight_grams(req.weight_grams)?;
        if req.subtotal_xaf < 0 {
            return Err(ValidationError::MustBePositive {
                field: "subtotalXaf".to_string(),
            }
            .into());
        }

        let mut conn = self.state.db.acquire().await?;
        let resolved = resolve_rate(&mut conn, &self.state.config, &req.region).await?;
        resolved.rate.check_weight(resolved.label(), req.weight_grams)?;

        let quote = resolved
            .rate
            .quote(req.weight_grams, Money::from_xaf(req.subtotal_xaf));
        Ok(ShippingEstimate::new(&resolved, quote))
    }
}
