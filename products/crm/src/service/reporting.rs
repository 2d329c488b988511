use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::debug;

use crate::error::CrmResult;
use crate::repo;
use crate::scope::Actor;
use crate::validation::parse_money;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub leads_count: u64,
    pub active_deals_count: u64,
    /// Sum of open deal values; unparseable values count as zero.
    pub pipeline_value: f64,
    pub won_count: u64,
    pub lost_count: u64,
}

/// Headline numbers over the caller's visible leads and deals. A deal is open
/// while `is_won` is unset.
pub async fn dashboard(db: &DatabaseConnection, actor: &Actor) -> CrmResult<DashboardStats> {
    let mut stats = DashboardStats {
        leads_count: repo::leads::count_visible(db, actor).await?,
        ..DashboardStats::default()
    };
    for deal in repo::deals::all_visible(db, actor).await? {
        match deal.is_won {
            Some(true) => stats.won_count += 1,
            Some(false) => stats.lost_count += 1,
            None => {
                stats.active_deals_count += 1;
                stats.pipeline_value += parse_money(&deal.value).unwrap_or(0.0);
            }
        }
    }
    debug!(leads = stats.leads_count, open = stats.active_deals_count, "dashboard computed");
    Ok(stats)
}
