//! Board read model: deals grouped into stage columns.
//!
//! Grouping is a pure function of its inputs. When the stage list comes from
//! configured stages (ids differ from names) deals are bucketed by
//! `deal_stage_id`; otherwise, or for deals that were never placed, the legacy
//! free-text `stage` is matched against stage names.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use entity::{deal_stages, deals};
use serde::Serialize;
use uuid::Uuid;

pub const UNSET_COLUMN_ID: &str = "__unset__";
pub const UNSET_COLUMN_NAME: &str = "Unset";
pub const DEFAULT_STAGE_NAME: &str = "Qualification";
pub const FALLBACK_STAGES: [&str; 5] = [
    "Qualification",
    "Proposal",
    "Negotiation",
    "Closed Won",
    "Closed Lost",
];

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRef {
    pub id: String,
    pub name: String,
    pub display_order: i32,
    pub is_won: bool,
    pub is_lost: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealCard {
    pub id: Uuid,
    pub name: String,
    pub value: String,
    pub currency: Option<String>,
    pub stage: Option<String>,
    pub deal_stage_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub expected_close_date: Option<DateTime<FixedOffset>>,
    pub is_won: Option<bool>,
}

impl From<&deals::Model> for DealCard {
    fn from(deal: &deals::Model) -> Self {
        Self {
            id: deal.id,
            name: deal.name.clone(),
            value: deal.value.clone(),
            currency: deal.currency.clone(),
            stage: deal.stage.clone(),
            deal_stage_id: deal.deal_stage_id,
            company_id: deal.company_id,
            expected_close_date: deal.expected_close_date,
            is_won: deal.is_won,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardColumn {
    pub stage_id: String,
    pub stage_name: String,
    pub is_won: bool,
    pub is_lost: bool,
    pub count: usize,
    pub value_total: f64,
    pub deals: Vec<DealCard>,
}

/// Configured stages by display order, or the fallback names when none exist.
pub fn stage_list(stages: &[deal_stages::Model]) -> Vec<StageRef> {
    if stages.is_empty() {
        let last = FALLBACK_STAGES.len() - 1;
        return FALLBACK_STAGES
            .iter()
            .enumerate()
            .map(|(idx, name)| StageRef {
                id: name.to_string(),
                name: name.to_string(),
                display_order: idx as i32,
                is_won: idx + 1 == last,
                is_lost: idx == last,
            })
            .collect();
    }
    let mut sorted: Vec<&deal_stages::Model> = stages.iter().collect();
    sorted.sort_by(|a, b| {
        a.display_order
            .cmp(&b.display_order)
            .then_with(|| a.name.cmp(&b.name))
    });
    sorted
        .into_iter()
        .map(|s| StageRef {
            id: s.id.to_string(),
            name: s.name.clone(),
            display_order: s.display_order,
            is_won: s.is_won,
            is_lost: s.is_lost,
        })
        .collect()
}

pub fn group_deals(deals: &[DealCard], stages: &[StageRef]) -> Vec<BoardColumn> {
    let use_api_stages = !stages.is_empty() && stages.iter().any(|s| s.id != s.name);
    let mut buckets: HashMap<&str, Vec<DealCard>> =
        stages.iter().map(|s| (s.id.as_str(), Vec::new())).collect();
    let mut unset: Vec<DealCard> = Vec::new();

    for deal in deals {
        let placed_id = match deal.deal_stage_id {
            Some(stage_id) if use_api_stages => Some(stage_id.to_string()),
            _ => None,
        };
        let key = match placed_id {
            Some(id) => id,
            None => {
                let wanted = deal
                    .stage
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .unwrap_or(DEFAULT_STAGE_NAME);
                stages
                    .iter()
                    .find(|s| s.name == wanted)
                    .map(|s| s.id.clone())
                    .unwrap_or_else(|| wanted.to_string())
            }
        };
        match buckets.get_mut(key.as_str()) {
            Some(bucket) => bucket.push(deal.clone()),
            None => unset.push(deal.clone()),
        }
    }

    let mut columns: Vec<BoardColumn> = stages
        .iter()
        .map(|s| {
            let deals = buckets.remove(s.id.as_str()).unwrap_or_default();
            column(s.id.clone(), s.name.clone(), s.is_won, s.is_lost, deals)
        })
        .collect();
    if !unset.is_empty() {
        columns.push(column(
            UNSET_COLUMN_ID.to_string(),
            UNSET_COLUMN_NAME.to_string(),
            false,
            false,
            unset,
        ));
    }
    columns
}

fn column(
    stage_id: String,
    stage_name: String,
    is_won: bool,
    is_lost: bool,
    deals: Vec<DealCard>,
) -> BoardColumn {
    BoardColumn {
        stage_id,
        stage_name,
        is_won,
        is_lost,
        count: deals.len(),
        value_total: deals.iter().map(|d| board_value(&d.value)).sum(),
        deals,
    }
}

/// Leading numeric part after dropping everything but digits, `.` and `-`; 0 when none.
pub fn board_value(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    let bytes = cleaned.as_bytes();
    let mut end = 0;
    if bytes.first() == Some(&b'-') {
        end = 1;
    }
    let mut seen_dot = false;
    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => end += 1,
            b'.' if !seen_dot => {
                seen_dot = true;
                end += 1;
            }
            _ => break,
        }
    }
    cleaned[..end].parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(name: &str, order: i32) -> deal_stages::Model {
        deal_stages::Model {
            id: Uuid::new_v4(),
            pipeline_id: Uuid::nil(),
            name: name.to_string(),
            display_order: order,
            is_won: false,
            is_lost: false,
        }
    }

    fn card(value: &str, stage: Option<&str>, deal_stage_id: Option<Uuid>) -> DealCard {
        DealCard {
            id: Uuid::new_v4(),
            name: "Deal".into(),
            value: value.into(),
            currency: None,
            stage: stage.map(str::to_string),
            deal_stage_id,
            company_id: None,
            expected_close_date: None,
            is_won: None,
        }
    }

    #[test]
    fn fallback_stages_when_none_configured() {
        let list = stage_list(&[]);
        let names: Vec<_> = list.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, FALLBACK_STAGES);
        assert!(list.iter().all(|s| s.id == s.name));
        assert!(list[3].is_won);
        assert!(list[4].is_lost);
    }

    #[test]
    fn configured_stages_sort_by_order_then_name() {
        let stages = vec![stage("Won", 3), stage("Beta", 1), stage("Alpha", 1)];
        let names: Vec<_> = stage_list(&stages).into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Won"]);
    }

    #[test]
    fn legacy_stage_name_matches_configured_column() {
        let stages = vec![stage("Qualification", 0), stage("Proposal", 1)];
        let list = stage_list(&stages);
        let deals = vec![card("100", Some("Proposal"), None)];
        let columns = group_deals(&deals, &list);
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[1].stage_name, "Proposal");
        assert_eq!(columns[1].count, 1);
    }

    #[test]
    fn unknown_stage_ids_and_names_go_to_unset() {
        let stages = vec![stage("Qualification", 0)];
        let list = stage_list(&stages);
        let deals = vec![
            card("10", None, Some(Uuid::new_v4())),
            card("5", Some("Nowhere"), None),
            card("1", None, None),
        ];
        let columns = group_deals(&deals, &list);
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0].count, 1, "missing stage defaults to Qualification");
        let unset = &columns[1];
        assert_eq!(unset.stage_id, UNSET_COLUMN_ID);
        assert_eq!(unset.stage_name, UNSET_COLUMN_NAME);
        assert_eq!(unset.count, 2);
        assert_eq!(unset.value_total, 15.0);
    }

    #[test]
    fn placed_deals_bucket_by_id() {
        let stages = vec![stage("Qualification", 0), stage("Proposal", 1)];
        let proposal_id = stages[1].id;
        let list = stage_list(&stages);
        let deals = vec![card("$1,200", Some("Qualification"), Some(proposal_id))];
        let columns = group_deals(&deals, &list);
        assert_eq!(columns[0].count, 0);
        assert_eq!(columns[1].count, 1);
        assert_eq!(columns[1].value_total, 1200.0);
    }

    #[test]
    fn fallback_board_ignores_stage_ids() {
        let list = stage_list(&[]);
        let deals = vec![card("7", Some("Negotiation"), Some(Uuid::new_v4()))];
        let columns = group_deals(&deals, &list);
        assert_eq!(columns.len(), 5);
        assert_eq!(columns[2].count, 1);
    }

    #[test]
    fn grouping_is_idempotent() {
        let stages = vec![stage("Qualification", 0), stage("Proposal", 1)];
        let list = stage_list(&stages);
        let deals = vec![
            card("100", Some("Proposal"), None),
            card("200", None, Some(stages[0].id)),
            card("x", Some("Gone"), None),
        ];
        let first = group_deals(&deals, &list);
        let flattened: Vec<DealCard> = first.iter().flat_map(|c| c.deals.clone()).collect();
        let second = group_deals(&flattened, &list);
        assert_eq!(first, second);
        assert_eq!(first, group_deals(&deals, &list));
    }

    #[test]
    fn board_value_reads_leading_number() {
        assert_eq!(board_value("$12,000"), 12000.0);
        assert_eq!(board_value("1.5.9"), 1.5);
        assert_eq!(board_value("-3"), -3.0);
        assert_eq!(board_value("n/a"), 0.0);
        assert_eq!(board_value(""), 0.0);
    }
}
