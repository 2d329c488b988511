mod common;

use common::{default_pipeline, owner_with_org, setup_db, stage};
use crm::service::companies::{self, CompanyInput};
use crm::service::contacts::{self, ContactInput};
use crm::service::deals::{self, CreateDeal};
use crm::service::leads::{self, LeadInput};
use crm::service::{reporting, search};

fn deal(name: &str, value: &str, stage_id: Option<uuid::Uuid>) -> CreateDeal {
    CreateDeal {
        name: Some(name.into()),
        value: Some(value.into()),
        deal_stage_id: stage_id,
        ..CreateDeal::default()
    }
}

fn lead(name: &str, email: &str) -> LeadInput {
    LeadInput {
        name: Some(name.into()),
        email: Some(email.into()),
        ..LeadInput::default()
    }
}

#[tokio::test]
async fn dashboard_splits_open_won_and_lost() {
    let db = setup_db().await;
    let actor = owner_with_org(&db, "pia@example.com").await;
    let other = owner_with_org(&db, "quin@example.com").await;
    let pipeline = default_pipeline(&db, &actor).await;
    let won = stage(&pipeline, "Closed Won").id;
    let lost = stage(&pipeline, "Closed Lost").id;
    let proposal = stage(&pipeline, "Proposal").id;

    for (name, value, stage_id) in [
        ("Open one", "$1,200", Some(proposal)),
        ("Open two", "300.50", None),
        ("Won", "5000", Some(won)),
        ("Lost", "800", Some(lost)),
    ] {
        deals::create(&db, &actor, deal(name, value, stage_id)).await.unwrap();
    }
    leads::create(&db, &actor, lead("Ray", "ray@example.com")).await.unwrap();
    leads::create(&db, &other, lead("Sue", "sue@example.com")).await.unwrap();
    deals::create(&db, &other, deal("Not mine", "9999", None)).await.unwrap();

    let stats = reporting::dashboard(&db, &actor).await.unwrap();
    assert_eq!(stats.leads_count, 1);
    assert_eq!(stats.active_deals_count, 2);
    assert_eq!(stats.pipeline_value, 1500.5);
    assert_eq!(stats.won_count, 1);
    assert_eq!(stats.lost_count, 1);

    let empty = reporting::dashboard(&db, &crm::Actor::new(actor.user_id, None)).await.unwrap();
    assert_eq!(empty, reporting::DashboardStats::default());
}

#[tokio::test]
async fn global_search_spans_every_kind_and_stays_scoped() {
    let db = setup_db().await;
    let actor = owner_with_org(&db, "tom@example.com").await;
    let other = owner_with_org(&db, "uma@example.com").await;

    companies::create(
        &db,
        &actor,
        CompanyInput {
            name: Some("Orbit Labs".into()),
            ..CompanyInput::default()
        },
    )
    .await
    .unwrap();
    contacts::create(
        &db,
        &actor,
        ContactInput {
            name: Some("Vera Orbit".into()),
            email: Some("vera@orbit.io".into()),
            ..ContactInput::default()
        },
    )
    .await
    .unwrap();
    leads::create(&db, &actor, lead("Orbital lead", "lead@orbit.io")).await.unwrap();
    deals::create(&db, &actor, deal("ORBIT expansion", "100", None)).await.unwrap();
    deals::create(&db, &actor, deal("Unrelated", "100", None)).await.unwrap();
    deals::create(&db, &other, deal("Orbit elsewhere", "100", None)).await.unwrap();

    let found = search::global(&db, &actor, "  orbit ").await.unwrap();
    assert_eq!(found.companies.len(), 1);
    assert_eq!(found.contacts.len(), 1);
    assert_eq!(found.leads.len(), 1);
    assert_eq!(found.deals.len(), 1);
    assert_eq!(found.deals[0].name, "ORBIT expansion");

    let blank = search::global(&db, &actor, "   ").await.unwrap();
    assert_eq!(blank, search::GlobalSearchResult::default());
}

#[tokio::test]
async fn global_search_caps_each_kind() {
    let db = setup_db().await;
    let actor = owner_with_org(&db, "val@example.com").await;
    for n in 0..12 {
        let name = format!("Bulk deal {n:02}");
        deals::create(&db, &actor, deal(&name, "1", None)).await.unwrap();
    }

    let found = search::global(&db, &actor, "bulk").await.unwrap();
    assert_eq!(found.deals.len() as u64, search::MAX_PER_KIND);
    assert_eq!(found.deals[0].name, "Bulk deal 00");
}
