mod common;

use common::{create_user, default_pipeline, domain_err, owner_with_org, setup_db, stage};
use crm::repo::activities::ActivityFilter;
use crm::service::deals::{self, CreateDeal, UpdateDeal};
use crm::service::pipelines::{self, CreatePipeline, StageInput, UpdateDealStage};
use crm::service::{activities, board};
use crm::{DomainError, PaginationParams};
use uuid::Uuid;

fn deal(name: &str, value: &str) -> CreateDeal {
    CreateDeal {
        name: Some(name.into()),
        value: Some(value.into()),
        ..CreateDeal::default()
    }
}

#[tokio::test]
async fn first_placement_is_recorded_without_a_from_stage() {
    let db = setup_db().await;
    let actor = owner_with_org(&db, "ana@example.com").await;
    let pipeline = default_pipeline(&db, &actor).await;
    let qualification = stage(&pipeline, "Qualification");

    let created = deals::create(
        &db,
        &actor,
        CreateDeal {
            pipeline_id: Some(pipeline.id),
            deal_stage_id: Some(qualification.id),
            ..deal("Acme renewal", "1200")
        },
    )
    .await
    .unwrap();
    assert_eq!(created.deal_stage_id, Some(qualification.id));
    assert_eq!(created.stage.as_deref(), Some("Qualification"));

    let history = deals::stage_history(&db, &actor, created.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].from_deal_stage_id, None);
    assert_eq!(history[0].to_deal_stage_id, Some(qualification.id));
    assert_eq!(history[0].changed_by_user_id, actor.user_id);

    let filter = ActivityFilter {
        deal_id: Some(created.id),
        ..ActivityFilter::default()
    };
    let logged = activities::list_paged(&db, &actor, PaginationParams::default(), filter)
        .await
        .unwrap();
    assert_eq!(logged.items.len(), 1);
    assert_eq!(logged.items[0].kind, "stage_change");
    assert_eq!(logged.items[0].subject.as_deref(), Some("Stage: (none) -> Qualification"));
}

#[tokio::test]
async fn change_stage_appends_history_and_sets_outcome() {
    let db = setup_db().await;
    let actor = owner_with_org(&db, "ben@example.com").await;
    let pipeline = default_pipeline(&db, &actor).await;
    let proposal = stage(&pipeline, "Proposal");
    let won = stage(&pipeline, "Closed Won");
    let lost = stage(&pipeline, "Closed Lost");

    let created = deals::create(
        &db,
        &actor,
        CreateDeal {
            pipeline_id: Some(pipeline.id),
            ..deal("Globex", "5000")
        },
    )
    .await
    .unwrap();
    assert!(deals::stage_history(&db, &actor, created.id).await.unwrap().is_empty());

    let moved = deals::change_stage(&db, &actor, created.id, proposal.id).await.unwrap();
    assert_eq!(moved.stage.as_deref(), Some("Proposal"));
    assert_eq!(moved.is_won, None);
    assert!(moved.last_activity_at.is_some());

    let closed = deals::change_stage(&db, &actor, created.id, won.id).await.unwrap();
    assert_eq!(closed.is_won, Some(true));
    let reopened = deals::change_stage(&db, &actor, created.id, lost.id).await.unwrap();
    assert_eq!(reopened.is_won, Some(false));

    let history = deals::stage_history(&db, &actor, created.id).await.unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].to_stage_name.as_deref(), Some("Closed Lost"));
    assert_eq!(history[0].from_stage_name.as_deref(), Some("Closed Won"));
    assert_eq!(history[2].from_deal_stage_id, None);
    assert_eq!(history[2].to_deal_stage_id, Some(proposal.id));
}

#[tokio::test]
async fn moving_into_the_current_stage_writes_nothing() {
    let db = setup_db().await;
    let actor = owner_with_org(&db, "cy@example.com").await;
    let pipeline = default_pipeline(&db, &actor).await;
    let negotiation = stage(&pipeline, "Negotiation");

    let created = deals::create(&db, &actor, deal("Initech", "300")).await.unwrap();
    deals::change_stage(&db, &actor, created.id, negotiation.id).await.unwrap();
    let again = deals::change_stage(&db, &actor, created.id, negotiation.id).await.unwrap();
    assert_eq!(again.deal_stage_id, Some(negotiation.id));
    assert_eq!(again.pipeline_id, Some(pipeline.id));
    assert_eq!(deals::stage_history(&db, &actor, created.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn change_stage_checks_deal_then_stage_then_pipeline() {
    let db = setup_db().await;
    let actor = owner_with_org(&db, "dee@example.com").await;
    let outsider = owner_with_org(&db, "eve@example.com").await;
    let pipeline = default_pipeline(&db, &actor).await;
    let foreign = default_pipeline(&db, &outsider).await;
    let foreign_stage = stage(&foreign, "Proposal");

    let second = pipelines::create(
        &db,
        &actor,
        CreatePipeline {
            name: Some("Partners".into()),
            stages: vec![StageInput {
                name: Some("Intro".into()),
                ..StageInput::default()
            }],
            ..CreatePipeline::default()
        },
    )
    .await
    .unwrap();
    let created = deals::create(
        &db,
        &actor,
        CreateDeal {
            pipeline_id: Some(pipeline.id),
            ..deal("Hooli", "10")
        },
    )
    .await
    .unwrap();

    let missing = deals::change_stage(&db, &actor, Uuid::new_v4(), foreign_stage.id).await;
    assert_eq!(domain_err(missing), DomainError::DealNotFound);

    let cross_org = deals::change_stage(&db, &actor, created.id, foreign_stage.id).await;
    assert_eq!(domain_err(cross_org), DomainError::DealStageNotFound);

    let other_pipeline =
        deals::change_stage(&db, &actor, created.id, second.deal_stages[0].id).await;
    assert_eq!(domain_err(other_pipeline), DomainError::InvalidStage);

    assert!(deals::stage_history(&db, &actor, created.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn foreign_stages_cannot_be_edited_or_deleted() {
    let db = setup_db().await;
    let actor = owner_with_org(&db, "fay@example.com").await;
    let outsider = owner_with_org(&db, "gus@example.com").await;
    let foreign = default_pipeline(&db, &outsider).await;
    let target = stage(&foreign, "Negotiation");

    let rename = UpdateDealStage {
        name: Some("Hijacked".into()),
        ..UpdateDealStage::default()
    };
    let updated = pipelines::update_stage(&db, &actor, target.id, rename).await;
    assert_eq!(domain_err(updated), DomainError::DealStageNotFound);
    let deleted = pipelines::delete_stage(&db, &actor, target.id).await;
    assert_eq!(domain_err(deleted), DomainError::DealStageNotFound);

    let unchanged = pipelines::get_stage(&db, &outsider, target.id).await.unwrap();
    assert_eq!(unchanged.name, "Negotiation");
}

#[tokio::test]
async fn stages_cannot_be_both_won_and_lost() {
    let db = setup_db().await;
    let actor = owner_with_org(&db, "hal@example.com").await;
    let pipeline = default_pipeline(&db, &actor).await;
    let won = stage(&pipeline, "Closed Won");

    let both = UpdateDealStage {
        is_lost: Some(true),
        ..UpdateDealStage::default()
    };
    let result = pipelines::update_stage(&db, &actor, won.id, both).await;
    assert_eq!(domain_err(result), DomainError::ConflictingOutcome);
}

#[tokio::test]
async fn moving_pipeline_drops_a_stage_from_the_old_one() {
    let db = setup_db().await;
    let actor = owner_with_org(&db, "ivy@example.com").await;
    let pipeline = default_pipeline(&db, &actor).await;
    let proposal = stage(&pipeline, "Proposal");
    let second = pipelines::create(
        &db,
        &actor,
        CreatePipeline {
            name: Some("Renewals".into()),
            ..CreatePipeline::default()
        },
    )
    .await
    .unwrap();

    let created = deals::create(
        &db,
        &actor,
        CreateDeal {
            deal_stage_id: Some(proposal.id),
            ..deal("Umbrella", "900")
        },
    )
    .await
    .unwrap();
    let moved = deals::update(
        &db,
        &actor,
        created.id,
        UpdateDeal {
            pipeline_id: Some(second.id),
            ..UpdateDeal::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(moved.pipeline_id, Some(second.id));
    assert_eq!(moved.deal_stage_id, None);

    let history = deals::stage_history(&db, &actor, created.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].from_deal_stage_id, Some(proposal.id));
    assert_eq!(history[0].to_deal_stage_id, None);
}

#[tokio::test]
async fn board_places_legacy_deals_by_stage_name() {
    let db = setup_db().await;
    let actor = owner_with_org(&db, "jo@example.com").await;
    let pipeline = default_pipeline(&db, &actor).await;
    let negotiation = stage(&pipeline, "Negotiation");

    deals::create(
        &db,
        &actor,
        CreateDeal {
            stage: Some("Proposal".into()),
            ..deal("Legacy", "$1,500.50")
        },
    )
    .await
    .unwrap();
    deals::create(&db, &actor, deal("Blank", "100")).await.unwrap();
    deals::create(
        &db,
        &actor,
        CreateDeal {
            deal_stage_id: Some(negotiation.id),
            ..deal("Placed", "400")
        },
    )
    .await
    .unwrap();

    let board = board::board(&db, &actor, pipeline.id).await.unwrap();
    let names: Vec<&str> = board.columns.iter().map(|c| c.stage_name.as_str()).collect();
    assert_eq!(
        names,
        ["Qualification", "Proposal", "Negotiation", "Closed Won", "Closed Lost"]
    );
    assert_eq!(board.columns[0].deals[0].name, "Blank");
    assert_eq!(board.columns[1].deals[0].name, "Legacy");
    assert_eq!(board.columns[1].value_total, 1500.5);
    assert_eq!(board.columns[2].deals[0].name, "Placed");
    assert_eq!(board.total_count, 3);
    assert_eq!(board.total_value, 2000.5);
}

#[tokio::test]
async fn board_is_scoped_to_members() {
    let db = setup_db().await;
    let actor = owner_with_org(&db, "kim@example.com").await;
    let outsider = owner_with_org(&db, "lou@example.com").await;
    let pipeline = default_pipeline(&db, &actor).await;

    let foreign = board::board(&db, &outsider, pipeline.id).await;
    assert_eq!(domain_err(foreign), DomainError::PipelineNotFound);

    let intruder = crm::Actor::new(outsider.user_id, actor.org_id);
    let not_member = board::board(&db, &intruder, pipeline.id).await;
    assert_eq!(domain_err(not_member), DomainError::NotMember);
}

#[tokio::test]
async fn outsiders_cannot_place_deals_in_another_organization() {
    let db = setup_db().await;
    let owner = owner_with_org(&db, "max@example.com").await;
    let pipeline = default_pipeline(&db, &owner).await;
    let proposal = stage(&pipeline, "Proposal");
    let stranger = create_user(&db, "ned@example.com").await;
    let intruder = crm::Actor::new(stranger, owner.org_id);

    let placed = deals::create(
        &db,
        &intruder,
        CreateDeal {
            pipeline_id: Some(pipeline.id),
            deal_stage_id: Some(proposal.id),
            ..deal("Squatter", "10")
        },
    )
    .await;
    assert_eq!(domain_err(placed), DomainError::NotMember);

    let staged_only = deals::create(
        &db,
        &intruder,
        CreateDeal {
            deal_stage_id: Some(proposal.id),
            ..deal("Squatter", "10")
        },
    )
    .await;
    assert_eq!(domain_err(staged_only), DomainError::NotMember);

    pipelines::delete(&db, &owner, pipeline.id).await.unwrap();
}

#[tokio::test]
async fn deleting_a_stage_moves_its_deals_out_with_history() {
    let db = setup_db().await;
    let actor = owner_with_org(&db, "ola@example.com").await;
    let pipeline = default_pipeline(&db, &actor).await;
    let won = stage(&pipeline, "Closed Won");

    let created = deals::create(
        &db,
        &actor,
        CreateDeal {
            pipeline_id: Some(pipeline.id),
            deal_stage_id: Some(won.id),
            ..deal("Closed", "700")
        },
    )
    .await
    .unwrap();
    assert_eq!(created.is_won, Some(true));

    pipelines::delete_stage(&db, &actor, won.id).await.unwrap();

    let after = deals::get(&db, &actor, created.id).await.unwrap();
    assert_eq!(after.deal_stage_id, None);
    assert_eq!(after.stage, None);
    assert_eq!(after.is_won, None);
    assert_eq!(after.pipeline_id, Some(pipeline.id));

    let history = deals::stage_history(&db, &actor, created.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].from_deal_stage_id, Some(won.id));
    assert_eq!(history[0].from_stage_name.as_deref(), Some("Closed Won"));
    assert_eq!(history[0].to_deal_stage_id, None);
}
