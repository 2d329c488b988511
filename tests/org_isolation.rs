use anyhow::Result;
use chrono::{Duration, Utc};
use crm::service::board;
use crm::service::deals::{self, CreateDeal};
use crm::service::pipelines::{self, UpdateDealStage};
use crm::service::tasks::{self, TaskInput};
use crm::{Actor, CrmError, DomainError, PaginationParams, reminders};
use crm_tests::{connect_with_retry, owner_with_org, postgres_image, postgres_url};
use migration::{Migrator, MigratorTrait};
use testcontainers::clients::Cli;

fn domain(result: Result<impl std::fmt::Debug, CrmError>) -> DomainError {
    match result {
        Err(err) => err.domain().cloned().unwrap_or_else(|| panic!("not a domain error: {err}")),
        Ok(value) => panic!("expected an error, got {value:?}"),
    }
}

async fn first_pipeline(db: &platform_db::DbPool, actor: &Actor) -> Result<pipelines::PipelineDto> {
    Ok(pipelines::list(db, actor).await?.remove(0))
}

#[tokio::test]
#[ignore = "needs a docker daemon"]
async fn organizations_do_not_see_each_other() -> Result<()> {
    let docker = Cli::default();
    let container = docker.run(postgres_image());
    let url = postgres_url(container.get_host_port_ipv4(5432));
    let db = connect_with_retry(&url).await?;
    Migrator::up(&db, None).await?;

    let alice = owner_with_org(&db, "alice@example.com", "Alice Co").await?;
    let bob = owner_with_org(&db, "bob@example.com", "Bob Co").await?;
    let alice_pipeline = first_pipeline(&db, &alice).await?;
    let bob_pipeline = first_pipeline(&db, &bob).await?;
    let proposal = alice_pipeline
        .deal_stages
        .iter()
        .find(|s| s.name == "Proposal")
        .map(|s| s.id)
        .expect("seeded stage");

    let deal = deals::create(
        &db,
        &alice,
        CreateDeal {
            name: Some("Umbrella".into()),
            value: Some("9000".into()),
            pipeline_id: Some(alice_pipeline.id),
            deal_stage_id: Some(proposal),
            ..CreateDeal::default()
        },
    )
    .await?;

    let bob_view = deals::list_paged(&db, &bob, PaginationParams::default(), None).await?;
    assert_eq!(bob_view.total_count, 0);
    assert_eq!(
        domain(deals::get(&db, &bob, deal.id).await),
        DomainError::DealNotFound
    );

    // Bob's own stage cannot be used on Alice's deal, nor can Alice's stage be edited by Bob.
    let bob_stage = bob_pipeline.deal_stages[0].id;
    assert_eq!(
        domain(deals::change_stage(&db, &alice, deal.id, bob_stage).await),
        DomainError::DealStageNotFound
    );
    let rename = UpdateDealStage {
        name: Some("Hijacked".into()),
        ..UpdateDealStage::default()
    };
    assert_eq!(
        domain(pipelines::update_stage(&db, &bob, proposal, rename).await),
        DomainError::DealStageNotFound
    );
    assert_eq!(
        domain(pipelines::delete_stage(&db, &bob, proposal).await),
        DomainError::DealStageNotFound
    );
    let untouched = pipelines::get_stage(&db, &alice, proposal).await?;
    assert_eq!(untouched.name, "Proposal");

    // Bob pointing his header at Alice's organization is not enough.
    let intruder = Actor::new(bob.user_id, alice.org_id);
    assert_eq!(
        domain(board::board(&db, &intruder, alice_pipeline.id).await),
        DomainError::NotMember
    );
    assert_eq!(
        domain(board::board(&db, &bob, alice_pipeline.id).await),
        DomainError::PipelineNotFound
    );

    let history = deals::stage_history(&db, &alice, deal.id).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].to_deal_stage_id, Some(proposal));
    assert_eq!(history[0].from_deal_stage_id, None);
    Ok(())
}

#[tokio::test]
#[ignore = "needs a docker daemon"]
async fn reminders_are_claimed_once_on_postgres() -> Result<()> {
    let docker = Cli::default();
    let container = docker.run(postgres_image());
    let url = postgres_url(container.get_host_port_ipv4(5432));
    let db = connect_with_retry(&url).await?;
    Migrator::up(&db, None).await?;

    let alice = owner_with_org(&db, "alice@example.com", "Alice Co").await?;
    let now = Utc::now().fixed_offset();
    for title in ["Call back", "Send contract"] {
        tasks::create(
            &db,
            &alice,
            TaskInput {
                title: Some(title.into()),
                reminder_at: Some(now - Duration::minutes(5)),
                ..TaskInput::default()
            },
        )
        .await?;
    }
    let done = tasks::create(
        &db,
        &alice,
        TaskInput {
            title: Some("Already done".into()),
            reminder_at: Some(now - Duration::minutes(5)),
            ..TaskInput::default()
        },
    )
    .await?;
    tasks::update_status(&db, &alice, done.id, "completed").await?;

    assert_eq!(reminders::run_reminder_pass(&db, now).await?, 2);
    assert_eq!(reminders::run_reminder_pass(&db, now).await?, 0);
    Ok(())
}
