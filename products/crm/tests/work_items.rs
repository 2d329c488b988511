mod common;

use chrono::{Duration, Utc};
use common::{default_pipeline, domain_err, owner_with_org, setup_db, stage};
use crm::reminders::run_reminder_pass;
use crm::service::activities::{self, ActivityInput};
use crm::service::leads::{self, ConvertLead, LeadInput};
use crm::service::sequences::{self, EnrollInput, SequenceInput, StepInput};
use crm::service::tasks::{self, TaskInput};
use crm::service::{contacts, deals};
use crm::{DomainError, PaginationParams};

fn lead(name: &str, email: &str) -> LeadInput {
    LeadInput {
        name: Some(name.into()),
        email: Some(email.into()),
        ..LeadInput::default()
    }
}

#[tokio::test]
async fn task_status_drives_completed_at() {
    let db = setup_db().await;
    let actor = owner_with_org(&db, "ada@example.com").await;

    let task = tasks::create(
        &db,
        &actor,
        TaskInput {
            title: Some("Call back".into()),
            priority: Some("high".into()),
            ..TaskInput::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(task.status, "todo");
    assert_eq!(task.priority, "high");
    assert_eq!(task.completed_at, None);

    let done = tasks::update_status(&db, &actor, task.id, "done").await.unwrap();
    assert_eq!(done.status, "completed");
    assert!(done.completed_at.is_some());

    let reopened = tasks::update_status(&db, &actor, task.id, "in-progress").await.unwrap();
    assert_eq!(reopened.status, "in_progress");
    assert_eq!(reopened.completed_at, None);

    let bad = tasks::update_status(&db, &actor, task.id, "someday").await;
    assert_eq!(domain_err(bad), DomainError::TaskInvalidStatus);
    let untitled = tasks::create(&db, &actor, TaskInput::default()).await;
    assert_eq!(domain_err(untitled), DomainError::TaskTitleRequired);
}

#[tokio::test]
async fn reminder_pass_claims_each_due_task_once() {
    let db = setup_db().await;
    let actor = owner_with_org(&db, "bo@example.com").await;
    let past = (Utc::now() - Duration::minutes(5)).fixed_offset();
    let future = (Utc::now() + Duration::hours(2)).fixed_offset();

    let due = tasks::create(
        &db,
        &actor,
        TaskInput {
            title: Some("Due".into()),
            reminder_at: Some(past),
            ..TaskInput::default()
        },
    )
    .await
    .unwrap();
    tasks::create(
        &db,
        &actor,
        TaskInput {
            title: Some("Later".into()),
            reminder_at: Some(future),
            ..TaskInput::default()
        },
    )
    .await
    .unwrap();
    tasks::create(
        &db,
        &actor,
        TaskInput {
            title: Some("Finished".into()),
            reminder_at: Some(past),
            status: Some("completed".into()),
            ..TaskInput::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(run_reminder_pass(&db, Utc::now().into()).await.unwrap(), 1);
    assert_eq!(run_reminder_pass(&db, Utc::now().into()).await.unwrap(), 0);
    let reminded = tasks::get(&db, &actor, due.id).await.unwrap();
    assert!(reminded.reminder_sent_at.is_some());

    let rearmed = tasks::update(
        &db,
        &actor,
        due.id,
        TaskInput {
            reminder_at: Some(past),
            ..TaskInput::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(rearmed.reminder_sent_at, None);
    assert_eq!(run_reminder_pass(&db, Utc::now().into()).await.unwrap(), 1);
}

#[tokio::test]
async fn converting_a_lead_creates_contact_and_deal_once() {
    let db = setup_db().await;
    let actor = owner_with_org(&db, "cal@example.com").await;
    let pipeline = default_pipeline(&db, &actor).await;
    let qualification = stage(&pipeline, "Qualification");

    let created = leads::create(&db, &actor, lead("Dana Scully", "dana@fbi.gov"))
        .await
        .unwrap();
    assert_eq!(created.status, "New");

    let converted = leads::convert(
        &db,
        &actor,
        created.id,
        ConvertLead {
            create_deal: true,
            deal_value: Some("2500".into()),
            pipeline_id: Some(pipeline.id),
            deal_stage_id: Some(qualification.id),
            ..ConvertLead::default()
        },
    )
    .await
    .unwrap();
    assert!(converted.lead.is_converted);
    assert_eq!(converted.lead.status, "Converted");
    assert_eq!(converted.lead.converted_to_contact_id, Some(converted.contact_id));

    let contact = contacts::get(&db, &actor, converted.contact_id).await.unwrap();
    assert_eq!(contact.email, "dana@fbi.gov");
    let deal = deals::get(&db, &actor, converted.deal_id.unwrap()).await.unwrap();
    assert_eq!(deal.name, "Dana Scully");
    assert_eq!(deal.deal_stage_id, Some(qualification.id));
    assert_eq!(deal.contact_id, Some(converted.contact_id));

    let again = leads::convert(&db, &actor, created.id, ConvertLead::default()).await;
    assert_eq!(domain_err(again), DomainError::LeadAlreadyConverted);
    let edit = leads::update(&db, &actor, created.id, lead("Fox", "fox@fbi.gov")).await;
    assert_eq!(domain_err(edit), DomainError::LeadAlreadyConverted);
}

#[tokio::test]
async fn failed_conversion_leaves_no_contact_behind() {
    let db = setup_db().await;
    let actor = owner_with_org(&db, "cy@example.com").await;
    let outsider = owner_with_org(&db, "dot@example.com").await;
    let foreign = default_pipeline(&db, &outsider).await;
    let created = leads::create(&db, &actor, lead("Walter Skinner", "walter@fbi.gov"))
        .await
        .unwrap();

    let converted = leads::convert(
        &db,
        &actor,
        created.id,
        ConvertLead {
            create_deal: true,
            deal_stage_id: Some(stage(&foreign, "Proposal").id),
            ..ConvertLead::default()
        },
    )
    .await;
    assert_eq!(domain_err(converted), DomainError::DealStageNotFound);

    let contacts = contacts::list_paged(&db, &actor, PaginationParams::default(), None)
        .await
        .unwrap();
    assert_eq!(contacts.total_count, 0);
    let deals = deals::list_paged(&db, &actor, PaginationParams::default(), None)
        .await
        .unwrap();
    assert_eq!(deals.total_count, 0);
    let lead = leads::get(&db, &actor, created.id).await.unwrap();
    assert!(!lead.is_converted);
    assert_eq!(lead.converted_to_contact_id, None);
}

#[tokio::test]
async fn conversion_reuses_a_contact_with_the_same_email() {
    let db = setup_db().await;
    let actor = owner_with_org(&db, "dev@example.com").await;
    let existing = contacts::create(
        &db,
        &actor,
        contacts::ContactInput {
            name: Some("Walter Skinner".into()),
            email: Some("walter@fbi.gov".into()),
            ..contacts::ContactInput::default()
        },
    )
    .await
    .unwrap();
    let created = leads::create(&db, &actor, lead("W. Skinner", "Walter@FBI.gov"))
        .await
        .unwrap();

    let converted = leads::convert(&db, &actor, created.id, ConvertLead::default())
        .await
        .unwrap();
    assert_eq!(converted.contact_id, existing.id);
    assert_eq!(converted.deal_id, None);
}

#[tokio::test]
async fn activities_need_a_visible_link() {
    let db = setup_db().await;
    let actor = owner_with_org(&db, "eli@example.com").await;
    let outsider = owner_with_org(&db, "fin@example.com").await;
    let foreign = leads::create(&db, &outsider, lead("Other", "other@example.com"))
        .await
        .unwrap();

    let unlinked = activities::create(
        &db,
        &actor,
        ActivityInput {
            kind: Some("note".into()),
            ..ActivityInput::default()
        },
    )
    .await;
    assert_eq!(domain_err(unlinked), DomainError::ActivityNoRelatedEntity);

    let cross = activities::create(
        &db,
        &actor,
        ActivityInput {
            kind: Some("call".into()),
            lead_id: Some(foreign.id),
            ..ActivityInput::default()
        },
    )
    .await;
    assert_eq!(domain_err(cross), DomainError::ActivityRelatedEntityNotFound);

    let reserved = activities::create(
        &db,
        &actor,
        ActivityInput {
            kind: Some("stage_change".into()),
            lead_id: Some(foreign.id),
            ..ActivityInput::default()
        },
    )
    .await;
    assert_eq!(domain_err(reserved), DomainError::ActivityInvalidType);
}

#[tokio::test]
async fn enrollments_pause_and_resume_only() {
    let db = setup_db().await;
    let actor = owner_with_org(&db, "gil@example.com").await;
    let sequence = sequences::create(
        &db,
        &actor,
        SequenceInput {
            name: Some("Onboarding".into()),
            ..SequenceInput::default()
        },
    )
    .await
    .unwrap();
    for subject in ["Welcome", "Checking in"] {
        sequences::add_step(
            &db,
            &actor,
            sequence.id,
            StepInput {
                subject: Some(subject.into()),
                body: Some("Hello".into()),
                delay_days: Some(2),
                ..StepInput::default()
            },
        )
        .await
        .unwrap();
    }

    let no_recipient =
        sequences::enroll(&db, &actor, sequence.id, EnrollInput::default()).await;
    assert_eq!(domain_err(no_recipient), DomainError::SequenceRecipientRequired);

    let prospect = leads::create(&db, &actor, lead("Hank", "hank@example.com"))
        .await
        .unwrap();
    let enrollment = sequences::enroll(
        &db,
        &actor,
        sequence.id,
        EnrollInput {
            lead_id: Some(prospect.id),
            ..EnrollInput::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(enrollment.status, "active");
    assert_eq!(enrollment.current_step, 1);
    assert_eq!(enrollment.recipient_email.as_deref(), Some("hank@example.com"));

    let resume_active = sequences::resume(&db, &actor, sequence.id, enrollment.id).await;
    assert!(matches!(
        domain_err(resume_active),
        DomainError::SequenceInvalidTransition { .. }
    ));
    let paused = sequences::pause(&db, &actor, sequence.id, enrollment.id).await.unwrap();
    assert_eq!(paused.status, "paused");
    let resumed = sequences::resume(&db, &actor, sequence.id, enrollment.id).await.unwrap();
    assert_eq!(resumed.status, "active");

    let detail = sequences::get(&db, &actor, sequence.id).await.unwrap();
    let orders: Vec<i32> = detail.steps.iter().map(|s| s.step_order).collect();
    assert_eq!(orders, [1, 2]);
    assert_eq!(detail.sequence.active_enrollment_count, 1);

    let listed = sequences::list(&db, &actor).await.unwrap();
    assert_eq!(listed[0].step_count, 2);
    assert!(listed[0].is_owner);
}

#[tokio::test]
async fn lists_are_paged_and_scoped() {
    let db = setup_db().await;
    let actor = owner_with_org(&db, "ida@example.com").await;
    let outsider = owner_with_org(&db, "jay@example.com").await;
    for n in 0..5 {
        leads::create(&db, &actor, lead(&format!("Lead {n}"), &format!("l{n}@example.com")))
            .await
            .unwrap();
    }
    leads::create(&db, &outsider, lead("Hidden", "hidden@example.com"))
        .await
        .unwrap();

    let page = leads::list_paged(
        &db,
        &actor,
        PaginationParams::new(Some(2), Some(2)),
        &Default::default(),
    )
    .await
    .unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total_count, 5);
    assert_eq!(page.total_pages, 3);
    assert!(page.has_next);
    assert!(page.has_previous);
}
