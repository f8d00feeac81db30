//! Integration tests for the metadata repositories.
//!
//! Exercises the run lifecycle against a real database:
//! - Seeding a job with schema, destination and mappings
//! - Started -> Finished / Started -> Failed transitions
//! - Terminal runs are never overwritten
//! - Listing order and paging
//!
//! Needs `DATABASE_URL`; run with `cargo test -- --ignored`.

use serde_json::json;
use sqlx::PgPool;
use synth_core::mapping::FieldMappings;
use synth_core::schema::SchemaField;
use synth_db::models::connection::CreateDatabaseConnection;
use synth_db::models::job::CreateJob;
use synth_db::models::job_mapping::CreateJobMapping;
use synth_db::models::job_run::JobRunListQuery;
use synth_db::models::schema::CreateSchema;
use synth_db::models::status::JobRunStatus;
use synth_db::repositories::{ConnectionRepo, JobMappingRepo, JobRepo, JobRunRepo, SchemaRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn field(name: &str) -> SchemaField {
    SchemaField {
        id: format!("f_{name}"),
        name: name.to_string(),
        field_type: "string".to_string(),
        required: true,
        description: String::new(),
    }
}

async fn seed_job(pool: &PgPool) -> i64 {
    let schema = SchemaRepo::create(
        pool,
        &CreateSchema {
            name: "users".to_string(),
            description: None,
            version: Some("1".to_string()),
            fields: vec![field("id"), field("name")],
        },
    )
    .await
    .unwrap();

    let destination = ConnectionRepo::create(
        pool,
        &CreateDatabaseConnection {
            name: "warehouse".to_string(),
            conn_type: "postgres".to_string(),
            details: "postgres://localhost/warehouse".to_string(),
        },
    )
    .await
    .unwrap();

    let job = JobRepo::create(
        pool,
        &CreateJob {
            name: "users job".to_string(),
            status_id: None,
            schema_id: schema.id,
            destination_id: Some(destination.id),
            simulation_rules: Some(json!({"generationFrequency": 25})),
            output_settings: Some(json!({"kafkaTopic": "users"})),
        },
    )
    .await
    .unwrap();

    job.id
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn job_loads_with_schema_and_mappings(pool: PgPool) {
    let job_id = seed_job(&pool).await;

    let job = JobRepo::find_by_id(&pool, job_id).await.unwrap().unwrap();
    let schema = SchemaRepo::find_by_id(&pool, job.schema_id)
        .await
        .unwrap()
        .unwrap();
    let names: Vec<_> = schema.definition().field_names().map(str::to_owned).collect();
    assert_eq!(names, ["id", "name"]);

    let destination = ConnectionRepo::find_by_id(&pool, job.destination_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(destination.status, "Disconnected");

    let mappings: FieldMappings = [("id".to_string(), "user_id".to_string())].into();
    JobMappingRepo::create(
        &pool,
        &CreateJobMapping {
            job_id,
            table_name: "users".to_string(),
            field_mappings: mappings.clone(),
        },
    )
    .await
    .unwrap();

    let listed = JobMappingRepo::list_by_job(&pool, job_id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].field_mappings.0, mappings);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn duplicate_table_mapping_is_rejected(pool: PgPool) {
    let job_id = seed_job(&pool).await;
    let input = CreateJobMapping {
        job_id,
        table_name: "users".to_string(),
        field_mappings: FieldMappings::new(),
    };

    JobMappingRepo::create(&pool, &input).await.unwrap();
    let err = JobMappingRepo::create(&pool, &input).await.unwrap_err();

    let db_err = err.as_database_error().expect("database error");
    assert_eq!(db_err.constraint(), Some("uq_job_mappings_job_table"));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn missing_job_is_none(pool: PgPool) {
    assert!(JobRepo::find_by_id(&pool, 999_999).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Run lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn started_run_finishes_once(pool: PgPool) {
    let job_id = seed_job(&pool).await;
    let run = JobRunRepo::start(&pool, job_id).await.unwrap();
    assert_eq!(run.status(), Some(JobRunStatus::Started));
    assert!(run.finished_at.is_none());
    assert_eq!(run.records_generated, 0);

    let finished = JobRunRepo::finish(&pool, run.id, 25, Some(12))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(finished.status(), Some(JobRunStatus::Finished));
    assert_eq!(finished.records_generated, 25);
    assert_eq!(finished.avg_latency_ms, Some(12));
    assert!(finished.finished_at.is_some());

    // A terminal run cannot be failed afterwards.
    let again = JobRunRepo::fail(&pool, run.id, 0, "late failure").await.unwrap();
    assert!(again.is_none());

    let stored = JobRunRepo::find_by_id(&pool, run.id).await.unwrap().unwrap();
    assert_eq!(stored.status(), Some(JobRunStatus::Finished));
    assert!(stored.error_message.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn failed_run_keeps_message_and_partial_count(pool: PgPool) {
    let job_id = seed_job(&pool).await;
    let run = JobRunRepo::start(&pool, job_id).await.unwrap();

    let failed = JobRunRepo::fail(&pool, run.id, 20, "generator timed out")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(failed.status(), Some(JobRunStatus::Failed));
    assert_eq!(failed.records_generated, 20);
    assert_eq!(failed.error_message.as_deref(), Some("generator timed out"));
    assert!(failed.finished_at.is_some());

    let again = JobRunRepo::finish(&pool, run.id, 25, None).await.unwrap();
    assert!(again.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn runs_list_newest_first_with_paging(pool: PgPool) {
    let job_id = seed_job(&pool).await;
    let first = JobRunRepo::start(&pool, job_id).await.unwrap();
    let second = JobRunRepo::start(&pool, job_id).await.unwrap();
    let third = JobRunRepo::start(&pool, job_id).await.unwrap();

    let all = JobRunRepo::list_by_job(&pool, job_id, &JobRunListQuery::default())
        .await
        .unwrap();
    let ids: Vec<_> = all.iter().map(|r| r.id).collect();
    assert_eq!(ids, [third.id, second.id, first.id]);

    let page = JobRunRepo::list_by_job(
        &pool,
        job_id,
        &JobRunListQuery {
            limit: Some(1),
            offset: Some(1),
        },
    )
    .await
    .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, second.id);
}
