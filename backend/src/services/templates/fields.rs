//! Field-level edits of a stored template's schema.
//!
//! Each edit is one IMMEDIATE transaction: it loads the latest stored schema,
//! applies the change through the `FieldStore` (which re-checks the
//! non-overlap invariant) and writes the schema back. Concurrent edits of the
//! same template are serialized by SQLite, so none of them is lost and a
//! stale schema held by a client can never be committed.

use crate::config::AppConfig;
use crate::db::{self, StorageError};
use actix_web::{web, HttpResponse, Responder};
use common::model::field::{Field, FieldDraft, FieldUpdate};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

/// Handler for `POST /api/templates/{template_id}/fields`.
pub async fn add(
    config: web::Data<AppConfig>,
    template_id: web::Path<String>,
    draft: web::Json<FieldDraft>,
) -> impl Responder {
    match db::open(&config.database).and_then(|mut conn| add_field(&mut conn, &template_id, draft.into_inner())) {
        Ok(field) => HttpResponse::Ok().json(field),
        Err(e) => e.to_response(),
    }
}

/// Handler for `PUT /api/templates/{template_id}/fields/{field_id}`.
pub async fn update(
    config: web::Data<AppConfig>,
    path: web::Path<(String, String)>,
    changes: web::Json<FieldUpdate>,
) -> impl Responder {
    let (template_id, field_id) = path.into_inner();
    let result = db::open(&config.database)
        .and_then(|mut conn| update_field(&mut conn, &template_id, &field_id, changes.into_inner()));
    match result {
        Ok(field) => HttpResponse::Ok().json(field),
        Err(e) => e.to_response(),
    }
}

/// Handler for `DELETE /api/templates/{template_id}/fields/{field_id}`.
pub async fn remove(config: web::Data<AppConfig>, path: web::Path<(String, String)>) -> impl Responder {
    let (template_id, field_id) = path.into_inner();
    match db::open(&config.database).and_then(|mut conn| remove_field(&mut conn, &template_id, &field_id)) {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => e.to_response(),
    }
}

pub fn add_field(conn: &mut Connection, template_id: &str, draft: FieldDraft) -> Result<Field, StorageError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut template = db::load_template(&tx, template_id)?;
    let flattened = db::document_text(&template.original_document)?;
    db::check_anchor(&flattened, &draft.placeholder, draft.start_position, draft.end_position)?;
    let field = template.schema.add(draft)?.clone();
    db::update_schema(&tx, template_id, &template.schema)?;
    tx.commit()?;
    info!(
        "Added field '{}' [{}, {}) to template {}",
        field.name, field.start_position, field.end_position, template_id
    );
    Ok(field)
}

pub fn update_field(
    conn: &mut Connection,
    template_id: &str,
    field_id: &str,
    changes: FieldUpdate,
) -> Result<Field, StorageError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut template = db::load_template(&tx, template_id)?;
    let field = template.schema.update(field_id, changes)?.clone();
    db::update_schema(&tx, template_id, &template.schema)?;
    tx.commit()?;
    Ok(field)
}

pub fn remove_field(conn: &mut Connection, template_id: &str, field_id: &str) -> Result<(), StorageError> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut template = db::load_template(&tx, template_id)?;
    let removed = template.schema.remove(field_id)?;
    db::update_schema(&tx, template_id, &template.schema)?;
    tx.commit()?;
    info!("Removed field '{}' from template {}", removed.name, template_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{memory_db, stored_template};
    use crate::services::templates::configure_routes;
    use actix_web::http::StatusCode;
    use actix_web::test::{call_and_read_body_json, call_service, init_service, TestRequest};
    use actix_web::App;
    use common::field_store::FieldStoreError;
    use common::model::field::FieldType;
    use common::model::template::{Template, TemplateSummary};
    use common::testing::{docx_with_body, paragraph};
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Barrier};
    use std::thread;

    // Flattened text of the stored template: "Dear NAME_HERE, you owe 0.00"
    fn draft(name: &str, placeholder: &str, start: usize) -> FieldDraft {
        FieldDraft {
            name: name.into(),
            placeholder: placeholder.into(),
            field_type: FieldType::Text,
            start_position: start,
            end_position: start + placeholder.len(),
        }
    }

    #[test]
    fn add_checks_anchor_and_overlap_against_stored_schema() {
        let mut conn = memory_db();
        let template = stored_template(&mut conn);

        let name = add_field(&mut conn, &template.id, draft("Name", "NAME_HERE", 5)).unwrap();
        add_field(&mut conn, &template.id, draft("Amount", "0.00", 24)).unwrap();

        let err = add_field(&mut conn, &template.id, draft("Wrong", "NAME", 0)).unwrap_err();
        assert!(matches!(err, StorageError::Invalid(_)));

        let err = add_field(&mut conn, &template.id, draft("Again", "HERE", 10)).unwrap_err();
        assert!(matches!(err, StorageError::Schema(FieldStoreError::Overlap { .. })));
        assert_eq!(err.to_response().status(), StatusCode::CONFLICT);

        let stored = db::load_template(&conn, &template.id).unwrap();
        assert_eq!(stored.schema.len(), 2);
        assert_eq!(stored.schema.first().map(|f| f.id.as_str()), Some(name.id.as_str()));
    }

    #[test]
    fn update_and_remove_persist() {
        let mut conn = memory_db();
        let template = stored_template(&mut conn);
        let field = add_field(&mut conn, &template.id, draft("Amount", "0.00", 24)).unwrap();

        let updated = update_field(
            &mut conn,
            &template.id,
            &field.id,
            FieldUpdate {
                name: Some("Total".into()),
                field_type: Some(FieldType::Number),
            },
        )
        .unwrap();
        assert_eq!(updated.name, "Total");
        assert_eq!(db::load_template(&conn, &template.id).unwrap().schema.fields()[0].field_type, FieldType::Number);

        remove_field(&mut conn, &template.id, &field.id).unwrap();
        assert!(db::load_template(&conn, &template.id).unwrap().schema.is_empty());
        let err = remove_field(&mut conn, &template.id, &field.id).unwrap_err();
        assert_eq!(err.to_response().status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn routes_add_and_list_fields() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::for_tests(dir.path());
        let template = stored_template(&mut db::open(&config.database).unwrap());

        let app = init_service(
            App::new()
                .app_data(web::Data::new(config.clone()))
                .service(configure_routes()),
        )
        .await;

        let req = TestRequest::post()
            .uri(&format!("/api/templates/{}/fields", template.id))
            .set_json(draft("Name", "NAME_HERE", 5))
            .to_request();
        let field: Field = call_and_read_body_json(&app, req).await;
        assert_eq!(field.placeholder, "NAME_HERE");

        let req = TestRequest::post()
            .uri(&format!("/api/templates/{}/fields", template.id))
            .set_json(draft("Overlap", "HERE", 10))
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = TestRequest::get().uri("/api/templates").to_request();
        let listed: Vec<TemplateSummary> = call_and_read_body_json(&app, req).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].field_count, 1);

        let req = TestRequest::delete()
            .uri(&format!("/api/templates/{}", template.id))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = TestRequest::get()
            .uri(&format!("/api/templates/{}", template.id))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn concurrent_adds_on_one_template_are_all_kept() {
        const PER_THREAD: usize = 40;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.sqlite");

        let text = "x".repeat(2 * PER_THREAD);
        let template = Template::new("Grid", docx_with_body(&paragraph(&[text.as_str()])));
        db::save_template(&mut db::open(&path).unwrap(), &template, usize::MAX).unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let workers: Vec<_> = (0..2)
            .map(|parity| {
                let barrier = Arc::clone(&barrier);
                let path = path.clone();
                let template_id = template.id.clone();
                thread::spawn(move || {
                    let mut conn = db::open(&path).unwrap();
                    barrier.wait();
                    (0..PER_THREAD)
                        .filter(|i| {
                            let start = 2 * i + parity;
                            add_field(&mut conn, &template_id, draft(&format!("F{}", start), "x", start)).is_ok()
                        })
                        .count()
                })
            })
            .collect();
        let acknowledged: usize = workers.into_iter().map(|w| w.join().unwrap()).sum();

        assert_eq!(acknowledged, 2 * PER_THREAD);
        let stored = db::load_template(&db::open(&path).unwrap(), &template.id).unwrap();
        assert_eq!(stored.schema.len(), 2 * PER_THREAD);
    }
}
