use crate::config::AppConfig;
use crate::db;
use actix_web::{web, HttpResponse, Responder};
use common::model::template::Template;

/// Handler for `POST /api/templates/save`.
///
/// A new template must carry a valid `.docx`; every field must match the
/// stored document's text at its offsets.
pub async fn process(config: web::Data<AppConfig>, payload: web::Json<Template>) -> impl Responder {
    let result = db::open(&config.database)
        .and_then(|mut conn| db::save_template(&mut conn, &payload, config.max_document_bytes));
    match result {
        Ok(()) => HttpResponse::Ok().body("Template saved"),
        Err(e) => e.to_response(),
    }
}

#[cfg(test)]
mod tests {
    use crate::config::AppConfig;
    use crate::db;
    use crate::services::templates::configure_routes;
    use actix_web::http::StatusCode;
    use actix_web::test::{call_service, init_service, TestRequest};
    use actix_web::{web, App};
    use common::model::template::Template;
    use common::testing::{docx_with_body, paragraph};

    #[actix_web::test]
    async fn save_rejects_documents_that_are_not_docx() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::for_tests(dir.path());
        let app = init_service(
            App::new()
                .app_data(web::Data::new(config.clone()))
                .service(configure_routes()),
        )
        .await;

        let junk = Template::new("Junk", b"definitely not a zip".to_vec());
        let req = TestRequest::post().uri("/api/templates/save").set_json(&junk).to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let valid = Template::new("Letter", docx_with_body(&paragraph(&["Hello ", "NAME"])));
        let req = TestRequest::post().uri("/api/templates/save").set_json(&valid).to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::OK);

        let conn = db::open(&config.database).unwrap();
        let stored: Vec<String> = db::list_templates(&conn).unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(stored, vec!["Letter".to_string()]);
    }
}
