//! Typed calls to the backend HTTP API.
//!
//! Errors are returned as display strings: the backend puts a readable
//! message in the body of every failed response.

use common::jobs::JobStatus;
use common::model::data::{DataRow, DataSession};
use common::model::field::{Field, FieldDraft, FieldUpdate};
use common::model::template::{Template, TemplateSummary};
use common::requests::{
    CsvImportResult, OpenSessionRequest, RenameSessionRequest, StartMergeRequest, StartMergeResponse,
    UploadTemplateRequest,
};
use gloo_net::http::{Request, Response};
use serde::de::DeserializeOwned;
use web_sys::{File, FormData};

async fn error_text(resp: Response) -> String {
    let status = resp.status();
    match resp.text().await {
        Ok(text) if !text.trim().is_empty() => text,
        _ => format!("Request failed with status {}", status),
    }
}

async fn read_json<T: DeserializeOwned>(resp: Result<Response, gloo_net::Error>) -> Result<T, String> {
    let resp = resp.map_err(|e| e.to_string())?;
    if !resp.ok() {
        return Err(error_text(resp).await);
    }
    resp.json::<T>().await.map_err(|e| e.to_string())
}

async fn read_empty(resp: Result<Response, gloo_net::Error>) -> Result<(), String> {
    let resp = resp.map_err(|e| e.to_string())?;
    if resp.ok() {
        Ok(())
    } else {
        Err(error_text(resp).await)
    }
}

fn form_with_file(file: &File) -> Result<FormData, String> {
    let form = FormData::new().map_err(|_| "Could not build the upload form".to_string())?;
    form.append_with_blob_and_filename("file", file, &file.name())
        .map_err(|_| "Could not attach the file".to_string())?;
    Ok(form)
}

pub async fn list_templates() -> Result<Vec<TemplateSummary>, String> {
    read_json(Request::get("/api/templates").send().await).await
}

pub async fn get_template(template_id: &str) -> Result<Template, String> {
    read_json(Request::get(&format!("/api/templates/{}", template_id)).send().await).await
}

/// Sends the template metadata first and the `.docx` second.
pub async fn upload_template(name: &str, file: &File) -> Result<Template, String> {
    let meta = serde_json::to_string(&UploadTemplateRequest { name: name.to_string() }).map_err(|e| e.to_string())?;
    let form = FormData::new().map_err(|_| "Could not build the upload form".to_string())?;
    form.append_with_str("json", &meta)
        .map_err(|_| "Could not attach the template name".to_string())?;
    form.append_with_blob_and_filename("file", file, &file.name())
        .map_err(|_| "Could not attach the file".to_string())?;

    let request = Request::post("/api/templates/upload").body(form).map_err(|e| e.to_string())?;
    read_json(request.send().await).await
}

pub async fn delete_template(template_id: &str) -> Result<(), String> {
    read_empty(Request::delete(&format!("/api/templates/{}", template_id)).send().await).await
}

pub async fn add_field(template_id: &str, draft: &FieldDraft) -> Result<Field, String> {
    let request = Request::post(&format!("/api/templates/{}/fields", template_id))
        .json(draft)
        .map_err(|e| e.to_string())?;
    read_json(request.send().await).await
}

pub async fn update_field(template_id: &str, field_id: &str, changes: &FieldUpdate) -> Result<Field, String> {
    let request = Request::put(&format!("/api/templates/{}/fields/{}", template_id, field_id))
        .json(changes)
        .map_err(|e| e.to_string())?;
    read_json(request.send().await).await
}

pub async fn remove_field(template_id: &str, field_id: &str) -> Result<(), String> {
    read_empty(
        Request::delete(&format!("/api/templates/{}/fields/{}", template_id, field_id))
            .send()
            .await,
    )
    .await
}

pub async fn open_session(template_id: &str) -> Result<DataSession, String> {
    let request = Request::post("/api/sessions/open")
        .json(&OpenSessionRequest {
            template_id: template_id.to_string(),
        })
        .map_err(|e| e.to_string())?;
    read_json(request.send().await).await
}

pub async fn rename_session(session_id: &str, name: &str) -> Result<DataSession, String> {
    let request = Request::put(&format!("/api/sessions/{}/name", session_id))
        .json(&RenameSessionRequest { name: name.to_string() })
        .map_err(|e| e.to_string())?;
    read_json(request.send().await).await
}

pub async fn list_rows(session_id: &str) -> Result<Vec<DataRow>, String> {
    read_json(Request::get(&format!("/api/sessions/{}/rows", session_id)).send().await).await
}

pub async fn replace_rows(session_id: &str, rows: &[DataRow]) -> Result<(), String> {
    let request = Request::put(&format!("/api/sessions/{}/rows", session_id))
        .json(&rows)
        .map_err(|e| e.to_string())?;
    read_empty(request.send().await).await
}

pub async fn import_csv(session_id: &str, file: &File) -> Result<CsvImportResult, String> {
    let request = Request::post(&format!("/api/data_sources/csv/import/{}", session_id))
        .body(form_with_file(file)?)
        .map_err(|e| e.to_string())?;
    read_json(request.send().await).await
}

pub async fn start_merge(template_id: &str, session_id: &str) -> Result<String, String> {
    let request = Request::post("/api/merge/start")
        .json(&StartMergeRequest {
            template_id: template_id.to_string(),
            session_id: session_id.to_string(),
        })
        .map_err(|e| e.to_string())?;
    let started: StartMergeResponse = read_json(request.send().await).await?;
    Ok(started.job_id)
}

pub async fn merge_status(job_id: &str) -> Result<JobStatus, String> {
    read_json(Request::get(&format!("/api/merge/status/{}", job_id)).send().await).await
}

pub fn merge_download_url(job_id: &str) -> String {
    format!("/api/merge/download/{}", job_id)
}
