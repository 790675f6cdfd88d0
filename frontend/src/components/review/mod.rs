//! Review screen: the template's data session, manual row entry, CSV import,
//! document generation and previews of the generated documents.
//!
//! Generation runs in the browser, one row at a time in row order, yielding
//! to the event loop between rows so progress can be painted. The first
//! failing row discards everything produced so far. The same batch can also
//! run on the server as a merge job, polled until it finishes.

use common::generator::{
    bundle_documents, bundle_file_name, document_file_name, generate_row_document, DocumentError, DOCX_MIME,
    ZIP_MIME,
};
use common::jobs::JobStatus;
use common::model::data::{DataRow, DataSession};
use common::model::generated::GeneratedDocument;
use common::model::template::Template;
use common::preview::PreviewDocument;
use common::requests::CsvImportResult;
use gloo_console::{error, log};
use yew::platform::spawn_local;
use yew::prelude::*;

use crate::api;
use crate::app::Screen;
use crate::download::{download_bytes, download_url};
use crate::helpers::{show_toast, yield_to_browser};

mod rows;
mod view;

/// Milliseconds between two status polls of a server job.
const POLL_INTERVAL_MS: u32 = 500;

#[derive(Properties, PartialEq, Clone)]
pub struct ReviewProps {
    pub template_id: String,
    pub on_navigate: Callback<Screen>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Generation {
    Idle,
    Running { completed: usize, total: usize },
}

pub struct ServerJob {
    pub job_id: String,
    pub status: JobStatus,
}

pub enum Msg {
    Loaded {
        template: Template,
        session: DataSession,
        rows: Vec<DataRow>,
    },
    LoadFailed(String),
    SetSessionName(String),
    SaveSessionName,
    SessionRenamed(DataSession),
    ChooseCsv,
    CsvSelected(web_sys::File),
    CsvImported(CsvImportResult),
    RowsLoaded(Vec<DataRow>),
    ClearRows,
    AddRow,
    EditCell {
        row: usize,
        field_id: String,
        value: String,
    },
    DeleteRow(usize),
    /// Stores the edited rows; sent when a cell loses focus.
    SaveRows,
    RowsSaved,
    Generate,
    Progress { completed: usize, total: usize },
    GenerationFinished(Result<Vec<GeneratedDocument>, String>),
    DownloadOne(usize),
    ShowPreview(usize),
    ClosePreview,
    DownloadAll,
    StartServerMerge,
    ServerJobUpdate(ServerJob),
    DownloadServerBundle,
    RequestFailed(String),
}

pub struct ReviewComponent {
    pub template: Option<Template>,
    pub session: Option<DataSession>,
    pub session_name: String,
    pub rows: Vec<DataRow>,
    pub importing: bool,
    pub generation: Generation,
    pub documents: Vec<GeneratedDocument>,
    /// Excerpt per generated document, same order as `documents`.
    pub excerpts: Vec<String>,
    pub preview: Option<(usize, PreviewDocument)>,
    pub rows_dirty: bool,
    pub server_job: Option<ServerJob>,
    pub error: Option<String>,
    pub csv_input_ref: NodeRef,
}

impl ReviewComponent {
    fn ids(&self) -> Option<(String, String)> {
        Some((self.template.as_ref()?.id.clone(), self.session.as_ref()?.id.clone()))
    }

    fn set_documents(&mut self, documents: Vec<GeneratedDocument>) {
        self.excerpts = documents
            .iter()
            .map(|d| rows::document_excerpt(&d.document, rows::EXCERPT_CHARS).unwrap_or_default())
            .collect();
        self.documents = documents;
        self.preview = None;
    }

    fn save_rows(&mut self, ctx: &Context<Self>) {
        let Some((_, session_id)) = self.ids() else {
            return;
        };
        self.rows_dirty = false;
        let rows = self.rows.clone();
        let link = ctx.link().clone();
        spawn_local(async move {
            match api::replace_rows(&session_id, &rows).await {
                Ok(()) => link.send_message(Msg::RowsSaved),
                Err(e) => link.send_message(Msg::RequestFailed(e)),
            }
        });
    }

    fn reload_rows(&self, ctx: &Context<Self>) {
        let Some((_, session_id)) = self.ids() else {
            return;
        };
        let link = ctx.link().clone();
        spawn_local(async move {
            match api::list_rows(&session_id).await {
                Ok(rows) => link.send_message(Msg::RowsLoaded(rows)),
                Err(e) => link.send_message(Msg::RequestFailed(e)),
            }
        });
    }
}

async fn load(template_id: String) -> Result<Msg, String> {
    let template = api::get_template(&template_id).await?;
    let session = api::open_session(&template_id).await?;
    let rows = api::list_rows(&session.id).await?;
    Ok(Msg::Loaded {
        template,
        session,
        rows,
    })
}

/// Generates one document per row; any failure fails the whole batch.
async fn generate_in_browser(template: Template, rows: Vec<DataRow>, link: html::Scope<ReviewComponent>) {
    let total = rows.len();
    let mut documents = Vec::with_capacity(total);
    for (index, row) in rows.iter().enumerate() {
        match generate_row_document(&template, row) {
            Ok(document) => documents.push(document),
            Err(e) => {
                let failure = DocumentError::RowFailed {
                    row: index + 1,
                    source: Box::new(e),
                };
                link.send_message(Msg::GenerationFinished(Err(failure.to_string())));
                return;
            }
        }
        link.send_message(Msg::Progress {
            completed: index + 1,
            total,
        });
        yield_to_browser().await;
    }
    link.send_message(Msg::GenerationFinished(Ok(documents)));
}

async fn run_server_merge(template_id: String, session_id: String, link: html::Scope<ReviewComponent>) {
    let job_id = match api::start_merge(&template_id, &session_id).await {
        Ok(job_id) => job_id,
        Err(e) => {
            link.send_message(Msg::RequestFailed(e));
            return;
        }
    };
    loop {
        match api::merge_status(&job_id).await {
            Ok(status) => {
                let finished = status.is_finished();
                link.send_message(Msg::ServerJobUpdate(ServerJob {
                    job_id: job_id.clone(),
                    status,
                }));
                if finished {
                    return;
                }
            }
            Err(e) => {
                link.send_message(Msg::RequestFailed(e));
                return;
            }
        }
        gloo_timers::future::TimeoutFuture::new(POLL_INTERVAL_MS).await;
    }
}

impl Component for ReviewComponent {
    type Message = Msg;
    type Properties = ReviewProps;

    fn create(ctx: &Context<Self>) -> Self {
        let link = ctx.link().clone();
        let template_id = ctx.props().template_id.clone();
        spawn_local(async move {
            match load(template_id).await {
                Ok(msg) => link.send_message(msg),
                Err(e) => link.send_message(Msg::LoadFailed(e)),
            }
        });
        Self {
            template: None,
            session: None,
            session_name: String::new(),
            rows: Vec::new(),
            importing: false,
            generation: Generation::Idle,
            documents: Vec::new(),
            excerpts: Vec::new(),
            preview: None,
            rows_dirty: false,
            server_job: None,
            error: None,
            csv_input_ref: NodeRef::default(),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Loaded {
                template,
                session,
                rows,
            } => {
                self.session_name = session.name.clone();
                self.template = Some(template);
                self.session = Some(session);
                self.rows = rows;
                true
            }
            Msg::LoadFailed(e) => {
                self.error = Some(format!("Could not load the data session: {}", e));
                true
            }
            Msg::SetSessionName(name) => {
                self.session_name = name;
                false
            }
            Msg::SaveSessionName => {
                let Some((_, session_id)) = self.ids() else {
                    return false;
                };
                let name = self.session_name.trim().to_string();
                if name.is_empty() || self.session.as_ref().is_some_and(|s| s.name == name) {
                    return false;
                }
                let link = ctx.link().clone();
                spawn_local(async move {
                    match api::rename_session(&session_id, &name).await {
                        Ok(session) => link.send_message(Msg::SessionRenamed(session)),
                        Err(e) => link.send_message(Msg::RequestFailed(e)),
                    }
                });
                false
            }
            Msg::SessionRenamed(session) => {
                self.session_name = session.name.clone();
                self.session = Some(session);
                show_toast("Session renamed.");
                true
            }
            Msg::ChooseCsv => {
                if let Some(input) = self.csv_input_ref.cast::<web_sys::HtmlInputElement>() {
                    input.click();
                }
                false
            }
            Msg::CsvSelected(file) => {
                let Some((_, session_id)) = self.ids() else {
                    return false;
                };
                if !file.name().to_lowercase().ends_with(".csv") {
                    show_toast("Please choose a .csv file.");
                    return false;
                }
                self.importing = true;
                let link = ctx.link().clone();
                spawn_local(async move {
                    match api::import_csv(&session_id, &file).await {
                        Ok(result) => link.send_message(Msg::CsvImported(result)),
                        Err(e) => link.send_message(Msg::RequestFailed(e)),
                    }
                });
                true
            }
            Msg::CsvImported(result) => {
                self.importing = false;
                log!(format!(
                    "Imported {} row(s); matched {:?}",
                    result.imported, result.matched_fields
                ));
                if result.matched_fields.is_empty() {
                    show_toast(&format!(
                        "Imported {} row(s), but no column matched a field name.",
                        result.imported
                    ));
                } else {
                    show_toast(&format!(
                        "Imported {} row(s). Matched: {}.",
                        result.imported,
                        result.matched_fields.join(", ")
                    ));
                }
                self.reload_rows(ctx);
                true
            }
            Msg::RowsLoaded(rows) => {
                self.rows = rows;
                self.rows_dirty = false;
                self.set_documents(Vec::new());
                true
            }
            Msg::ClearRows => {
                let Some((_, session_id)) = self.ids() else {
                    return false;
                };
                let link = ctx.link().clone();
                spawn_local(async move {
                    match api::replace_rows(&session_id, &[]).await {
                        Ok(()) => link.send_message(Msg::RowsLoaded(Vec::new())),
                        Err(e) => link.send_message(Msg::RequestFailed(e)),
                    }
                });
                false
            }
            Msg::AddRow => {
                let Some((template_id, session_id)) = self.ids() else {
                    return false;
                };
                let field_ids: Vec<&str> = self
                    .template
                    .as_ref()
                    .map(|t| t.schema.fields().iter().map(|f| f.id.as_str()).collect())
                    .unwrap_or_default();
                let row = rows::blank_row(&template_id, &session_id, &field_ids);
                self.rows.push(row);
                self.set_documents(Vec::new());
                self.save_rows(ctx);
                true
            }
            Msg::EditCell { row, field_id, value } => {
                if rows::set_cell(&mut self.rows, row, &field_id, value) {
                    self.rows_dirty = true;
                }
                false
            }
            Msg::DeleteRow(index) => {
                if rows::delete_row(&mut self.rows, index).is_none() {
                    return false;
                }
                self.set_documents(Vec::new());
                self.save_rows(ctx);
                true
            }
            Msg::SaveRows => {
                if !self.rows_dirty || matches!(self.generation, Generation::Running { .. }) {
                    return false;
                }
                self.set_documents(Vec::new());
                self.save_rows(ctx);
                true
            }
            Msg::RowsSaved => {
                log!(format!("Saved {} row(s)", self.rows.len()));
                false
            }
            Msg::Generate => {
                let Some(template) = self.template.clone() else {
                    return false;
                };
                if self.rows.is_empty() || matches!(self.generation, Generation::Running { .. }) {
                    return false;
                }
                self.set_documents(Vec::new());
                self.error = None;
                self.generation = Generation::Running {
                    completed: 0,
                    total: self.rows.len(),
                };
                spawn_local(generate_in_browser(template, self.rows.clone(), ctx.link().clone()));
                true
            }
            Msg::Progress { completed, total } => {
                self.generation = Generation::Running { completed, total };
                true
            }
            Msg::GenerationFinished(result) => {
                self.generation = Generation::Idle;
                match result {
                    Ok(documents) => {
                        show_toast(&format!("Generated {} document(s).", documents.len()));
                        self.set_documents(documents);
                    }
                    Err(e) => {
                        error!(format!("Generation failed: {}", e));
                        self.set_documents(Vec::new());
                        self.error = Some(format!("Generation failed: {}", e));
                    }
                }
                true
            }
            Msg::DownloadOne(index) => {
                let (Some(template), Some(document)) = (self.template.as_ref(), self.documents.get(index)) else {
                    return false;
                };
                let row = self.rows.iter().find(|r| r.id == document.data_row_id);
                let name = document_file_name(template, row, index);
                if download_bytes(&document.document, &name, DOCX_MIME).is_err() {
                    show_toast("The download could not be started.");
                }
                false
            }
            Msg::ShowPreview(index) => {
                let Some(document) = self.documents.get(index) else {
                    return false;
                };
                match PreviewDocument::from_docx(&document.document) {
                    Ok(preview) => self.preview = Some((index, preview)),
                    Err(e) => self.error = Some(format!("Could not preview the document: {}", e)),
                }
                true
            }
            Msg::ClosePreview => {
                self.preview = None;
                true
            }
            Msg::DownloadAll => {
                let Some(template) = self.template.as_ref() else {
                    return false;
                };
                match bundle_documents(&self.documents, template, &self.rows) {
                    Ok(bundle) => {
                        if download_bytes(&bundle, &bundle_file_name(template), ZIP_MIME).is_err() {
                            show_toast("The download could not be started.");
                        }
                    }
                    Err(e) => {
                        self.error = Some(format!("Could not build the zip: {}", e));
                        return true;
                    }
                }
                false
            }
            Msg::StartServerMerge => {
                let Some((template_id, session_id)) = self.ids() else {
                    return false;
                };
                if self
                    .server_job
                    .as_ref()
                    .is_some_and(|job| !job.status.is_finished())
                {
                    return false;
                }
                self.server_job = None;
                spawn_local(run_server_merge(template_id, session_id, ctx.link().clone()));
                true
            }
            Msg::ServerJobUpdate(job) => {
                if let JobStatus::Failed(e) = &job.status {
                    self.error = Some(format!("Server generation failed: {}", e));
                }
                self.server_job = Some(job);
                true
            }
            Msg::DownloadServerBundle => {
                if let Some(ServerJob {
                    job_id,
                    status: JobStatus::Completed(file_name),
                }) = &self.server_job
                {
                    if download_url(&api::merge_download_url(job_id), file_name, false).is_err() {
                        show_toast("The download could not be started.");
                    }
                }
                false
            }
            Msg::RequestFailed(e) => {
                self.importing = false;
                self.error = Some(e);
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        view::view(self, ctx)
    }
}
