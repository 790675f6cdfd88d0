//! Template list: upload a `.docx`, open it in the editor or the review
//! screen, delete it.

use crate::api;
use crate::app::Screen;
use crate::helpers::{read_file_bytes, show_toast, take_selected_file};
use common::generator::validate_document;
use common::model::template::{Template, TemplateSummary};
use gloo_console::error;
use yew::platform::spawn_local;
use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct TemplatesProps {
    pub on_navigate: Callback<Screen>,
}

pub enum Msg {
    Loaded(Vec<TemplateSummary>),
    LoadFailed(String),
    SetName(String),
    ChooseFile,
    FileSelected(web_sys::File),
    Uploaded(Template),
    UploadFailed(String),
    Delete(String),
    Deleted(String),
}

pub struct TemplatesComponent {
    templates: Vec<TemplateSummary>,
    loading: bool,
    uploading: bool,
    name: String,
    file_input_ref: NodeRef,
}

fn load(link: html::Scope<TemplatesComponent>) {
    spawn_local(async move {
        match api::list_templates().await {
            Ok(list) => link.send_message(Msg::Loaded(list)),
            Err(e) => link.send_message(Msg::LoadFailed(e)),
        }
    });
}

/// Template name for an upload: the typed name, else the file name without
/// its extension.
fn upload_name(typed: &str, file_name: &str) -> String {
    let typed = typed.trim();
    if !typed.is_empty() {
        return typed.to_string();
    }
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file_name.to_string(),
    }
}

impl Component for TemplatesComponent {
    type Message = Msg;
    type Properties = TemplatesProps;

    fn create(ctx: &Context<Self>) -> Self {
        load(ctx.link().clone());
        Self {
            templates: Vec::new(),
            loading: true,
            uploading: false,
            name: String::new(),
            file_input_ref: NodeRef::default(),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Loaded(list) => {
                self.templates = list;
                self.loading = false;
                true
            }
            Msg::LoadFailed(e) => {
                self.loading = false;
                error!(format!("Loading templates failed: {}", e));
                show_toast(&format!("Could not load templates: {}", e));
                true
            }
            Msg::SetName(name) => {
                self.name = name;
                false
            }
            Msg::ChooseFile => {
                if let Some(input) = self.file_input_ref.cast::<web_sys::HtmlInputElement>() {
                    input.click();
                }
                false
            }
            Msg::FileSelected(file) => {
                if !file.name().to_lowercase().ends_with(".docx") {
                    show_toast("Please choose a .docx file.");
                    return false;
                }
                self.uploading = true;
                let name = upload_name(&self.name, &file.name());
                let link = ctx.link().clone();
                spawn_local(async move {
                    let result = async {
                        let bytes = read_file_bytes(file.clone()).await?;
                        validate_document(&bytes).map_err(|e| e.to_string())?;
                        api::upload_template(&name, &file).await
                    }
                    .await;
                    match result {
                        Ok(template) => link.send_message(Msg::Uploaded(template)),
                        Err(e) => link.send_message(Msg::UploadFailed(e)),
                    }
                });
                true
            }
            Msg::Uploaded(template) => {
                self.uploading = false;
                self.name.clear();
                show_toast(&format!("Template \"{}\" uploaded.", template.name));
                ctx.props().on_navigate.emit(Screen::Editor(template.id));
                true
            }
            Msg::UploadFailed(e) => {
                self.uploading = false;
                show_toast(&e);
                true
            }
            Msg::Delete(template_id) => {
                let link = ctx.link().clone();
                spawn_local(async move {
                    match api::delete_template(&template_id).await {
                        Ok(()) => link.send_message(Msg::Deleted(template_id)),
                        Err(e) => show_toast(&format!("Could not delete the template: {}", e)),
                    }
                });
                false
            }
            Msg::Deleted(template_id) => {
                self.templates.retain(|t| t.id != template_id);
                show_toast("Template deleted.");
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let link = ctx.link();
        let navigate = ctx.props().on_navigate.clone();

        html! {
            <div class="screen templates">
                <header class="toolbar">
                    <h1>{"Templates"}</h1>
                    <input
                        type="text"
                        placeholder="Template name"
                        value={self.name.clone()}
                        oninput={link.callback(|e: InputEvent| {
                            let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                            Msg::SetName(input.value())
                        })}
                    />
                    <button class="icon-btn" disabled={self.uploading} onclick={link.callback(|_| Msg::ChooseFile)}>
                        <i class="material-icons">{"upload_file"}</i>
                        <span class="icon-label">{ if self.uploading { "Uploading..." } else { "Upload .docx" } }</span>
                    </button>
                    <input
                        type="file"
                        accept=".docx"
                        style="display:none"
                        ref={self.file_input_ref.clone()}
                        onchange={link.batch_callback(|e: Event| take_selected_file(&e).map(Msg::FileSelected))}
                    />
                </header>
                {
                    if self.loading {
                        html! { <p class="muted">{"Loading..."}</p> }
                    } else if self.templates.is_empty() {
                        html! { <p class="muted">{"No templates yet. Upload a .docx to start."}</p> }
                    } else {
                        html! {
                            <ul class="template-list">
                                { for self.templates.iter().map(|t| {
                                    let edit = {
                                        let navigate = navigate.clone();
                                        let id = t.id.clone();
                                        Callback::from(move |_| navigate.emit(Screen::Editor(id.clone())))
                                    };
                                    let review = {
                                        let navigate = navigate.clone();
                                        let id = t.id.clone();
                                        Callback::from(move |_| navigate.emit(Screen::Review(id.clone())))
                                    };
                                    let id = t.id.clone();
                                    let delete = link.callback(move |_| Msg::Delete(id.clone()));
                                    html! {
                                        <li class="template-card" key={t.id.clone()}>
                                            <div class="template-name">{ &t.name }</div>
                                            <div class="muted">
                                                { format!("{} field(s), created {}", t.field_count, t.created_at.format("%b %-d, %Y")) }
                                            </div>
                                            <div class="actions">
                                                <button onclick={edit}>{"Edit fields"}</button>
                                                <button onclick={review} disabled={t.field_count == 0}>{"Data & generate"}</button>
                                                <button class="danger" onclick={delete}>{"Delete"}</button>
                                            </div>
                                        </li>
                                    }
                                }) }
                            </ul>
                        }
                    }
                }
            </div>
        }
    }
}

#[cfg(test)]
mod tests {
    use super::upload_name;

    #[test]
    fn typed_name_wins_over_file_name() {
        assert_eq!(upload_name("  Offer letter ", "offer.docx"), "Offer letter");
        assert_eq!(upload_name("", "Offer Letter v2.docx"), "Offer Letter v2");
        assert_eq!(upload_name(" ", ".docx"), ".docx");
    }
}
