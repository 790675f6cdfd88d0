use common::generator::document_file_name;
use common::jobs::{progress_percent, JobStatus};
use common::preview::{PreviewParagraph, PreviewRun};
use yew::html::Scope;
use yew::prelude::*;

use crate::app::Screen;
use crate::helpers::take_selected_file;

use super::{Generation, Msg, ReviewComponent};

pub fn view(component: &ReviewComponent, ctx: &Context<ReviewComponent>) -> Html {
    let link = ctx.link();
    let navigate = ctx.props().on_navigate.clone();
    let template_id = ctx.props().template_id.clone();
    let title = component
        .template
        .as_ref()
        .map(|t| t.name.clone())
        .unwrap_or_else(|| "Loading...".to_string());

    let back = {
        let navigate = navigate.clone();
        Callback::from(move |_| navigate.emit(Screen::Templates))
    };
    let edit = Callback::from(move |_| navigate.emit(Screen::Editor(template_id.clone())));

    html! {
        <div class="screen review">
            <header class="toolbar">
                <button class="icon-btn" onclick={back}>
                    <i class="material-icons">{"arrow_back"}</i>
                </button>
                <h1>{ title }</h1>
                <button class="icon-btn" onclick={edit}>
                    <i class="material-icons">{"edit"}</i>
                    <span class="icon-label">{"Edit fields"}</span>
                </button>
            </header>
            {
                match &component.error {
                    Some(message) => html! { <div class="error-banner"><span>{ message }</span></div> },
                    None => html! {},
                }
            }
            { session_bar(component, link) }
            { rows_table(component, link) }
            { generation_panel(component, link) }
        </div>
    }
}

fn session_bar(component: &ReviewComponent, link: &Scope<ReviewComponent>) -> Html {
    if component.session.is_none() {
        return html! {};
    }
    html! {
        <section class="session-bar">
            <input
                type="text"
                value={component.session_name.clone()}
                oninput={link.callback(|e: InputEvent| {
                    let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                    Msg::SetSessionName(input.value())
                })}
                onchange={link.callback(|_| Msg::SaveSessionName)}
            />
            <button class="icon-btn" disabled={component.importing} onclick={link.callback(|_| Msg::ChooseCsv)}>
                <i class="material-icons">{"table_chart"}</i>
                <span class="icon-label">{ if component.importing { "Importing..." } else { "Import CSV" } }</span>
            </button>
            <input
                type="file"
                accept=".csv"
                style="display:none"
                ref={component.csv_input_ref.clone()}
                onchange={link.batch_callback(|e: Event| take_selected_file(&e).map(Msg::CsvSelected))}
            />
            <button class="danger" disabled={component.rows.is_empty()} onclick={link.callback(|_| Msg::ClearRows)}>
                {"Clear rows"}
            </button>
        </section>
    }
}

fn rows_table(component: &ReviewComponent, link: &Scope<ReviewComponent>) -> Html {
    let Some(template) = &component.template else {
        return html! {};
    };
    let fields = template.schema.fields();
    let add_row = html! {
        <button class="icon-btn" disabled={fields.is_empty()} onclick={link.callback(|_| Msg::AddRow)}>
            <i class="material-icons">{"add"}</i>
            <span class="icon-label">{"Add row"}</span>
        </button>
    };
    if component.rows.is_empty() {
        return html! {
            <section class="rows-editor">
                <p class="muted">{"No data rows yet. Add rows by hand or import a CSV whose headers match the field names."}</p>
                { add_row }
            </section>
        };
    }
    html! {
        <section class="rows-editor">
            <table class="rows">
                <thead>
                    <tr>
                        <th>{"#"}</th>
                        { for fields.iter().map(|f| html! { <th>{ &f.name }</th> }) }
                        <th></th>
                    </tr>
                </thead>
                <tbody>
                    { for component.rows.iter().enumerate().map(|(index, row)| html! {
                        <tr key={row.id.clone()}>
                            <td>{ (index + 1).to_string() }</td>
                            { for fields.iter().map(|f| {
                                let field_id = f.id.clone();
                                html! {
                                    <td>
                                        <input
                                            type="text"
                                            value={row.value_for(&f.id).to_string()}
                                            oninput={link.callback(move |e: InputEvent| {
                                                let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                                Msg::EditCell { row: index, field_id: field_id.clone(), value: input.value() }
                                            })}
                                            onchange={link.callback(|_| Msg::SaveRows)}
                                        />
                                    </td>
                                }
                            }) }
                            <td>
                                <button class="icon-btn" title="Delete row" onclick={link.callback(move |_| Msg::DeleteRow(index))}>
                                    <i class="material-icons">{"delete"}</i>
                                </button>
                            </td>
                        </tr>
                    }) }
                </tbody>
            </table>
            { add_row }
        </section>
    }
}

fn generation_panel(component: &ReviewComponent, link: &Scope<ReviewComponent>) -> Html {
    let running = matches!(component.generation, Generation::Running { .. });
    let server_busy = component
        .server_job
        .as_ref()
        .is_some_and(|job| !job.status.is_finished());
    let can_generate = !component.rows.is_empty() && !running;

    html! {
        <section class="generation">
            <div class="actions">
                <button disabled={!can_generate} onclick={link.callback(|_| Msg::Generate)}>
                    {"Generate documents"}
                </button>
                <button disabled={component.rows.is_empty() || server_busy} onclick={link.callback(|_| Msg::StartServerMerge)}>
                    {"Generate on server"}
                </button>
            </div>
            {
                match component.generation {
                    Generation::Running { completed, total } => html! {
                        <div class="progress">
                            <progress max="100" value={progress_percent(completed, total).to_string()} />
                            <span>{ format!("{}/{}", completed, total) }</span>
                        </div>
                    },
                    Generation::Idle => html! {},
                }
            }
            { server_job_status(component, link) }
            { documents_list(component, link) }
        </section>
    }
}

fn server_job_status(component: &ReviewComponent, link: &Scope<ReviewComponent>) -> Html {
    let Some(job) = &component.server_job else {
        return html! {};
    };
    match &job.status {
        JobStatus::Pending => html! { <p class="muted">{"Server job queued..."}</p> },
        JobStatus::InProgress(percent) => html! {
            <div class="progress">
                <progress max="100" value={percent.to_string()} />
                <span>{ format!("{}%", percent) }</span>
            </div>
        },
        JobStatus::Completed(file_name) => html! {
            <p>
                <button onclick={link.callback(|_| Msg::DownloadServerBundle)}>
                    { format!("Download {}", file_name) }
                </button>
            </p>
        },
        JobStatus::Failed(_) => html! {},
    }
}

fn documents_list(component: &ReviewComponent, link: &Scope<ReviewComponent>) -> Html {
    let Some(template) = &component.template else {
        return html! {};
    };
    if component.documents.is_empty() {
        return html! {};
    }
    html! {
        <div class="documents">
            <button onclick={link.callback(|_| Msg::DownloadAll)}>
                {"Download all (.zip)"}
            </button>
            <ul>
                { for component.documents.iter().enumerate().map(|(index, document)| html! {
                    <li key={document.id.clone()}>
                        <span>{ document_file_name(template, component.rows.iter().find(|r| r.id == document.data_row_id), index) }</span>
                        <span class="muted excerpt">{ component.excerpts.get(index).cloned().unwrap_or_default() }</span>
                        <button onclick={link.callback(move |_| Msg::ShowPreview(index))}>{"Preview"}</button>
                        <button onclick={link.callback(move |_| Msg::DownloadOne(index))}>{"Download"}</button>
                    </li>
                }) }
            </ul>
            { document_preview(component, link) }
        </div>
    }
}

fn document_preview(component: &ReviewComponent, link: &Scope<ReviewComponent>) -> Html {
    let Some((index, preview)) = &component.preview else {
        return html! {};
    };
    html! {
        <div class="document-preview">
            <header class="toolbar">
                <h2>{ format!("Document {}", index + 1) }</h2>
                <button class="icon-btn" onclick={link.callback(|_| Msg::ClosePreview)}>
                    <i class="material-icons">{"close"}</i>
                </button>
            </header>
            <div class="page">
                { for preview.paragraphs.iter().map(paragraph_html) }
            </div>
        </div>
    }
}

fn paragraph_html(paragraph: &PreviewParagraph) -> Html {
    let class = match &paragraph.style {
        Some(style) => format!("para para-{}", style.to_lowercase()),
        None => "para".to_string(),
    };
    if paragraph.runs.is_empty() {
        return html! { <p class={class}><br /></p> };
    }
    html! {
        <p class={class}>
            { for paragraph.runs.iter().map(|run| html! {
                <span class="run" style={run_style(run)}>{ run.text.clone() }</span>
            }) }
        </p>
    }
}

fn run_style(run: &PreviewRun) -> String {
    let mut style = String::new();
    if run.bold {
        style.push_str("font-weight:bold;");
    }
    if run.italic {
        style.push_str("font-style:italic;");
    }
    if run.underline {
        style.push_str("text-decoration:underline;");
    }
    style
}
