//! Rendering of the editor: toolbar, error banner, the document with field
//! highlights and the draw overlay, and the field sidebar.
//!
//! The document root must only contain run text. Every run becomes one
//! `<span>` whose text nodes concatenate to the run text, so the DOM text
//! leaves flatten to the same string the offsets were taken from.

use common::highlight::segment_leaf;
use common::model::field::{Field, FieldType};
use common::preview::{PreviewParagraph, PreviewRun};
use common::text::utf16_len;
use std::str::FromStr;
use yew::html::Scope;
use yew::prelude::*;

use crate::app::Screen;

use super::field_sheet::field_sheet;
use super::messages::Msg;
use super::state::EditorComponent;

pub fn view(component: &EditorComponent, ctx: &Context<EditorComponent>) -> Html {
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
    let review = Callback::from(move |_| navigate.emit(Screen::Review(template_id.clone())));

    html! {
        <div class="screen editor">
            <header class="toolbar">
                <button class="icon-btn" onclick={back}>
                    <i class="material-icons">{"arrow_back"}</i>
                </button>
                <h1>{ title }</h1>
                <span class="muted">{"Select text to create a field. Hold Alt and drag to draw a box."}</span>
                <button class="icon-btn" disabled={component.fields().is_empty()} onclick={review}>
                    <i class="material-icons">{"table_chart"}</i>
                    <span class="icon-label">{"Data & generate"}</span>
                </button>
            </header>
            { error_banner(component, link) }
            <div class="editor-body">
                <div
                    class="page-frame"
                    onmousedown={link.callback(Msg::PointerDown)}
                    onmousemove={link.callback(Msg::PointerMove)}
                    onmouseup={link.callback(Msg::PointerUp)}
                    onmouseleave={link.callback(|_| Msg::PointerLeave)}
                >
                    <div class="docx-page" ref={component.document_ref.clone()}>
                        { for component.document_html(link) }
                    </div>
                    { draw_overlay(component) }
                </div>
                { sidebar(component, link) }
            </div>
            { field_sheet(component, link) }
        </div>
    }
}

fn error_banner(component: &EditorComponent, link: &Scope<EditorComponent>) -> Html {
    match &component.error {
        Some(message) => html! {
            <div class="error-banner">
                <span>{ message }</span>
                <button onclick={link.callback(|_| Msg::DismissError)}>{"✕"}</button>
            </div>
        },
        None => html! {},
    }
}

fn draw_overlay(component: &EditorComponent) -> Html {
    match component.live_rect {
        Some(rect) => {
            let style = format!(
                "left:{}px;top:{}px;width:{}px;height:{}px;",
                rect.left, rect.top, rect.width, rect.height
            );
            html! { <div class="draw-box" style={style}></div> }
        }
        None => html! {},
    }
}

impl EditorComponent {
    /// One `<p>` per paragraph; leaf offsets run across paragraphs.
    fn document_html(&self, link: &Scope<EditorComponent>) -> Vec<Html> {
        let mut offset = 0;
        self.preview
            .paragraphs
            .iter()
            .map(|paragraph| {
                let html = self.paragraph_html(paragraph, offset, link);
                offset += paragraph.runs.iter().map(|r| utf16_len(&r.text)).sum::<usize>();
                html
            })
            .collect()
    }

    fn paragraph_html(&self, paragraph: &PreviewParagraph, start: usize, link: &Scope<EditorComponent>) -> Html {
        let class = match &paragraph.style {
            Some(style) => format!("para para-{}", style.to_lowercase()),
            None => "para".to_string(),
        };
        if paragraph.runs.is_empty() {
            return html! { <p class={class}><br /></p> };
        }
        let mut offset = start;
        let runs: Vec<Html> = paragraph
            .runs
            .iter()
            .map(|run| {
                let html = self.run_html(run, offset, link);
                offset += utf16_len(&run.text);
                html
            })
            .collect();
        html! { <p class={class}>{ for runs }</p> }
    }

    fn run_html(&self, run: &PreviewRun, start: usize, link: &Scope<EditorComponent>) -> Html {
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
        let fields = self.fields();
        let segments = segment_leaf(&run.text, start, fields).into_iter().map(|segment| {
            match segment.field_id.and_then(|id| fields.iter().find(|f| f.id == id)) {
                Some(field) => self.mark_html(field, segment.text, link),
                None => html! { { segment.text } },
            }
        });
        html! { <span class="run" style={style}>{ for segments }</span> }
    }

    fn mark_html(&self, field: &Field, text: String, link: &Scope<EditorComponent>) -> Html {
        let field_style = field.field_type.style();
        let active = self.controller.active_field() == Some(field.id.as_str());
        let background = if active {
            field_style.background_active
        } else {
            field_style.background
        };
        let style = format!(
            "background:{};border-bottom:2px solid {};",
            background, field_style.border
        );
        let field_id = field.id.clone();
        html! {
            <mark
                class={classes!("field-mark", active.then_some("active"))}
                data-field-id={field.id.clone()}
                title={field.name.clone()}
                style={style}
                onclick={link.callback(move |_| Msg::MarkClicked(field_id.clone()))}
            >
                { text }
            </mark>
        }
    }
}

pub(super) fn type_options(selected: FieldType) -> Html {
    html! {
        <>
            { for FieldType::ALL.iter().map(|t| html! {
                <option value={t.as_str()} selected={*t == selected}>{ t.label() }</option>
            }) }
        </>
    }
}

fn sidebar(component: &EditorComponent, link: &Scope<EditorComponent>) -> Html {
    let fields = component.fields();
    html! {
        <aside class="field-list">
            <h2>{ format!("Fields ({})", fields.len()) }</h2>
            {
                if fields.is_empty() {
                    html! { <p class="muted">{"No fields yet."}</p> }
                } else {
                    html! { <>{ for fields.iter().map(|field| field_card(component, field, link)) }</> }
                }
            }
        </aside>
    }
}

fn field_card(component: &EditorComponent, field: &Field, link: &Scope<EditorComponent>) -> Html {
    let style = field.field_type.style();
    let active = component.controller.active_field() == Some(field.id.as_str());

    let id = field.id.clone();
    let on_select = link.callback(move |_| Msg::RevealField(id.clone()));
    let id = field.id.clone();
    let on_rename = link.batch_callback(move |e: Event| {
        let input: web_sys::HtmlInputElement = e.target_unchecked_into();
        let name = input.value();
        (!name.trim().is_empty()).then(|| Msg::RenameField {
            field_id: id.clone(),
            name,
        })
    });
    let id = field.id.clone();
    let on_type = link.batch_callback(move |e: Event| {
        let select: web_sys::HtmlSelectElement = e.target_unchecked_into();
        FieldType::from_str(&select.value())
            .ok()
            .map(|field_type| Msg::ChangeFieldType {
                field_id: id.clone(),
                field_type,
            })
    });
    let id = field.id.clone();
    let on_delete = link.callback(move |_| Msg::DeleteField(id.clone()));

    html! {
        <div
            key={field.id.clone()}
            class={classes!("field-card", active.then_some("active"))}
            style={format!("border-left:4px solid {};", style.border)}
        >
            <div class="field-card-head" onclick={on_select}>
                <i class="material-icons">{ style.icon }</i>
                <span class={style.badge_class}>{ field.field_type.label() }</span>
                <code class="placeholder">{ &field.placeholder }</code>
            </div>
            <input type="text" value={field.name.clone()} onchange={on_rename} />
            <select onchange={on_type}>{ type_options(field.field_type) }</select>
            <button class="danger" onclick={on_delete}>{"Delete"}</button>
        </div>
    }
}
