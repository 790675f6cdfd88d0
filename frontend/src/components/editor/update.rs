//! Update function for the template editor.
//!
//! Pointer input goes through the `SelectionController`: a plain drag is
//! resolved from the native selection on pointer-up and its errors are shown
//! in the banner, an Alt+drag draws a box whose failures are dropped. A valid
//! candidate opens the field sheet; confirming it asks the server to add the
//! field, and only the server's answer changes the local schema.

use common::model::field::{FieldDraft, FieldUpdate};
use common::preview::PreviewDocument;
use common::selection::{Candidate, PointerOutcome};
use gloo_console::{error, log};
use yew::platform::spawn_local;
use yew::prelude::*;

use crate::api;
use crate::helpers::show_toast;
use crate::tops_sheet::yw_material_top_sheet::{close_top_sheet, open_top_sheet};

use super::dom::clear_native_selection;
use super::messages::Msg;
use super::state::EditorComponent;

pub fn update(component: &mut EditorComponent, ctx: &Context<EditorComponent>, msg: Msg) -> bool {
    match msg {
        Msg::Loaded(template) => {
            match PreviewDocument::from_docx(&template.original_document) {
                Ok(preview) => {
                    component.flattened = preview.flattened_text();
                    component.preview = preview;
                }
                Err(e) => component.error = Some(format!("Could not render the document: {}", e)),
            }
            log!(format!(
                "Loaded template {} with {} field(s)",
                template.id,
                template.schema.len()
            ));
            component.template = Some(template);
            true
        }
        Msg::LoadFailed(e) => {
            component.error = Some(format!("Could not load the template: {}", e));
            true
        }
        Msg::PointerDown(e) => {
            if e.button() != 0 || component.pending.is_some() {
                return false;
            }
            let Some(dom) = component.dom() else {
                return false;
            };
            component.controller.pointer_down(dom.local_point(&e), e.alt_key());
            if component.controller.is_drawing() {
                // Keep the browser from starting a text selection under the box.
                e.prevent_default();
                clear_native_selection();
                component.live_rect = component.controller.live_rect();
                return true;
            }
            false
        }
        Msg::PointerMove(e) => {
            if !component.controller.is_drawing() {
                return false;
            }
            let Some(dom) = component.dom() else {
                return false;
            };
            component.live_rect = component.controller.pointer_move(dom.local_point(&e));
            true
        }
        Msg::PointerLeave => {
            if !component.controller.is_drawing() {
                return false;
            }
            component.controller.cancel();
            component.live_rect = None;
            true
        }
        Msg::PointerUp(e) => {
            if e.button() != 0 || component.pending.is_some() || component.template.is_none() {
                return false;
            }
            let Some(dom) = component.dom() else {
                return false;
            };
            component.live_rect = None;
            let fields = component.fields().to_vec();
            match component.controller.pointer_up(dom.local_point(&e)) {
                PointerOutcome::Discarded => {}
                PointerOutcome::BoxDrawn(rect) => {
                    if let Some(candidate) =
                        component
                            .controller
                            .resolve_box(&rect, &dom, &component.flattened, &fields)
                    {
                        open_pending(component, candidate);
                    }
                }
                PointerOutcome::ResolveSelection => {
                    let selection = dom.native_selection();
                    match component.controller.resolve_selection(
                        selection.as_ref(),
                        &dom,
                        &component.flattened,
                        &fields,
                    ) {
                        Ok(Some(candidate)) => open_pending(component, candidate),
                        Ok(None) => {}
                        Err(e) => component.error = Some(e.to_string()),
                    }
                }
            }
            true
        }
        Msg::MarkClicked(field_id) => {
            component.controller.toggle_active_field(&field_id);
            true
        }
        Msg::RevealField(field_id) => {
            let Some(start) = component
                .fields()
                .iter()
                .find(|f| f.id == field_id)
                .map(|f| f.start_position)
            else {
                return false;
            };
            if let Some(dom) = component.dom() {
                dom.reveal_offset(start);
            }
            component.controller.set_active_field(Some(field_id));
            true
        }
        Msg::DismissError => {
            component.error = None;
            true
        }
        Msg::SetPendingName(name) => {
            component.pending_name = name;
            false
        }
        Msg::SetPendingType(field_type) => {
            component.pending_type = field_type;
            true
        }
        Msg::ConfirmField => {
            let (Some(candidate), Some(template_id)) = (component.pending.clone(), component.template_id()) else {
                return false;
            };
            let name = component.pending_name.trim().to_string();
            if name.is_empty() {
                show_toast("Give the field a name first.");
                return false;
            }
            let draft = FieldDraft {
                name,
                placeholder: candidate.placeholder,
                field_type: component.pending_type,
                start_position: candidate.start_position,
                end_position: candidate.end_position,
            };
            component.saving = true;
            let link = ctx.link().clone();
            spawn_local(async move {
                match api::add_field(&template_id, &draft).await {
                    Ok(field) => link.send_message(Msg::FieldAdded(field)),
                    Err(e) => link.send_message(Msg::RequestFailed(e)),
                }
            });
            true
        }
        Msg::CancelField => {
            close_pending(component);
            true
        }
        Msg::FieldAdded(field) => {
            component.saving = false;
            let field_id = field.id.clone();
            let name = field.name.clone();
            if component.edit_fields(|fields| fields.push(field)) {
                component.controller.set_active_field(Some(field_id));
                show_toast(&format!("Field \"{}\" added.", name));
            }
            close_pending(component);
            true
        }
        Msg::RenameField { field_id, name } => {
            let unchanged = component
                .fields()
                .iter()
                .any(|f| f.id == field_id && f.name == name.trim());
            if unchanged {
                return false;
            }
            send_update(
                component,
                ctx,
                field_id,
                FieldUpdate {
                    name: Some(name),
                    field_type: None,
                },
            );
            false
        }
        Msg::ChangeFieldType { field_id, field_type } => {
            send_update(
                component,
                ctx,
                field_id,
                FieldUpdate {
                    name: None,
                    field_type: Some(field_type),
                },
            );
            false
        }
        Msg::FieldChanged(field) => component.edit_fields(|fields| {
            if let Some(slot) = fields.iter_mut().find(|f| f.id == field.id) {
                *slot = field;
            }
        }),
        Msg::DeleteField(field_id) => {
            let Some(template_id) = component.template_id() else {
                return false;
            };
            let link = ctx.link().clone();
            spawn_local(async move {
                match api::remove_field(&template_id, &field_id).await {
                    Ok(()) => link.send_message(Msg::FieldRemoved(field_id)),
                    Err(e) => link.send_message(Msg::RequestFailed(e)),
                }
            });
            false
        }
        Msg::FieldRemoved(field_id) => {
            if component.controller.active_field() == Some(field_id.as_str()) {
                component.controller.set_active_field(None);
            }
            component.edit_fields(|fields| fields.retain(|f| f.id != field_id))
        }
        Msg::RequestFailed(e) => {
            error!(format!("Field request failed: {}", e));
            component.saving = false;
            component.error = Some(e);
            true
        }
    }
}

/// Clears the native selection and opens the field sheet for `candidate`.
fn open_pending(component: &mut EditorComponent, candidate: Candidate) {
    clear_native_selection();
    component.pending = Some(candidate);
    component.pending_name.clear();
    component.pending_type = Default::default();
    component.error = None;
    open_top_sheet(component.sheet_ref.clone());
}

fn close_pending(component: &mut EditorComponent) {
    component.pending = None;
    component.saving = false;
    close_top_sheet(component.sheet_ref.clone());
}

fn send_update(component: &EditorComponent, ctx: &Context<EditorComponent>, field_id: String, changes: FieldUpdate) {
    let Some(template_id) = component.template_id() else {
        return;
    };
    let link = ctx.link().clone();
    spawn_local(async move {
        match api::update_field(&template_id, &field_id, &changes).await {
            Ok(field) => link.send_message(Msg::FieldChanged(field)),
            Err(e) => link.send_message(Msg::RequestFailed(e)),
        }
    });
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn opening_the_field_sheet_clears_the_native_selection() {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();
        let root = document.create_element("div").unwrap();
        root.set_text_content(Some("Dear NAME_HERE"));
        document.body().unwrap().append_child(&root).unwrap();

        let text = root.first_child().unwrap();
        let range = document.create_range().unwrap();
        range.set_start(&text, 5).unwrap();
        range.set_end(&text, 14).unwrap();
        let selection = window.get_selection().unwrap().unwrap();
        selection.remove_all_ranges().unwrap();
        selection.add_range(&range).unwrap();
        assert_eq!(selection.range_count(), 1);

        let mut component = EditorComponent::new();
        open_pending(
            &mut component,
            Candidate {
                start_position: 5,
                end_position: 14,
                placeholder: "NAME_HERE".into(),
            },
        );

        assert_eq!(selection.range_count(), 0);
        assert_eq!(component.pending.as_ref().map(|c| c.start_position), Some(5));
        root.remove();
    }
}
