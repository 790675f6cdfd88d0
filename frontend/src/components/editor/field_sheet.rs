use common::model::field::FieldType;
use common::text::utf16_len;
use std::str::FromStr;
use yew::html::Scope;
use yew::prelude::*;

use crate::tops_sheet::yw_material_top_sheet::YwMaterialTopSheet;

use super::messages::Msg;
use super::state::EditorComponent;
use super::view::type_options;

/// Sheet asking for the name and type of the pending candidate.
pub fn field_sheet(component: &EditorComponent, link: &Scope<EditorComponent>) -> Html {
    let body = match &component.pending {
        Some(candidate) => {
            let style = component.pending_type.style();
            html! {
                <form
                    class="field-sheet"
                    onsubmit={link.callback(|e: SubmitEvent| {
                        e.prevent_default();
                        Msg::ConfirmField
                    })}
                >
                    <p>
                        <code style={format!("background:{};", style.background)}>{ &candidate.placeholder }</code>
                        <span class="muted">
                            { format!(" {} character(s) at [{}, {})", utf16_len(&candidate.placeholder), candidate.start_position, candidate.end_position) }
                        </span>
                    </p>
                    <label>
                        {"Name"}
                        <input
                            type="text"
                            value={component.pending_name.clone()}
                            oninput={link.callback(|e: InputEvent| {
                                let input: web_sys::HtmlInputElement = e.target_unchecked_into();
                                Msg::SetPendingName(input.value())
                            })}
                        />
                    </label>
                    <label>
                        {"Type"}
                        <select onchange={link.batch_callback(|e: Event| {
                            let select: web_sys::HtmlSelectElement = e.target_unchecked_into();
                            FieldType::from_str(&select.value()).ok().map(Msg::SetPendingType)
                        })}>
                            { type_options(component.pending_type) }
                        </select>
                    </label>
                    <div class="actions">
                        <button type="button" onclick={link.callback(|_| Msg::CancelField)}>{"Cancel"}</button>
                        <button type="submit" disabled={component.saving}>
                            { if component.saving { "Saving..." } else { "Add field" } }
                        </button>
                    </div>
                </form>
            }
        }
        None => html! {},
    };

    html! {
        <YwMaterialTopSheet
            node_ref={component.sheet_ref.clone()}
            title="New field"
            on_dismiss={link.callback(|_| Msg::CancelField)}
        >
            { body }
        </YwMaterialTopSheet>
    }
}
