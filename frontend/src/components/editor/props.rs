use crate::app::Screen;
use yew::prelude::*;

/// Properties for the `EditorComponent`.
#[derive(Properties, PartialEq, Clone)]
pub struct EditorProps {
    /// Template loaded from the server when the editor mounts.
    pub template_id: String,
    /// Leaves the editor for another screen.
    pub on_navigate: Callback<Screen>,
}
