//! Template editor: shows the uploaded document, turns selections into
//! fields and lists the fields defined so far.
//!
//! Submodules follow the usual split: `state`, `messages`, `props`,
//! `update` and `view`, plus `dom` (the live DOM as a `RenderedDocument`)
//! and `field_sheet` (the name/type dialog for a pending candidate).

use yew::platform::spawn_local;
use yew::prelude::*;

mod dom;
mod field_sheet;
mod messages;
mod props;
mod state;
mod update;
mod view;

use crate::api;
pub use messages::Msg;
pub use props::EditorProps;
pub use state::EditorComponent;

impl Component for EditorComponent {
    type Message = Msg;
    type Properties = EditorProps;

    fn create(ctx: &Context<Self>) -> Self {
        let link = ctx.link().clone();
        let template_id = ctx.props().template_id.clone();
        spawn_local(async move {
            match api::get_template(&template_id).await {
                Ok(template) => link.send_message(Msg::Loaded(template)),
                Err(e) => link.send_message(Msg::LoadFailed(e)),
            }
        });
        EditorComponent::new()
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        update::update(self, ctx, msg)
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        view::view(self, ctx)
    }
}
