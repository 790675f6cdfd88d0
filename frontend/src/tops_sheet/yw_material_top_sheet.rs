use gloo_timers::callback::Timeout;
use uuid::Uuid;
use web_sys::KeyboardEvent;
use yew::{html, AttrValue, Callback, Component, Context, Html, NodeRef, Properties};

/// Delay before toggling `show`, so a sheet rendered in the same frame still
/// slides in.
const TOGGLE_DELAY_MS: u32 = 50;

/// Dialog sliding down from the top of the viewport. It is hidden until
/// `open_top_sheet` adds the `show` class; Escape inside it emits `on_dismiss`.
pub struct YwMaterialTopSheet {
    title_id: String,
}

#[derive(Properties, PartialEq)]
pub struct Props {
    #[prop_or_default]
    pub children: Html,
    pub node_ref: NodeRef,
    pub title: AttrValue,
    #[prop_or_default]
    pub on_dismiss: Callback<()>,
}

impl Component for YwMaterialTopSheet {
    type Message = ();
    type Properties = Props;

    fn create(_ctx: &Context<Self>) -> Self {
        Self {
            title_id: format!("sheet-title-{}", Uuid::new_v4()),
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let props = ctx.props();
        let on_dismiss = props.on_dismiss.clone();
        let onkeydown = Callback::from(move |e: KeyboardEvent| {
            if e.key() == "Escape" {
                on_dismiss.emit(());
            }
        });
        html! {
            <div
                class="top-sheet"
                role="dialog"
                aria-labelledby={self.title_id.clone()}
                ref={props.node_ref.clone()}
                {onkeydown}
            >
                <h2 class="top-sheet-title" id={self.title_id.clone()}>{ props.title.clone() }</h2>
                { props.children.clone() }
            </div>
        }
    }
}

fn set_shown(top_sheet_ref: &NodeRef, shown: bool) {
    let Some(sheet) = top_sheet_ref.cast::<web_sys::Element>() else {
        return;
    };
    Timeout::new(TOGGLE_DELAY_MS, move || {
        let classes = sheet.class_list();
        let _ = if shown { classes.add_1("show") } else { classes.remove_1("show") };
    })
    .forget();
}

pub fn open_top_sheet(top_sheet_ref: NodeRef) {
    set_shown(&top_sheet_ref, true);
}

pub fn close_top_sheet(top_sheet_ref: NodeRef) {
    set_shown(&top_sheet_ref, false);
}
