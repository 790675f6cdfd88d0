//! Root component: switches between the template list, the editor and the
//! review screen without a router.

use crate::components::editor::EditorComponent;
use crate::components::review::ReviewComponent;
use crate::components::templates::TemplatesComponent;
use yew::{html, Callback, Component, Context, Html};

#[derive(Clone, Debug, PartialEq)]
pub enum Screen {
    Templates,
    Editor(String),
    Review(String),
}

pub enum Msg {
    Navigate(Screen),
}

pub struct App {
    screen: Screen,
}

impl Component for App {
    type Message = Msg;
    type Properties = ();

    fn create(_ctx: &Context<Self>) -> Self {
        Self {
            screen: Screen::Templates,
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Navigate(screen) => {
                if self.screen == screen {
                    return false;
                }
                self.screen = screen;
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let navigate: Callback<Screen> = ctx.link().callback(Msg::Navigate);
        match &self.screen {
            Screen::Templates => html! {
                <TemplatesComponent on_navigate={navigate} />
            },
            Screen::Editor(template_id) => html! {
                <EditorComponent key={template_id.clone()} template_id={template_id.clone()} on_navigate={navigate} />
            },
            Screen::Review(template_id) => html! {
                <ReviewComponent key={template_id.clone()} template_id={template_id.clone()} on_navigate={navigate} />
            },
        }
    }
}
