//! Dioxus components.
//!
//! Everything below [`ChatWidget`] is a pure function of the props it is
//! given. Only the root talks to the chat core and the upload coordinator.

mod file_upload;
mod header;
mod icons;
mod input;
mod message;
mod messages;
mod toggle;
mod typing;
mod widget;
mod window;

pub use file_upload::*;
pub use header::*;
pub use input::*;
pub use message::*;
pub use messages::*;
pub use toggle::*;
pub use typing::*;
pub use widget::*;
pub use window::*;

#[cfg(test)]
pub(crate) fn render(dom: &mut dioxus::prelude::VirtualDom) -> String {
    dom.rebuild_in_place();
    dioxus_ssr::render(dom)
}
