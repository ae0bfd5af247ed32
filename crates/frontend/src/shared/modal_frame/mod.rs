use gloo_timers::future::TimeoutFuture;
use leptos::ev;
use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::shared::icons::icon;

/// Overlay with a titled surface. Closes on the header button, on Escape
/// and on a click that both starts and ends on the overlay.
#[component]
#[allow(non_snake_case)]
pub fn ModalFrame(
    #[prop(into)] title: String,
    on_close: Callback<()>,
    /// Stacking order; nested modals pass a higher value (default 1000).
    #[prop(optional)]
    z_index: Option<i32>,
    /// Extra class for the surface.
    #[prop(optional)]
    modal_class: Option<String>,
    children: Children,
) -> impl IntoView {
    let z_index = z_index.unwrap_or(1000);
    let pressed_on_overlay = RwSignal::new(false);

    let on_overlay = |ev: &ev::MouseEvent| match (ev.target(), ev.current_target()) {
        (Some(t), Some(ct)) => t == ct,
        _ => false,
    };

    // Closing from inside the overlay's own click handler would drop the
    // handler mid-dispatch; defer to the next tick.
    let close_later = move || {
        spawn_local(async move {
            TimeoutFuture::new(0).await;
            on_close.run(());
        });
    };

    let escape = window_event_listener(ev::keydown, move |ev: ev::KeyboardEvent| {
        if ev.key() == "Escape" {
            close_later();
        }
    });
    on_cleanup(move || escape.remove());

    let surface_class = match modal_class {
        Some(extra) => format!("modal {}", extra),
        None => "modal".to_string(),
    };

    view! {
        <div
            class="modal-overlay"
            style=format!("z-index: {};", z_index)
            on:mousedown=move |ev| pressed_on_overlay.set(on_overlay(&ev))
            on:click=move |ev| {
                let close = pressed_on_overlay.get_untracked() && on_overlay(&ev);
                pressed_on_overlay.set(false);
                if close {
                    close_later();
                }
            }
        >
            <div class=surface_class style="position: relative;" role="dialog">
                <div class="modal__header">
                    <h2 class="modal__title">{title}</h2>
                    <button
                        class="modal__close"
                        aria-label="Close"
                        on:click=move |_| on_close.run(())
                    >
                        {icon("x")}
                    </button>
                </div>
                <div class="modal__body">{children()}</div>
            </div>
        </div>
    }
}
