use leptos::prelude::*;

use crate::shared::icons::icon;

/// Message shown above a view after a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    /// Whether a "Retry" action is offered.
    pub retry: bool,
}

impl Notice {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            retry: false,
        }
    }

    pub fn retryable(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            retry: true,
        }
    }
}

/// Dismissable notice bar; renders nothing while `notice` is `None`.
#[component]
#[allow(non_snake_case)]
pub fn NoticeBar(
    notice: RwSignal<Option<Notice>>,
    /// Run by the "Retry" button; the notice is dismissed first.
    #[prop(optional)]
    on_retry: Option<Callback<()>>,
) -> impl IntoView {
    view! {
        {move || {
            notice
                .get()
                .map(|n| {
                    let show_retry = n.retry && on_retry.is_some();
                    view! {
                        <div class="notice notice--error" role="alert">
                            <span class="notice__text">{n.text}</span>
                            <Show when=move || show_retry>
                                <button
                                    class="button button--secondary notice__retry"
                                    on:click=move |_| {
                                        notice.set(None);
                                        if let Some(retry) = on_retry {
                                            retry.run(());
                                        }
                                    }
                                >
                                    {icon("refresh")}
                                    "Retry"
                                </button>
                            </Show>
                            <button
                                class="notice__close"
                                aria-label="Dismiss"
                                on:click=move |_| notice.set(None)
                            >
                                {icon("x")}
                            </button>
                        </div>
                    }
                })
        }}
    }
}
