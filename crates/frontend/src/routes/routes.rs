use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes, A};
use leptos_router::path;

use crate::domain::a001_geodetic_point::ui::map::GeodesyMapPage;
use crate::domain::a002_drawing::ui::filter::DrawingsFilter;

#[component]
fn NavBar() -> impl IntoView {
    view! {
        <nav class="navbar">
            <A href="/geodesy">"Geodesy"</A>
            <A href="/drawings">"Drawings"</A>
        </nav>
    }
}

#[component]
fn NotFound() -> impl IntoView {
    view! {
        <div class="page">
            <p>"Page not found."</p>
        </div>
    }
}

#[component]
pub fn AppRoutes() -> impl IntoView {
    view! {
        <Router>
            <NavBar />
            <main>
                <Routes fallback=|| view! { <NotFound /> }>
                    <Route path=path!("/") view=GeodesyMapPage />
                    <Route path=path!("/geodesy") view=GeodesyMapPage />
                    <Route path=path!("/drawings") view=DrawingsFilter />
                </Routes>
            </main>
        </Router>
    }
}
