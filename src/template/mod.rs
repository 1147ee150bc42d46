//! Templating code.
//!
//! This defines the [`Page`] item, which wraps the body of every page in
//! the shared layout (stylesheet, navigation bar).

use hypertext::prelude::*;

use crate::auth::Admin;

pub struct Page<R: Renderable> {
    body: Option<R>,
    admin: Option<Admin>,
    active_nav: Option<&'static str>,
}

impl<R: Renderable> Page<R> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn body(mut self, body: R) -> Self {
        self.body = Some(body);
        self
    }

    /// Shows the administration links in the navigation bar.
    pub fn admin(mut self, admin: Admin) -> Self {
        self.admin = Some(admin);
        self
    }

    pub fn admin_opt(mut self, admin: Option<Admin>) -> Self {
        self.admin = admin;
        self
    }

    pub fn active_nav(mut self, nav: &'static str) -> Self {
        self.active_nav = Some(nav);
        self
    }

    fn nav_class(&self, nav: &str) -> &'static str {
        if self.active_nav == Some(nav) {
            "nav-link text-white fw-bold"
        } else {
            "nav-link text-white"
        }
    }
}

const PUBLIC_NAV: &[(&str, &str, &str)] = &[
    ("table", "/table", "Standings"),
    ("fixtures", "/fixtures", "Fixtures"),
    ("results", "/results", "Results"),
    ("teams", "/tournament-teams", "Teams"),
    ("rules", "/rules", "Rules"),
];

const ADMIN_NAV: &[(&str, &str, &str)] = &[
    ("dashboard", "/admin/dashboard", "Dashboard"),
    ("admin_tournaments", "/admin/tournaments", "Tournaments"),
    ("admin_teams", "/admin/teams", "Teams"),
    ("admin_matches", "/admin/matches", "Matches"),
];

impl<R: Renderable> Renderable for Page<R> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            html {
                head {
                    title { "Matchday" }
                    meta charset="utf-8";
                    meta
                        name="viewport"
                        content="width=device-width, initial-scale=1";
                    link
                        href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css"
                        rel="stylesheet";
                }
                body class="d-flex flex-column vh-100" {
                    nav class="navbar navbar-expand"
                        style="background-color: #1f5130;"
                        data-bs-theme="dark" {
                        div class="container-fluid" {
                            a class="navbar-brand text-white" href="/" {
                                "Matchday"
                            }
                            ul class="navbar-nav me-auto" {
                                @for (key, href, text) in PUBLIC_NAV {
                                    li class="nav-item" {
                                        a class=(self.nav_class(key)) href=(href) {
                                            (text)
                                        }
                                    }
                                }
                            }
                            ul class="navbar-nav" {
                                @if let Some(admin) = &self.admin {
                                    @for (key, href, text) in ADMIN_NAV {
                                        li class="nav-item" {
                                            a class=(self.nav_class(key)) href=(href) {
                                                (text)
                                            }
                                        }
                                    }
                                    li class="nav-item" {
                                        form method="post" action="/admin/logout" {
                                            button type="submit" class="btn btn-link nav-link text-white" {
                                                "Log out " (admin.username)
                                            }
                                        }
                                    }
                                } @else {
                                    li class="nav-item" {
                                        a class="nav-link text-white" href="/admin/login" {
                                            "Admin"
                                        }
                                    }
                                }
                            }
                        }
                    }
                    div class="flex-grow-1" {
                        @if let Some(body) = &self.body {
                            (body)
                        }
                    }
                }
            }
        }
        .render_to(buffer)
    }
}

impl<R: Renderable> Default for Page<R> {
    fn default() -> Self {
        Self {
            body: Default::default(),
            admin: Default::default(),
            active_nav: Default::default(),
        }
    }
}
