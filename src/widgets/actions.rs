use hypertext::prelude::*;

/// A row of links styled as buttons.
pub struct Actions<'r> {
    pub options: &'r [(&'r str, &'r str)],
}

impl<'r> Renderable for Actions<'r> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            div class = "row mt-3 mb-3" {
                @for (link, text) in self.options {
                    div class = "col-md-auto" {
                        a class="btn btn-primary"
                            href=(link) {
                            (text)
                        }
                    }
                }
            }
        }
        .render_to(buffer);
    }
}

/// A single button which submits an empty POST form. Used for actions which
/// modify state (deleting, toggling) so that they are never triggered by a
/// plain link.
pub struct PostButton<'r> {
    pub action: String,
    pub text: &'r str,
    pub class: &'r str,
}

impl Renderable for PostButton<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            form method="post" action=(self.action) class="d-inline" {
                button type="submit" class=(format!("btn btn-sm {}", self.class)) {
                    (self.text)
                }
            }
        }
        .render_to(buffer);
    }
}
