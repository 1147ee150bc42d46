use hypertext::prelude::*;

pub struct ErrorAlert<S> {
    pub msg: S,
}

impl<S: ToString> Renderable for ErrorAlert<S> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud!({
            div class="alert alert-danger" role="alert" {
                (self.msg.to_string())
            }
        })
        .render_to(buffer);
    }
}

/// Renders an [`ErrorAlert`] if there is an error to show.
pub struct MaybeError<'a> {
    pub error: Option<&'a str>,
}

impl Renderable for MaybeError<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud!({
            @if let Some(error) = self.error {
                ErrorAlert msg=(error);
            }
        })
        .render_to(buffer);
    }
}
