use hypertext::prelude::*;

use crate::tournaments::Tournament;

/// A GET form which reloads `action` with `?tournament=<id>`.
pub struct TournamentSelector<'r> {
    pub action: &'r str,
    pub tournaments: &'r [Tournament],
    pub selected: Option<i32>,
    /// Offer an "All tournaments" entry (an empty `tournament` parameter).
    pub include_all: bool,
}

impl Renderable for TournamentSelector<'_> {
    fn render_to(
        &self,
        buffer: &mut hypertext::Buffer<hypertext::context::Node>,
    ) {
        maud! {
            form method="get" action=(self.action) class="row g-2 align-items-center mb-4" {
                div class="col-auto" {
                    label for="tournament" class="col-form-label" { "Tournament" }
                }
                div class="col-auto" {
                    select class="form-select" id="tournament" name="tournament" {
                        @if self.include_all {
                            option value="" { "All tournaments" }
                        } @else if self.selected.is_none() {
                            option value="" selected { "Select a tournament" }
                        }
                        @for tournament in self.tournaments {
                            @if Some(tournament.id) == self.selected {
                                option value=(tournament.id) selected { (tournament.name) }
                            } @else {
                                option value=(tournament.id) { (tournament.name) }
                            }
                        }
                    }
                }
                div class="col-auto" {
                    button type="submit" class="btn btn-outline-primary" { "Show" }
                }
            }
        }
        .render_to(buffer);
    }
}
