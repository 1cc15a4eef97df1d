use anyhow::Result;
use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::{
    db::driver::Db,
    models::{GridRow, GridVariant, Projection},
    repository,
};

pub const PAGE_TITLE: &str = "TODO CRUD";
pub const EMPTY_WARNING: &str = "No TODOs, add above";

// htmx drops 4xx/5xx bodies by default; route them into `#flash` instead and
// clear it again on the next successful swap
const SWAP_ERRORS_JS: &str = r#"
document.body.addEventListener("htmx:beforeSwap", function (evt) {
    var flash = document.getElementById("flash");
    if (evt.detail.xhr.status >= 400) {
        evt.detail.shouldSwap = true;
        evt.detail.isError = false;
        evt.detail.target = flash;
    } else {
        flash.innerHTML = "";
    }
});
"#;

/// Result of one render pass over the `#app` region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderPass {
    /// Nothing stored: show the warning and stop before the grid.
    Empty,
    Grid(Projection),
}

pub fn render_app(db: &Db, variant: GridVariant) -> Result<RenderPass> {
    let projection = Projection::build(repository::list(db)?, variant);
    if projection.is_empty() {
        return Ok(RenderPass::Empty);
    }
    Ok(RenderPass::Grid(projection))
}

// === Layout ===
pub fn page(app: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { "✅ " (PAGE_TITLE) }
                script src="https://unpkg.com/htmx.org@1.9.10" {}
                script src="https://cdn.tailwindcss.com" {}
            }
            body class="bg-gray-100 font-sans leading-normal tracking-normal" {
                div class="container mx-auto max-w-3xl p-8" {
                    h1 class="text-4xl text-gray-700 mb-2" { "🧗 " (PAGE_TITLE) }
                    hr class="h-1 mb-6 border-0 bg-gradient-to-r from-red-400 via-yellow-400 to-purple-500";
                    div id="flash" class="mb-4" {}
                    div id="app" {
                        (app)
                    }
                }
                script { (PreEscaped(SWAP_ERRORS_JS)) }
            }
        }
    }
}

// everything below the header, swapped wholesale on every interaction
pub fn app_html(pass: &RenderPass) -> Markup {
    html! {
        (controls_html())
        @match pass {
            RenderPass::Empty => {
                div class="mt-6 rounded bg-yellow-100 text-yellow-800 p-4" role="alert" { (EMPTY_WARNING) }
            }
            RenderPass::Grid(projection) => {
                (grid_html(projection))
            }
        }
    }
}

// === Components ===
fn controls_html() -> Markup {
    html! {
        div class="flex gap-2 items-start" {
            button class="bg-white hover:bg-gray-200 rounded shadow py-2 px-4" hx-get="/app" hx-target="#app" {
                "⟳ Refresh"
            }
            details class="relative" {
                summary class="list-none cursor-pointer bg-white hover:bg-gray-200 rounded shadow py-2 px-4" { "➕ New" }
                div class="absolute z-10 mt-2 w-72 bg-white rounded-lg shadow-lg p-4" {
                    (new_todo_html())
                }
            }
        }
    }
}

// the add form; empty titles go through untouched
fn new_todo_html() -> Markup {
    html! {
        form hx-post="/todos" hx-target="#app" aria-label="Add TODO" {
            label class="block text-gray-700 mb-1" for="new-title" { "Title" }
            input id="new-title" class="w-full rounded border p-2 mb-3" type="text" name="title";
            button class="bg-blue-500 hover:bg-blue-700 text-white font-bold py-2 px-4 rounded" type="submit" { "Submit" }
        }
    }
}

fn cell_name(position: usize, field: &str) -> String {
    format!("rows[{position}].{field}")
}

fn grid_html(projection: &Projection) -> Markup {
    let variant = projection.variant;
    html! {
        form id="grid" class="mt-6" hx-post="/grid" hx-trigger="change" hx-target="#app" {
            table class="w-full bg-white rounded-lg shadow-lg" {
                thead {
                    tr class="text-left text-gray-700" {
                        th class="p-2" { (variant.title_label()) }
                        th class="p-2" { (variant.completed_label()) }
                        @if variant.has_delete() {
                            th class="p-2" { (variant.delete_label()) }
                        }
                    }
                }
                tbody {
                    @for row in &projection.rows {
                        (row_html(row, variant))
                    }
                }
            }
        }
    }
}

fn row_html(row: &GridRow, variant: GridVariant) -> Markup {
    let position = row.position;
    html! {
        tr class="border-t" {
            td class="p-2" {
                input type="hidden" name=(cell_name(position, "id")) value=(row.id);
                input class="w-full rounded p-1" type="text" name=(cell_name(position, "title")) value=(row.title);
            }
            td class="p-2" {
                @match variant {
                    GridVariant::Deletable => {
                        input type="checkbox" name=(cell_name(position, "completed")) checked[row.completed];
                    }
                    GridVariant::Plain => {
                        input class="w-20 rounded p-1" type="number" min="0" max="1" step="1"
                            name=(cell_name(position, "completed")) value=(u8::from(row.completed));
                    }
                }
            }
            @if variant.has_delete() {
                td class="p-2" {
                    input type="checkbox" name=(cell_name(position, "delete")) checked[row.delete];
                }
            }
        }
    }
}
