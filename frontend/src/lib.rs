//! Server-side HTML for the task list page.
//!
//! Pages are built with sauron's node builders and rendered to a string;
//! nothing here talks to the database. `render_to_string` writes text and
//! attribute values verbatim, so anything not written in this file goes
//! through [`user_text`] or [`user_attr`] first.

use html_escape::{encode_double_quoted_attribute, encode_text};
use listy_shared::{Task, ValidationError};
use sauron::{
    html::{attributes::*, *},
    prelude::*,
};

const STYLESHEET: &str = "\
body{font-family:system-ui,sans-serif;background:#1e1e2e;color:#cdd6f4;margin:0}\
.page{max-width:40rem;margin:0 auto;padding:2rem 1.5rem}\
ul{list-style:none;padding:0}\
li{display:flex;justify-content:space-between;padding:.6rem .8rem;margin-bottom:.5rem;background:#313244;border-radius:.5rem}\
a{color:#f38ba8;text-decoration:none}\
input{padding:.5rem;border-radius:.4rem;border:1px solid #45475a;background:#181825;color:#cdd6f4}\
button{padding:.5rem 1rem;border:0;border-radius:.4rem;background:#89b4fa;color:#1e1e2e}\
.error{color:#f38ba8;margin:.4rem 0}\
.empty{color:#a6adc8;font-style:italic}";

/// The list + create form page served at `/`.
#[derive(Debug, Default)]
pub struct IndexPage<'a> {
    tasks: &'a [Task],
    label: &'a str,
    error: Option<&'a ValidationError>,
}

impl<'a> IndexPage<'a> {
    pub fn new(tasks: &'a [Task]) -> Self {
        Self {
            tasks,
            label: "",
            error: None,
        }
    }

    /// Re-render the form with the rejected input and its validation error.
    pub fn with_error(mut self, label: &'a str, error: &'a ValidationError) -> Self {
        self.label = label;
        self.error = Some(error);
        self
    }

    pub fn render(&self) -> String {
        document("Listy", self.view())
    }

    fn view(&self) -> Node<()> {
        div(
            [class("page")],
            [
                h1([], [text("Listy")]),
                self.view_create_form(),
                self.view_task_list(),
            ],
        )
    }

    fn view_create_form(&self) -> Node<()> {
        form(
            [attr("method", "post"), attr("action", "/")],
            [
                label([attr("for", "label")], [text("New task ")]),
                input(
                    [
                        r#type("text"),
                        id("label"),
                        attr("name", "label"),
                        placeholder("What needs doing?"),
                        attr("value", user_attr(self.label)),
                    ],
                    [],
                ),
                button([r#type("submit")], [text("Add")]),
                match self.error {
                    Some(err) => p([class("error")], [user_text(&err.to_string())]),
                    None => span([], []),
                },
            ],
        )
    }

    fn view_task_list(&self) -> Node<()> {
        if self.tasks.is_empty() {
            return p([class("empty")], [text("Nothing to do.")]);
        }
        ul(
            [class("tasks")],
            self.tasks.iter().map(view_task).collect::<Vec<_>>(),
        )
    }
}

fn view_task(task: &Task) -> Node<()> {
    li(
        [],
        [
            span([class("name")], [user_text(&task.name)]),
            a(
                [
                    href(user_attr(&format!("/delete/{}", task.id))),
                    attr("title", "Delete"),
                ],
                [text("delete")],
            ),
        ],
    )
}

/// A bare page for error responses (503, 500).
pub fn error_page(heading: &str, message: &str) -> String {
    document(
        heading,
        div(
            [class("page")],
            [h1([], [user_text(heading)]), p([], [user_text(message)])],
        ),
    )
}

/// Escaped text node.
fn user_text(s: &str) -> Node<()> {
    text(encode_text(s))
}

/// Escaped value for a double-quoted attribute.
fn user_attr(s: &str) -> String {
    encode_double_quoted_attribute(s).into_owned()
}

/// Wrap `content` in the document shell. `page_title` must be static text.
fn document(page_title: &str, content: Node<()>) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <title>{}</title><style>{}</style></head><body>{}</body></html>",
        page_title,
        STYLESHEET,
        content.render_to_string()
    )
}
