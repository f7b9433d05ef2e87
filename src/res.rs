//! Page fragments under `res/`, filled in by placeholder replacement.
//!
//! Everything that reaches a template goes through [`escape`] or
//! [`markdown`], both of which also neutralise `{` so user text can never
//! complete a placeholder.

use axum::response::Html;

use crate::{
    db::{Category, Joke},
    listing::{ListedJoke, Neighbors, Order},
};

#[macro_export]
macro_rules! include_res {
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

pub const SITE_TITLE: &str = "Jokes.pw";

pub fn escape(text: &str) -> String {
    html_escape::encode_safe(text).replace('{', "&#123;")
}

/// Renders joke text as markdown, with any raw html shown as text.
pub fn markdown(text: &str) -> String {
    use pulldown_cmark::{Event, Parser};

    let parser = Parser::new(text).map(|event| match event {
        Event::Html(html) | Event::InlineHtml(html) => Event::Text(html),
        _ => event,
    });

    let mut html_output = String::new();
    pulldown_cmark::html::push_html(&mut html_output, parser);
    html_output.replace('{', "&#123;")
}

pub fn page(title: &str, categories: &[Category], body: &str) -> Html<String> {
    let nav: String = categories
        .iter()
        .map(|c| format!(r#"<a href="/jokes/{}">{}</a>"#, escape(&c.slug), escape(&c.name)))
        .collect::<Vec<_>>()
        .join(" ");

    Html(
        include_res!(str, "/pages/layout.html")
            .replace("{title}", &escape(title))
            .replace("{categories}", &nav)
            .replace("{body}", body),
    )
}

pub fn message(heading: &str, text: &str) -> String {
    include_res!(str, "/pages/message.html")
        .replace("{heading}", &escape(heading))
        .replace("{text}", &escape(text))
}

pub fn not_found() -> Html<String> {
    page(
        &format!("Not found | {SITE_TITLE}"),
        &[],
        include_res!(str, "/pages/not_found.html"),
    )
}

pub fn joke_item(item: &ListedJoke) -> String {
    let reply = match &item.joke.reply {
        Some(reply) => format!(r#"<div class="reply">{}</div>"#, markdown(reply)),
        None => String::new(),
    };

    include_res!(str, "/pages/joke_item.html")
        .replace("{id}", &item.joke.id.to_string())
        .replace("{likes}", &item.joke.like_count.to_string())
        .replace("{liked}", if item.liked { "disabled" } else { "" })
        .replace("{category_slug}", &escape(&item.category.slug))
        .replace("{category_name}", &escape(&item.category.name))
        .replace("{reply}", &reply)
        .replace("{text}", &markdown(&item.joke.text))
}

pub fn joke_list(jokes: &[ListedJoke]) -> String {
    if jokes.is_empty() {
        return r#"<p class="empty">No jokes here yet.</p>"#.to_owned();
    }
    jokes.iter().map(joke_item).collect()
}

pub fn joke_page(item: &ListedJoke, neighbors: &Neighbors) -> String {
    let link = |joke: &Option<Joke>, label: &str| match joke {
        Some(joke) => format!(r#"<a href="/joke/{}">{label}</a>"#, joke.id),
        None => String::new(),
    };

    include_res!(str, "/pages/joke_page.html")
        .replace("{prev}", &link(&neighbors.prev, "&larr; previous"))
        .replace("{next}", &link(&neighbors.next, "next &rarr;"))
        .replace("{joke}", &joke_item(item))
}

pub fn category_page(category: &Category, order: Order, jokes: &[ListedJoke]) -> String {
    let orders = [
        (Order::MostLiked, "most liked"),
        (Order::Newest, "newest"),
        (Order::Oldest, "oldest"),
        (Order::Random, "random"),
    ]
    .iter()
    .map(|(o, label)| {
        if *o == order {
            format!("<strong>{label}</strong>")
        } else {
            format!(
                r#"<a href="/jokes/{}?orderby={}">{label}</a>"#,
                escape(&category.slug),
                o.as_param()
            )
        }
    })
    .collect::<Vec<_>>()
    .join(" · ");

    include_res!(str, "/pages/category.html")
        .replace("{orders}", &orders)
        .replace("{name}", &escape(&category.name))
        .replace("{jokes}", &joke_list(jokes))
}
