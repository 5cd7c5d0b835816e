use hypertext::{Rendered, prelude::*};

use crate::{
    categories::{self, CATEGORIES},
    models::Film,
    search::{EmptyState, Listing},
};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";
const SITE_NAME: &str = "Snowboard Films";

pub fn index_page(listing: &Listing) -> Rendered<String> {
    let query = listing.query.clone().unwrap_or_default();
    let empty_message = listing.empty_state().map(|state| match state {
        EmptyState::NoFilms => "No films yet.".to_string(),
        EmptyState::NoMatch => format!("No result found for \"{query}\""),
        EmptyState::EmptyCategory => "No films in this category.".to_string(),
    });
    let selected = listing.category.as_deref();

    layout(
        SITE_NAME,
        maud! {
            div class="max-w-6xl mx-auto px-6 py-10" {
                header {
                    h1 class="text-3xl font-bold text-gray-900" { (SITE_NAME) }
                    p class="mt-2 text-gray-600" { "A collection of ski and snowboard films, edits and clips." }
                }

                form class="mt-8 flex gap-2" method="get" action="/" {
                    input class="w-full rounded-md border border-gray-300 px-3 py-2" type="search" name="search" value=(query) placeholder="Search films";
                    @if let Some(category) = selected {
                        input type="hidden" name="categories" value=(category);
                    }
                    button class="rounded-md bg-gray-900 px-4 py-2 font-semibold text-white" type="submit" { "Search" }
                }

                nav class="mt-6 flex flex-wrap gap-2" {
                    a class="rounded-full bg-white px-3 py-1 text-sm text-gray-700 shadow" href=(filter_href(&query, None)) { "All" }
                    @for category in CATEGORIES {
                        a class=(format!("rounded-full px-3 py-1 text-sm {}", category.variant.badge_class())) href=(filter_href(&query, Some(category.value))) {
                            (category.label)
                            @if selected == Some(category.value) { " ✓" }
                        }
                    }
                }

                @if let Some(message) = &empty_message {
                    p class="mt-10 text-sm text-gray-500" { (message) }
                }

                div class="mt-8 grid gap-4 sm:grid-cols-2 lg:grid-cols-3" {
                    @for film in &listing.films {
                        a class="block bg-white shadow rounded-lg overflow-hidden hover:shadow-md" href=(format!("/films/{}", film.id)) {
                            @if let Some(thumbnail) = &film.thumbnail {
                                img class="w-full aspect-video object-cover" src=(thumbnail) alt=(film.title);
                            }
                            div class="p-4" {
                                h2 class="font-semibold text-gray-900" { (film.title) }
                                @if let Some(author) = &film.author {
                                    p class="mt-1 text-sm text-gray-500" { (author) }
                                }
                                div class="mt-3 flex flex-wrap gap-1" {
                                    @for value in &film.categories {
                                        span class=(badge_class(value)) { (category_label(value)) }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn film_page(film: &Film) -> Rendered<String> {
    let published = film.published_at.map(|d| d.strftime("%Y-%m-%d").to_string());

    layout(
        &film.title,
        maud! {
            div class="max-w-3xl mx-auto px-6 py-10" {
                a class="text-sm text-blue-600 hover:text-blue-800" href="/" { "Back" }
                h1 class="mt-4 text-3xl font-bold text-gray-900" { (film.title) }
                @if let Some(author) = &film.author {
                    p class="mt-2 text-gray-600" { (author) }
                }
                @if let Some(thumbnail) = &film.thumbnail {
                    img class="mt-6 w-full rounded-lg" src=(thumbnail) alt=(film.title);
                }
                div class="mt-4 flex flex-wrap gap-4 text-sm text-gray-500" {
                    @if let Some(date) = &published { span { (date) } }
                    @if let Some(views) = film.view_count { span { (views) " views" } }
                    @if let Some(likes) = film.like_count { span { (likes) " likes" } }
                }
                div class="mt-3 flex flex-wrap gap-1" {
                    @for value in &film.categories {
                        span class=(badge_class(value)) { (category_label(value)) }
                    }
                }
                @if let Some(description) = &film.description {
                    p class="mt-6 whitespace-pre-line text-gray-700" { (description) }
                }
                a class="mt-6 inline-block rounded-md bg-gray-900 px-4 py-2 font-semibold text-white" href=(film.url) target="_blank" rel="noopener noreferrer" { "Watch" }
            }
        },
    )
}

pub fn message_page(title: &str, message: &str) -> Rendered<String> {
    layout(
        title,
        maud! {
            div class="max-w-xl mx-auto px-6 py-16" {
                div class="bg-white shadow rounded-lg p-8" {
                    h1 class="text-2xl font-bold text-gray-900" { (title) }
                    p class="mt-4 text-gray-700" { (message) }
                    a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/" { "Back" }
                }
            }
        },
    )
}

fn layout(title: &str, body: impl Renderable) -> Rendered<String> {
    maud! {
        !DOCTYPE
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                script src=(TAILWIND_CDN) {}
            }
            body class="min-h-screen bg-gray-50" { (body) }
        }
    }
    .render()
}

fn filter_href(query: &str, category: Option<&str>) -> String {
    let mut params = Vec::new();
    if !query.is_empty() {
        params.push(format!("search={}", urlencoding::encode(query)));
    }
    if let Some(category) = category {
        params.push(format!("categories={}", urlencoding::encode(category)));
    }
    if params.is_empty() { "/".to_string() } else { format!("/?{}", params.join("&")) }
}

fn badge_class(value: &str) -> String {
    let colors = categories::find(value).map_or("bg-gray-100 text-gray-800", |c| c.variant.badge_class());
    format!("rounded-full px-2 py-0.5 text-xs {colors}")
}

fn category_label(value: &str) -> &str {
    categories::find(value).map_or(value, |c| c.label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::{FilmQuery, apply};

    fn film() -> Film {
        Film {
            id: 7,
            title: "Park Laps".into(),
            url: "https://youtu.be/dQw4w9WgXcQ".into(),
            description: None,
            thumbnail: None,
            published_at: None,
            author: Some("Ski Co".into()),
            view_count: Some(12),
            like_count: None,
            categories: vec!["Tools".into()],
            created_by: "u1".into(),
            created_at: jiff::Timestamp::UNIX_EPOCH,
            updated_at: jiff::Timestamp::UNIX_EPOCH,
        }
    }

    #[test]
    fn index_lists_films() {
        let html = index_page(&apply(vec![film()], &FilmQuery::default())).into_inner();
        assert!(html.contains("Park Laps"));
        assert!(html.contains("/films/7"));
        assert!(!html.contains("No films yet."));
    }

    #[test]
    fn index_tells_empty_store_from_no_match() {
        let html = index_page(&apply(vec![], &FilmQuery::default())).into_inner();
        assert!(html.contains("No films yet."));

        let q = FilmQuery { search: Some("powder".into()), category: None };
        let html = index_page(&apply(vec![film()], &q)).into_inner();
        assert!(html.contains("No result found for"));
        assert!(!html.contains("No films yet."));
    }

    #[test]
    fn filter_links_keep_the_query() {
        assert_eq!(filter_href("", None), "/");
        assert_eq!(filter_href("ski trip", Some("my-stuff")), "/?search=ski%20trip&categories=my-stuff");
    }
}
