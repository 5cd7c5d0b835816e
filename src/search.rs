//! Search, ranking and category filtering for the film listing.

use serde::Serialize;

use crate::models::Film;

/// Which field matched the query, best first.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Relevance {
    Title,
    Author,
    Url,
    Category,
}

#[derive(Clone, Debug, Default)]
pub struct FilmQuery {
    pub search: Option<String>,
    pub category: Option<String>,
}

impl FilmQuery {
    /// Reads `search` and `categories` from raw query pairs. Only the first value of
    /// a repeated key counts and unknown keys are ignored.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = FilmQuery::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "search" => &mut query.search,
                "categories" => &mut query.category,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyState {
    /// The store holds no films at all.
    NoFilms,
    /// Films exist but none match the search query.
    NoMatch,
    /// Films exist but none carry the selected category.
    EmptyCategory,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub films: Vec<Film>,
    /// Number of films before any filtering.
    pub total: usize,
    pub query: Option<String>,
    pub category: Option<String>,
}

impl Listing {
    pub fn empty_state(&self) -> Option<EmptyState> {
        if !self.films.is_empty() {
            return None;
        }
        Some(if self.total == 0 {
            EmptyState::NoFilms
        } else if self.query.is_some() {
            EmptyState::NoMatch
        } else {
            EmptyState::EmptyCategory
        })
    }
}

/// Trims and lower-cases a query. Blank queries count as absent.
pub fn normalize_query(raw: Option<&str>) -> Option<String> {
    raw.map(|q| q.trim().to_lowercase()).filter(|q| !q.is_empty())
}

/// Best relevance tier for `film`, or `None` if nothing matches. `query` must be normalized.
pub fn relevance(film: &Film, query: &str) -> Option<Relevance> {
    let contains = |s: &str| s.to_lowercase().contains(query);

    if contains(&film.title) {
        Some(Relevance::Title)
    } else if film.author.as_deref().is_some_and(contains) {
        Some(Relevance::Author)
    } else if contains(&film.url) {
        Some(Relevance::Url)
    } else if film.categories.iter().any(|c| contains(c)) {
        Some(Relevance::Category)
    } else {
        None
    }
}

/// Keeps matching films ordered by tier. Order within a tier is preserved.
pub fn search(films: Vec<Film>, query: &str) -> Vec<Film> {
    let mut ranked: Vec<(Relevance, Film)> =
        films.into_iter().filter_map(|f| relevance(&f, query).map(|r| (r, f))).collect();
    ranked.sort_by_key(|(r, _)| *r);
    ranked.into_iter().map(|(_, f)| f).collect()
}

/// Exact category membership. Order is preserved.
pub fn filter_by_category(films: Vec<Film>, category: &str) -> Vec<Film> {
    films.into_iter().filter(|f| f.categories.iter().any(|c| c == category)).collect()
}

pub fn apply(films: Vec<Film>, params: &FilmQuery) -> Listing {
    let total = films.len();
    let query = normalize_query(params.search.as_deref());
    let category =
        params.category.as_deref().map(str::trim).filter(|c| !c.is_empty()).map(str::to_string);

    let mut films = films;
    if let Some(q) = &query {
        films = search(films, q);
    }
    if let Some(c) = &category {
        films = filter_by_category(films, c);
    }

    Listing { films, total, query, category }
}
