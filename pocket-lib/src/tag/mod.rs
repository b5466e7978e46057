mod handlers;

use actix_web::{web, Scope};

pub fn tag_service() -> Scope {
    web::scope("/tags")
        .service(handlers::get_tags)
        .service(handlers::create_tag)
        .service(handlers::update_tag)
        .service(handlers::delete_tag)
}

/// Lowercases, turns whitespace runs into `-` and drops anything outside `[a-z0-9_-]`
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() {
            pending_dash = true;
            continue;
        }
        if !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-') {
            continue;
        }
        if pending_dash && !slug.is_empty() {
            slug.push('-');
        }
        pending_dash = false;
        slug.push(c);
    }
    slug
}
