//! Plain-text rendering of a `ListView`.

use std::fmt::Write;

use catalog_core::{Character, ListView};

const DESCRIPTION_WIDTH: usize = 60;

pub fn render(view: &ListView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", header(view));
    if !view.found_any || view.page.characters.is_empty() {
        let _ = writeln!(out, "  No characters found.");
        return out;
    }
    for character in &view.page.characters {
        let _ = writeln!(
            out,
            "  {:>8}  {:<30} {}",
            character.id,
            character.name,
            summary(&character.description)
        );
    }
    out
}

fn header(view: &ListView) -> String {
    let search = if view.search.is_empty() {
        String::new()
    } else {
        format!(" matching \"{}\"", view.search)
    };
    match view.visible_range() {
        Some((first, last)) => format!(
            "Page {} of {} - showing {first}-{last} of {}{search}",
            view.current_page, view.total_pages, view.page.total
        ),
        None => format!("Page {} of {}{search}", view.current_page, view.total_pages),
    }
}

fn summary(description: &str) -> String {
    if description.chars().count() <= DESCRIPTION_WIDTH {
        return description.to_string();
    }
    let cut: String = description.chars().take(DESCRIPTION_WIDTH - 3).collect();
    format!("{cut}...")
}

/// Detail block shown before the save/delete/cancel prompt.
pub fn detail(character: &Character) -> String {
    let description = if character.description.is_empty() {
        "No description available"
    } else {
        &character.description
    };
    format!(
        "Character Details\n  Name: {}\n  {}\n  Image: {}\n",
        character.name, description, character.thumbnail
    )
}
