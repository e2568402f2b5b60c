//! # Rendering
//!
//! Layout (widths, truncation, padding) is computed on plain strings with
//! `unicode-width`; color is applied last and only when asked for, so the
//! render functions can be tested on their exact output.

use cmdb_attrs::api::SearchPage;
use cmdb_attrs::model::{AttributeFlags, AttributeView};
use colored::Colorize;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ID_WIDTH: usize = 6;
const NAME_WIDTH: usize = 24;
const ALIAS_WIDTH: usize = 24;
const TYPE_WIDTH: usize = 9;
const CHOICES_WIDTH: usize = 30;

pub fn render_search_page(page: &SearchPage, use_color: bool) -> String {
    if page.items.is_empty() {
        return format!("No attributes found ({} total).\n", page.total);
    }

    let mut out = String::new();
    let header = format!(
        "{}{}{}{}{}{}",
        pad("ID", ID_WIDTH),
        pad("NAME", NAME_WIDTH),
        pad("ALIAS", ALIAS_WIDTH),
        pad("TYPE", TYPE_WIDTH),
        pad("CHOICES", CHOICES_WIDTH),
        "FLAGS"
    );
    out.push_str(&paint(header.trim_end(), use_color, |s| s.bold().to_string()));
    out.push('\n');

    for view in &page.items {
        let attr = &view.attribute;
        let line = format!(
            "{}{}{}{}{}{}",
            pad(&attr.id.to_string(), ID_WIDTH),
            pad(&attr.name, NAME_WIDTH),
            pad(&attr.alias, ALIAS_WIDTH),
            pad(attr.value_type.as_str(), TYPE_WIDTH),
            pad(&choices(view), CHOICES_WIDTH),
            flag_names(&attr.flags).join(",")
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }

    let footer = format!("{} of {} attributes", page.items.len(), page.total);
    out.push_str(&paint(&footer, use_color, |s| s.dimmed().to_string()));
    out.push('\n');
    out
}

pub fn render_attribute(view: &AttributeView, use_color: bool) -> String {
    let attr = &view.attribute;
    let title = format!("{} {}", attr.id, attr.name);
    let flags = flag_names(&attr.flags);

    let mut out = paint(&title, use_color, |s| s.bold().to_string());
    out.push('\n');
    let rows = [
        ("alias", attr.alias.clone()),
        ("type", attr.value_type.to_string()),
        ("choices", choices(view)),
        ("flags", if flags.is_empty() { "-".to_string() } else { flags.join(", ") }),
        ("created", attr.created_at.format("%Y-%m-%d %H:%M").to_string()),
        ("updated", attr.updated_at.format("%Y-%m-%d %H:%M").to_string()),
    ];
    for (label, value) in rows {
        out.push_str(&format!("  {} {}\n", pad(label, 9), value));
    }
    out
}

pub fn print_success(message: &str) {
    println!("{}", message.green());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "Error:".red().bold(), message);
}

fn choices(view: &AttributeView) -> String {
    if view.choice_values.is_empty() {
        return "-".to_string();
    }
    view.choice_values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn flag_names(flags: &AttributeFlags) -> Vec<&'static str> {
    [
        (flags.is_index, "index"),
        (flags.is_list, "list"),
        (flags.is_uniq, "uniq"),
        (flags.is_link, "link"),
        (flags.is_password, "password"),
        (flags.is_sortable, "sortable"),
    ]
    .into_iter()
    .filter_map(|(set, name)| set.then_some(name))
    .collect()
}

fn paint(s: &str, use_color: bool, style: impl Fn(&str) -> String) -> String {
    if use_color {
        style(s)
    } else {
        s.to_string()
    }
}

/// Truncate to `width` display columns (minus one for the gap) and pad.
fn pad(s: &str, width: usize) -> String {
    let cell = truncate_to_width(s, width.saturating_sub(1));
    let fill = width.saturating_sub(cell.width());
    format!("{}{}", cell, " ".repeat(fill))
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;
    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result.push('…');
    result
}
