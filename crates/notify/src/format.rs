//! Renders a [`Listing`] into the Telegram broadcast message.
//!
//! All helpers are pure string transforms so the exact wire text stays easy
//! to pin down in tests. The broadcast uses Telegram HTML parse mode, so
//! source-controlled text is escaped before it lands in the template.

use chrono::{DateTime, Utc};

use gigwatch_core::{Listing, Pricing, Skill};

use crate::traits::{ActionButton, ChannelMessage, MessageFormat};

/// Highlight markers the search endpoint wraps around matched terms.
const HIGHLIGHT_MARKERS: [&str; 2] = ["H^", "^H"];

const APPLY_URL_BASE: &str = "https://www.upwork.com/freelance-jobs/apply/";
const SOURCE_SITE_URL: &str = "https://upwork.com";
const SOURCE_SITE_LABEL: &str = "upwork.com";
const TRUNCATION_MARKER: &str = "...";

/// The public search surface does not expose proposal counts, so the
/// broadcast shows the bracket every fresh listing starts in.
const PROPOSALS_LABEL: &str = "1 to 5";
/// Shown when the source did not provide a publication timestamp.
const FALLBACK_ELAPSED_LABEL: &str = "10 minutes ago";

/// Rendering knobs that come from configuration.
#[derive(Debug, Clone)]
pub struct MessageLimits {
    /// Character ceiling for the description block.
    pub description_max_chars: usize,
}

/// Remove highlight markers from source text.
pub fn strip_markers(text: &str) -> String {
    let mut out = text.to_string();
    for marker in HIGHLIGHT_MARKERS {
        out = out.replace(marker, "");
    }
    out
}

/// Turn a listing title into the slug segment of the apply link:
/// markers stripped, trimmed, whitespace runs collapsed to `-`, and a
/// trailing `_` separating slug from listing ref.
pub fn title_slug(title: &str) -> String {
    let cleaned = strip_markers(title);
    let mut slug = cleaned.trim().split_whitespace().collect::<Vec<_>>().join("-");
    slug.push('_');
    slug
}

/// Deep link to the listing's application page.
pub fn apply_url(title: &str, listing_ref: &str) -> String {
    format!("{APPLY_URL_BASE}{}{}", title_slug(title), listing_ref)
}

/// Escape text for Telegram HTML parse mode (`&`, `<`, `>`).
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Escape text for an HTML attribute value: the text entities plus `"`,
/// which would otherwise terminate the attribute.
pub fn escape_attr(text: &str) -> String {
    escape_html(text).replace('"', "&quot;")
}

/// Strip markers and cap the description, appending `...` when cut.
pub fn truncate_description(description: &str, max_chars: usize) -> String {
    let stripped = strip_markers(description);
    if stripped.chars().count() <= max_chars {
        return stripped;
    }
    let cut: String = stripped.chars().take(max_chars).collect();
    format!("{cut}{TRUNCATION_MARKER}")
}

/// Skill labels as space-separated hashtags, inner whitespace removed
/// (`Web Scraping` becomes `#WebScraping`).
pub fn hashtags(skills: &[Skill]) -> String {
    skills
        .iter()
        .map(|skill| format!("#{}", skill.label.split_whitespace().collect::<String>()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Budget line for the broadcast.
pub fn pricing_line(pricing: &Pricing) -> String {
    match pricing {
        Pricing::Hourly { min, max: Some(max) } => format!("Hourly: ${min} - ${max}"),
        Pricing::Hourly { min, max: None } => format!("Hourly: ${min}+"),
        Pricing::Fixed => "Fixed price".to_string(),
    }
}

/// Coarse "n units ago" label for the publication timestamp.
pub fn elapsed_label(published_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(published_at) = published_at else {
        return FALLBACK_ELAPSED_LABEL.to_string();
    };
    let elapsed = now.signed_duration_since(published_at);
    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        unit_label(minutes, "minute")
    } else if minutes < 60 * 24 {
        unit_label(elapsed.num_hours(), "hour")
    } else {
        unit_label(elapsed.num_days(), "day")
    }
}

fn unit_label(value: i64, unit: &str) -> String {
    if value == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{value} {unit}s ago")
    }
}

/// Render the broadcast message for one listing.
pub fn render_listing(listing: &Listing, limits: &MessageLimits) -> ChannelMessage {
    render_listing_at(listing, limits, Utc::now())
}

/// Deterministic variant of [`render_listing`] taking `now` explicitly.
pub fn render_listing_at(
    listing: &Listing,
    limits: &MessageLimits,
    now: DateTime<Utc>,
) -> ChannelMessage {
    let title = escape_html(&strip_markers(&listing.title));
    let url = apply_url(&listing.title, &listing.listing_ref);
    // The same URL goes out twice: raw as the button target (a JSON field)
    // and escaped where it sits inside an href attribute.
    let href = escape_attr(&url);
    let elapsed = elapsed_label(listing.published_at, now);
    let pricing = pricing_line(&listing.pricing);
    let description = escape_html(&truncate_description(
        &listing.description,
        limits.description_max_chars,
    ));
    let tags = hashtags(&listing.skills);

    let text = format!(
        "\nNew opportunity at: <a href=\"{SOURCE_SITE_URL}\">{SOURCE_SITE_LABEL}</a>\n\
         \n\
         🔔 <b><a href=\"{href}\">{title}</a></b>\n\
         \n\
         ⏱️  {elapsed}\n\
         \n\
         💲  {pricing}\n\
         \n\
         {description}\n\
         \n\
         📈 Proposals: {PROPOSALS_LABEL}\n\
         \n\
         {tags}\n"
    );

    ChannelMessage {
        text,
        format: MessageFormat::Html,
        disable_link_preview: true,
        buttons: vec![ActionButton { label: "Apply".to_string(), url }],
    }
}
