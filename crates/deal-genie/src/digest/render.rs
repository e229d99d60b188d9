use std::fmt::{self, Write};

use chrono::{DateTime, Utc};

use super::domain::{DigestEmail, Subscriber};
use crate::personalization::explanation::format_currency;
use crate::personalization::{RecommendationSet, ScoredRecommendation};

/// Render subject, HTML and plain-text bodies for one subscriber.
pub fn render_email(
    subscriber: &Subscriber,
    picks: &RecommendationSet,
    sender: &str,
    now: DateTime<Utc>,
) -> Result<DigestEmail, fmt::Error> {
    Ok(DigestEmail {
        to: subscriber.email.clone(),
        from: sender.to_string(),
        subject: subject(picks.recommendations.len(), now),
        html_body: html_body(subscriber, picks)?,
        text_body: text_body(subscriber, picks)?,
    })
}

fn subject(count: usize, now: DateTime<Utc>) -> String {
    let noun = if count == 1 { "deal" } else { "deals" };
    format!(
        "Your Genie Picks: {count} new {noun} for the week of {}",
        now.format("%b %-d, %Y")
    )
}

fn greeting(subscriber: &Subscriber) -> &str {
    subscriber
        .first_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("there")
}

fn html_body(subscriber: &Subscriber, picks: &RecommendationSet) -> Result<String, fmt::Error> {
    let mut html = String::new();
    writeln!(html, "<html><body>")?;
    writeln!(html, "<h1>Hi {},</h1>", escape_html(greeting(subscriber)))?;
    writeln!(
        html,
        "<p>{}</p>",
        escape_html(&picks.explanation.reasoning_text)
    )?;
    writeln!(html, "<ol>")?;
    for pick in &picks.recommendations {
        writeln!(
            html,
            "<li><strong>{}</strong> ({}) &middot; {}/100<br/>{}</li>",
            escape_html(&pick.property.address),
            escape_html(&price_label(pick)),
            score_label(pick),
            escape_html(&pick.match_reason)
        )?;
    }
    writeln!(html, "</ol>")?;
    writeln!(
        html,
        "<p>You are receiving this because you opted into weekly Genie Picks.</p>"
    )?;
    write!(html, "</body></html>")?;
    Ok(html)
}

fn text_body(subscriber: &Subscriber, picks: &RecommendationSet) -> Result<String, fmt::Error> {
    let mut text = String::new();
    writeln!(text, "Hi {},", greeting(subscriber))?;
    writeln!(text)?;
    writeln!(text, "{}", picks.explanation.reasoning_text)?;
    writeln!(text)?;
    for (idx, pick) in picks.recommendations.iter().enumerate() {
        writeln!(
            text,
            "{}. {} ({}) - {}/100: {}",
            idx + 1,
            pick.property.address,
            price_label(pick),
            score_label(pick),
            pick.match_reason
        )?;
    }
    writeln!(text)?;
    write!(
        text,
        "You are receiving this because you opted into weekly Genie Picks."
    )?;
    Ok(text)
}

fn price_label(pick: &ScoredRecommendation) -> String {
    pick.property
        .attributes
        .price
        .map(format_currency)
        .unwrap_or_else(|| "price on request".to_string())
}

fn score_label(pick: &ScoredRecommendation) -> String {
    format!("{:.0}", pick.match_score)
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
