//! Rendering projection - what the presentation layer is allowed to see.
//!
//! Every title and content string passes through a [`Sanitizer`] before it is
//! placed in a view.

use std::fmt::Write as _;
use std::str::FromStr;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::domain::{Post, PostId};
use crate::error::PostError;

/// Turns raw post text into something safe for a particular display.
pub trait Sanitizer {
    fn sanitize(&self, raw: &str) -> String;
}

/// Escapes text for inclusion in HTML element content or quoted attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSanitizer;

impl Sanitizer for HtmlSanitizer {
    fn sanitize(&self, raw: &str) -> String {
        escape_html(raw)
    }
}

/// Escape `&`, `<`, `>`, `"` and `'`, and turn newlines into `<br>`.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\n' => out.push_str("<br>"),
            c => out.push(c),
        }
    }
    out
}

/// Strips control characters so post text cannot drive the terminal.
///
/// Newlines are kept and continuation lines are indented by `indent` spaces.
#[derive(Debug, Clone, Copy)]
pub struct TerminalSanitizer {
    pub indent: usize,
}

impl Default for TerminalSanitizer {
    fn default() -> Self {
        Self { indent: 2 }
    }
}

impl Sanitizer for TerminalSanitizer {
    fn sanitize(&self, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        for c in raw.chars() {
            match c {
                '\n' => {
                    out.push('\n');
                    out.extend(std::iter::repeat_n(' ', self.indent));
                }
                '\t' => out.push('\t'),
                c if c.is_control() => {}
                c => out.push(c),
            }
        }
        out
    }
}

/// Format used when no valid timestamp format is configured.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Time zone rendered timestamps are shown in. Storage is always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayZone {
    Utc,
    #[default]
    Local,
}

impl FromStr for DisplayZone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "utc" => Ok(Self::Utc),
            "local" => Ok(Self::Local),
            other => Err(format!("unknown time zone {other:?}, expected utc or local")),
        }
    }
}

/// Whether `format` is a strftime string `chrono` can render.
pub fn is_valid_timestamp_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Render `at` for display. An unusable `format` falls back to
/// [`DEFAULT_TIMESTAMP_FORMAT`].
pub fn format_timestamp(at: DateTime<Utc>, format: &str, zone: DisplayZone) -> String {
    let format = if is_valid_timestamp_format(format) {
        format
    } else {
        DEFAULT_TIMESTAMP_FORMAT
    };

    let mut out = String::new();
    let written = match zone {
        DisplayZone::Utc => write!(out, "{}", at.format(format)),
        DisplayZone::Local => write!(out, "{}", at.with_timezone(&Local).format(format)),
    };
    match written {
        Ok(()) => out,
        Err(_) => at.to_rfc3339(),
    }
}

/// One post, ready to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostView {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub created_at: String,
    pub published: bool,
    pub status_label: &'static str,
    pub toggle_label: &'static str,
}

/// The visible list plus its count line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostListView {
    pub count: usize,
    pub count_label: String,
    pub items: Vec<PostView>,
}

impl PostListView {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Build a list view from already-filtered posts.
pub fn project<'a, S: Sanitizer + ?Sized>(
    posts: impl Iterator<Item = &'a Post>,
    sanitizer: &S,
    timestamp_format: &str,
    zone: DisplayZone,
) -> PostListView {
    let items: Vec<PostView> = posts
        .map(|post| PostView {
            id: post.id,
            title: sanitizer.sanitize(&post.title),
            content: sanitizer.sanitize(&post.content),
            created_at: format_timestamp(post.created_at, timestamp_format, zone),
            published: post.published,
            status_label: if post.published { "Published" } else { "Draft" },
            toggle_label: if post.published { "Unpublish" } else { "Publish" },
        })
        .collect();

    PostListView {
        count: items.len(),
        count_label: format!("{} post(s)", items.len()),
        items,
    }
}

/// Markup for a list view. The view must have been built with [`HtmlSanitizer`].
pub fn html_fragment(view: &PostListView) -> String {
    let mut html = String::new();
    for item in &view.items {
        // Writing to a String cannot fail.
        let _ = write!(
            html,
            r#"
      <article class="post" data-id="{id}">
        <h3>{title}</h3>
        <small>{created} • {status}</small>
        <p>{content}</p>
        <div class="actions">
          <button class="editBtn">✏️ Edit</button>
          <button class="deleteBtn">🗑️ Delete</button>
          <button class="togglePubBtn">{toggle}</button>
        </div>
      </article>"#,
            id = item.id,
            title = item.title,
            created = escape_html(&item.created_at),
            status = item.status_label,
            content = item.content,
            toggle = item.toggle_label,
        );
    }
    html
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn saved() -> Self {
        Self::info("Post saved successfully!")
    }

    pub fn from_error(err: &PostError) -> Self {
        let level = match err {
            PostError::Validation(_) => NoticeLevel::Error,
            PostError::NotFound(_) | PostError::Persistence(_) => NoticeLevel::Warning,
        };
        Self {
            level,
            message: err.user_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn post(id: u64, title: &str, content: &str, published: bool) -> Post {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        Post::new(PostId(id), title.into(), content.into(), published, at)
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
        assert_eq!(escape_html("line one\nline two"), "line one<br>line two");
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
    }

    #[test]
    fn test_terminal_sanitizer_drops_escape_sequences() {
        let sanitizer = TerminalSanitizer::default();
        assert_eq!(sanitizer.sanitize("red\u{1b}[31m text\r"), "red[31m text");
        assert_eq!(sanitizer.sanitize("a\nb"), "a\n  b");
    }

    #[test]
    fn test_project_labels_and_count() {
        let posts = [post(1, "One", "", true), post(2, "Two", "", false)];
        let view = project(posts.iter(), &HtmlSanitizer, "%Y-%m-%d %H:%M", DisplayZone::Utc);

        assert_eq!(view.count, 2);
        assert_eq!(view.count_label, "2 post(s)");
        assert_eq!(view.items[0].status_label, "Published");
        assert_eq!(view.items[0].toggle_label, "Unpublish");
        assert_eq!(view.items[1].status_label, "Draft");
        assert_eq!(view.items[1].toggle_label, "Publish");
        assert_eq!(view.items[0].created_at, "2024-03-01 09:30");
    }

    #[test]
    fn test_bad_timestamp_format_falls_back_to_default() {
        assert!(is_valid_timestamp_format("%d.%m.%Y %H:%M"));
        assert!(!is_valid_timestamp_format("%Q"));
        assert!(!is_valid_timestamp_format("%"));

        let posts = [post(1, "One", "", false)];
        let view = project(posts.iter(), &HtmlSanitizer, "%Q", DisplayZone::Utc);
        assert_eq!(view.items[0].created_at, "2024-03-01 09:30:00");
    }

    #[test]
    fn test_local_zone_converts_from_utc() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let expected = at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string();

        assert_eq!(
            format_timestamp(at, "%Y-%m-%d %H:%M", DisplayZone::Local),
            expected
        );
        assert_eq!(
            format_timestamp(at, "%Y-%m-%d %H:%M", DisplayZone::Utc),
            "2024-03-01 09:30"
        );
    }

    #[test]
    fn test_display_zone_parsing() {
        assert_eq!(" UTC ".parse::<DisplayZone>(), Ok(DisplayZone::Utc));
        assert_eq!("local".parse::<DisplayZone>(), Ok(DisplayZone::Local));
        assert!("mars".parse::<DisplayZone>().is_err());
    }

    #[test]
    fn test_project_sanitizes_every_field() {
        let posts = [post(7, "<script>", "x\"y", false)];
        let view = project(posts.iter(), &HtmlSanitizer, "%Y", DisplayZone::Utc);

        assert_eq!(view.items[0].title, "&lt;script&gt;");
        assert_eq!(view.items[0].content, "x&quot;y");
    }

    #[test]
    fn test_html_fragment_contains_article_per_post() {
        let posts = [post(7, "Hi <b>", "body", true)];
        let html = html_fragment(&project(posts.iter(), &HtmlSanitizer, "%Y", DisplayZone::Utc));

        assert!(html.contains(r#"<article class="post" data-id="7">"#));
        assert!(html.contains("<h3>Hi &lt;b&gt;</h3>"));
        assert!(html.contains("2024 • Published"));
        assert!(html.contains(r#"<button class="togglePubBtn">Unpublish</button>"#));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_empty_projection() {
        let view = project(std::iter::empty(), &HtmlSanitizer, "%Y", DisplayZone::Utc);
        assert!(view.is_empty());
        assert_eq!(view.count_label, "0 post(s)");
        assert_eq!(html_fragment(&view), "");
    }

    #[test]
    fn test_notice_levels() {
        assert_eq!(Notice::saved().message, "Post saved successfully!");
        assert_eq!(
            Notice::from_error(&PostError::empty_title()),
            Notice {
                level: NoticeLevel::Error,
                message: "Enter a title".to_string(),
            }
        );
        assert_eq!(
            Notice::from_error(&PostError::NotFound(PostId(1))).level,
            NoticeLevel::Warning
        );
    }
}
