//! Per-test artifacts.
//!
//! A [`TestRun`] owns `<results_dir>/<test-slug>/` and stores named
//! attachments under its `attachments/` directory.

use crate::result::{A11yError, A11yResult};
use crate::scan_result::AxeResults;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Name of the raw scan result attachment
pub const SCAN_RESULTS_ATTACHMENT: &str = "accessibility-scan-results";

/// Attachment media type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum ContentType {
    /// `application/json`
    Json,
    /// `text/html`
    Html,
    /// `text/plain`
    Text,
    /// Any other MIME type, stored with a `.bin` extension
    Other(String),
}

impl ContentType {
    /// Map a MIME type
    #[must_use]
    pub fn parse(mime: &str) -> Self {
        match mime.split(';').next().map(str::trim) {
            Some("application/json") => Self::Json,
            Some("text/html") => Self::Html,
            Some("text/plain") => Self::Text,
            _ => Self::Other(mime.to_string()),
        }
    }

    /// MIME type
    #[must_use]
    pub fn mime(&self) -> &str {
        match self {
            Self::Json => "application/json",
            Self::Html => "text/html",
            Self::Text => "text/plain",
            Self::Other(mime) => mime,
        }
    }

    /// File extension without the dot
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Html => "html",
            Self::Text => "txt",
            Self::Other(_) => "bin",
        }
    }
}

impl From<ContentType> for String {
    fn from(content_type: ContentType) -> Self {
        content_type.mime().to_string()
    }
}

/// Body and media type of an attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentBody {
    /// Raw content
    pub body: Vec<u8>,
    /// Media type
    pub content_type: ContentType,
}

impl AttachmentBody {
    /// Create an attachment body
    #[must_use]
    pub fn new(body: impl Into<Vec<u8>>, content_type: ContentType) -> Self {
        Self {
            body: body.into(),
            content_type,
        }
    }
}

/// A stored attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    /// Attachment name
    pub name: String,
    /// Where the body was written
    pub path: PathBuf,
    /// Media type
    pub content_type: ContentType,
}

/// Artifact sink for one test
#[derive(Debug)]
pub struct TestRun {
    title: String,
    slug: String,
    output_dir: PathBuf,
    attachments: Mutex<Vec<Attachment>>,
}

impl TestRun {
    /// Artifacts for `title` go to `<results_dir>/<slug of title>/`
    #[must_use]
    pub fn new(title: impl Into<String>, results_dir: &Path) -> Self {
        let title = title.into();
        let slug = slugify(&title);
        Self {
            output_dir: results_dir.join(&slug),
            title,
            slug,
            attachments: Mutex::new(Vec::new()),
        }
    }

    /// Test title
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Directory-safe title
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Output directory of this run
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `body` to `attachments/<name>.<ext>` and record it
    ///
    /// # Errors
    ///
    /// Returns [`A11yError::Attachment`] for an empty name or a failed write
    pub async fn attach(&self, name: &str, body: AttachmentBody) -> A11yResult<Attachment> {
        let failed = |message: String| A11yError::Attachment {
            name: name.to_string(),
            message,
        };
        if name.trim().is_empty() || name.contains(['/', '\\']) {
            return Err(failed("attachment names must be non-empty file names".to_string()));
        }

        let dir = self.output_dir.join("attachments");
        let path = dir.join(format!("{name}.{}", body.content_type.extension()));
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| failed(format!("{}: {e}", dir.display())))?;
        tokio::fs::write(&path, &body.body)
            .await
            .map_err(|e| failed(format!("{}: {e}", path.display())))?;

        let attachment = Attachment {
            name: name.to_string(),
            path,
            content_type: body.content_type,
        };
        tracing::debug!(test = %self.title, name, path = %attachment.path.display(), "attached");
        self.attachments.lock().await.push(attachment.clone());
        Ok(attachment)
    }

    /// Attachments recorded so far, oldest first
    pub async fn attachments(&self) -> Vec<Attachment> {
        self.attachments.lock().await.clone()
    }
}

/// Attach the raw scan result as pretty-printed JSON
///
/// # Errors
///
/// Returns error if serialisation or the write fails
pub async fn attach_accessibility_results(
    results: &AxeResults,
    run: &TestRun,
) -> A11yResult<Attachment> {
    let body = serde_json::to_string_pretty(results)?;
    run.attach(
        SCAN_RESULTS_ATTACHMENT,
        AttachmentBody::new(body, ContentType::Json),
    )
    .await
}

/// Lowercase ASCII letters and digits joined by single hyphens
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        let _ = slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("test");
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    mod content_type_tests {
        use super::*;

        #[test]
        fn test_parse_and_extension() {
            assert_eq!(ContentType::parse("application/json"), ContentType::Json);
            assert_eq!(ContentType::parse("text/html; charset=utf-8"), ContentType::Html);
            assert_eq!(ContentType::Json.extension(), "json");
            let other = ContentType::parse("image/png");
            assert_eq!(other.mime(), "image/png");
            assert_eq!(other.extension(), "bin");
        }

        #[test]
        fn test_serializes_as_mime() {
            assert_eq!(
                serde_json::to_value(ContentType::Json).unwrap(),
                serde_json::json!("application/json")
            );
        }
    }

    mod slug_tests {
        use super::*;

        #[test]
        fn test_slugify() {
            assert_eq!(
                slugify("Reddit Home Page - Accessibility Tests > home page should not have violations"),
                "reddit-home-page-accessibility-tests-home-page-should-not-have-violations"
            );
            assert_eq!(slugify("  ??  "), "test");
        }
    }

    mod attach_tests {
        use super::*;

        #[tokio::test]
        async fn test_attach_writes_and_records() {
            let dir = tempfile::tempdir().unwrap();
            let run = TestRun::new("Popular page", dir.path());
            let attachment = run
                .attach("notes", AttachmentBody::new("hello", ContentType::Text))
                .await
                .unwrap();
            assert_eq!(
                attachment.path,
                dir.path().join("popular-page/attachments/notes.txt")
            );
            assert_eq!(std::fs::read_to_string(&attachment.path).unwrap(), "hello");
            assert_eq!(run.attachments().await, vec![attachment]);
        }

        #[tokio::test]
        async fn test_rejects_path_like_names() {
            let dir = tempfile::tempdir().unwrap();
            let run = TestRun::new("t", dir.path());
            let err = run
                .attach("../escape", AttachmentBody::new("x", ContentType::Text))
                .await
                .unwrap_err();
            assert!(matches!(err, A11yError::Attachment { .. }));
            assert!(run.attachments().await.is_empty());
        }

        #[tokio::test]
        async fn test_scan_results_are_pretty_json() {
            let dir = tempfile::tempdir().unwrap();
            let run = TestRun::new("home", dir.path());
            let results = AxeResults::from_json(r#"{"url": "https://www.reddit.com/", "violations": []}"#)
                .unwrap();
            let attachment = attach_accessibility_results(&results, &run).await.unwrap();
            assert_eq!(attachment.name, SCAN_RESULTS_ATTACHMENT);
            assert_eq!(attachment.content_type, ContentType::Json);
            assert!(attachment.path.ends_with("attachments/accessibility-scan-results.json"));
            let text = std::fs::read_to_string(&attachment.path).unwrap();
            assert!(text.contains("\n  \"url\": \"https://www.reddit.com/\""));
            let back: AxeResults = serde_json::from_str(&text).unwrap();
            assert_eq!(back, results);
        }

        #[tokio::test]
        async fn test_write_failure_is_attachment_error() {
            let dir = tempfile::tempdir().unwrap();
            let blocker = dir.path().join("blocker");
            std::fs::write(&blocker, "x").unwrap();
            let run = TestRun::new("t", &blocker);
            let err = run
                .attach("a", AttachmentBody::new("x", ContentType::Json))
                .await
                .unwrap_err();
            assert!(matches!(err, A11yError::Attachment { ref name, .. } if name == "a"));
        }
    }
}
