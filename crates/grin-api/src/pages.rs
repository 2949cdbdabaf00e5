//! Server-rendered HTML for the three pages.

use std::fmt::Write;

use grin_types::{ClassificationRecord, Label};

pub const UPLOAD_SUCCESS_MESSAGE: &str = "Image uploaded successfully!";

/// What the classify page shows after an upload attempt.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifyView {
    pub success: Option<String>,
    pub label: Option<Label>,
    pub error: Option<String>,
}

impl ClassifyView {
    pub fn success(label: Label) -> Self {
        Self {
            success: Some(UPLOAD_SUCCESS_MESSAGE.to_string()),
            label: Some(label),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

pub fn home(message: &str) -> String {
    layout(
        "Home",
        &format!(
            "<h1>{}</h1>\n<p>Upload a photo and find out whether the person in it is smiling.</p>\n\
             <p><a href=\"/classify\">Classify an image</a></p>",
            escape(message)
        ),
    )
}

pub fn classify(view: &ClassifyView) -> String {
    let mut body = String::from("<h1>Classify an image</h1>\n");

    if let Some(success) = &view.success {
        let _ = writeln!(body, "<p class=\"success\">{}</p>", escape(success));
    }
    if let Some(label) = view.label {
        let _ = writeln!(body, "<p class=\"label\">Prediction: <strong>{}</strong></p>", label);
    }
    if let Some(error) = &view.error {
        let _ = writeln!(body, "<p class=\"error\">{}</p>", escape(error));
    }

    body.push_str(
        "<form action=\"/upload\" method=\"post\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"file\" accept=\"image/*\" required>\n\
         <button type=\"submit\">Upload</button>\n\
         </form>",
    );

    layout("Classify", &body)
}

pub fn history(entries: &[ClassificationRecord]) -> String {
    let mut body = String::from("<h1>History</h1>\n");

    if entries.is_empty() {
        body.push_str("<p>No images have been classified yet.</p>");
        return layout("History", &body);
    }

    body.push_str("<table>\n<tr><th>Image</th><th>Label</th><th>Uploaded</th></tr>\n");
    for entry in entries {
        let path = escape(&entry.image_path);
        let _ = writeln!(
            body,
            "<tr><td><img src=\"/{path}\" alt=\"{path}\" width=\"64\"></td><td>{}</td><td>{}</td></tr>",
            entry.label,
            entry.upload_date.format("%Y-%m-%d %H:%M:%S %:z"),
        );
    }
    body.push_str("</table>");

    layout("History", &body)
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{title} | Grin</title>\n\
         <link rel=\"stylesheet\" href=\"/static/style.css\">\n</head>\n<body>\n\
         <nav><a href=\"/\">Home</a> <a href=\"/classify\">Classify</a> <a href=\"/history\">History</a></nav>\n\
         <main>\n{body}\n</main>\n</body>\n</html>\n"
    )
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn home_shows_message() {
        assert!(home("Hello world!").contains("<h1>Hello world!</h1>"));
    }

    #[test]
    fn classify_success_shows_label() {
        let page = classify(&ClassifyView::success(Label::NotSmiling));
        assert!(page.contains(UPLOAD_SUCCESS_MESSAGE));
        assert!(page.contains("<strong>Not Smiling</strong>"));
        assert!(!page.contains("class=\"error\""));
    }

    #[test]
    fn classify_error_is_escaped() {
        let page = classify(&ClassifyView::error("bad <script>"));
        assert!(page.contains("bad &lt;script&gt;"));
        assert!(!page.contains("class=\"success\""));
    }

    #[test]
    fn empty_history_says_so() {
        assert!(history(&[]).contains("No images have been classified yet."));
    }

    #[test]
    fn history_rows_link_images() {
        let date = FixedOffset::east_opt(6 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .unwrap();
        let page = history(&[ClassificationRecord {
            id: 1,
            image_path: "images/a.png".into(),
            label: Label::Smiling,
            upload_date: date,
        }]);

        assert!(page.contains("src=\"/images/a.png\""));
        assert!(page.contains("<td>Smiling</td>"));
        assert!(page.contains("2024-05-01 12:00:00 +06:00"));
    }
}
