//! HTML page generation.
//!
//! Pages are rendered server-side as plain strings; there is no template
//! engine. Every user-controlled value passes through [`html_escape`] before
//! interpolation, and filenames are percent-encoded when they appear in URLs.

use crate::meta::{is_jpeg_name, ExifField, ImageSummary};

/// A gallery entry: a filename plus its stored description, if any.
#[derive(Debug, Clone)]
pub struct GalleryEntry {
    /// Filename as uploaded (and blob key)
    pub name: String,

    /// AI-generated description, when one has been recorded
    pub description: Option<String>,
}

fn push_row(rows: &mut String, label: &str, value: &str) {
    rows.push_str(&format!(
        "        <tr><td>{}</td><td>{}</td></tr>\n",
        html_escape(label),
        html_escape(value)
    ));
}

/// Escape HTML special characters to prevent XSS attacks.
pub fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

const STYLE: &str = r#"
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif;
            max-width: 860px;
            margin: 0 auto;
            padding: 24px;
            color: #222;
        }
        header { display: flex; justify-content: space-between; align-items: baseline; }
        header .who { color: #666; font-size: 14px; }
        ul.gallery { list-style: none; padding: 0; }
        ul.gallery li { margin-bottom: 24px; border-bottom: 1px solid #eee; padding-bottom: 16px; }
        ul.gallery img { display: block; margin: 8px 0; border-radius: 4px; }
        .description { color: #444; font-size: 14px; white-space: pre-wrap; }
        .actions { font-size: 13px; }
        .actions form { display: inline; }
        table { border-collapse: collapse; }
        table td { border: 1px solid #ccc; padding: 4px 10px; font-size: 14px; }
        .error { color: #b00020; }
        .notice { color: #1a7f37; }
        form.auth { max-width: 320px; }
        form.auth label { display: block; margin-top: 12px; }
        form.auth input { width: 100%; padding: 6px; box-sizing: border-box; }
        form.auth button { margin-top: 16px; padding: 6px 18px; }
"#;

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>{STYLE}</style>
</head>
<body>
{body}
</body>
</html>
"#
    )
}

/// Render the gallery home page for a signed-in user.
pub fn render_index(email: &str, entries: &[GalleryEntry]) -> String {
    let escaped_email = html_escape(email);

    let mut items = String::new();
    for entry in entries {
        let escaped_name = html_escape(&entry.name);
        let encoded_name = urlencoding::encode(&entry.name);

        let thumbnail = if is_jpeg_name(&entry.name) {
            format!(r#"<img src="/image/{encoded_name}" width="200" alt="{escaped_name}">"#)
        } else {
            String::new()
        };

        let description = match &entry.description {
            Some(text) => format!(
                r#"<p class="description">{}</p>"#,
                html_escape(text)
            ),
            None => String::new(),
        };

        items.push_str(&format!(
            r#"            <li>
                <a href="/files/{encoded_name}">{escaped_name}</a>
                {thumbnail}
                {description}
                <div class="actions">
                    <a href="/generate/{encoded_name}">Generate description</a>
                    <form method="post" action="/delete/{encoded_name}">
                        <button type="submit">Delete</button>
                    </form>
                </div>
            </li>
"#
        ));
    }

    if items.is_empty() {
        items.push_str("            <li>No files uploaded yet.</li>\n");
    }

    let body = format!(
        r#"    <header>
        <h1>Upload and View Images</h1>
        <span class="who">{escaped_email} &middot; <a href="/logout">Sign out</a></span>
    </header>
    <form method="post" enctype="multipart/form-data" action="/upload">
        <div>
            <label for="file">Choose file to upload</label>
            <input type="file" id="file" name="form_file" accept="image/jpeg,image/jpg" />
        </div>
        <div>
            <button type="submit">Submit</button>
        </div>
    </form>
    <h2>Uploaded Files</h2>
    <ul class="gallery">
{items}    </ul>
"#
    );

    page("Photobin", &body)
}

/// Render the metadata page for a single file.
///
/// `summary` and `exif` are both best-effort: a missing summary renders an
/// error row, missing EXIF renders the conventional "not available" row.
pub fn render_details(
    filename: &str,
    summary: Option<&ImageSummary>,
    exif: Option<&[ExifField]>,
    description: Option<&str>,
) -> String {
    let escaped_name = html_escape(filename);
    let encoded_name = urlencoding::encode(filename);

    let mut rows = String::new();

    push_row(&mut rows, "Filename", filename);
    match summary {
        Some(s) => {
            push_row(&mut rows, "Image Size", &format!("({}, {})", s.width, s.height));
            push_row(&mut rows, "Image Height", &s.height.to_string());
            push_row(&mut rows, "Image Width", &s.width.to_string());
            push_row(&mut rows, "Image Format", &s.format);
            push_row(&mut rows, "Image Mode", &s.mode);
            push_row(
                &mut rows,
                "Image is Animated",
                if s.animated { "True" } else { "False" },
            );
            push_row(&mut rows, "Frames in Image", &s.frames.to_string());
        }
        None => push_row(&mut rows, "Image", "could not be decoded"),
    }

    match exif {
        Some(fields) if !fields.is_empty() => {
            for field in fields {
                push_row(&mut rows, &field.label(), &field.value);
            }
        }
        _ => rows.push_str("        <tr><td>EXIF data not available</td></tr>\n"),
    }

    let description_html = match description {
        Some(text) => format!(
            "    <h3>Description</h3>\n    <p class=\"description\">{}</p>\n",
            html_escape(text)
        ),
        None => String::new(),
    };

    let body = format!(
        r#"    <h2>{escaped_name}</h2>
    <img src="/image/{encoded_name}" width="500" alt="{escaped_name}">
    <table width="500">
{rows}    </table>
{description_html}    <br><a href="/">Back</a>
"#
    );

    page(&format!("Photobin - {escaped_name}"), &body)
}

/// Render the sign-in page.
pub fn render_signin(error: Option<&str>, notice: Option<&str>) -> String {
    let mut messages = String::new();
    if let Some(text) = notice {
        messages.push_str(&format!(
            "    <p class=\"notice\">{}</p>\n",
            html_escape(text)
        ));
    }
    if let Some(text) = error {
        messages.push_str(&format!(
            "    <p class=\"error\">{}</p>\n",
            html_escape(text)
        ));
    }

    let body = format!(
        r#"    <h1>Sign in</h1>
{messages}    <form class="auth" method="post" action="/signin">
        <label for="email">Email</label>
        <input type="email" id="email" name="email" required />
        <label for="password">Password</label>
        <input type="password" id="password" name="password" required />
        <button type="submit">Sign in</button>
    </form>
    <p>No account? <a href="/signup">Sign up</a></p>
"#
    );

    page("Photobin - Sign in", &body)
}

/// Render the sign-up page.
pub fn render_signup(error: Option<&str>) -> String {
    let message = match error {
        Some(text) => format!("    <p class=\"error\">{}</p>\n", html_escape(text)),
        None => String::new(),
    };

    let body = format!(
        r#"    <h1>Sign up</h1>
{message}    <form class="auth" method="post" action="/signup">
        <label for="email">Email</label>
        <input type="email" id="email" name="email" required />
        <label for="password">Password</label>
        <input type="password" id="password" name="password" required />
        <button type="submit">Sign up</button>
    </form>
    <p>Already registered? <a href="/signin">Sign in</a></p>
"#
    );

    page("Photobin - Sign up", &body)
}
