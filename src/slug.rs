const VIDEO_EXTENSIONS: [&str; 6] = [".mp4", ".mkv", ".webm", ".mov", ".m4v", ".avi"];

/// Normalize free text into a URL-safe, lowercase slug.
///
/// `"My Movie"` becomes `"my-movie"`; `"Trip (2019).mp4"` becomes `"trip-2019"`.
pub fn slugify(text: &str) -> String {
    let text = text.trim();
    let lower = text.to_lowercase();
    let stem = VIDEO_EXTENSIONS
        .iter()
        .find_map(|ext| lower.strip_suffix(ext))
        .unwrap_or(lower.as_str());

    let mut slug = String::with_capacity(stem.len());
    let mut pending_dash = false;
    for c in stem.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// Last path segment of a URL, without query or fragment.
pub fn file_name_from_url(url: &str) -> &str {
    let url = url.split(['?', '#']).next().unwrap_or(url);
    url.trim_end_matches('/').rsplit('/').next().unwrap_or(url)
}
