use crate::error::RelayError;
use crate::registry::LinkEntry;
use askama::Template;

/// Landing page: a form that registers a link through `POST /generate`.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate;

/// Admin listing with a delete button per entry.
#[derive(Template)]
#[template(path = "admin.html")]
pub struct AdminTemplate<'a> {
    pub entries: &'a [LinkEntry],
    pub admin_token: &'a str,
}

pub fn index_page() -> Result<String, RelayError> {
    Ok(IndexTemplate.render()?)
}

pub fn admin_page(entries: &[LinkEntry], admin_token: &str) -> Result<String, RelayError> {
    let template = AdminTemplate {
        entries,
        admin_token,
    };
    Ok(template.render()?)
}
