// Sat Oct 17 2026 - Alex

pub const FORM_FIELD_MARKER: &str = "txtLName";
pub const FORM_BUTTON_MARKER: &str = "btnSave";
pub const FORM_PAGE: &str = "PlayerModify.aspx";
pub const CLOSED_MARKER: &str = "No Data to display";
/// The site spells it both ways.
pub const DETAILS_PAGES: &[&str] = &["TournamentDetails.aspx", "TournametDetails.aspx"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    RegistrationForm,
    Closed,
    Unknown,
}

pub fn has_form_markers(body: &str) -> bool {
    body.contains(FORM_FIELD_MARKER) && body.contains(FORM_BUTTON_MARKER) && !body.contains(CLOSED_MARKER)
}

pub fn is_form_url(url: &str) -> bool {
    url.to_ascii_lowercase().contains(&FORM_PAGE.to_ascii_lowercase())
}

pub fn is_details_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    DETAILS_PAGES.iter().any(|p| lower.contains(&p.to_ascii_lowercase()))
}

pub fn classify_page(final_url: &str, body: &str) -> PageKind {
    if has_form_markers(body) && is_form_url(final_url) && !is_details_url(final_url) {
        PageKind::RegistrationForm
    } else if body.contains(CLOSED_MARKER) || is_details_url(final_url) {
        PageKind::Closed
    } else {
        PageKind::Unknown
    }
}
