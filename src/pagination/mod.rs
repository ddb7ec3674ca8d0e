//! Pagination frame detection: paper profiles, margin priors, and the
//! classification of header, footer, and wing text.

pub mod detect;
pub mod paper;

pub use detect::{detect_pagination_frame, PaginationFrame};
pub use paper::{find_profile, PaperProfile};
