//! UIコンポーネント

pub mod header;
pub mod loading_spinner;
pub mod results_page;
pub mod toast;
pub mod upload_area;
pub mod upload_page;
