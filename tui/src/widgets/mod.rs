pub mod banner;
pub mod status_bar;
