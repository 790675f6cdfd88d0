pub mod editor;
pub mod review;
pub mod templates;
