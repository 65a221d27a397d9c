pub mod fetchers;
pub mod guard;
pub mod html;
pub mod text;
