//! Form rendering module
//!
//! - `field_renderer`: text, toggle and select rows
//! - `entity_form`: the create wizards for clients, admins, teachers and students

mod entity_form;
mod field_renderer;

pub use entity_form::draw_entity_form;
pub use field_renderer::draw_field;
