pub mod column_menu;
pub mod controls;
pub mod field_list;
pub mod grid;
pub mod multiline_text_input;
pub mod text_input;
pub(crate) mod text_input_common;
