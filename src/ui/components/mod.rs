pub mod chat_area;
pub mod input_bar;
pub mod name_entry;
pub mod toast;
