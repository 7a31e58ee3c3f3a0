pub mod site_index;
pub mod text_chunk;
