pub mod chunk;
pub mod load_error;
pub mod mesh_buffer;
pub mod name_ref;
