pub mod csv;
pub mod lines;
