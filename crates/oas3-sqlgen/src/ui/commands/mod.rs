pub mod check;
pub mod generate;

pub use check::check_models;
pub use generate::generate_models;
