pub mod books;
pub mod lookup;
pub mod refresh;
pub mod status;
