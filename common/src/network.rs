pub mod address;
pub mod country;
pub mod pair;
