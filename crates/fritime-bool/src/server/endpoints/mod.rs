pub mod combined;
pub mod status;
