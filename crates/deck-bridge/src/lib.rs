pub mod cli;
pub mod deck;
pub mod engine;
pub mod enrich;
pub mod error;
pub mod feed;
pub mod normalize;
pub mod registry;
pub mod render;
pub mod share;
pub mod transport;
