pub(crate) mod common;
mod export;
