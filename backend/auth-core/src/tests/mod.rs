mod engine;
mod errors;
mod protocol;
mod token_store;
