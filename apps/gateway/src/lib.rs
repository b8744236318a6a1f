// Library exports for testing
// Both binaries import these as well

pub mod app;
pub mod error;
pub mod logger;

#[cfg(test)]
mod tests;
