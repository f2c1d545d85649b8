pub mod catalog;
pub mod config;
pub mod flags;
pub mod overlay;
pub mod pages;
pub mod session;

#[cfg(test)]
mod tests;
#[cfg(test)]
mod testutil;
