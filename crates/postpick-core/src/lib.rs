pub mod config;
pub mod doctor;
pub mod item;
pub mod search;
pub mod source;
pub mod store;
#[cfg(test)]
pub(crate) mod test_support;
