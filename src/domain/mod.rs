pub mod article;
pub mod auth;
pub mod ingestion;
pub mod interaction;
pub mod notifier;
pub mod refresh;
pub mod retention;
pub mod source;

#[cfg(test)]
pub(crate) mod test_support;
