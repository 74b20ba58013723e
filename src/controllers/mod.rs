pub mod article;
pub mod health;
pub mod refresh;
pub mod source;
