pub mod configure;
pub mod query;
pub mod repl;
