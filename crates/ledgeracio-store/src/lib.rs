pub mod db;

pub use db::AllowlistStore;
