pub mod ai;
pub mod db;
