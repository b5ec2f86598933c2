pub mod freeze;
pub mod install;
pub mod list;
