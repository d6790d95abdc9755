pub mod archive;
pub mod auth;
pub mod file_handlers;
pub mod file_ops;
pub mod folder_handlers;
pub mod folder_ops;
pub mod handler_utils;
pub mod path;
pub mod store;
