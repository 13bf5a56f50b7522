pub mod catalog;
pub mod clients;
pub mod config;
pub mod contifico;
pub mod documents;
pub mod error;
pub mod models;
pub mod periods;
pub mod routes;
pub mod servicli;
pub mod state;
pub mod ventas;
