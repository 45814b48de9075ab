#![allow(missing_docs)]

pub(crate) mod db;
pub(crate) mod http;

pub(crate) use db::{create_test_user, get_test_connection};
pub(crate) use http::{get_location, get_test_server, log_in};
