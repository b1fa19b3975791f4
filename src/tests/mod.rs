mod support;

mod config_tests;
mod store_tests;
