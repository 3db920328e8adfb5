pub mod measurements_api;
