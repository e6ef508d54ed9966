//! Integration tests for the scrivener generation pipeline

mod authoring;
mod config_integration;
mod key_pool;
mod model_providers;
mod pipeline_run;
mod test_utils;
