//! Integration tests for Sumi-Frontier

mod crawl_tests;
