pub mod setup_test;
