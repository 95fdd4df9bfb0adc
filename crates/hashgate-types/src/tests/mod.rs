pub mod fingerprint_tests;
