//! Write-ahead log test suite

mod recovery_tests;
