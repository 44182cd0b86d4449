//! Storage test suite

mod sstable_tests;
