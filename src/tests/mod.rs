pub mod store_tests;
pub mod layout_tests;
pub mod region_tests;
pub mod engine_tests;
pub mod crash_tests;
