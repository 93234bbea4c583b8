#[macro_export]
macro_rules! include_modules {
    () => {
        pub mod model;
        pub mod pefti_error;
        pub mod processing;
        pub mod utils;
    }
}
