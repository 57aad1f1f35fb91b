pub mod coincap;
pub mod coindesk;
pub mod custom_csv;

pub use coincap::CoinCapSource;
pub use coindesk::CoinDeskSource;
pub use custom_csv::CustomCsvSource;
