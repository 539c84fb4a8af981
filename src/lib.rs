#![doc(test(attr(deny(warnings))))]

//! Finance Core models personal income and expense tracking: a local transaction
//! book, recurring and installment projection, per-month views, and the currency and
//! language preferences that drive formatting.

pub mod cli;
pub mod config;
pub mod currency;
pub mod errors;
pub mod language;
pub mod ledger;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Finance Core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
