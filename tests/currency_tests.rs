mod common;

use common::{date, setup_test_env};
use finance_core::{
    config::Config,
    currency::{format_currency_value, format_date, CurrencyCode, NegativeStyle},
    language::{find_language, parse_display_date},
};

#[test]
fn brazilian_settings_format_reals_and_dates() {
    let (_storage, manager) = setup_test_env();
    let mut config = Config::default();
    config.set_language("pt-BR").unwrap();
    config.set_currency("BRL").unwrap();
    manager.save(&config).unwrap();

    let loaded = manager.load().unwrap();
    let locale = loaded.locale();
    assert_eq!(
        format_currency_value(-1234.5, &loaded.currency, &locale, &loaded.format),
        "-R$1.234,50"
    );
    assert_eq!(format_date(&locale, date(2025, 7, 4)), "04/07/2025");
}

#[test]
fn parentheses_style_survives_a_config_restore() {
    let (_storage, manager) = setup_test_env();
    let mut config = Config::default();
    config.format.negative_style = NegativeStyle::Parentheses;
    let backup = manager.backup(&config, Some("accounting")).unwrap();
    manager.save(&Config::default()).unwrap();

    let restored = manager.restore(&backup).unwrap();
    let usd = CurrencyCode::new("USD");
    assert_eq!(
        format_currency_value(-99.999, &usd, &restored.locale(), &restored.format),
        "($100.00)"
    );
}

#[test]
fn language_lookup_and_form_dates() {
    assert_eq!(find_language("ES").unwrap().native_name, "Español");
    assert!(parse_display_date("31/02/2024").is_err());
    assert_eq!(parse_display_date("15/08/2024").unwrap(), date(2024, 8, 15));
}
