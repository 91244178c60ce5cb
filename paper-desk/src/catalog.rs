use paper_engine::models::{Instrument, MarketBoard, MarketEntry, Quote};

/// The seed catalog for a fresh account: a handful of NSE large caps
/// with plausible opening prices. Previous closes sit slightly off the
/// open so day-change fields start non-trivial.
pub fn default_market() -> MarketBoard {
    let rows: Vec<(&str, &str, &str, &str, f64, f64, u64)> = vec![
        (
            "reliance",
            "RELIANCE",
            "Reliance Industries",
            "Energy",
            2_950.00,
            2_941.45,
            5_230_000,
        ),
        (
            "tcs",
            "TCS",
            "Tata Consultancy Services",
            "Information Technology",
            3_850.00,
            3_862.10,
            1_910_000,
        ),
        (
            "hdfcbank",
            "HDFCBANK",
            "HDFC Bank",
            "Financial Services",
            1_650.00,
            1_644.30,
            7_450_000,
        ),
        (
            "infy",
            "INFY",
            "Infosys",
            "Information Technology",
            1_500.00,
            1_507.85,
            4_120_000,
        ),
        (
            "icicibank",
            "ICICIBANK",
            "ICICI Bank",
            "Financial Services",
            1_050.00,
            1_046.70,
            6_880_000,
        ),
        (
            "hindunilvr",
            "HINDUNILVR",
            "Hindustan Unilever",
            "Consumer Goods",
            2_400.00,
            2_410.55,
            1_040_000,
        ),
        (
            "bhartiartl",
            "BHARTIARTL",
            "Bharti Airtel",
            "Telecommunications",
            1_150.00,
            1_143.90,
            3_360_000,
        ),
        (
            "sbin",
            "SBIN",
            "State Bank of India",
            "Financial Services",
            780.00,
            777.25,
            9_540_000,
        ),
        (
            "itc",
            "ITC",
            "ITC Limited",
            "Consumer Goods",
            440.00,
            441.80,
            8_720_000,
        ),
        (
            "tatamotors",
            "TATAMOTORS",
            "Tata Motors",
            "Automobile",
            950.00,
            944.60,
            5_010_000,
        ),
    ];

    MarketBoard::new(
        rows.into_iter()
            .map(|(id, symbol, name, sector, price, prev_close, volume)| MarketEntry {
                instrument: Instrument::new(id, symbol, "NSE", name, sector),
                quote: Quote::opening(price, prev_close, volume),
            })
            .collect(),
    )
}
