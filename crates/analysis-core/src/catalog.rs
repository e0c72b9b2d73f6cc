use crate::types::IndexInfo;

/// Supported market indices: (id, provider symbol, display name, country).
const INDICES: &[(&str, &str, &str, &str)] = &[
    // Indian Indices
    ("NIFTY50", "^NSEI", "NIFTY 50", "India"),
    ("SENSEX", "^BSESN", "BSE SENSEX", "India"),
    ("NIFTYBANK", "^NSEBANK", "NIFTY Bank", "India"),
    ("NIFTYIT", "^CNXIT", "NIFTY IT", "India"),
    // US Indices
    ("SP500", "^GSPC", "S&P 500", "USA"),
    ("NASDAQ", "^IXIC", "NASDAQ Composite", "USA"),
    ("DOWJONES", "^DJI", "Dow Jones Industrial", "USA"),
    ("RUSSELL2000", "^RUT", "Russell 2000", "USA"),
    // European Indices
    ("FTSE100", "^FTSE", "FTSE 100", "UK"),
    ("DAX", "^GDAXI", "DAX", "Germany"),
    ("CAC40", "^FCHI", "CAC 40", "France"),
    ("EUROSTOXX50", "^STOXX50E", "Euro Stoxx 50", "Europe"),
    // Asian Indices
    ("NIKKEI225", "^N225", "Nikkei 225", "Japan"),
    ("HANGSENG", "^HSI", "Hang Seng", "Hong Kong"),
    ("SHANGHAI", "000001.SS", "Shanghai Composite", "China"),
    ("KOSPI", "^KS11", "KOSPI", "South Korea"),
    ("ASX200", "^AXJO", "ASX 200", "Australia"),
    // Other Global Indices
    ("BOVESPA", "^BVSP", "Bovespa", "Brazil"),
    ("TSX", "^GSPTSE", "S&P/TSX Composite", "Canada"),
    ("SWISSMARKET", "^SSMI", "Swiss Market Index", "Switzerland"),
];

pub const TIME_PERIODS: &[&str] = &["1d", "5d", "1mo", "3mo", "6mo", "1y", "2y", "5y", "max"];

pub const INTERVALS: &[&str] = &["1m", "5m", "15m", "30m", "1h", "1d", "1wk", "1mo"];

const INTRADAY_INTERVALS: &[&str] = &["1m", "5m", "15m", "30m", "1h"];

/// Extra news search terms for indices whose display name alone is a poor query.
const MARKET_TERMS: &[(&str, &[&str])] = &[
    ("NIFTY50", &["NSE India", "Indian stock market", "Nifty"]),
    ("SENSEX", &["BSE India", "Bombay Stock Exchange", "Sensex"]),
    ("SP500", &["S&P 500", "US stock market", "Wall Street"]),
    ("NASDAQ", &["NASDAQ", "tech stocks", "US technology"]),
    ("DOWJONES", &["Dow Jones", "US blue chips"]),
    ("NIKKEI225", &["Nikkei", "Japan stocks", "Tokyo Stock Exchange"]),
    ("FTSE100", &["FTSE", "London Stock Exchange", "UK stocks"]),
];

/// All supported indices in catalog order.
pub fn all_indices() -> Vec<IndexInfo> {
    INDICES.iter().map(to_info).collect()
}

/// Look up an index by id, case-insensitively.
pub fn find_index(index_id: &str) -> Option<IndexInfo> {
    let id = index_id.trim().to_uppercase();
    INDICES.iter().find(|(key, ..)| *key == id).map(to_info)
}

pub fn market_terms(index_id: &str) -> &'static [&'static str] {
    let id = index_id.to_uppercase();
    MARKET_TERMS
        .iter()
        .find(|(key, _)| *key == id)
        .map(|(_, terms)| *terms)
        .unwrap_or(&[])
}

pub fn is_valid_period(period: &str) -> bool {
    TIME_PERIODS.contains(&period)
}

pub fn is_valid_interval(interval: &str) -> bool {
    INTERVALS.contains(&interval)
}

pub fn is_intraday(interval: &str) -> bool {
    INTRADAY_INTERVALS.contains(&interval)
}

fn to_info(entry: &(&str, &str, &str, &str)) -> IndexInfo {
    let (id, symbol, name, country) = *entry;
    IndexInfo {
        id: id.to_string(),
        symbol: symbol.to_string(),
        name: name.to_string(),
        country: country.to_string(),
    }
}
