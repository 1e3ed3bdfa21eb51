use serde::{Deserialize, Serialize};

use super::flexible_f64;

/// Finnhub 公司档案（`/stock/profile2`）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyProfile {
    pub country: String,
    pub currency: String,
    pub exchange: String,
    pub ipo: String,
    #[serde(rename = "marketCapitalization", deserialize_with = "flexible_f64")]
    pub market_cap: f64,
    pub name: String,
    pub phone: String,
    #[serde(rename = "shareOutstanding", deserialize_with = "flexible_f64")]
    pub share_outstanding: f64,
    pub ticker: String,
    #[serde(rename = "weburl")]
    pub web_url: String,
    pub logo: String,
    #[serde(rename = "finnhubIndustry")]
    pub finnhub_industry: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_profile_with_missing_fields() {
        let profile: CompanyProfile = serde_json::from_str(
            r#"{"country":"US","exchange":"NASDAQ NMS - GLOBAL MARKET","name":"Apple Inc",
                "marketCapitalization":2950000.5,"weburl":"https://www.apple.com/","ticker":"AAPL"}"#,
        )
        .unwrap();
        assert_eq!(profile.name, "Apple Inc");
        assert_eq!(profile.market_cap, 2950000.5);
        assert_eq!(profile.web_url, "https://www.apple.com/");
        assert!(profile.logo.is_empty());
    }

    #[test]
    fn unknown_symbol_yields_empty_profile() {
        let profile: CompanyProfile = serde_json::from_str("{}").unwrap();
        assert_eq!(profile, CompanyProfile::default());
    }
}
