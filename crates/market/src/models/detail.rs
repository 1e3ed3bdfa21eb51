use dogonomics_ai_analysis::Article;
use serde::{Deserialize, Serialize};

use super::{BasicFinancials, ChartDataPoint, CompanyProfile, Quote, TechnicalIndicator};

/// 个股详情，由行情、档案、财务、日线拼装而成
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDetailData {
    pub company_name: String,
    pub description: String,
    pub current_price: f64,
    pub change_percentage: f64,
    pub exchange: String,
    pub symbol: String,
    pub asset_type: String,
    pub ebitda: String,
    pub pe_ratio: f64,
    pub eps: f64,
    pub about_description: String,
    pub chart_data: Vec<ChartDataPoint>,
    pub technical_indicators: Vec<TechnicalIndicator>,
    pub sentiment_data: Vec<ChartDataPoint>,
    pub news: Vec<Article>,
    pub analytics_data: Vec<ChartDataPoint>,
    pub logo: String,
}

impl StockDetailData {
    pub fn assemble(
        symbol: &str,
        chart: Vec<ChartDataPoint>,
        profile: CompanyProfile,
        financials: &BasicFinancials,
        quote: &Quote,
    ) -> Self {
        Self {
            about_description: format!("{} is listed on {}", profile.name, profile.exchange),
            company_name: profile.name,
            description: profile.country,
            current_price: quote.current_price,
            change_percentage: quote.percent_change,
            exchange: profile.exchange,
            symbol: symbol.to_string(),
            asset_type: "Stock".to_string(),
            ebitda: "N/A".to_string(),
            pe_ratio: financials.pe_ratio(),
            eps: financials.eps(),
            chart_data: chart,
            technical_indicators: Vec::new(),
            sentiment_data: Vec::new(),
            news: Vec::new(),
            analytics_data: Vec::new(),
            logo: profile.logo,
        }
    }
}
