//! 크립토 스크리너 크롤러.
//!
//! Yahoo Finance 크립토 스크리너를 페이지 단위로 크롤링하여
//! 수집 대상 자산 유니버스를 구성합니다.
//!
//! ## 필터 조건
//! - 호가 통화가 USDT/USDC/USD/BTC/ETH 중 하나
//! - 24시간 거래량 10만 이상
//! - 유통량 0 초과
//! - 52주 변동률이 (-95%, 2000%) 구간 안
//!
//! ## 사용 예시
//! ```rust,ignore
//! let screener = CoinScreener::new(ScreenerConfig::default());
//! let assets = screener.discover().await?;
//! ```

use futures::future::join_all;
use reqwest::Client;
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};

use coinflow_core::Asset;

use crate::error::{DataError, Result};

const BASE_URL: &str = "https://finance.yahoo.com/markets/crypto/all/";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 허용하는 호가 통화.
const VALID_QUOTES: [&str; 5] = ["USDT", "USDC", "USD", "BTC", "ETH"];

/// 스크리너 설정.
#[derive(Debug, Clone)]
pub struct ScreenerConfig {
    /// 조회할 전체 코인 수
    pub total_coins: usize,
    /// 페이지당 코인 수
    pub page_size: usize,
    /// 24시간 최소 거래량
    pub min_volume: Decimal,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            total_coins: 1300,
            page_size: 100,
            min_volume: Decimal::from(100_000),
        }
    }
}

/// 스크리너 목록의 한 행.
#[derive(Debug, Clone)]
pub struct CoinListing {
    /// 심볼 (예: "BTC-USD")
    pub symbol: String,
    /// 표시 이름
    pub name: String,
    /// 시가총액
    pub market_cap: Decimal,
    /// 24시간 거래량
    pub volume_24h: Decimal,
    /// 유통량
    pub circulating_supply: Decimal,
    /// 52주 변동률 (%)
    pub change_52w: Option<Decimal>,
}

/// Yahoo Finance 크립토 스크리너 크롤러.
pub struct CoinScreener {
    client: Client,
    config: ScreenerConfig,
}

impl CoinScreener {
    /// 새 스크리너를 생성합니다.
    pub fn new(config: ScreenerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 유니버스를 발견합니다.
    ///
    /// 모든 페이지를 동시에 요청하고, 실패한 페이지는 경고만 남기고
    /// 결과에서 제외합니다. 반환된 자산의 커서는 모두 `None`입니다.
    pub async fn discover(&self) -> Result<Vec<Asset>> {
        let starts: Vec<usize> = (0..self.config.total_coins)
            .step_by(self.config.page_size)
            .collect();

        let futures: Vec<_> = starts
            .iter()
            .map(|&start| async move {
                let result = self.fetch_page(start).await;
                (start, result)
            })
            .collect();

        let pages = join_all(futures).await;

        let mut listings = Vec::new();
        for (start, result) in pages {
            match result {
                Ok(html) => {
                    let page_listings = parse_listing_table(&html);
                    debug!(start, count = page_listings.len(), "페이지 파싱 완료");
                    listings.extend(page_listings);
                }
                Err(e) => {
                    warn!(start, error = %e, "페이지 수집 실패");
                }
            }
        }

        let assets: Vec<Asset> = listings
            .into_iter()
            .filter(|listing| self.passes_filters(listing))
            .map(|listing| Asset::new(listing.symbol, listing.name))
            .collect();

        info!(count = assets.len(), "유니버스 발견 완료");
        Ok(assets)
    }

    /// 스크리너 페이지 한 장을 가져옵니다.
    async fn fetch_page(&self, start: usize) -> Result<String> {
        let response = self
            .client
            .get(BASE_URL)
            .query(&[("start", start), ("count", self.config.page_size)])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?)
    }

    /// 목록 필터를 적용합니다.
    fn passes_filters(&self, listing: &CoinListing) -> bool {
        let quote = listing.symbol.rsplit('-').next().unwrap_or_default();
        if !VALID_QUOTES.contains(&quote) {
            return false;
        }

        if listing.volume_24h < self.config.min_volume {
            return false;
        }

        if listing.circulating_supply <= Decimal::ZERO {
            return false;
        }

        match listing.change_52w {
            Some(change) => change > Decimal::from(-95) && change < Decimal::from(2000),
            None => false,
        }
    }
}

/// 스크리너 HTML에서 목록 테이블을 파싱합니다.
///
/// 테이블이 없거나 행 구조가 예상과 다르면 해당 행만 건너뜁니다.
pub fn parse_listing_table(html: &str) -> Vec<CoinListing> {
    let document = Html::parse_document(html);

    let table_selector = match Selector::parse("table") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    let row_selector = match Selector::parse("tr") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    let cell_selector = match Selector::parse("td") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let table = match document.select(&table_selector).next() {
        Some(t) => t,
        None => return Vec::new(),
    };

    let mut listings = Vec::new();

    // 첫 행은 헤더
    for row in table.select(&row_selector).skip(1) {
        let cells: Vec<String> = row
            .select(&cell_selector)
            .map(|cell| cell.text().collect::<Vec<_>>().join(" ").trim().to_string())
            .collect();

        if cells.len() < 10 {
            continue;
        }

        // 심볼 셀은 "BTC-USD Bitcoin USD" 형태, 첫 토큰이 심볼
        let symbol = match cells[0].split_whitespace().next() {
            Some(s) if s.contains('-') => s.to_string(),
            _ => continue,
        };

        let name = cells[1].clone();
        let market_cap = parse_abbrev_number(&cells[6]);
        let volume_24h = parse_abbrev_number(&cells[8]);
        let circulating_supply = parse_abbrev_number(&cells[cells.len() - 3]);
        let change_52w = parse_percent(&cells[cells.len() - 2]);

        listings.push(CoinListing {
            symbol,
            name,
            market_cap,
            volume_24h,
            circulating_supply,
            change_52w,
        });
    }

    listings
}

/// "131.179B", "214.428M", "1.2T", "950K" 형태의 축약 숫자를 파싱합니다.
///
/// 파싱 불가능하거나 "--"이면 0을 반환합니다.
pub fn parse_abbrev_number(text: &str) -> Decimal {
    let text = text.trim().to_uppercase();
    if text.is_empty() || text == "--" {
        return Decimal::ZERO;
    }

    let (digits, multiplier) = match text.chars().last() {
        Some('T') => (&text[..text.len() - 1], Decimal::from(1_000_000_000_000i64)),
        Some('B') => (&text[..text.len() - 1], Decimal::from(1_000_000_000i64)),
        Some('M') => (&text[..text.len() - 1], Decimal::from(1_000_000i64)),
        Some('K') => (&text[..text.len() - 1], Decimal::from(1_000i64)),
        _ => (text.as_str(), Decimal::ONE),
    };

    digits
        .replace(',', "")
        .parse::<Decimal>()
        .map(|v| v * multiplier)
        .unwrap_or(Decimal::ZERO)
}

/// "12.34%" 형태의 변동률을 파싱합니다.
fn parse_percent(text: &str) -> Option<Decimal> {
    let cleaned = text.trim().replace(['%', ','], "");
    if cleaned.is_empty() || cleaned == "--" {
        return None;
    }
    cleaned.parse::<Decimal>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_abbrev_number() {
        assert_eq!(parse_abbrev_number("131.179B"), dec!(131_179_000_000));
        assert_eq!(parse_abbrev_number("214.428M"), dec!(214_428_000));
        assert_eq!(parse_abbrev_number("1.2T"), dec!(1_200_000_000_000));
        assert_eq!(parse_abbrev_number("950K"), dec!(950_000));
        assert_eq!(parse_abbrev_number("--"), Decimal::ZERO);
        assert_eq!(parse_abbrev_number(""), Decimal::ZERO);
        assert_eq!(parse_abbrev_number("1234"), dec!(1234));
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent("12.34%"), Some(dec!(12.34)));
        assert_eq!(parse_percent("-5.5%"), Some(dec!(-5.5)));
        assert_eq!(parse_percent("--"), None);
        assert_eq!(parse_percent(""), None);
    }

    #[test]
    fn test_filters() {
        let screener = CoinScreener::new(ScreenerConfig::default()).unwrap();
        let listing = CoinListing {
            symbol: "BTC-USD".to_string(),
            name: "Bitcoin USD".to_string(),
            market_cap: dec!(1_000_000_000),
            volume_24h: dec!(500_000),
            circulating_supply: dec!(19_000_000),
            change_52w: Some(dec!(42.0)),
        };
        assert!(screener.passes_filters(&listing));

        // 허용되지 않는 호가 통화
        let mut bad_quote = listing.clone();
        bad_quote.symbol = "BTC-EUR".to_string();
        assert!(!screener.passes_filters(&bad_quote));

        // 거래량 미달
        let mut low_volume = listing.clone();
        low_volume.volume_24h = dec!(50_000);
        assert!(!screener.passes_filters(&low_volume));

        // 유통량 0
        let mut no_supply = listing.clone();
        no_supply.circulating_supply = Decimal::ZERO;
        assert!(!screener.passes_filters(&no_supply));

        // 52주 변동률 범위 밖 또는 누락
        let mut extreme_change = listing.clone();
        extreme_change.change_52w = Some(dec!(5000));
        assert!(!screener.passes_filters(&extreme_change));

        let mut no_change = listing;
        no_change.change_52w = None;
        assert!(!screener.passes_filters(&no_change));
    }

    #[test]
    fn test_parse_listing_table() {
        let html = r#"
        <html><body><table>
          <tr><th>Symbol</th></tr>
          <tr>
            <td><span>BTC-USD</span> <span>Bitcoin USD</span></td>
            <td>Bitcoin USD</td>
            <td>97,000</td><td>+1.2%</td><td>1</td><td>2</td>
            <td>1.9T</td><td>x</td><td>45.3B</td>
            <td>19.8M</td><td>55.2%</td><td>chart</td>
          </tr>
        </table></body></html>"#;

        let listings = parse_listing_table(html);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].symbol, "BTC-USD");
        assert_eq!(listings[0].volume_24h, dec!(45_300_000_000));
        assert_eq!(listings[0].circulating_supply, dec!(19_800_000));
        assert_eq!(listings[0].change_52w, Some(dec!(55.2)));
    }

    #[tokio::test]
    #[ignore] // 실제 네트워크 테스트는 ignore
    async fn test_discover_live() {
        let screener = CoinScreener::new(ScreenerConfig::default()).unwrap();
        let assets = screener.discover().await.unwrap();
        println!("발견된 자산 수: {}", assets.len());
    }
}
