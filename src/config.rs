use anyhow::{bail, Context, Result};

use crate::models::{QueryDescriptor, SortOrder};

#[derive(Debug, Clone)]
pub struct Config {
    pub payments_api_url: String,
    pub request_timeout_secs: u64,
    pub default_page_size: u32,
    pub default_sort_order: SortOrder,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            payments_api_url: std::env::var("PAYMENTS_API_URL")
                .context("PAYMENTS_API_URL required")?,
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .context("Invalid REQUEST_TIMEOUT_SECS")?,
            default_page_size: std::env::var("DEFAULT_PAGE_SIZE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DEFAULT_PAGE_SIZE")?,
            default_sort_order: Self::parse_sort_order()?,
        };

        config.validate()?;
        Ok(config)
    }

    fn parse_sort_order() -> Result<SortOrder> {
        let order = std::env::var("DEFAULT_SORT_ORDER").unwrap_or_else(|_| "desc".to_string());
        match order.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => bail!("Unknown sort order: {}", order),
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.payments_api_url.starts_with("http") {
            bail!("PAYMENTS_API_URL must be HTTP(S) URL");
        }
        if self.default_page_size == 0 {
            bail!("DEFAULT_PAGE_SIZE must be at least 1");
        }

        tracing::info!("Configuration validated for {}", self.payments_api_url);

        Ok(())
    }

    pub fn initial_query(&self) -> QueryDescriptor {
        QueryDescriptor::compose(1, self.default_page_size, "", self.default_sort_order, "")
    }
}
