//! Terminal "navigation": the customer continues in a browser.

use shop_core::{Navigator, ShopError, ShopResult};
use std::io::Write;
use tracing::info;
use url::Url;

/// Prints the hosted checkout URL for the customer to open
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, url: &str) -> ShopResult<()> {
        let url = Url::parse(url)
            .map_err(|e| ShopError::Validation(format!("invalid checkout URL {:?}: {}", url, e)))?;
        info!("Handing off to {}", url.host_str().unwrap_or_default());

        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "Continue to payment: {}", url)
            .and_then(|_| stdout.flush())
            .map_err(|e| ShopError::Persistence(format!("failed to write to stdout: {}", e)))
    }
}
