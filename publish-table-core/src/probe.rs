//! Credential probe: a single read-only lookup proving the API key can see the target page.

use thiserror::Error;
use tracing::{debug, error, info};

use crate::contract::TablePublisher;

/// Probe failure. Bad key, bad page id and an unreachable network are deliberately
/// indistinguishable here; the underlying cause is only logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid Notion API key or page ID")]
pub struct CredentialError;

/// Verify that the publisher's credentials can access `page_id`.
pub async fn verify_access<P>(publisher: &P, page_id: &str) -> Result<(), CredentialError>
where
    P: TablePublisher + ?Sized,
{
    info!(page_id, "[PROBE] Checking access to target page");
    match publisher.fetch_page(page_id).await {
        Ok(page) => {
            debug!(page = %page, "[PROBE] Page data");
            info!(page_id, "[PROBE] Target page is accessible");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, page_id, "[PROBE][ERROR] Target page lookup failed");
            Err(CredentialError)
        }
    }
}
