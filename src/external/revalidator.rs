use crate::config::RevalidateConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde_json::json;

/// Asks the front-end to drop its cached render of the given routes.
#[derive(Clone)]
pub struct RevalidationService {
    client: Client,
    config: RevalidateConfig,
}

impl RevalidationService {
    pub fn new(config: RevalidateConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.url.is_some()
    }

    pub async fn revalidate_paths(&self, paths: &[String]) -> AppResult<()> {
        let Some(url) = self.config.url.as_deref() else {
            return Ok(());
        };

        let response = self
            .client
            .post(url)
            .header("x-revalidate-secret", &self.config.secret)
            .json(&json!({ "paths": paths }))
            .send()
            .await?;

        if response.status().is_success() {
            log::debug!("Revalidated {paths:?}");
            Ok(())
        } else {
            Err(AppError::ExternalApiError(format!(
                "Revalidation returned {}",
                response.status()
            )))
        }
    }

    /// Fire and forget: failures are logged, never returned.
    pub fn spawn_revalidate<I, S>(&self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.is_enabled() {
            return;
        }
        let paths: Vec<String> = paths.into_iter().map(Into::into).collect();
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.revalidate_paths(&paths).await {
                log::error!("Revalidation of {paths:?} failed: {e}");
            }
        });
    }
}
