use crate::config::VirementConfig;
use crate::utils::generate_transfer_reference;
use chrono::Utc;

/// Bank transfer "provider": nothing leaves the process, the payer gets a
/// reference to quote and a page with the bank details.
#[derive(Clone)]
pub struct VirementService {
    config: VirementConfig,
}

#[derive(Debug, Clone)]
pub struct TransferInstructions {
    pub reference: String,
    pub url: String,
}

impl VirementService {
    pub fn new(config: VirementConfig) -> Self {
        Self { config }
    }

    pub fn create_transfer(&self) -> TransferInstructions {
        let reference = generate_transfer_reference(Utc::now());
        let separator = if self.config.instructions_url.contains('?') {
            '&'
        } else {
            '?'
        };
        let url = format!(
            "{}{}reference={}",
            self.config.instructions_url, separator, reference
        );
        TransferInstructions { reference, url }
    }

    pub fn config(&self) -> &VirementConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_transfer_url_carries_reference() {
        let service = VirementService::new(VirementConfig {
            instructions_url: "https://asso.test/paiements/virement".to_string(),
            ..Default::default()
        });
        let transfer = service.create_transfer();
        assert!(transfer.reference.starts_with("VIR-"));
        assert_eq!(
            transfer.url,
            format!(
                "https://asso.test/paiements/virement?reference={}",
                transfer.reference
            )
        );
    }

    #[test]
    fn test_create_transfer_appends_to_existing_query() {
        let service = VirementService::new(VirementConfig {
            instructions_url: "https://asso.test/p?lang=fr".to_string(),
            ..Default::default()
        });
        assert!(service.create_transfer().url.contains("?lang=fr&reference=VIR-"));
    }
}
