use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub payment: PaymentConfig,
    #[serde(default)]
    pub stripe: StripeConfig,
    #[serde(default)]
    pub paypal: PayPalConfig,
    #[serde(default)]
    pub virement: VirementConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub revalidate: RevalidateConfig,
    pub calendar: CalendarConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Unset allows any origin.
    #[serde(default)]
    pub allowed_origin: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64,  // seconds
    pub refresh_token_expires_in: i64, // seconds
}

/// Which payment provider backs `create_payment_session`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProviderKind {
    Stripe,
    Paypal,
    Virement,
}

impl std::str::FromStr for PaymentProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stripe" => Ok(PaymentProviderKind::Stripe),
            "paypal" => Ok(PaymentProviderKind::Paypal),
            "virement" => Ok(PaymentProviderKind::Virement),
            other => Err(format!(
                "PAYMENT_PROVIDER invalide: {other} (attendu: stripe, paypal, virement)"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentConfig {
    pub provider: PaymentProviderKind,
    /// ISO 4217, lowercase
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StripeConfig {
    pub secret_key: String,
    pub webhook_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: String,
    pub base_url: String,
}

impl Default for PayPalConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            base_url: "https://api-m.sandbox.paypal.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VirementConfig {
    /// Front-end page showing the bank details; the reference is appended as a query parameter.
    pub instructions_url: String,
    pub iban: String,
    pub bic: String,
    pub beneficiaire: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
    #[serde(default)]
    pub admin_email: Option<String>,
    /// IANA zone event times are shown in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

fn default_timezone() -> String {
    "Europe/Paris".to_string()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.resend.com/emails".to_string(),
            api_key: String::new(),
            from: "Association <noreply@example.org>".to_string(),
            admin_email: None,
            timezone: default_timezone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RevalidateConfig {
    #[serde(default)]
    pub url: Option<String>,
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    pub name: String,
    /// Used in VEVENT UIDs.
    pub domain: String,
    /// Public site root used for VEVENT URLs.
    pub site_url: String,
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // no file: everything comes from the environment
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => toml::from_str(&config_str)
                .map_err(|e| format!("Failed to parse configuration file: {e}"))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and config.toml was not found")?;
                let provider = match get_env("PAYMENT_PROVIDER") {
                    Some(v) => v.parse::<PaymentProviderKind>()?,
                    None => PaymentProviderKind::Stripe,
                };
                let site_url =
                    get_env("SITE_URL").unwrap_or_else(|| "http://localhost:3000".to_string());

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                        allowed_origin: get_env("CORS_ALLOWED_ORIGIN"),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                        refresh_token_expires_in: get_env_parse(
                            "JWT_REFRESH_EXPIRES_IN",
                            2_592_000i64,
                        ),
                    },
                    payment: PaymentConfig {
                        provider,
                        currency: get_env("PAYMENT_CURRENCY").unwrap_or_else(|| "eur".to_string()),
                        success_url: get_env("PAYMENT_SUCCESS_URL")
                            .unwrap_or_else(|| format!("{site_url}/paiements/succes")),
                        cancel_url: get_env("PAYMENT_CANCEL_URL")
                            .unwrap_or_else(|| format!("{site_url}/paiements/annule")),
                    },
                    stripe: StripeConfig {
                        secret_key: get_env("STRIPE_SECRET_KEY").unwrap_or_default(),
                        webhook_secret: get_env("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
                    },
                    paypal: PayPalConfig {
                        client_id: get_env("PAYPAL_CLIENT_ID").unwrap_or_default(),
                        client_secret: get_env("PAYPAL_CLIENT_SECRET").unwrap_or_default(),
                        base_url: get_env("PAYPAL_BASE_URL")
                            .unwrap_or_else(|| PayPalConfig::default().base_url),
                    },
                    virement: VirementConfig {
                        instructions_url: get_env("VIREMENT_INSTRUCTIONS_URL")
                            .unwrap_or_else(|| format!("{site_url}/paiements/virement")),
                        iban: get_env("VIREMENT_IBAN").unwrap_or_default(),
                        bic: get_env("VIREMENT_BIC").unwrap_or_default(),
                        beneficiaire: get_env("VIREMENT_BENEFICIAIRE").unwrap_or_default(),
                    },
                    mail: MailConfig {
                        api_url: get_env("MAIL_API_URL")
                            .unwrap_or_else(|| MailConfig::default().api_url),
                        api_key: get_env("MAIL_API_KEY").unwrap_or_default(),
                        from: get_env("MAIL_FROM").unwrap_or_else(|| MailConfig::default().from),
                        admin_email: get_env("MAIL_ADMIN_EMAIL"),
                        timezone: get_env("MAIL_TIMEZONE").unwrap_or_else(default_timezone),
                    },
                    revalidate: RevalidateConfig {
                        url: get_env("REVALIDATE_URL"),
                        secret: get_env("REVALIDATE_SECRET").unwrap_or_default(),
                    },
                    calendar: CalendarConfig {
                        name: get_env("CALENDAR_NAME")
                            .unwrap_or_else(|| "Événements de l'association".to_string()),
                        domain: get_env("CALENDAR_DOMAIN")
                            .unwrap_or_else(|| "association.local".to_string()),
                        site_url,
                    },
                }
            }
            Err(e) => {
                return Err(format!("Failed to read configuration file {config_path}: {e}").into());
            }
        };

        // environment always wins over the file
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("CORS_ALLOWED_ORIGIN") {
            config.server.allowed_origin = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("JWT_REFRESH_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.refresh_token_expires_in = n;
        }
        if let Ok(v) = env::var("PAYMENT_PROVIDER") {
            config.payment.provider = v.parse()?;
        }
        if let Ok(v) = env::var("PAYMENT_CURRENCY") {
            config.payment.currency = v;
        }
        if let Ok(v) = env::var("PAYMENT_SUCCESS_URL") {
            config.payment.success_url = v;
        }
        if let Ok(v) = env::var("PAYMENT_CANCEL_URL") {
            config.payment.cancel_url = v;
        }
        if let Ok(v) = env::var("STRIPE_SECRET_KEY") {
            config.stripe.secret_key = v;
        }
        if let Ok(v) = env::var("STRIPE_WEBHOOK_SECRET") {
            config.stripe.webhook_secret = v;
        }
        if let Ok(v) = env::var("PAYPAL_CLIENT_ID") {
            config.paypal.client_id = v;
        }
        if let Ok(v) = env::var("PAYPAL_CLIENT_SECRET") {
            config.paypal.client_secret = v;
        }
        if let Ok(v) = env::var("PAYPAL_BASE_URL") {
            config.paypal.base_url = v;
        }
        if let Ok(v) = env::var("VIREMENT_INSTRUCTIONS_URL") {
            config.virement.instructions_url = v;
        }
        if let Ok(v) = env::var("VIREMENT_IBAN") {
            config.virement.iban = v;
        }
        if let Ok(v) = env::var("VIREMENT_BIC") {
            config.virement.bic = v;
        }
        if let Ok(v) = env::var("VIREMENT_BENEFICIAIRE") {
            config.virement.beneficiaire = v;
        }
        if let Ok(v) = env::var("MAIL_API_URL") {
            config.mail.api_url = v;
        }
        if let Ok(v) = env::var("MAIL_API_KEY") {
            config.mail.api_key = v;
        }
        if let Ok(v) = env::var("MAIL_FROM") {
            config.mail.from = v;
        }
        if let Ok(v) = env::var("MAIL_ADMIN_EMAIL") {
            config.mail.admin_email = Some(v);
        }
        if let Ok(v) = env::var("MAIL_TIMEZONE") {
            config.mail.timezone = v;
        }
        if let Ok(v) = env::var("REVALIDATE_URL") {
            config.revalidate.url = Some(v);
        }
        if let Ok(v) = env::var("REVALIDATE_SECRET") {
            config.revalidate.secret = v;
        }
        if let Ok(v) = env::var("CALENDAR_NAME") {
            config.calendar.name = v;
        }
        if let Ok(v) = env::var("CALENDAR_DOMAIN") {
            config.calendar.domain = v;
        }
        if let Ok(v) = env::var("SITE_URL") {
            config.calendar.site_url = v;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_provider_parse() {
        assert_eq!(
            "stripe".parse::<PaymentProviderKind>(),
            Ok(PaymentProviderKind::Stripe)
        );
        assert_eq!(
            " PayPal ".parse::<PaymentProviderKind>(),
            Ok(PaymentProviderKind::Paypal)
        );
        assert_eq!(
            "virement".parse::<PaymentProviderKind>(),
            Ok(PaymentProviderKind::Virement)
        );
        assert!("cheque".parse::<PaymentProviderKind>().is_err());
    }

    #[test]
    fn test_config_from_toml_str() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 8081

            [database]
            url = "postgres://localhost/asso"
            max_connections = 5

            [jwt]
            secret = "s"
            access_token_expires_in = 60
            refresh_token_expires_in = 120

            [payment]
            provider = "virement"
            currency = "eur"
            success_url = "http://localhost:3000/ok"
            cancel_url = "http://localhost:3000/ko"

            [calendar]
            name = "Agenda"
            domain = "asso.test"
            site_url = "https://asso.test"
        "#;
        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.payment.provider, PaymentProviderKind::Virement);
        assert_eq!(config.server.port, 8081);
        assert!(config.stripe.secret_key.is_empty());
        assert!(config.revalidate.url.is_none());
        assert_eq!(config.paypal.base_url, "https://api-m.sandbox.paypal.com");
    }
}
