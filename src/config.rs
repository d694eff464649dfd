use bigdecimal::BigDecimal;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub payment_service_url: String,
    pub mailer_url: String,
    pub webhook_secret: String,
    pub moderation_amount_limit: BigDecimal,
    pub collaborator_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,
            database_url: env::var("DATABASE_URL")?,
            payment_service_url: env::var("PAYMENT_SERVICE_URL")?,
            mailer_url: env::var("MAILER_URL")?,
            webhook_secret: env::var("WEBHOOK_SECRET")?,
            moderation_amount_limit: BigDecimal::from_str(
                &env::var("MODERATION_AMOUNT_LIMIT").unwrap_or_else(|_| "1000".to_string()),
            )
            .map_err(|e| anyhow::anyhow!("MODERATION_AMOUNT_LIMIT is not a number: {e}"))?,
            collaborator_timeout_secs: env::var("COLLABORATOR_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,
        })
    }
}
