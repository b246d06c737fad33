//! Per-shop outbound mail configuration.
//!
//! Absent settings and `enabled: false` both mean "mail not configured",
//! which dispatch reports as a structured failure rather than an error.
//! Passwords are stored sealed (see [`crate::seal`]), never in the clear.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::seal;
use crate::store::{SettingsStore, keys, load_or_default, save};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailProvider {
    Gmail,
    Outlook,
    Yahoo,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub secure: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailSettings {
    pub enabled: bool,
    pub provider: MailProvider,
    pub from_name: String,
    pub from_email: String,
    /// Sealed form, `hex(nonce):hex(ciphertext)`.
    pub sealed_password: String,
    /// Only consulted for [`MailProvider::Custom`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp: Option<SmtpConfig>,
}

impl EmailSettings {
    pub fn new(
        provider: MailProvider,
        from_name: impl Into<String>,
        from_email: impl Into<String>,
        password: &str,
        secret: &str,
    ) -> Result<Self> {
        Ok(Self {
            enabled: true,
            provider,
            from_name: from_name.into(),
            from_email: from_email.into(),
            sealed_password: seal::seal(secret, password)?,
            smtp: None,
        })
    }

    pub fn with_smtp(mut self, smtp: SmtpConfig) -> Self {
        self.smtp = Some(smtp);
        self
    }

    /// The SMTP endpoint for this provider. Known providers carry fixed
    /// endpoints; custom requires an explicit one.
    pub fn smtp_config(&self) -> Result<SmtpConfig> {
        let fixed = |host: &str, port: u16, secure: bool| SmtpConfig {
            host: host.to_string(),
            port,
            secure,
        };
        match self.provider {
            MailProvider::Gmail => Ok(fixed("smtp.gmail.com", 587, false)),
            MailProvider::Outlook => Ok(fixed("smtp-mail.outlook.com", 587, false)),
            MailProvider::Yahoo => Ok(fixed("smtp.mail.yahoo.com", 465, true)),
            MailProvider::Custom => match &self.smtp {
                Some(smtp) => Ok(smtp.clone()),
                None => bail!("custom mail provider without an smtp endpoint"),
            },
        }
    }

    pub fn open_password(&self, secret: &str) -> Result<String> {
        seal::open(secret, &self.sealed_password)
    }
}

/// The shop's mail settings when present *and* enabled.
pub async fn load_mail(store: &dyn SettingsStore, shop: &str) -> Result<Option<EmailSettings>> {
    let settings: Option<EmailSettings> = load_or_default(store, shop, keys::EMAIL).await?;
    Ok(settings.filter(|s| s.enabled))
}

pub async fn save_mail(
    store: &dyn SettingsStore,
    shop: &str,
    settings: &EmailSettings,
) -> Result<()> {
    save(store, shop, keys::EMAIL, settings).await
}

/// Flip the enabled flag off, keeping the rest of the record.
pub async fn disable_mail(store: &dyn SettingsStore, shop: &str) -> Result<bool> {
    let settings: Option<EmailSettings> = load_or_default(store, shop, keys::EMAIL).await?;
    match settings {
        Some(mut s) if s.enabled => {
            s.enabled = false;
            save_mail(store, shop, &s).await?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;

    fn settings(provider: MailProvider) -> EmailSettings {
        EmailSettings::new(provider, "Demo Shop", "hello@demo.example", "hunter2", "secret")
            .unwrap()
    }

    #[tokio::test]
    async fn absent_settings_mean_not_configured() {
        let store = MemStore::new();
        assert!(load_mail(&store, "demo.example").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn disabled_settings_mean_not_configured() {
        let store = MemStore::new();
        let mut s = settings(MailProvider::Gmail);
        s.enabled = false;
        save_mail(&store, "demo.example", &s).await.unwrap();
        assert!(load_mail(&store, "demo.example").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn enabled_settings_roundtrip_with_sealed_password() {
        let store = MemStore::new();
        let s = settings(MailProvider::Yahoo);
        save_mail(&store, "demo.example", &s).await.unwrap();

        let loaded = load_mail(&store, "demo.example").await.unwrap().unwrap();
        assert_eq!(loaded, s);
        assert_ne!(loaded.sealed_password, "hunter2");
        assert_eq!(loaded.open_password("secret").unwrap(), "hunter2");
    }

    #[tokio::test]
    async fn disable_keeps_the_record() {
        let store = MemStore::new();
        save_mail(&store, "demo.example", &settings(MailProvider::Gmail))
            .await
            .unwrap();
        assert!(disable_mail(&store, "demo.example").await.unwrap());
        assert!(load_mail(&store, "demo.example").await.unwrap().is_none());

        let raw: Option<EmailSettings> = load_or_default(&store, "demo.example", keys::EMAIL)
            .await
            .unwrap();
        assert_eq!(raw.unwrap().from_email, "hello@demo.example");
    }

    #[test]
    fn provider_endpoints() {
        assert_eq!(
            settings(MailProvider::Gmail).smtp_config().unwrap().host,
            "smtp.gmail.com"
        );
        let yahoo = settings(MailProvider::Yahoo).smtp_config().unwrap();
        assert_eq!(yahoo.port, 465);
        assert!(yahoo.secure);

        assert!(settings(MailProvider::Custom).smtp_config().is_err());
        let custom = settings(MailProvider::Custom).with_smtp(SmtpConfig {
            host: "mail.demo.example".into(),
            port: 2525,
            secure: false,
        });
        assert_eq!(custom.smtp_config().unwrap().port, 2525);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(settings(MailProvider::Gmail)).unwrap();
        assert!(json.get("fromEmail").is_some());
        assert!(json.get("sealedPassword").is_some());
        assert_eq!(json.get("provider").unwrap(), "gmail");
    }
}
