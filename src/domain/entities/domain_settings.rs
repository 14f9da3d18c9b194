//! Per-domain settings, stored 1:1 with [`super::Domain`].

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// How traffic for the custom hostname is served.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, AsRefStr, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RedirectMode {
    Proxy,
    #[default]
    Redirect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomainSettings {
    pub domain_id: i64,
    pub redirect_mode: RedirectMode,
    pub custom_nameservers: Option<String>,
    pub force_ssl: bool,
}

/// Settings created together with a domain.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDomainSettings {
    pub redirect_mode: RedirectMode,
    pub custom_nameservers: Option<String>,
    pub force_ssl: bool,
}

impl Default for NewDomainSettings {
    fn default() -> Self {
        Self {
            redirect_mode: RedirectMode::default(),
            custom_nameservers: None,
            force_ssl: true,
        }
    }
}

/// Partial settings update.
///
/// `custom_nameservers: Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct UpdateDomainSettings {
    pub redirect_mode: Option<RedirectMode>,
    pub custom_nameservers: Option<Option<String>>,
    pub force_ssl: Option<bool>,
}

impl UpdateDomainSettings {
    pub fn is_empty(&self) -> bool {
        self.redirect_mode.is_none() && self.custom_nameservers.is_none() && self.force_ssl.is_none()
    }
}
