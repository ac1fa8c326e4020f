//! Contact form delivery through a transactional email API.
//!
//! The service credentials come from the environment. The visitor's message
//! goes out with the main template; when an auto-reply template is
//! configured a confirmation is sent back to the visitor afterwards, on a
//! best-effort basis.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::i18n::I18n;

pub const DEFAULT_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

const SERVICE_ID_VAR: &str = "FOLIO_EMAIL_SERVICE_ID";
const TEMPLATE_ID_VAR: &str = "FOLIO_EMAIL_TEMPLATE_ID";
const PUBLIC_KEY_VAR: &str = "FOLIO_EMAIL_PUBLIC_KEY";
const AUTOREPLY_TEMPLATE_VAR: &str = "FOLIO_EMAIL_AUTOREPLY_TEMPLATE_ID";
const ENDPOINT_VAR: &str = "FOLIO_EMAIL_ENDPOINT";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactField {
    Name,
    Email,
    Subject,
    Message,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    /// Returns the first field that is blank or malformed.
    pub fn validate(&self) -> std::result::Result<(), ContactField> {
        if self.name.trim().is_empty() {
            return Err(ContactField::Name);
        }
        if !is_plausible_email(self.email.trim()) {
            return Err(ContactField::Email);
        }
        if self.subject.trim().is_empty() {
            return Err(ContactField::Subject);
        }
        if self.message.trim().is_empty() {
            return Err(ContactField::Message);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn is_plausible_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "field", rename_all = "lowercase")]
pub enum ContactStatus {
    Sent,
    Failed,
    Invalid(ContactField),
}

impl ContactStatus {
    pub fn i18n_key(&self) -> &'static str {
        match self {
            ContactStatus::Sent => "contact-status-sent",
            ContactStatus::Failed => "contact-status-failed",
            ContactStatus::Invalid(ContactField::Name) => "contact-status-invalid-name",
            ContactStatus::Invalid(ContactField::Email) => "contact-status-invalid-email",
            ContactStatus::Invalid(ContactField::Subject) => "contact-status-invalid-subject",
            ContactStatus::Invalid(ContactField::Message) => "contact-status-invalid-message",
        }
    }

    pub fn message(&self, i18n: &I18n) -> String {
        i18n.tr(self.i18n_key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailConfig {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    pub autoreply_template_id: Option<String>,
    pub endpoint: String,
}

impl EmailConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Blank values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let require = |name: &str| {
            get(name).ok_or_else(|| Error::Config(format!("{} is not set", name)))
        };

        Ok(Self {
            service_id: require(SERVICE_ID_VAR)?,
            template_id: require(TEMPLATE_ID_VAR)?,
            public_key: require(PUBLIC_KEY_VAR)?,
            autoreply_template_id: get(AUTOREPLY_TEMPLATE_VAR),
            endpoint: get(ENDPOINT_VAR).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateParams {
    pub from_name: String,
    pub from_email: String,
    pub subject: String,
    pub message: String,
}

impl From<&ContactForm> for TemplateParams {
    fn from(form: &ContactForm) -> Self {
        Self {
            from_name: form.name.trim().to_string(),
            from_email: form.email.trim().to_string(),
            subject: form.subject.trim().to_string(),
            message: form.message.trim().to_string(),
        }
    }
}

/// Body of a send request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailRequest {
    pub service_id: String,
    pub template_id: String,
    pub user_id: String,
    pub template_params: TemplateParams,
}

pub trait EmailTransport: Send + Sync {
    fn send(&self, request: &EmailRequest) -> Result<()>;
}

pub struct HttpEmailTransport {
    client: Client,
    endpoint: String,
}

impl HttpEmailTransport {
    pub fn new(endpoint: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

impl EmailTransport for HttpEmailTransport {
    fn send(&self, request: &EmailRequest) -> Result<()> {
        let body = serde_json::to_vec(request)?;
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(Error::Server(format!("{}: {}", status, detail.trim())));
        }
        Ok(())
    }
}

pub struct ContactService {
    config: EmailConfig,
    transport: Box<dyn EmailTransport>,
}

impl ContactService {
    pub fn new(config: EmailConfig, transport: Box<dyn EmailTransport>) -> Self {
        Self { config, transport }
    }

    /// Service configured from the environment, sending over HTTP.
    pub fn from_env() -> Result<Self> {
        let config = EmailConfig::from_env()?;
        let transport = HttpEmailTransport::new(config.endpoint.clone())?;
        Ok(Self::new(config, Box::new(transport)))
    }

    /// Validate and send `form`. The form is cleared only once the message
    /// is accepted, so a failed send can be retried as is.
    pub fn submit(&self, form: &mut ContactForm) -> ContactStatus {
        if let Err(field) = form.validate() {
            log::debug!("Contact form rejected: {:?}", field);
            return ContactStatus::Invalid(field);
        }

        let params = TemplateParams::from(&*form);
        if let Err(e) = self.transport.send(&self.request(&self.config.template_id, params.clone())) {
            log::warn!("Failed to send contact message: {}", e);
            return ContactStatus::Failed;
        }
        log::info!("Contact message sent");
        form.clear();

        if let Some(template) = self.config.autoreply_template_id.as_deref() {
            if let Err(e) = self.transport.send(&self.request(template, params)) {
                log::warn!("Auto-reply not sent: {}", e);
            }
        }
        ContactStatus::Sent
    }

    fn request(&self, template_id: &str, template_params: TemplateParams) -> EmailRequest {
        EmailRequest {
            service_id: self.config.service_id.clone(),
            template_id: template_id.to_string(),
            user_id: self.config.public_key.clone(),
            template_params,
        }
    }
}
